use clap::Parser;
use face_capture::Config;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config: Config = Config::parse();

    let end = face_capture::run(&config)?;
    println!("Stopped: {end:?}");
    Ok(())
}
