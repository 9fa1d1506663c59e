use clap::Parser;

use galaxy::cli::Cli;
use galaxy::AppError;

fn run(cli: Cli) -> Result<(), AppError> {
    let params = cli.parameters()?;

    if let Some(path) = &cli.save_preset {
        params.save(path)?;
        log::info!("wrote preset {}", path.display());
        return Ok(());
    }

    cli.galaxy(params).run()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Cli::parse()) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
