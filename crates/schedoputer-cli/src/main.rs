mod cli;
mod config;
mod logging;
mod simulate;

use cli::Command;

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("schedoputer error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let config = config::load(args.config.as_deref())?;

    match args.command {
        Command::Challenge => simulate::challenge(config).await,
        Command::Run(run) => simulate::run(config, run).await,
    }
}
