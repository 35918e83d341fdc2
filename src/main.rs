use clap::Parser;
use clap::error::ErrorKind;
use kmeanspp::cli::{self, Cli, Invocation};
use kmeanspp::error::INVALID_INPUT_MESSAGE;
use std::process;
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => err.exit(),
        Err(err) => {
            init_logging(0);
            error!(%err, "could not parse arguments");
            println!("{}", INVALID_INPUT_MESSAGE);
            process::exit(1);
        }
    };

    init_logging(cli.verbose);

    let result = Invocation::from_cli(&cli).and_then(|invocation| cli::run(&invocation));
    match result {
        Ok(output) => print!("{}", output),
        Err(err) => {
            error!(%err, "kmeanspp failed");
            println!("{}", err.exit_message());
            process::exit(err.exit_code());
        }
    }
}
