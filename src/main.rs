// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, build the
//   application and hand it to the selected command.
// - Every error ends up here, is printed once, and picks the exit code.

use clap::Parser;
use redfish_cli::cli::{Cli, Command};
use redfish_cli::config::Config;
use redfish_cli::{rawput, types, App, CliResult, RestApp};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug, cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(?e, "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = Config::load(cli.config.as_deref())?;
    let mut api = App::new(config)?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Command::Rawput(options) => rawput::run(&mut api, &options, cli.verbose, &mut out),
        Command::Types(options) => types::run(&mut api, &options, &mut out),
        Command::Logout => {
            if !api.logout()? {
                eprintln!("No session to log out of.");
            }
            Ok(())
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins over the flags.
fn init_logging(debug: u8, verbose: bool) {
    let level = match (debug, verbose) {
        (0, false) => LevelFilter::WARN,
        (0, true) | (1, _) => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
