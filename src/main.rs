use std::process::ExitCode;

use clap::{Parser, Subcommand};
use http_timing::config::app_config::load_config;
use http_timing::error::Error;
use http_timing::http_probe::report;
use http_timing::munin::{do_config, do_ping};

#[derive(Parser)]
#[command(about, long_about = None)]
struct Interface {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the munin graph configuration
    Config,
    /// Tell munin whether the plugin can configure itself
    Autoconf,
    /// Print the plugin version
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    // stdout belongs to munin, diagnostics go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let interface = Interface::parse();
    match run(interface.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", report(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Option<Commands>) -> Result<(), Error> {
    match command {
        None => {
            let config = load()?;
            print!("{}", do_ping(&config).await?);
        }
        Some(Commands::Config) => {
            let config = load()?;
            print!("{}", do_config(&config)?);
            if config.config_and_ping {
                print!("{}", do_ping(&config).await?);
            }
        }
        Some(Commands::Autoconf) => {
            println!(
                "no (This module is meant to run outside of the node hosting the URIs and is to be configured manually.)"
            );
        }
        Some(Commands::Version) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
    }
    Ok(())
}

fn load() -> Result<http_timing::config::model::Config, Error> {
    let mut config = load_config()?;
    let arg0 = std::env::args_os()
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_default();
    config.set_suffix_from_arg0(&arg0);
    Ok(config)
}
