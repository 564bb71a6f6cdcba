mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;

use cli::{Cli, Commands};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Configure {
            threads,
            keep_raw,
            world_type,
            show,
        } => {
            commands::configure::handle(threads, keep_raw, world_type, show)?;
        }

        Commands::Export {
            source,
            output,
            threads,
            keep_raw,
        } => {
            let config = Config::load()?;
            commands::export::handle(&source, &output, threads, keep_raw, &config)?;
        }

        Commands::List { pak, kind } => {
            let config = Config::load()?;
            commands::list::handle(&pak, kind.as_deref(), &config)?;
        }

        Commands::Cat {
            export,
            id,
            output,
            raw,
        } => {
            let config = Config::load()?;
            commands::cat::handle(&export, &id, output.as_deref(), raw, &config)?;
        }

        Commands::Resolve { export, id } => {
            let config = Config::load()?;
            commands::resolve::handle(&export, &id, &config)?;
        }

        Commands::Rename { export, id, name } => {
            let config = Config::load()?;
            commands::rename::handle(&export, &id, &name, &config)?;
        }

        Commands::Pack {
            input,
            output,
            compress,
        } => {
            commands::pack::handle(&input, &output, compress)?;
        }
    }

    Ok(())
}
