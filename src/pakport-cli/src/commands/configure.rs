//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up pakport defaults.

use crate::config::Config;
use anyhow::Result;

/// Handle the configure command
pub fn handle(
    threads: Option<usize>,
    keep_raw: Option<bool>,
    world_type: Option<String>,
    show: bool,
) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if !apply(&mut config, threads, keep_raw, world_type)? {
        show_usage();
        return Ok(());
    }

    config.save()?;
    println!("Configuration updated");
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

/// Apply the given settings; returns whether anything was set
fn apply(
    config: &mut Config,
    threads: Option<usize>,
    keep_raw: Option<bool>,
    world_type: Option<String>,
) -> Result<bool> {
    let mut changed = false;

    if let Some(threads) = threads {
        config.threads = Some(threads);
        changed = true;
    }
    if let Some(keep_raw) = keep_raw {
        config.keep_raw = keep_raw;
        changed = true;
    }
    if let Some(code) = world_type {
        config.world_type = Some(code.to_ascii_uppercase());
        // reject codes the catalog can't use before saving them
        config.catalog()?;
        changed = true;
    }

    Ok(changed)
}

/// Display current configuration
fn show_config(config: &Config) {
    match config.threads {
        Some(n) if n > 0 => println!("Threads:    {}", n),
        _ => println!("Threads:    all cores"),
    }
    println!("Keep raw:   {}", config.keep_raw);
    println!(
        "World type: {}",
        config.world_type.as_deref().unwrap_or("MLVL (default)")
    );
    println!(
        "Layout:     {}/ {}/ {}/ ({}, {}), manifest {}",
        config.layout.disc,
        config.layout.cooked,
        config.layout.raw,
        config.layout.worlds,
        config.layout.resources,
        config.layout.manifest
    );

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: pakport configure [--threads N] [--keep-raw true|false] [--world-type CODE]");
    println!("   or: pakport configure --show");
}
