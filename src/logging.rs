use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::File;
use std::path::Path;

/// Initializes the global logger, writing to `path`.
///
/// The terminal belongs to the game while it runs, so without a log file
/// nothing is logged. When `verbose` is `true`, debug messages are written
/// too; `RUST_LOG` overrides either level.
pub fn init(path: Option<&Path>, verbose: bool) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;

    let env = Env::default().default_filter_or(level.to_string());
    let mut builder = Builder::from_env(env);
    builder.target(Target::Pipe(Box::new(file)));

    // `try_init` only fails if a logger was already set.
    let _ = builder.try_init();
    Ok(())
}
