//! Persist the best score to disk (XDG config or ~/.config/chiptui).

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

const FILENAME: &str = "best";

/// Returns the path to the best score file (config dir / chiptui / best).
fn config_path() -> PathBuf {
    let home_config = || {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => home_config(),
    };
    base.join("chiptui").join(FILENAME)
}

/// Best score on disk; 0 on missing or unreadable file.
pub fn load_best() -> u32 {
    load_best_from(&config_path())
}

/// Save best score to disk. Creates the config directory if needed.
pub fn save_best(best: u32) -> Result<()> {
    save_best_to(&config_path(), best)
}

fn load_best_from(path: &Path) -> u32 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.lines().next().and_then(|l| l.trim().parse().ok()))
        .unwrap_or(0)
}

fn save_best_to(path: &Path, best: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("{best}\n"))?;
    Ok(())
}
