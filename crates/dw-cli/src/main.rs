mod logging;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use dw_core::config::{self, Config, WatchConfig};
use dw_core::level::DayExtractor;
use dw_core::motd::MotdTable;
use dw_watch::announce::{Announcer, RED, RESET};
use dw_watch::shutdown::ShutdownSignal;
use dw_watch::watcher::WatchSession;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// daywatch -- announce in-game day changes of a Minecraft world.
#[derive(Parser)]
#[command(name = "daywatch", version, about)]
struct Cli {
    /// Path to a `level.dat` or an Indev `.mclevel`; a file chooser opens
    /// when this is omitted or invalid.
    level_file: Option<PathBuf>,

    /// Check interval in seconds (minimum 1, default 5).
    #[arg(short, long)]
    interval: Option<String>,

    /// Mute the terminal bell for new days.
    #[arg(short, long)]
    mute: bool,

    /// CSV file of per-day messages (`<day>,<message>`).
    #[arg(long)]
    motds: Option<PathBuf>,

    /// Message display template; `%MOTD%` is the message, `%ESC%` an
    /// ANSI escape.
    #[arg(long)]
    motd_format: Option<String>,

    /// Only display messages on their exact scheduled day.
    #[arg(long)]
    fresh_motds: bool,

    /// Alternate config file (default `~/.daywatch/config.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init("info");

    let config = load_config(cli.config.clone());
    let interval_secs = effective_interval(cli.interval.as_deref(), &config.watch);
    let mute = cli.mute || config.watch.mute;
    let fresh_motds = cli.fresh_motds || config.motd.fresh_only;
    let motd_format = cli.motd_format.or(config.motd.format);
    let motds_path = cli
        .motds
        .or_else(|| config.motd.path.as_deref().map(PathBuf::from));

    let Some(level_file) = resolve_level_file(cli.level_file) else {
        // Dismissed chooser: a deliberate no-op, not an error.
        info!("no file chosen");
        return Ok(());
    };
    if !level_file.exists() || level_file.is_dir() {
        anyhow::bail!("failed to open file \"{}\"", level_file.display());
    }

    let motds = motds_path.and_then(|path| match MotdTable::load(&path) {
        Ok(table) => {
            info!(path = %path.display(), entries = table.len(), "loaded message table");
            Some(table)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "could not load message table");
            None
        }
    });

    let announcer = Announcer::new(mute, motds, motd_format, fresh_motds);
    let session = WatchSession::new(
        DayExtractor::new(&level_file),
        announcer,
        Duration::from_secs(interval_secs),
    );

    let shutdown = ShutdownSignal::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for ctrl-c");
                return;
            }
            info!("ctrl-c received, stopping");
            shutdown.trigger();
        });
    }

    if let Err(err) = session.run(shutdown).await {
        eprintln!(
            "{RED}failed to read \"{}\": {err}{RESET}",
            level_file.display()
        );
        std::process::exit(1);
    }
    Ok(())
}

/// Load the config file, falling back to defaults when it is missing or
/// broken. An explicitly passed `--config` path still only warns, so a
/// typo'd file never blocks watching.
fn load_config(explicit: Option<PathBuf>) -> Config {
    let result = match &explicit {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    result.unwrap_or_else(|err| {
        warn!(error = %err, "failed to load config, using defaults");
        Config::default()
    })
}

/// CLI interval wins over the config file; both go through the same
/// clamping rules.
fn effective_interval(cli_interval: Option<&str>, watch: &WatchConfig) -> u64 {
    match cli_interval {
        Some(raw) => config::coerce_interval(raw),
        None => watch.effective_interval_secs(),
    }
}

/// Use the explicit path when it points at a real file, otherwise fall
/// back to an interactive chooser restricted to the two known extensions.
/// `None` means the chooser was dismissed.
fn resolve_level_file(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() && !path.is_dir() {
            return Some(path);
        }
        warn!(path = %path.display(), "path is missing or a directory, opening chooser");
    }

    rfd::FileDialog::new()
        .set_title("Select Minecraft level file")
        .add_filter("Minecraft level", &["dat", "mclevel"])
        .pick_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_interval_overrides_config() {
        let watch = WatchConfig {
            interval_secs: 30,
            mute: false,
        };
        assert_eq!(effective_interval(Some("2"), &watch), 2);
        assert_eq!(effective_interval(Some("0"), &watch), 1);
        assert_eq!(effective_interval(Some("junk"), &watch), 5);
        assert_eq!(effective_interval(None, &watch), 30);
    }
}
