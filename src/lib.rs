#![warn(missing_docs)]
//! Nettoggle main components and helper functions used by `main`
use anyhow::{Context, Result};
use directories_next::ProjectDirs;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use shell_words::split;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

pub mod command;
pub mod config;
pub mod daemon;
pub mod inspect;
pub mod poller;
pub mod signal;
pub mod state;
pub use command::{CommandResult, CommandRunner, SystemCommandRunner};
pub use config::{AppConfig, Args};
pub use daemon::DaemonController;
pub use inspect::Inspector;
pub use poller::StatePoller;
pub use signal::{ControlSignal, Wakeup};
pub use state::{NetworkState, NetworkStatus, StatusCell};

/// Setup logging to stdout
/// (Tracing is a bit more involving to set up but will provide much more feature if needed)
pub fn setup_tracing(args: &Args) -> Result<()> {
    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer =
        EnvFilter::try_new(args.verbose.get_level_filter()).context("Initializing log filter")?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
    Ok(())
}

/// Merge configuration layers: defaults, then the optional TOML config file,
/// then the command line.
pub fn merge_config_file(cli: Args) -> Result<Args> {
    let mut figment = Figment::from(Serialized::defaults(Args::default()));
    if let Some(dirs) = ProjectDirs::from("net", "clabaut", "nettoggle") {
        let path = dirs.config_dir().join("config.toml");
        if path.exists() {
            debug!("Merging config file {:?}", path);
            figment = figment.merge(Toml::file(path));
        }
    }
    figment
        .merge(Serialized::defaults(cli))
        .extract()
        .context("Merging configuration")
}

/// Run the user's change hook with the new status in `NETTOGGLE_STATUS`.
///
/// The command string is split shell-style. Any failure (unparsable command,
/// spawn error, non-zero exit) is logged and swallowed: a broken hook must
/// not take the watcher down.
pub fn run_change_hook(cmd: &str, state: &NetworkState) {
    let params = match split(cmd) {
        Ok(params) => params,
        Err(e) => {
            warn!("Unable to parse change hook '{}': {}", cmd, e);
            return;
        }
    };
    if params.is_empty() {
        return;
    }
    debug!("Running change hook {}", cmd);
    match Command::new(&params[0])
        .args(&params[1..])
        .env("NETTOGGLE_STATUS", state.status.to_string())
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("Change hook '{}' exited with {}", cmd, status),
        Err(e) => warn!("Unable to run change hook '{}': {}", cmd, e),
    }
}

/// Main watch loop: probe, publish, wait, repeat.
///
/// The first detection happens immediately. A refresh request on `signal`
/// wakes the wait early for another probe; a stop request ends the loop.
/// With `interval = 0` the loop probes exactly once (one-shot mode). Each
/// published state lands in `cell` for subscribers; when `json` is set it is
/// also printed as one JSON line per publish.
pub fn watch_network_loop(
    config: &AppConfig,
    poller: &StatePoller,
    cell: &StatusCell,
    signal: &ControlSignal,
    json: bool,
) -> Result<()> {
    let interval = Duration::from_secs(config.poll.interval);
    loop {
        let state = poller.detect_state();
        let changed = cell.publish(state);
        if changed {
            info!(
                "Status is now: {} (daemon running: {})",
                state.status, state.daemon_running
            );
            if let Some(cmd) = &config.on_change_cmd {
                run_change_hook(cmd, &state);
            }
        }
        if json {
            println!("{}", serde_json::to_string(&state)?);
        }
        if config.poll.interval == 0 {
            break;
        }
        if signal.wait(interval) == Wakeup::Stopped {
            break;
        }
    }
    Ok(())
}
