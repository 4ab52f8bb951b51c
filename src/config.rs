//! Command line parameters and application configuration.
//!
//! [`Args`] is the raw structopt/serde surface merged from defaults, the
//! optional TOML config file and the command line (see
//! [`crate::merge_config_file`]). [`Args::validate`] turns the merged result
//! into the concrete [`AppConfig`] consumed by the rest of the crate.
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;
use tracing::debug;

/// Default path of the privileged toggle script.
pub const DEFAULT_SCRIPT_PATH: &str = "/usr/local/sbin/wifi-toggle.sh";
/// Default launchd service definition of the helper daemon.
pub const DEFAULT_PLIST_PATH: &str = "/Library/LaunchDaemons/com.user.wifitoggle.plist";
/// Default launchd service identifier of the helper daemon.
pub const DEFAULT_SERVICE_ID: &str = "com.user.wifitoggle";
/// Default log file appended by the toggle script.
pub const DEFAULT_LOG_PATH: &str = "/tmp/wifi-toggle.log";

// Courtesy of structopt_flags crate
#[derive(structopt::StructOpt, Debug, Clone)]
#[allow(missing_docs)]
pub struct QuietVerbose {
    /// Increase the output's verbosity level
    ///
    /// Pass many times to increase verbosity level, up to 3.
    #[structopt(
        name = "quietverbose",
        long = "verbose",
        short = "v",
        parse(from_occurrences),
        conflicts_with = "quietquiet",
        global = true
    )]
    verbosity_level: u8,

    /// Decrease the output's verbosity level.
    ///
    /// Used once, it will set error log level.
    /// Used twice, will silent the log completely
    #[structopt(
        name = "quietquiet",
        long = "quiet",
        short = "q",
        parse(from_occurrences),
        conflicts_with = "quietverbose",
        global = true
    )]
    quiet_level: u8,
}

impl Default for QuietVerbose {
    fn default() -> Self {
        QuietVerbose {
            verbosity_level: 1,
            quiet_level: 0,
        }
    }
}

impl Serialize for QuietVerbose {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.get_level_filter())
    }
}

fn de_from_str<'de, D>(deserializer: D) -> Result<QuietVerbose, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(match s.to_ascii_lowercase().as_ref() {
        "off" => QuietVerbose {
            verbosity_level: 0,
            quiet_level: 2,
        },
        "error" => QuietVerbose {
            verbosity_level: 0,
            quiet_level: 1,
        },
        "warn" => QuietVerbose {
            verbosity_level: 0,
            quiet_level: 0,
        },
        "info" => QuietVerbose {
            verbosity_level: 1,
            quiet_level: 0,
        },
        "debug" => QuietVerbose {
            verbosity_level: 2,
            quiet_level: 0,
        },
        _ => QuietVerbose {
            verbosity_level: 3,
            quiet_level: 0,
        },
    })
}

impl QuietVerbose {
    /// Tracing level filter corresponding to the `-v`/`-q` occurrences.
    pub fn get_level_filter(&self) -> &str {
        let quiet: i8 = if self.quiet_level > 1 {
            2
        } else {
            self.quiet_level as i8
        };
        let verbose: i8 = if self.verbosity_level > 2 {
            3
        } else {
            self.verbosity_level as i8
        };
        match verbose - quiet {
            -2 => "Off",
            -1 => "Error",
            0 => "Warn",
            1 => "Info",
            2 => "Debug",
            _ => "Trace",
        }
    }
}

#[derive(structopt::StructOpt, Serialize, Deserialize, Debug)]
/// Watch and drive a macOS Wi-Fi/Ethernet failover helper
///
/// Polls networksetup, ifconfig and launchctl to derive the current failover
/// state and logs every transition. Without an action flag it keeps watching
/// until stopped; with `--interval 0` it probes once and exits.
pub struct Args {
    /// Seconds between two polls (0 means poll once and exit)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[structopt(short, long, env)]
    pub interval: Option<u64>,

    /// Path of the privileged toggle script
    #[serde(skip_serializing_if = "Option::is_none")]
    #[structopt(long, env, parse(from_os_str))]
    pub script_path: Option<PathBuf>,

    /// Path of the helper daemon's launchd plist
    #[serde(skip_serializing_if = "Option::is_none")]
    #[structopt(long, env, parse(from_os_str))]
    pub plist_path: Option<PathBuf>,

    /// launchd service identifier of the helper daemon
    #[serde(skip_serializing_if = "Option::is_none")]
    #[structopt(long, env)]
    pub service_id: Option<String>,

    /// Path of the log file appended by the toggle script
    #[serde(skip_serializing_if = "Option::is_none")]
    #[structopt(long, env, parse(from_os_str))]
    pub log_path: Option<PathBuf>,

    /// Number of log lines shown by --show-log
    #[serde(skip_serializing_if = "Option::is_none")]
    #[structopt(long, env)]
    pub log_lines: Option<usize>,

    /// Command run after each status change (split shell-style; the new
    /// status is passed in the NETTOGGLE_STATUS environment variable)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[structopt(long, env)]
    pub on_change_cmd: Option<String>,

    /// Run the toggle script under administrator privileges and exit
    #[structopt(long)]
    #[serde(default)]
    pub toggle: bool,

    /// Restart the helper daemon (bootout, bootstrap, kickstart) and exit
    #[structopt(long)]
    #[serde(default)]
    pub restart_daemon: bool,

    /// Print the tail of the toggle script's log and exit
    #[structopt(long)]
    #[serde(default)]
    pub show_log: bool,

    /// Print each published state as a JSON line
    #[structopt(long)]
    #[serde(default)]
    pub json: bool,

    #[allow(missing_docs)]
    #[structopt(flatten)]
    #[serde(deserialize_with = "de_from_str")]
    pub verbose: QuietVerbose,
}

impl Default for Args {
    fn default() -> Args {
        let res = Args {
            interval: Some(5),
            script_path: Some(DEFAULT_SCRIPT_PATH.into()),
            plist_path: Some(DEFAULT_PLIST_PATH.into()),
            service_id: Some(DEFAULT_SERVICE_ID.into()),
            log_path: Some(DEFAULT_LOG_PATH.into()),
            log_lines: Some(10),
            on_change_cmd: None,
            toggle: false,
            restart_daemon: false,
            show_log: false,
            json: false,
            verbose: QuietVerbose {
                verbosity_level: 1,
                quiet_level: 0,
            },
        };
        debug!("Args::default : {:#?}", res);
        res
    }
}

impl Args {
    /// Turn merged arguments into a concrete [`AppConfig`].
    ///
    /// Every field has a default, so this only fails when a merge layer
    /// explicitly removed one.
    pub fn validate(self) -> Result<AppConfig> {
        Ok(AppConfig {
            poll: PollConfig {
                interval: self.interval.context("Internal error, no `interval` configured")?,
            },
            helper: HelperConfig {
                script_path: self
                    .script_path
                    .context("Internal error, no `script_path` configured")?,
                plist_path: self
                    .plist_path
                    .context("Internal error, no `plist_path` configured")?,
                service_id: self
                    .service_id
                    .context("Internal error, no `service_id` configured")?,
                log_path: self
                    .log_path
                    .context("Internal error, no `log_path` configured")?,
                log_lines: self.log_lines.unwrap_or(10),
            },
            on_change_cmd: self.on_change_cmd,
        })
    }
}

/// Polling parameters.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Seconds between two polls; 0 means a single probe.
    pub interval: u64,
}

/// Fixed collaborators of the privileged helper.
#[derive(Debug, Clone)]
pub struct HelperConfig {
    /// Privileged toggle script invoked through osascript.
    pub script_path: PathBuf,
    /// launchd service definition of the helper daemon.
    pub plist_path: PathBuf,
    /// launchd service identifier of the helper daemon.
    pub service_id: String,
    /// Log file appended by the toggle script.
    pub log_path: PathBuf,
    /// Number of lines shown when tailing the log.
    pub log_lines: usize,
}

/// Full validated configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Polling parameters.
    pub poll: PollConfig,
    /// Helper daemon collaborators.
    pub helper: HelperConfig,
    /// Optional hook command run after each status change.
    pub on_change_cmd: Option<String>,
}

#[cfg(test)]
mod validate_should {
    use super::*;
    use anyhow::anyhow;
    use test_log::test; // Automatically trace tests

    #[test]
    fn succeed_with_default_args() -> Result<()> {
        let config = Args::default().validate()?;
        assert_eq!(config.poll.interval, 5);
        assert_eq!(config.helper.service_id, DEFAULT_SERVICE_ID);
        assert_eq!(config.helper.script_path, PathBuf::from(DEFAULT_SCRIPT_PATH));
        assert_eq!(config.helper.log_lines, 10);
        assert!(config.on_change_cmd.is_none());
        Ok(())
    }

    #[test]
    fn accept_a_zero_interval_for_one_shot_mode() -> Result<()> {
        let args = Args {
            interval: Some(0),
            ..Default::default()
        };
        assert_eq!(args.validate()?.poll.interval, 0);
        Ok(())
    }

    #[test]
    fn error_when_interval_is_none() -> Result<()> {
        let args = Args {
            interval: None,
            ..Default::default()
        };
        match args.validate() {
            Ok(_) => Err(anyhow!("Expected an error")),
            Err(e) => {
                assert!(e.to_string().contains("interval"), "Unexpected error: {}", e);
                Ok(())
            }
        }
    }
}
