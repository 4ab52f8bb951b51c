#![doc = include_str!("../README.md")]
use ::lib::config::Args;
use ::lib::{
    merge_config_file, setup_tracing, watch_network_loop, CommandRunner, ControlSignal,
    DaemonController, Inspector, StatePoller, StatusCell, SystemCommandRunner,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[paw::main]
fn main(args: Args) -> Result<()> {
    setup_tracing(&args)?;
    // Merge config Default → Config File → command line args
    let args = merge_config_file(args)?;
    debug!("Merged config and parameters : {:#?}", args);

    let (toggle, restart_daemon, show_log, json) =
        (args.toggle, args.restart_daemon, args.show_log, args.json);
    let config = args.validate()?;

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner);
    let inspector = Inspector::new(Arc::clone(&runner));
    let daemon = DaemonController::new(runner, config.helper.clone());

    if restart_daemon {
        info!("Restarting helper daemon {}", config.helper.service_id);
        daemon.restart_daemon();
        return Ok(());
    }
    if toggle {
        let rx = daemon.run_toggle_script();
        match rx.recv() {
            Ok(true) => info!("Toggle script completed"),
            _ => warn!("Toggle script failed or was declined"),
        }
        return Ok(());
    }
    if show_log {
        for line in daemon.tail_log(config.helper.log_lines) {
            println!("{line}");
        }
        return Ok(());
    }

    let poller = StatePoller::new(inspector, daemon);
    let cell = StatusCell::new();
    let signal = ControlSignal::new();
    watch_network_loop(&config, &poller, &cell, &signal, json)
}
