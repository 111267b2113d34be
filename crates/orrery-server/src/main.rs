//! Publish server entry point.
//!
//! Run with: `cargo run -p orrery-server -- --port 5000`

use std::sync::Arc;

use clap::Parser;
use orrery_config::CliArgs;
use orrery_github::Publisher;
use orrery_server::PublishServer;
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();
    let (config, config_dir) = args.load_config();

    let log_dir = config_dir.join("logs");
    orrery_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    info!(
        "Publishing {} from {} as repository '{}'",
        config.github.source_dirs.join(", "),
        config.github.project_root.display(),
        config.github.repository
    );

    let publisher = Publisher::from_config(&config.github);
    let mut server = PublishServer::new(config.server.address.clone(), config.server.port);
    if let Err(e) = server.start(Arc::new(publisher)) {
        error!("{e}");
        std::process::exit(1);
    }

    if let Err(e) = server.wait() {
        error!("{e}");
        std::process::exit(1);
    }
}
