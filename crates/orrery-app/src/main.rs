//! Orrery viewer entry point.
//!
//! Run with: `cargo run -p orrery-app -- --width 1920 --height 1080`

use clap::Parser;
use orrery_app::window::{ConfigWatch, run_with_config};
use orrery_config::CliArgs;
use orrery_input::InputMap;
use tracing::{error, info, warn};

const INPUT_FILE_NAME: &str = "input.ron";

fn main() {
    let args = CliArgs::parse();
    let (config, config_dir) = args.load_config();

    let log_dir = config_dir.join("logs");
    orrery_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let input_path = config_dir.join(INPUT_FILE_NAME);
    let input_map = if input_path.exists() {
        InputMap::load(&input_path)
    } else {
        let map = InputMap::default_viewer();
        match map.save(&input_path) {
            Ok(()) => info!("Wrote default keybindings to {}", input_path.display()),
            Err(e) => warn!("Could not write {}: {e}", input_path.display()),
        }
        map
    };

    info!(
        "Publishing via {} (F5 publish, F6 pull request, F7 upload)",
        config.server_url()
    );

    let watch = ConfigWatch {
        dir: config_dir,
        overrides: args,
    };
    if let Err(e) = run_with_config(config, input_map, Some(watch)) {
        error!("Event loop failed: {e}");
        std::process::exit(1);
    }
}
