// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cadence preview - headless automation playback
//!
//! Builds (or loads) a timeline and plays it frame by frame through the
//! automation engine, logging what every tick touched.
//!
//! Usage: `cadence_preview [PROJECT_FILE]`
//!
//! Settings are read from the RON file named by `CADENCE_SETTINGS`, if set.

mod preview;

use cadence_timeline::EngineSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn init_tracing(extra_directive: Option<&str>) {
    let mut env_filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["cadence_app=debug", "cadence_automation=info"]
        .into_iter()
        .chain(extra_directive)
    {
        match directive.parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(e) => eprintln!("Ignoring log directive '{directive}': {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() {
    let settings = EngineSettings::load_from_env();
    init_tracing(settings.as_ref().ok().map(|s| s.log_directive.as_str()));

    tracing::info!("Starting Cadence preview v{}", env!("CARGO_PKG_VERSION"));

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load settings: {e}");
            std::process::exit(1);
        }
    };

    let project = std::env::args_os().nth(1).map(std::path::PathBuf::from);
    if let Err(e) = preview::run(&settings, project.as_deref()) {
        tracing::error!("Preview failed: {e}");
        std::process::exit(1);
    }
}
