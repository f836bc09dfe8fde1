// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visual Three - multi-track media timeline editor
//!
//! Hosts the timeline engine in a docked egui window:
//! - Media library of imported files, dragged onto layers
//! - Timeline with layer headers, ruler and clip blocks
//! - Player with transport controls and a preview canvas
//!
//! Files passed on the command line are imported into the library at startup.

mod app;
mod library;
mod panel_types;
mod panels;

use app::VisualThreeApp;
use library::MediaLibrary;
use std::path::Path;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use visual_three_timeline::{TimelineConfig, CONFIG_FILE_NAME};

const LOG_DIRECTIVES: [&str; 4] = [
    "visual_three_app=debug",
    "visual_three_timeline=debug",
    "wgpu=warn",
    "naga=warn",
];

fn main() {
    let env_filter = LOG_DIRECTIVES
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(tracing_subscriber::EnvFilter::from_default_env(), |filter, directive| {
            filter.add_directive(directive)
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Visual Three v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Application crashed: {e}");
        std::process::exit(1);
    }
}

fn run() -> app::Result<()> {
    let config = TimelineConfig::load_or_default(Path::new(CONFIG_FILE_NAME))?;

    let library = MediaLibrary::from_paths(std::env::args().skip(1));
    tracing::info!(assets = library.len(), "Media library ready");

    VisualThreeApp::run(config, library)
}
