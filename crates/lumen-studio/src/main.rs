mod audio;
mod plasma;

use std::sync::Arc;

use anyhow::Result;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::window::{AudioInput, Host, HostConfig};
use lumen_engine::PlatformHints;
use winit::dpi::LogicalSize;

use audio::{PcmLevel, ToneFeed};
use plasma::PlasmaEngine;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    // lumen-studio [preset] [device-model] [--low-ram]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let low_ram = args.iter().any(|a| a == "--low-ram");
    let mut positional = args.iter().filter(|a| !a.starts_with("--"));
    let preset_path = positional.next().cloned().unwrap_or_default();
    let device_model = positional.next().cloned().unwrap_or_else(|| "desktop".to_string());

    log::info!("keys: P performance mode, E rogue engine, T trim cache, Esc quit");

    let level = Arc::new(PcmLevel::default());
    let (_feed, pcm) = ToneFeed::spawn();

    let config = HostConfig {
        title: "lumen studio".to_string(),
        initial_size: LogicalSize::new(1280.0, 720.0),
        preset_path,
        hints: PlatformHints::new(device_model, low_ram),
        audio: Some(AudioInput {
            sink: level.clone(),
            pcm,
        }),
        ..HostConfig::default()
    };

    Host::run(config, PlasmaEngine::new(level))
}
