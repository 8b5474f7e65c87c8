//! CLI smoke host.
//!
//! # Responsibility
//! - Provide a minimal executable that drives the whole tool subsystem:
//!   config, logging, discovery, load, a few frames, teardown.
//! - Keep output deterministic for quick local sanity checks.

use exthost_core::{
    core_version, init_logging, HostConfig, HostServices, HostSession, MessageKind, ToolRegistry,
};
use std::path::Path;
use std::sync::Arc;

const SMOKE_RAM_BYTES: usize = 64 * 1024;
const SMOKE_FRAMES: usize = 3;

fn main() {
    println!("exthost_core version={}", core_version());

    let Some(config_path) = std::env::args().nth(1) else {
        println!("usage: exthost_cli <config.toml>");
        return;
    };

    let config = match HostConfig::load(Path::new(&config_path)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("exthost_cli: {err}");
            std::process::exit(1);
        }
    };

    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("exthost_cli: logging disabled: {err}");
        }
    }

    let host: Arc<dyn HostServices> =
        Arc::new(HostSession::new(SMOKE_RAM_BYTES, config.tools_dir.clone()));
    let mut registry = ToolRegistry::new();
    let functional = registry.load_dir(&config.tools_dir, &host);
    println!(
        "tools dir={} loaded={} functional={}",
        config.tools_dir.display(),
        registry.len(),
        functional
    );

    registry.broadcast(MessageKind::OnLoad);
    for _ in 0..SMOKE_FRAMES {
        registry.broadcast(MessageKind::OnFrame);
    }
    registry.broadcast(MessageKind::Shutdown);

    // Registry teardown delivers one OnUnload to every still-open tool.
    drop(registry);
    println!("smoke complete frames={SMOKE_FRAMES}");
}
