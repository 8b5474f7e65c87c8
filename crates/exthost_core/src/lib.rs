//! Runtime external-tool subsystem for the host application.
//! This crate is the single source of truth for the host/module contract.

pub mod config;
pub mod host;
pub mod logging;
pub mod protocol;
pub mod tools;

pub use config::{ConfigError, HostConfig};
pub use host::{HostServices, HostSession};
pub use logging::{default_log_level, init_logging, logging_status};
pub use protocol::{
    CpuSnapshot, FrameTexture, HostCallbacks, MemoryRegion, Message, MessageGroup, MessageKind,
    CALLBACKS_ABI_VERSION, CPU_GPR_COUNT, MESSAGE_WIRE_SIZE,
};
pub use tools::discovery::discover_modules;
pub use tools::loader::ModuleLibrary;
pub use tools::registry::ToolRegistry;
pub use tools::tool::{ExternalTool, OnMessageFn, ToolState, ENTRY_POINT, LEGACY_ENTRY_POINT};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
