//! Host/module message protocol contracts.
//!
//! This module defines the shared vocabulary both sides of the external-tool
//! boundary are compiled against: the closed message-kind enumeration, the
//! fixed 16-byte message layout, and the versioned capability struct. It is
//! a pure data contract; delivery behavior lives in `crate::tools`.

pub mod callbacks;
pub mod message;

pub use callbacks::{
    ConfigPathFn, CpuSnapshot, CpuStateFn, FrameTexture, HostCallbacks, MemoryFn, MemoryRegion,
    CALLBACKS_ABI_VERSION, CPU_GPR_COUNT,
};
pub use message::{Message, MessageGroup, MessageKind, MESSAGE_WIRE_SIZE};
