//! Capability struct and borrowed payload views.
//!
//! # Responsibility
//! - Define the versioned capability table delivered once per successful
//!   load via [`MessageKind::Callbacks`](super::MessageKind::Callbacks).
//! - Define the `#[repr(C)]` views other message payloads borrow.
//!
//! # Invariants
//! - Capability function pointers stay callable from module code until the
//!   module receives `OnUnload`; after that every retained pointer is dead.
//! - `abi_version` changes whenever the layout of this file changes.

use std::ffi::c_void;

/// Number of general-purpose registers exposed in a [`CpuSnapshot`].
pub const CPU_GPR_COUNT: usize = 32;

/// Revision of the [`HostCallbacks`] layout.
///
/// There is no runtime negotiation between host and module; a module built
/// against a different revision must refuse to use the table when this
/// value does not match its own build.
pub const CALLBACKS_ABI_VERSION: u64 = 1;

/// Borrowed view of the host's raw addressable memory region.
///
/// The pointed-to bytes alias live host state: reads observe and writes
/// mutate the running session directly.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct MemoryRegion {
    pub ptr: *mut u8,
    pub len: usize,
}

impl MemoryRegion {
    /// Returns an empty region, used when the host has no RAM mapped.
    pub const fn empty() -> Self {
        Self {
            ptr: std::ptr::null_mut(),
            len: 0,
        }
    }

    /// Returns whether this region maps any bytes.
    pub const fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }
}

/// Copied processor state at the moment of the capability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CpuSnapshot {
    /// Current program counter.
    pub pc: u64,
    /// Next program counter (delay-slot architectures diverge from `pc + 4`).
    pub next_pc: u64,
    /// Link register.
    pub link: u64,
    /// General-purpose registers.
    pub gpr: [u64; CPU_GPR_COUNT],
}

impl CpuSnapshot {
    /// Returns an all-zero snapshot.
    pub const fn zeroed() -> Self {
        Self {
            pc: 0,
            next_pc: 0,
            link: 0,
            gpr: [0; CPU_GPR_COUNT],
        }
    }
}

/// Borrowed payload of [`MessageKind::FrameTexture`](super::MessageKind).
///
/// Pixel format and row layout are owned by the presentation collaborator;
/// this view only carries the bytes through the protocol.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct FrameTexture {
    pub data: *const u8,
    pub len: usize,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
}

/// Obtains the host's raw memory region.
///
/// `ctx` must be the context pointer delivered in the same
/// [`HostCallbacks`] value.
pub type MemoryFn = unsafe extern "C" fn(ctx: *mut c_void, out: *mut MemoryRegion) -> bool;

/// Copies the current processor state into `out`.
pub type CpuStateFn = unsafe extern "C" fn(ctx: *mut c_void, out: *mut CpuSnapshot) -> bool;

/// Copies the configured external-tools directory path (UTF-8, no NUL
/// terminator) into `buf`, writing at most `cap` bytes. Returns the full
/// path length in bytes; a return value greater than `cap` means the copy
/// was truncated and the caller should retry with a larger buffer.
pub type ConfigPathFn = unsafe extern "C" fn(ctx: *mut c_void, buf: *mut u8, cap: usize) -> usize;

/// Capability table handed to a module exactly once per successful load.
///
/// Delivered by borrowed pointer in the `Callbacks` message; receivers copy
/// the struct (it is plain data) but must treat every pointer inside it as
/// valid only until their next `OnUnload`. After a reload the table is not
/// re-delivered; a module that kept its copy keeps working because the
/// host context outlives the reload, but the safe assumption window is
/// still bounded by `OnUnload`.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct HostCallbacks {
    /// Layout revision; compare against [`CALLBACKS_ABI_VERSION`].
    pub abi_version: u64,
    /// Opaque host context passed back to every capability call.
    pub ctx: *mut c_void,
    /// Raw-memory capability; null when the host exposes no RAM.
    pub memory: Option<MemoryFn>,
    /// Processor-state capability; null when the host exposes no core.
    pub cpu_state: Option<CpuStateFn>,
    /// Configuration-lookup capability for the external-tools directory.
    pub config_path: Option<ConfigPathFn>,
}

#[cfg(test)]
mod tests {
    use super::{CpuSnapshot, HostCallbacks, MemoryRegion, CALLBACKS_ABI_VERSION, CPU_GPR_COUNT};
    use std::ptr;

    #[test]
    fn empty_region_is_empty() {
        let region = MemoryRegion::empty();
        assert!(region.is_empty());
        assert!(region.ptr.is_null());
        assert_eq!(region.len, 0);
    }

    #[test]
    fn zeroed_snapshot_clears_every_register() {
        let snapshot = CpuSnapshot::zeroed();
        assert_eq!(snapshot.pc, 0);
        assert_eq!(snapshot.next_pc, 0);
        assert_eq!(snapshot.link, 0);
        assert_eq!(snapshot.gpr, [0; CPU_GPR_COUNT]);
    }

    #[test]
    fn callbacks_table_is_plain_copyable_data() {
        let table = HostCallbacks {
            abi_version: CALLBACKS_ABI_VERSION,
            ctx: ptr::null_mut(),
            memory: None,
            cpu_state: None,
            config_path: None,
        };
        let copy = table;
        assert_eq!(copy.abi_version, table.abi_version);
        assert!(copy.memory.is_none());
        assert!(copy.cpu_state.is_none());
        assert!(copy.config_path.is_none());
    }
}
