//! Host-side capability boundary.
//!
//! # Responsibility
//! - Define the narrow trait external tools are granted capabilities over.
//! - Provide the extern "C" shims that recover the host from the capability
//!   context pointer.
//! - Ship a minimal owned session implementation for the CLI and tests.
//!
//! # Invariants
//! - The RAM buffer address of a [`HostSession`] is stable for the session's
//!   whole lifetime; modules may hold the region pointer until `OnUnload`.
//! - Shims never unwind into module code; every failure returns `false` or
//!   a zero length.

use crate::protocol::{
    CpuSnapshot, HostCallbacks, MemoryRegion, CALLBACKS_ABI_VERSION,
};
use std::cell::UnsafeCell;
use std::ffi::c_void;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Narrow slice of host state exposed to external tools.
///
/// Implementations are collaborator subsystems (memory mapper, processor
/// core, configuration store); this crate only specifies the boundary.
pub trait HostServices {
    /// Returns the raw addressable memory region, or an empty region when
    /// no RAM is mapped. The returned pointer aliases live host state.
    fn memory(&self) -> MemoryRegion;

    /// Returns a copy of the current processor state.
    fn cpu_state(&self) -> CpuSnapshot;

    /// Returns the configured external-tools directory path.
    fn tools_dir(&self) -> PathBuf;
}

/// Builds the capability table for one host context.
///
/// `host` must stay at a stable address for as long as any module may call
/// through the returned table; the owning tool keeps it boxed for exactly
/// that reason.
pub(crate) fn capability_table(host: &Arc<dyn HostServices>) -> HostCallbacks {
    HostCallbacks {
        abi_version: CALLBACKS_ABI_VERSION,
        ctx: (host as *const Arc<dyn HostServices>).cast_mut().cast::<c_void>(),
        memory: Some(memory_shim),
        cpu_state: Some(cpu_state_shim),
        config_path: Some(config_path_shim),
    }
}

unsafe extern "C" fn memory_shim(ctx: *mut c_void, out: *mut MemoryRegion) -> bool {
    if ctx.is_null() || out.is_null() {
        return false;
    }
    let host = &*ctx.cast::<Arc<dyn HostServices>>();
    *out = host.memory();
    true
}

unsafe extern "C" fn cpu_state_shim(ctx: *mut c_void, out: *mut CpuSnapshot) -> bool {
    if ctx.is_null() || out.is_null() {
        return false;
    }
    let host = &*ctx.cast::<Arc<dyn HostServices>>();
    *out = host.cpu_state();
    true
}

unsafe extern "C" fn config_path_shim(ctx: *mut c_void, buf: *mut u8, cap: usize) -> usize {
    if ctx.is_null() {
        return 0;
    }
    let host = &*ctx.cast::<Arc<dyn HostServices>>();
    let path = host.tools_dir();
    let bytes = path.to_string_lossy().into_owned().into_bytes();
    if !buf.is_null() && cap > 0 {
        let copied = bytes.len().min(cap);
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf, copied);
    }
    bytes.len()
}

/// Minimal owned host session backing the capability boundary.
///
/// Holds a heap RAM buffer with a stable address, a mutable processor
/// snapshot, and the configured tools directory. Not `Sync`: capability
/// calls happen synchronously on the thread that drives the tools, and the
/// RAM buffer is deliberately writable through module-held pointers.
pub struct HostSession {
    ram: UnsafeCell<Box<[u8]>>,
    cpu: Mutex<CpuSnapshot>,
    tools_dir: PathBuf,
}

impl HostSession {
    /// Creates a session with `ram_len` zeroed RAM bytes.
    pub fn new(ram_len: usize, tools_dir: impl Into<PathBuf>) -> Self {
        Self {
            ram: UnsafeCell::new(vec![0u8; ram_len].into_boxed_slice()),
            cpu: Mutex::new(CpuSnapshot::zeroed()),
            tools_dir: tools_dir.into(),
        }
    }

    /// Returns the mapped RAM length in bytes.
    pub fn ram_len(&self) -> usize {
        // SAFETY: length never changes after construction; no module write
        // can race this read.
        unsafe { (&(*self.ram.get())).len() }
    }

    /// Reads one RAM byte, `None` when out of range.
    pub fn ram_byte(&self, offset: usize) -> Option<u8> {
        if offset >= self.ram_len() {
            return None;
        }
        // SAFETY: in-range read of the session-owned buffer; modules only
        // execute while a send is in flight, and sends are synchronous on
        // this thread.
        Some(unsafe { *(*self.ram.get()).as_ptr().add(offset) })
    }

    /// Writes one RAM byte from the host side, `false` when out of range.
    pub fn poke_ram(&self, offset: usize, value: u8) -> bool {
        if offset >= self.ram_len() {
            return false;
        }
        // SAFETY: in-range write through the cell; same single-thread
        // discipline as `ram_byte`.
        unsafe {
            *(*self.ram.get()).as_mut_ptr().add(offset) = value;
        }
        true
    }

    /// Replaces the processor snapshot modules observe.
    pub fn set_cpu_state(&self, snapshot: CpuSnapshot) {
        *self.cpu.lock().expect("cpu snapshot lock poisoned") = snapshot;
    }
}

impl HostServices for HostSession {
    fn memory(&self) -> MemoryRegion {
        // SAFETY: pointer derived through the cell keeps write provenance
        // over the whole buffer; the box gives it a stable address.
        let ram = unsafe { &mut *self.ram.get() };
        MemoryRegion {
            ptr: ram.as_mut_ptr(),
            len: ram.len(),
        }
    }

    fn cpu_state(&self) -> CpuSnapshot {
        *self.cpu.lock().expect("cpu snapshot lock poisoned")
    }

    fn tools_dir(&self) -> PathBuf {
        self.tools_dir.clone()
    }
}
