//! Probe external tool: the reference module for host integration tests.
//!
//! # Responsibility
//! - Implement the `OnMessage` entry point of a well-behaved external tool.
//! - Record every received message kind and the delivered capability table
//!   so tests can observe host traffic from the module side.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - The capability table is used strictly within its documented validity
//!   window (captured at `Callbacks`, abandoned at `OnUnload`).

use exthost_core::protocol::{
    CpuSnapshot, FrameTexture, HostCallbacks, MemoryRegion, Message, MessageKind,
};
use std::sync::Mutex;

static TRACE: Mutex<Vec<u64>> = Mutex::new(Vec::new());
static CALLBACKS: Mutex<CapturedTable> = Mutex::new(CapturedTable(None));
static LAST_FRAME: Mutex<Option<(u32, u32)>> = Mutex::new(None);

/// Captured capability table.
///
/// The raw pointers inside make `HostCallbacks` `!Send`; the probe only
/// ever runs on the host thread that delivered the table, so parking it in
/// a process-wide cell is sound.
struct CapturedTable(Option<HostCallbacks>);

// SAFETY: all probe exports execute synchronously on the host thread; the
// cell is never touched from anywhere else.
unsafe impl Send for CapturedTable {}

fn record(kind: u64) {
    if let Ok(mut trace) = TRACE.lock() {
        trace.push(kind);
    }
}

fn captured() -> Option<HostCallbacks> {
    CALLBACKS.lock().ok().and_then(|cell| cell.0)
}

/// Module entry point invoked by the host for every message.
///
/// # FFI contract
/// - Synchronous; returns when handling is done.
/// - Never unwinds into the host.
/// - The message payload is borrowed and not retained past this call;
///   only the capability *table contents* are copied out, per protocol.
#[allow(non_snake_case)]
#[no_mangle]
pub extern "C" fn OnMessage(message: Message) {
    record(message.kind);
    match message.decode_kind() {
        Some(MessageKind::Callbacks) => {
            if message.payload.is_null() {
                return;
            }
            // SAFETY: the host guarantees a Callbacks payload points at a
            // live HostCallbacks for the duration of this call.
            let table = unsafe { *message.payload.cast::<HostCallbacks>() };
            if let Ok(mut cell) = CALLBACKS.lock() {
                cell.0 = Some(table);
            }
        }
        Some(MessageKind::FrameTexture) => {
            if message.payload.is_null() {
                return;
            }
            // SAFETY: a FrameTexture payload points at a live view for the
            // duration of this call. Only the dimensions are kept; the
            // pixel pointer is borrowed and must not outlive the call.
            let frame = unsafe { *message.payload.cast::<FrameTexture>() };
            if let Ok(mut cell) = LAST_FRAME.lock() {
                *cell = Some((frame.width, frame.height));
            }
        }
        Some(MessageKind::OnUnload) => {
            // Capability pointers die with this message; drop the copy.
            if let Ok(mut cell) = CALLBACKS.lock() {
                cell.0 = None;
            }
        }
        _ => {}
    }
}

/// Returns how many messages the probe has received since the last clear.
///
/// # FFI contract
/// - Sync, non-blocking, never panics.
#[no_mangle]
pub extern "C" fn probe_trace_len() -> usize {
    TRACE.lock().map(|trace| trace.len()).unwrap_or(0)
}

/// Returns the wire code of the `index`-th recorded message.
///
/// # FFI contract
/// - Returns `u64::MAX` when `index` is out of range.
#[no_mangle]
pub extern "C" fn probe_trace_at(index: usize) -> u64 {
    TRACE
        .lock()
        .ok()
        .and_then(|trace| trace.get(index).copied())
        .unwrap_or(u64::MAX)
}

/// Clears the recorded trace (the captured capability table stays).
#[no_mangle]
pub extern "C" fn probe_trace_clear() {
    if let Ok(mut trace) = TRACE.lock() {
        trace.clear();
    }
}

/// Returns the `abi_version` of the captured capability table, 0 if none
/// has been delivered (or it was dropped at `OnUnload`).
#[no_mangle]
pub extern "C" fn probe_abi_version() -> u64 {
    captured().map(|table| table.abi_version).unwrap_or(0)
}

/// Writes one byte into host RAM through the memory capability.
///
/// # FFI contract
/// - Returns `false` when no capability is held or `offset` is out of the
///   host region's range.
#[no_mangle]
pub extern "C" fn probe_poke_ram(offset: usize, value: u8) -> bool {
    let Some(table) = captured() else {
        return false;
    };
    let Some(memory) = table.memory else {
        return false;
    };
    let mut region = MemoryRegion::empty();
    // SAFETY: capability call within the validity window, with the ctx the
    // host delivered alongside it.
    if !unsafe { memory(table.ctx, &mut region) } || region.is_empty() || offset >= region.len {
        return false;
    }
    // SAFETY: bounds-checked write into the live host region.
    unsafe { *region.ptr.add(offset) = value };
    true
}

/// Returns the host program counter through the processor-state
/// capability, or `u64::MAX` when the capability is unavailable.
#[no_mangle]
pub extern "C" fn probe_pc() -> u64 {
    let Some(table) = captured() else {
        return u64::MAX;
    };
    let Some(cpu_state) = table.cpu_state else {
        return u64::MAX;
    };
    let mut snapshot = CpuSnapshot::zeroed();
    // SAFETY: capability call within the validity window.
    if !unsafe { cpu_state(table.ctx, &mut snapshot) } {
        return u64::MAX;
    }
    snapshot.pc
}

/// Copies the host's external-tools directory path into `buf` through the
/// configuration capability; returns the full path length in bytes (0 when
/// the capability is unavailable).
///
/// # FFI contract
/// - Writes at most `cap` bytes; a return value above `cap` means the copy
///   was truncated.
#[no_mangle]
pub extern "C" fn probe_tools_dir(buf: *mut u8, cap: usize) -> usize {
    let Some(table) = captured() else {
        return 0;
    };
    let Some(config_path) = table.config_path else {
        return 0;
    };
    // SAFETY: capability call within the validity window; buf/cap come
    // straight from the caller.
    unsafe { config_path(table.ctx, buf, cap) }
}

/// Returns the width of the last frame texture received, 0 when none.
#[no_mangle]
pub extern "C" fn probe_last_frame_width() -> u32 {
    LAST_FRAME
        .lock()
        .ok()
        .and_then(|cell| *cell)
        .map(|(width, _)| width)
        .unwrap_or(0)
}

/// Returns the height of the last frame texture received, 0 when none.
#[no_mangle]
pub extern "C" fn probe_last_frame_height() -> u32 {
    LAST_FRAME
        .lock()
        .ok()
        .and_then(|cell| *cell)
        .map(|(_, height)| height)
        .unwrap_or(0)
}
