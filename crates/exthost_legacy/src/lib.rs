//! Legacy-revision fixture module.
//!
//! Exports only the older `on_message` entry-point name, so integration
//! tests can pin the host's fallback resolution order.

use exthost_core::protocol::Message;
use std::sync::atomic::{AtomicUsize, Ordering};

static RECEIVED: AtomicUsize = AtomicUsize::new(0);

/// Older-revision module entry point.
///
/// # FFI contract
/// - Synchronous; never unwinds into the host.
#[no_mangle]
pub extern "C" fn on_message(_message: Message) {
    RECEIVED.fetch_add(1, Ordering::SeqCst);
}

/// Returns how many messages this module has received.
///
/// # FFI contract
/// - Sync, non-blocking, never panics.
#[no_mangle]
pub extern "C" fn legacy_message_count() -> usize {
    RECEIVED.load(Ordering::SeqCst)
}
