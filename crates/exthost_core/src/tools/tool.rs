//! External tool lifecycle state machine.
//!
//! # Responsibility
//! - Own one module handle plus its resolved entry point.
//! - Drive attach, message delivery, reload, and teardown for that module.
//!
//! # Invariants
//! - Exactly one `Initialize` followed by exactly one `Callbacks` is sent
//!   per successful transition into `OpenFunctional`, before any other
//!   traffic.
//! - Exactly one `OnUnload` is delivered before an open handle closes, on
//!   every path (reload, teardown); a tool that never became functional
//!   delivers none.
//! - A message reaches the module only while the handle is open and the
//!   entry point is resolved; otherwise sending is a silent no-op.

use crate::host::{capability_table, HostServices};
use crate::protocol::{HostCallbacks, Message, MessageKind};
use crate::tools::loader::ModuleLibrary;
use log::{info, warn};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

/// Required entry-point export of an external tool module.
pub const ENTRY_POINT: &str = "OnMessage";
/// Entry-point name used by the older protocol revision.
pub const LEGACY_ENTRY_POINT: &str = "on_message";

/// Signature of the module entry point: accepts one message, returns
/// nothing. The call is synchronous; the host blocks until it returns.
pub type OnMessageFn = unsafe extern "C" fn(Message);

/// Lifecycle state of one external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    /// Module open failed (or was never attempted); no handle is held.
    Unopened,
    /// Handle open and entry point resolved; messages flow.
    OpenFunctional,
    /// Handle open but the required entry point is missing; the module
    /// stays mapped and never receives messages.
    OpenNonfunctional,
    /// Handle released after a reload failure or teardown.
    Closed,
}

/// One dynamically loaded external tool.
///
/// Lifecycle operations take `&mut self` and the type is intentionally not
/// `Sync`; a host that shares one tool across threads must wrap it in its
/// own lock around the full load/reload/unload sequence. Sends to
/// *different* tools are independent.
pub struct ExternalTool {
    path: PathBuf,
    library: ModuleLibrary,
    entry: Option<OnMessageFn>,
    state: ToolState,
    // Boxed so the capability context pointer stays stable while the tool
    // value itself moves (e.g. into a registry).
    host: Box<Arc<dyn HostServices>>,
}

impl ExternalTool {
    /// Opens the module at `path` and, when functional, performs the
    /// capability exchange: exactly `[Initialize, Callbacks]`, in order.
    ///
    /// Failure never surfaces as an error value: a bad path leaves the
    /// tool `Unopened`, a missing entry point leaves it
    /// `OpenNonfunctional` with one diagnostic emitted. The host
    /// continues unaffected either way.
    pub fn open(path: impl Into<PathBuf>, host: Arc<dyn HostServices>) -> Self {
        let path = path.into();
        let library = ModuleLibrary::open(&path);
        let mut tool = Self {
            path,
            library,
            entry: None,
            state: ToolState::Unopened,
            host: Box::new(host),
        };
        tool.attach();
        if tool.state == ToolState::OpenFunctional {
            tool.send(MessageKind::Initialize);
            tool.deliver_callbacks();
        }
        tool
    }

    /// Returns the module path this tool was created from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ToolState {
        self.state
    }

    /// Returns whether messages currently reach the module.
    pub fn is_functional(&self) -> bool {
        self.state == ToolState::OpenFunctional
    }

    /// Sends a payload-free message to the module.
    ///
    /// Silent no-op unless the handle is open and the entry point is
    /// resolved. Delivery is immediate and synchronous: the module runs on
    /// the calling thread and this call returns when its handler returns.
    pub fn send(&self, kind: MessageKind) {
        self.send_with(kind, ptr::null_mut());
    }

    /// Sends a message carrying a borrowed payload pointer.
    ///
    /// The payload is only valid for the duration of this call; the module
    /// must not retain it.
    pub fn send_with(&self, kind: MessageKind, payload: *mut c_void) {
        let Some(entry) = self.entry else {
            return;
        };
        if !self.library.is_open() {
            return;
        }
        let message = Message::with_payload(kind, payload);
        // SAFETY: `entry` was resolved from the currently-open handle and
        // is cleared before every close, so the callable is live. The
        // module side of the contract (synchronous return, no payload
        // retention) is the accepted host trust boundary.
        unsafe { entry(message) };
    }

    /// Reloads the module from its original path.
    ///
    /// Sequence: deliver `OnUnload` (skipped while nonfunctional), close,
    /// reopen, re-resolve. When reopen and re-resolution both succeed the
    /// tool is `OpenFunctional` again, but `Initialize`/`Callbacks` are
    /// *not* resent — the source protocol leaves reloaded modules to keep
    /// their previously captured capabilities, and this implementation
    /// preserves that behavior. When re-resolution fails after a
    /// successful reopen the handle is closed again and the tool ends
    /// `Closed`, regardless of how it started; there is no automatic
    /// retry.
    pub fn reload(&mut self) {
        info!(
            "event=tool_reload module=tools status=start path={}",
            self.path.display()
        );
        self.detach();
        self.library = ModuleLibrary::open(&self.path);
        if !self.library.is_open() {
            self.state = ToolState::Closed;
            warn!(
                "event=tool_reload module=tools status=error path={} error=reopen_failed",
                self.path.display()
            );
            return;
        }
        self.entry = Self::resolve_entry(&self.library);
        if self.entry.is_none() {
            self.library.close();
            self.state = ToolState::Closed;
            warn!(
                "event=tool_reload module=tools status=error path={} error=entry_point_missing",
                self.path.display()
            );
            return;
        }
        self.state = ToolState::OpenFunctional;
        info!(
            "event=tool_reload module=tools status=ok path={}",
            self.path.display()
        );
    }

    fn attach(&mut self) {
        if !self.library.is_open() {
            self.state = ToolState::Unopened;
            return;
        }
        self.entry = Self::resolve_entry(&self.library);
        if self.entry.is_some() {
            self.state = ToolState::OpenFunctional;
            info!(
                "event=tool_attach module=tools status=ok path={}",
                self.path.display()
            );
        } else {
            self.state = ToolState::OpenNonfunctional;
            warn!(
                "event=tool_attach module=tools status=nonfunctional path={} error=entry_point_missing",
                self.path.display()
            );
        }
    }

    fn resolve_entry(library: &ModuleLibrary) -> Option<OnMessageFn> {
        // SAFETY: the module contract fixes the signature of both export
        // names to `fn(Message)`. A module exporting something else under
        // these names violates the protocol it was built against.
        unsafe {
            library
                .resolve::<OnMessageFn>(ENTRY_POINT)
                .or_else(|| library.resolve::<OnMessageFn>(LEGACY_ENTRY_POINT))
        }
    }

    fn deliver_callbacks(&self) {
        let mut table: HostCallbacks = capability_table(&self.host);
        self.send_with(
            MessageKind::Callbacks,
            (&mut table as *mut HostCallbacks).cast::<c_void>(),
        );
    }

    fn detach(&mut self) {
        if self.library.is_open() {
            self.send(MessageKind::OnUnload);
            self.entry = None;
            self.library.close();
        }
    }
}

impl Drop for ExternalTool {
    fn drop(&mut self) {
        self.detach();
        self.state = ToolState::Closed;
    }
}
