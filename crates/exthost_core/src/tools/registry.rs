//! Process-wide registry of loaded external tools.
//!
//! # Responsibility
//! - Own every [`ExternalTool`] for the host process, in load order.
//! - Run aggregate operations (broadcast, reload-all) without letting one
//!   tool's failure disturb the others.
//!
//! # Invariants
//! - Insertion order is preserved; aggregate operations iterate in it.
//! - Teardown drops every tool, so each still-open module sees exactly one
//!   `OnUnload`.

use crate::host::HostServices;
use crate::protocol::MessageKind;
use crate::tools::discovery::discover_modules;
use crate::tools::tool::{ExternalTool, ToolState};
use log::info;
use std::ffi::c_void;
use std::path::Path;
use std::sync::Arc;

/// Ordered, owning collection of external tools.
///
/// The registry is an explicit object with a normal construction/teardown
/// lifecycle; whatever subsystem drives reload or frame events receives it
/// by reference. Tools never outlive the registry, and there is no
/// single-tool removal — the registry tears down as a whole.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ExternalTool>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one tool, preserving load order.
    pub fn add(&mut self, tool: ExternalTool) {
        self.tools.push(tool);
    }

    /// Opens the module at `path` and appends the resulting tool.
    ///
    /// Returns the lifecycle state the new tool ended up in; a failed open
    /// still registers the tool (its state records the failure).
    pub fn load(&mut self, path: impl AsRef<Path>, host: Arc<dyn HostServices>) -> ToolState {
        let tool = ExternalTool::open(path.as_ref(), host);
        let state = tool.state();
        self.add(tool);
        state
    }

    /// Discovers module files in `dir` and loads each one.
    ///
    /// Returns how many of the discovered modules ended up functional.
    pub fn load_dir(&mut self, dir: &Path, host: &Arc<dyn HostServices>) -> usize {
        let mut functional = 0;
        for path in discover_modules(dir) {
            if self.load(&path, Arc::clone(host)) == ToolState::OpenFunctional {
                functional += 1;
            }
        }
        info!(
            "event=registry_load_dir module=tools status=ok dir={} total={} functional={}",
            dir.display(),
            self.tools.len(),
            functional
        );
        functional
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry holds no tools.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Returns one tool by insertion index.
    pub fn get(&self, index: usize) -> Option<&ExternalTool> {
        self.tools.get(index)
    }

    /// Iterates tools in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ExternalTool> {
        self.tools.iter()
    }

    /// Sends one payload-free message to every tool in insertion order.
    ///
    /// Nonfunctional tools skip delivery silently, as single sends do.
    pub fn broadcast(&self, kind: MessageKind) {
        for tool in &self.tools {
            tool.send(kind);
        }
    }

    /// Sends one payload-carrying message to every tool in insertion order.
    ///
    /// The payload is borrowed for each synchronous delivery in turn.
    pub fn broadcast_with(&self, kind: MessageKind, payload: *mut c_void) {
        for tool in &self.tools {
            tool.send_with(kind, payload);
        }
    }

    /// Reloads every tool independently, in insertion order.
    ///
    /// One tool's reload failure never blocks or corrupts the reload of
    /// the next; each tool simply records its own end state.
    pub fn reload_all(&mut self) {
        info!(
            "event=registry_reload_all module=tools status=start total={}",
            self.tools.len()
        );
        for tool in &mut self.tools {
            tool.reload();
        }
        let functional = self
            .tools
            .iter()
            .filter(|tool| tool.is_functional())
            .count();
        info!(
            "event=registry_reload_all module=tools status=ok total={} functional={}",
            self.tools.len(),
            functional
        );
    }
}
