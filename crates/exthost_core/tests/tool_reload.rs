//! Reload sequences: unload, close, reopen, re-resolve.

mod common;

use common::{fixture_copy, ProbeView, BLANK, PROBE};
use exthost_core::{ExternalTool, HostServices, HostSession, MessageKind, ToolState};
use std::path::Path;
use std::sync::Arc;

fn host_for(dir: &Path) -> Arc<dyn HostServices> {
    Arc::new(HostSession::new(4096, dir))
}

#[test]
fn reload_sends_onunload_then_reattaches_without_reinitializing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let module = fixture_copy(dir.path(), PROBE, "echo");
    let mut tool = ExternalTool::open(&module, host_for(dir.path()));

    let view = ProbeView::attach(&module);
    view.clear_trace();

    tool.reload();
    assert_eq!(tool.state(), ToolState::OpenFunctional);

    // Only the unload crosses the boundary: Initialize/Callbacks are not
    // resent after a reload. The module dropped its capability copy at
    // OnUnload, so it now reports no table — the observable consequence
    // of the reattach-silently protocol.
    assert_eq!(view.trace(), vec![MessageKind::OnUnload.code()]);
    assert_eq!(view.abi_version(), 0);

    tool.send(MessageKind::OnFrame);
    assert_eq!(
        view.trace(),
        vec![MessageKind::OnUnload.code(), MessageKind::OnFrame.code()]
    );
}

#[test]
fn reload_of_nonfunctional_tool_runs_but_ends_non_open() {
    let dir = tempfile::tempdir().expect("temp dir");
    let module = fixture_copy(dir.path(), BLANK, "broken");
    let mut tool = ExternalTool::open(&module, host_for(dir.path()));
    assert_eq!(tool.state(), ToolState::OpenNonfunctional);

    // The attempt runs: close, reopen, re-resolve. Re-resolution fails
    // again, and after a reload that means the module is let go.
    tool.reload();
    assert_eq!(tool.state(), ToolState::Closed);
    tool.send(MessageKind::OnFrame);
    assert_eq!(tool.state(), ToolState::Closed);
}

#[cfg(unix)]
#[test]
fn reload_after_module_file_removed_ends_closed() {
    let dir = tempfile::tempdir().expect("temp dir");
    let module = fixture_copy(dir.path(), PROBE, "echo");
    let mut tool = ExternalTool::open(&module, host_for(dir.path()));
    let view = ProbeView::attach(&module);
    view.clear_trace();

    std::fs::remove_file(&module).expect("remove module file");
    tool.reload();

    assert_eq!(tool.state(), ToolState::Closed);
    assert_eq!(view.trace(), vec![MessageKind::OnUnload.code()]);

    // Dead tool: sends are silent no-ops from here on.
    tool.send(MessageKind::OnFrame);
    assert_eq!(view.trace(), vec![MessageKind::OnUnload.code()]);
}

#[cfg(unix)]
#[test]
fn reload_losing_the_entry_point_ends_non_open_despite_initial_success() {
    let dir = tempfile::tempdir().expect("temp dir");
    let module = fixture_copy(dir.path(), PROBE, "echo");
    let mut tool = ExternalTool::open(&module, host_for(dir.path()));
    assert_eq!(tool.state(), ToolState::OpenFunctional);

    let view = ProbeView::attach(&module);
    view.clear_trace();

    // Swap the module for one without the entry point, as a rebuild that
    // dropped the export would. Rename keeps the mapped image intact.
    let replacement = fixture_copy(dir.path(), BLANK, "replacement");
    std::fs::rename(&replacement, &module).expect("replace module file");

    tool.reload();
    assert_eq!(tool.state(), ToolState::Closed);
    assert_eq!(view.trace(), vec![MessageKind::OnUnload.code()]);
}
