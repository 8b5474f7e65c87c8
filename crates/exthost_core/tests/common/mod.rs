//! Shared fixture plumbing for the integration suites.
//!
//! Fixture modules are real cdylib workspace members; they are built on
//! demand through the `cargo` binary that compiled this test, then copied
//! into per-test temp directories so each test works against its own
//! module image (the dynamic loader dedupes images by file identity, not
//! path string).
#![allow(dead_code)]

use exthost_core::ModuleLibrary;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Once;

pub const PROBE: &str = "exthost_probe";
pub const BLANK: &str = "exthost_blank";
pub const LEGACY: &str = "exthost_legacy";

static BUILD_FIXTURES: Once = Once::new();

fn ensure_fixtures_built() {
    BUILD_FIXTURES.call_once(|| {
        let status = Command::new(env!("CARGO"))
            .args(["build", "-p", PROBE, "-p", BLANK, "-p", LEGACY])
            .status()
            .expect("cargo must be invocable from the test environment");
        assert!(status.success(), "fixture module build failed");
    });
}

fn target_debug_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CARGO_TARGET_DIR") {
        return PathBuf::from(dir).join("debug");
    }
    // This crate lives at <workspace>/crates/exthost_core.
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("workspace root above crates/exthost_core")
        .join("target")
        .join("debug")
}

fn module_file_name(stem: &str) -> String {
    format!(
        "{}{stem}{}",
        std::env::consts::DLL_PREFIX,
        std::env::consts::DLL_SUFFIX
    )
}

/// Returns the built artifact path of one fixture crate.
pub fn fixture_artifact(name: &str) -> PathBuf {
    ensure_fixtures_built();
    let path = target_debug_dir().join(module_file_name(name));
    assert!(
        path.exists(),
        "fixture artifact missing after build: {}",
        path.display()
    );
    path
}

/// Copies one fixture into `dir` under `stem`, yielding an isolated module
/// image with its own statics.
pub fn fixture_copy(dir: &Path, name: &str, stem: &str) -> PathBuf {
    let destination = dir.join(module_file_name(stem));
    std::fs::copy(fixture_artifact(name), &destination).expect("fixture copy succeeds");
    destination
}

type TraceLenFn = unsafe extern "C" fn() -> usize;
type TraceAtFn = unsafe extern "C" fn(usize) -> u64;
type TraceClearFn = unsafe extern "C" fn();
type AbiVersionFn = unsafe extern "C" fn() -> u64;
type PokeRamFn = unsafe extern "C" fn(usize, u8) -> bool;
type PcFn = unsafe extern "C" fn() -> u64;
type ToolsDirFn = unsafe extern "C" fn(*mut u8, usize) -> usize;
type FrameDimFn = unsafe extern "C" fn() -> u32;
type LegacyCountFn = unsafe extern "C" fn() -> usize;

/// Module-side observer over one probe image.
///
/// Holds its own open handle to the same module file a tool loaded, which
/// pins the image (and its recorded trace) across the tool's close paths.
pub struct ProbeView {
    lib: ModuleLibrary,
}

impl ProbeView {
    pub fn attach(path: &Path) -> Self {
        let lib = ModuleLibrary::open(path);
        assert!(lib.is_open(), "probe view must open {}", path.display());
        Self { lib }
    }

    fn call<T: Copy>(&self, name: &str) -> T {
        // SAFETY: the probe crate in this workspace exports these symbols
        // with exactly the types declared above.
        unsafe { self.lib.resolve::<T>(name) }
            .unwrap_or_else(|| panic!("probe export missing: {name}"))
    }

    pub fn trace(&self) -> Vec<u64> {
        let len: TraceLenFn = self.call("probe_trace_len");
        let at: TraceAtFn = self.call("probe_trace_at");
        // SAFETY: probe exports are plain synchronous getters.
        let count = unsafe { len() };
        (0..count).map(|index| unsafe { at(index) }).collect()
    }

    pub fn clear_trace(&self) {
        let clear: TraceClearFn = self.call("probe_trace_clear");
        // SAFETY: as above.
        unsafe { clear() };
    }

    pub fn abi_version(&self) -> u64 {
        let abi: AbiVersionFn = self.call("probe_abi_version");
        // SAFETY: as above.
        unsafe { abi() }
    }

    pub fn poke_ram(&self, offset: usize, value: u8) -> bool {
        let poke: PokeRamFn = self.call("probe_poke_ram");
        // SAFETY: as above; the probe bounds-checks the write.
        unsafe { poke(offset, value) }
    }

    pub fn pc(&self) -> u64 {
        let pc: PcFn = self.call("probe_pc");
        // SAFETY: as above.
        unsafe { pc() }
    }

    pub fn last_frame(&self) -> Option<(u32, u32)> {
        let width: FrameDimFn = self.call("probe_last_frame_width");
        let height: FrameDimFn = self.call("probe_last_frame_height");
        // SAFETY: plain synchronous getters.
        match unsafe { (width(), height()) } {
            (0, 0) => None,
            dims => Some(dims),
        }
    }

    pub fn tools_dir(&self) -> String {
        let tools_dir: ToolsDirFn = self.call("probe_tools_dir");
        let mut buf = vec![0u8; 512];
        // SAFETY: valid buffer handed to the probe's bounded copy.
        let len = unsafe { tools_dir(buf.as_mut_ptr(), buf.len()) };
        assert!(len <= buf.len(), "tools dir exceeds view buffer");
        buf.truncate(len);
        String::from_utf8(buf).expect("tools dir path is UTF-8")
    }
}

/// Reads the received-message count of one legacy-revision module image.
pub fn legacy_message_count(path: &Path) -> usize {
    let lib = ModuleLibrary::open(path);
    assert!(lib.is_open(), "legacy view must open {}", path.display());
    // SAFETY: the legacy fixture exports this symbol with this type.
    let count = unsafe { lib.resolve::<LegacyCountFn>("legacy_message_count") }
        .expect("legacy export missing: legacy_message_count");
    // SAFETY: plain synchronous getter.
    unsafe { count() }
}
