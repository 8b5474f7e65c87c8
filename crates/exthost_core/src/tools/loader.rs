//! Owning wrapper around one native module handle.
//!
//! # Responsibility
//! - Open/close an independently-compiled shared module by file path.
//! - Resolve exported entry points by name into typed callables.
//!
//! # Invariants
//! - Open failure leaves the handle non-open; it never crosses the module
//!   boundary as a panic or error value.
//! - `close` is idempotent; drop releases the handle on every exit path.
//! - Resolution failure yields `None`, never a dangling pointer.

use libloading::Library;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One loaded (or failed-to-load) native module.
///
/// The handle is move-only and exclusively owned; the mapped module stays
/// valid from a successful `open` until `close` or drop. Callables resolved
/// from this handle are only meaningful while it remains open — the caller
/// pairing symbols with the handle owns that discipline.
#[derive(Debug)]
pub struct ModuleLibrary {
    path: PathBuf,
    lib: Option<Library>,
}

impl ModuleLibrary {
    /// Opens a native module from `path`.
    ///
    /// A bad path or load-time linkage failure is reported as a non-open
    /// handle plus one diagnostic log line. The host continues unaffected.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let started_at = Instant::now();

        // SAFETY: loading a native module runs its initializers. The host
        // accepts that trust boundary for configured external tools; there
        // is no way to verify a foreign binary beyond this point.
        let lib = match unsafe { Library::new(&path) } {
            Ok(lib) => {
                info!(
                    "event=module_open module=tools status=ok path={} duration_ms={}",
                    path.display(),
                    started_at.elapsed().as_millis()
                );
                Some(lib)
            }
            Err(err) => {
                warn!(
                    "event=module_open module=tools status=error path={} error={}",
                    path.display(),
                    err
                );
                None
            }
        };

        Self { path, lib }
    }

    /// Returns the source path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether the module is currently mapped.
    pub fn is_open(&self) -> bool {
        self.lib.is_some()
    }

    /// Resolves an exported symbol into a callable of type `T`.
    ///
    /// Returns `None` when the handle is closed or the name is absent.
    ///
    /// # Safety
    /// The exported symbol carries no type information across the binary
    /// boundary; the caller asserts that the export named `name` really has
    /// type `T` in the module's build. The returned value must not be
    /// called after this handle closes.
    pub unsafe fn resolve<T: Copy>(&self, name: &str) -> Option<T> {
        let lib = self.lib.as_ref()?;
        match lib.get::<T>(name.as_bytes()) {
            Ok(symbol) => Some(*symbol),
            Err(_) => None,
        }
    }

    /// Closes the module handle. Idempotent on an already-closed handle.
    pub fn close(&mut self) {
        if let Some(lib) = self.lib.take() {
            if let Err(err) = lib.close() {
                warn!(
                    "event=module_close module=tools status=error path={} error={}",
                    self.path.display(),
                    err
                );
                return;
            }
            info!(
                "event=module_close module=tools status=ok path={}",
                self.path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ModuleLibrary;

    type NoSuchFn = unsafe extern "C" fn() -> u64;

    #[test]
    fn open_failure_yields_non_open_handle() {
        let lib = ModuleLibrary::open("/definitely/not/a/module.so");
        assert!(!lib.is_open());
        assert_eq!(lib.path().to_str(), Some("/definitely/not/a/module.so"));
    }

    #[test]
    fn resolve_on_closed_handle_returns_none() {
        let lib = ModuleLibrary::open("/definitely/not/a/module.so");
        // SAFETY: the handle is closed; resolution must short-circuit to None.
        let entry = unsafe { lib.resolve::<NoSuchFn>("OnMessage") };
        assert!(entry.is_none());
    }

    #[test]
    fn close_is_idempotent() {
        let mut lib = ModuleLibrary::open("/definitely/not/a/module.so");
        lib.close();
        lib.close();
        assert!(!lib.is_open());
    }
}
