//! Module-file discovery in the configured tools directory.

use log::{info, warn};
use std::path::{Path, PathBuf};

/// Scans `dir` (non-recursively) for native modules.
///
/// Matches files carrying the platform dynamic-library extension and
/// returns them sorted by path, so load order is deterministic across
/// runs. A missing or unreadable directory is logged and yields an empty
/// list; discovery never fails the host.
pub fn discover_modules(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                "event=module_discovery module=tools status=error dir={} error={}",
                dir.display(),
                err
            );
            return Vec::new();
        }
    };

    let mut modules: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext == std::env::consts::DLL_EXTENSION)
        })
        .collect();
    modules.sort();

    info!(
        "event=module_discovery module=tools status=ok dir={} found={}",
        dir.display(),
        modules.len()
    );
    modules
}

#[cfg(test)]
mod tests {
    use super::discover_modules;
    use std::fs;

    #[test]
    fn missing_directory_yields_empty_list() {
        let modules = discover_modules("/no/such/tools/dir".as_ref());
        assert!(modules.is_empty());
    }

    #[test]
    fn finds_only_platform_modules_sorted() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ext = std::env::consts::DLL_EXTENSION;

        fs::write(dir.path().join(format!("zeta.{ext}")), b"stub").expect("write zeta");
        fs::write(dir.path().join(format!("alpha.{ext}")), b"stub").expect("write alpha");
        fs::write(dir.path().join("readme.txt"), b"not a module").expect("write readme");
        fs::create_dir(dir.path().join(format!("subdir.{ext}"))).expect("create decoy dir");

        let modules = discover_modules(dir.path());
        assert_eq!(modules.len(), 2);
        assert!(modules[0].ends_with(format!("alpha.{ext}")));
        assert!(modules[1].ends_with(format!("zeta.{ext}")));
    }
}
