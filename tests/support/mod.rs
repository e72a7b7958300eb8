//! Shared test utilities.

use camino::Utf8PathBuf;
use tempfile::TempDir;

pub mod runtime;

/// Creates a temporary directory and returns it with a UTF-8 `results`
/// path inside it.
///
/// # Panics
///
/// Panics if the temporary directory cannot be created or its path is not
/// valid UTF-8.
pub fn create_output_root() -> (TempDir, Utf8PathBuf) {
    let temp =
        TempDir::new().unwrap_or_else(|error| panic!("failed to create temporary directory: {error}"));
    let root = Utf8PathBuf::from_path_buf(temp.path().join("results"))
        .unwrap_or_else(|path| panic!("temporary path is not UTF-8: {}", path.display()));
    (temp, root)
}
