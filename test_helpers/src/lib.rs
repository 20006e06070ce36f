//! Test helpers for the sky workspace
//!
//! Locates the workspace root and hands out paths under `test_output/` where
//! tests drop binary arrays, model configurations and other artifacts.

use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

/// Directory, relative to the workspace root, that collects test artifacts.
pub const OUTPUT_DIR_NAME: &str = "test_output";

#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("workspace root not found above {0}")]
    WorkspaceRootNotFound(PathBuf),
    #[error("I/O error while locating workspace root: {0}")]
    Io(#[from] std::io::Error),
}

/// Walk up from `start` to the first directory whose `Cargo.toml` declares a
/// `[workspace]`.
pub fn find_workspace_root_from(start: &Path) -> Result<PathBuf, TestHelperError> {
    for dir in start.ancestors() {
        let manifest = dir.join("Cargo.toml");
        if manifest.is_file() && std::fs::read_to_string(&manifest)?.contains("[workspace]") {
            return Ok(dir.to_path_buf());
        }
    }
    Err(TestHelperError::WorkspaceRootNotFound(start.to_path_buf()))
}

/// Workspace root found from the current directory.
pub fn find_workspace_root() -> Result<PathBuf, TestHelperError> {
    find_workspace_root_from(&std::env::current_dir()?)
}

static WORKSPACE_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_workspace_root().expect("tests must run inside the sky workspace"));

/// `test_output/` under the workspace root, created on first use.
pub fn get_output_dir() -> PathBuf {
    let dir = WORKSPACE_ROOT.join(OUTPUT_DIR_NAME);
    std::fs::create_dir_all(&dir).expect("failed to create test output directory");
    dir
}

/// Path of `name` inside the test output directory.
pub fn output_path<P: AsRef<Path>>(name: P) -> PathBuf {
    get_output_dir().join(name)
}
