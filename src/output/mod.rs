//! Writing harvested files below an output root.
//!
//! All writes go through a capability-scoped [`Dir`] opened on the output
//! root, so a remote path can never place a file outside it. Existing files
//! are overwritten and existing directories are reused.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;

use crate::review::HarvestError;

/// Default output root, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "results";

/// Optional directory inserted between the output root and remote paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputNamespace {
    /// Remote paths land directly under the output root.
    #[default]
    Flat,
    /// Remote paths land under `<owner>/<name>/<unit>` for each review.
    PerReview,
    /// Remote paths land under the given Jira epic key.
    Epic(String),
}

/// Local destination of one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    relative: Utf8PathBuf,
}

impl DownloadTarget {
    /// Joins the namespace directory and the remote file path.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::UnsafePath` when the remote path is absolute,
    /// empty, or contains `..` components.
    pub fn new(namespace: Option<&Utf8Path>, remote_path: &str) -> Result<Self, HarvestError> {
        let remote = Utf8Path::new(remote_path);
        let escapes = remote
            .components()
            .any(|component| !matches!(component, Utf8Component::Normal(_) | Utf8Component::CurDir));
        if remote_path.is_empty() || escapes {
            return Err(HarvestError::UnsafePath {
                path: remote_path.to_owned(),
            });
        }

        let relative = namespace.map_or_else(|| remote.to_path_buf(), |dir| dir.join(remote));
        Ok(Self { relative })
    }

    /// Path relative to the output root.
    #[must_use]
    pub fn relative(&self) -> &Utf8Path {
        &self.relative
    }
}

/// Handle on the output root directory.
#[derive(Debug)]
pub struct OutputTree {
    root: Utf8PathBuf,
    dir: Dir,
}

impl OutputTree {
    /// Creates the output root if needed and opens it.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Io` when the directory cannot be created or
    /// opened.
    pub fn open(root: &Utf8Path) -> Result<Self, HarvestError> {
        Dir::create_ambient_dir_all(root, ambient_authority()).map_err(|error| {
            HarvestError::Io {
                message: format!("failed to create output directory '{root}': {error}"),
            }
        })?;
        let dir = Dir::open_ambient_dir(root, ambient_authority()).map_err(|error| {
            HarvestError::Io {
                message: format!("failed to open output directory '{root}': {error}"),
            }
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            dir,
        })
    }

    /// Output root as configured.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Writes `contents` to `target`, creating parent directories first and
    /// overwriting any existing file.
    ///
    /// Returns the written path including the output root.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::Io` when a directory or the file cannot be
    /// written.
    pub fn write(&self, target: &DownloadTarget, contents: &str) -> Result<Utf8PathBuf, HarvestError> {
        let relative = target.relative();
        if let Some(parent) = relative.parent()
            && !parent.as_str().is_empty()
        {
            self.dir
                .create_dir_all(parent)
                .map_err(|error| HarvestError::Io {
                    message: format!("failed to create directory '{parent}': {error}"),
                })?;
        }

        self.dir
            .write(relative, contents)
            .map_err(|error| HarvestError::Io {
                message: format!("failed to write '{relative}': {error}"),
            })?;

        let written = self.root.join(relative);
        tracing::debug!(path = %written, bytes = contents.len(), "wrote harvested file");
        Ok(written)
    }
}
