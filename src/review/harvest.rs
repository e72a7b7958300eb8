//! Driver that turns review references into files below the output root.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use url::Url;

use crate::beautify::RemovedLines;
use crate::output::{DownloadTarget, OutputNamespace, OutputTree};
use crate::progress::{ProgressEvent, ProgressSink};

use super::error::HarvestError;
use super::gateway::ChangeSetGateway;
use super::locator::{ReviewKind, ReviewReference};
use super::models::RetrievalMode;

/// Per-run settings shared by every review unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestOptions {
    /// Diff text or full file content.
    pub mode: RetrievalMode,
    /// Whether removed lines survive beautification.
    pub removed_lines: RemovedLines,
    /// Directory inserted between the output root and remote paths.
    pub namespace: OutputNamespace,
}

/// One input URL and the outcome of parsing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    /// The URL as supplied.
    pub url: String,
    /// Parsed reference, or the parse failure.
    pub reference: Result<ReviewReference, HarvestError>,
}

/// Whether a failure on one entry ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// One URL from the command line; any failure is fatal.
    Single,
    /// URLs read from a list file; failures are recorded and skipped.
    List,
}

/// Review URLs of one kind, parsed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewBatch {
    kind: ReviewKind,
    batch_kind: BatchKind,
    entries: Vec<BatchEntry>,
}

impl ReviewBatch {
    /// Batch for a single URL supplied on the command line.
    #[must_use]
    pub fn single(kind: ReviewKind, url: &str) -> Self {
        Self {
            kind,
            batch_kind: BatchKind::Single,
            entries: vec![parse_entry(kind, url.to_owned())],
        }
    }

    /// Batch for URLs read from a list file.
    ///
    /// # Errors
    ///
    /// Returns `HarvestError::MissingInput` when `urls` is empty.
    pub fn from_urls(kind: ReviewKind, urls: Vec<String>) -> Result<Self, HarvestError> {
        if urls.is_empty() {
            return Err(HarvestError::MissingInput);
        }
        Ok(Self {
            kind,
            batch_kind: BatchKind::List,
            entries: urls.into_iter().map(|url| parse_entry(kind, url)).collect(),
        })
    }

    /// Kind of review unit every entry is parsed as.
    #[must_use]
    pub const fn kind(&self) -> ReviewKind {
        self.kind
    }

    /// Whether failures are fatal or skipped.
    #[must_use]
    pub const fn batch_kind(&self) -> BatchKind {
        self.batch_kind
    }

    /// Entries in input order.
    #[must_use]
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// API base the token is validated against: that of the first entry
    /// that parsed.
    ///
    /// # Errors
    ///
    /// Returns the first parse error when no entry parsed.
    pub fn api_base(&self) -> Result<&Url, HarvestError> {
        if let Some(reference) = self
            .entries
            .iter()
            .find_map(|entry| entry.reference.as_ref().ok())
        {
            return Ok(reference.api_base());
        }
        Err(self
            .entries
            .iter()
            .find_map(|entry| entry.reference.as_ref().err().cloned())
            .unwrap_or(HarvestError::MissingInput))
    }
}

fn parse_entry(kind: ReviewKind, url: String) -> BatchEntry {
    let reference = ReviewReference::parse(kind, &url);
    BatchEntry { url, reference }
}

/// Outcome of harvesting a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    /// Number of review units harvested.
    pub succeeded: usize,
    /// URLs that were skipped, with the reason.
    pub failed: Vec<(String, HarvestError)>,
    /// Every file written, in order.
    pub files_written: Vec<Utf8PathBuf>,
}

/// Validates a token once and harvests review units through a gateway.
pub struct ReviewHarvest<'run, Gateway>
where
    Gateway: ChangeSetGateway,
{
    gateway: &'run Gateway,
    output: &'run OutputTree,
    sink: &'run dyn ProgressSink,
    options: HarvestOptions,
}

impl<'run, Gateway> ReviewHarvest<'run, Gateway>
where
    Gateway: ChangeSetGateway,
{
    /// Creates a harvest writing below `output` and reporting to `sink`.
    #[must_use]
    pub const fn new(
        gateway: &'run Gateway,
        output: &'run OutputTree,
        sink: &'run dyn ProgressSink,
        options: HarvestOptions,
    ) -> Self {
        Self {
            gateway,
            output,
            sink,
            options,
        }
    }

    /// Confirms the gateway's token is accepted and reports the identity.
    ///
    /// # Errors
    ///
    /// Propagates `HarvestError::InvalidCredential` or `HarvestError::Network`
    /// from the gateway.
    pub async fn validate(&self, kind: ReviewKind) -> Result<Option<String>, HarvestError> {
        let identity = self.gateway.validate_token().await?;
        tracing::info!(provider = %kind.provider(), identity = ?identity, "token accepted");
        self.sink.record(ProgressEvent::TokenValidated {
            provider: kind.provider(),
            identity: identity.clone(),
        });
        Ok(identity)
    }

    /// Fetches one review unit and writes each changed file.
    ///
    /// Returns the written paths in the order the provider listed the files.
    ///
    /// # Errors
    ///
    /// Returns the gateway error when the change set cannot be fetched,
    /// `HarvestError::UnsafePath` for a remote path that would escape the
    /// output root, and `HarvestError::Io` when writing fails.
    pub async fn harvest(
        &self,
        reference: &ReviewReference,
    ) -> Result<Vec<Utf8PathBuf>, HarvestError> {
        let change_set = self
            .gateway
            .change_set(reference, self.options.mode)
            .await?;
        if change_set.files.is_empty() {
            tracing::info!(project = %reference.project(), unit = %reference.unit(), "no changed files");
        }

        let namespace = self.namespace_for(reference);
        let mut written = Vec::with_capacity(change_set.files.len());
        for file in &change_set.files {
            let target = DownloadTarget::new(namespace.as_deref(), &file.path)?;
            let path = self
                .output
                .write(&target, &file.rendered(self.options.removed_lines))?;
            self.sink.record(ProgressEvent::FileWritten { path: path.clone() });
            written.push(path);
        }
        Ok(written)
    }

    /// Validates the token, then harvests every entry of `batch` in order.
    ///
    /// # Errors
    ///
    /// Token validation failures are always fatal. For a single URL any
    /// parse, fetch, or write failure is returned; for a list those are
    /// recorded in the report and the next entry is processed.
    pub async fn harvest_batch(&self, batch: &ReviewBatch) -> Result<HarvestReport, HarvestError> {
        self.validate(batch.kind()).await?;

        let mut report = HarvestReport::default();
        for entry in batch.entries() {
            self.sink.record(ProgressEvent::ReviewStarted {
                url: entry.url.clone(),
            });
            let outcome = match &entry.reference {
                Ok(reference) => self.harvest(reference).await,
                Err(error) => Err(error.clone()),
            };

            match outcome {
                Ok(mut files) => {
                    report.succeeded += 1;
                    report.files_written.append(&mut files);
                }
                Err(error) if batch.batch_kind() == BatchKind::Single => return Err(error),
                Err(error) => {
                    tracing::warn!(url = %entry.url, %error, "skipping review");
                    self.sink.record(ProgressEvent::ReviewFailed {
                        url: entry.url.clone(),
                        message: error.to_string(),
                    });
                    report.failed.push((entry.url.clone(), error));
                }
            }
        }

        if batch.batch_kind() == BatchKind::List {
            self.sink.record(ProgressEvent::BatchFinished {
                succeeded: report.succeeded,
                failed: report.failed.len(),
            });
        }
        Ok(report)
    }

    fn namespace_for(&self, reference: &ReviewReference) -> Option<Utf8PathBuf> {
        match &self.options.namespace {
            OutputNamespace::Flat => None,
            OutputNamespace::PerReview => Some(reference.review_directory()),
            OutputNamespace::Epic(key) => Some(Utf8PathBuf::from(key)),
        }
    }
}

/// Reads review URLs from a list file, one per line.
///
/// Surrounding whitespace is trimmed; blank lines and lines starting with `#`
/// are skipped.
///
/// # Errors
///
/// Returns `HarvestError::Io` when the file cannot be read.
pub fn read_url_list(path: &Utf8Path) -> Result<Vec<String>, HarvestError> {
    let (dir_path, file_name) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_str().is_empty() => (parent, name),
        (_, Some(name)) => (Utf8Path::new("."), name),
        (_, None) => {
            return Err(HarvestError::Io {
                message: format!("'{path}' is not a file path"),
            });
        }
    };

    let read_error = |error: std::io::Error| HarvestError::Io {
        message: format!("failed to read URL list '{path}': {error}"),
    };
    let dir = Dir::open_ambient_dir(dir_path, ambient_authority()).map_err(read_error)?;
    let contents = dir.read_to_string(file_name).map_err(read_error)?;

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToOwned::to_owned)
        .collect())
}
