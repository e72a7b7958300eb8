//! Error types exposed by the review harvesting layer.

use thiserror::Error;

use super::locator::Provider;

/// Errors surfaced while parsing input, talking to a provider, or writing
/// output files.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarvestError {
    /// No review URL, URL list file, or epic URL was supplied.
    #[error(
        "a review URL or URL list file is required \
         (use --pr-url, --pr-file, --mr-url, --mr-file, --commit-url, \
         --commit-file, or --epic-url)"
    )]
    MissingInput,

    /// The credential for a provider was missing from the CLI, config, and
    /// environment.
    #[error(
        "{provider} token is required (use --{flag} or set {env})",
        flag = .provider.token_flag(),
        env = .provider.token_env()
    )]
    MissingToken {
        /// Provider the token is for.
        provider: Provider,
    },

    /// The provided URL could not be parsed at all.
    #[error("URL is invalid: {0}")]
    InvalidUrl(String),

    /// The URL parsed but does not have the shape expected for its provider.
    #[error("{url} is not a valid {expected} URL")]
    MalformedReference {
        /// The offending URL.
        url: String,
        /// Description of the expected shape, e.g. `/owner/repo/pull/<number>`.
        expected: String,
    },

    /// The provider rejected the credential during validation.
    #[error("{provider} token is invalid: {message}")]
    InvalidCredential {
        /// Provider that rejected the token.
        provider: Provider,
        /// Status or identity detail returned by the provider.
        message: String,
    },

    /// The provider returned a non-success status or an unexpected payload
    /// while retrieving a change set.
    #[error("fetch failed: {message}")]
    FetchFailed {
        /// Status code and response detail.
        message: String,
    },

    /// Networking failed while calling a provider.
    #[error("network error: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// A remote file path would escape the output directory.
    #[error("refusing to write outside the output directory: {path}")]
    UnsafePath {
        /// The remote path as reported by the provider.
        path: String,
    },

    /// Local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },
}
