//! Error mapping helpers for the gateway implementations.

use http::StatusCode;

use crate::review::error::HarvestError;
use crate::review::locator::Provider;

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> HarvestError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return HarvestError::FetchFailed {
            message: format!(
                "{operation} failed with status {status}: {message}",
                status = source.status_code,
                message = source.message
            ),
        };
    }

    if is_network_error(error) {
        return HarvestError::Network {
            message: format!("{operation} failed: {error}"),
        };
    }

    HarvestError::FetchFailed {
        message: format!("{operation} failed: {error}"),
    }
}

/// Maps a failed token check; any status GitHub answers with counts as a
/// rejected credential.
pub(super) fn map_octocrab_credential_error(error: &octocrab::Error) -> HarvestError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return HarvestError::InvalidCredential {
            provider: Provider::GitHub,
            message: format!(
                "GitHub returned {status} {message}",
                status = source.status_code,
                message = source.message
            ),
        };
    }

    if is_network_error(error) {
        return HarvestError::Network {
            message: format!("token validation failed: {error}"),
        };
    }

    HarvestError::InvalidCredential {
        provider: Provider::GitHub,
        message: error.to_string(),
    }
}

pub(crate) fn map_http_error(
    operation: &str,
    status: StatusCode,
    maybe_message: Option<String>,
) -> HarvestError {
    let message = maybe_message.unwrap_or_else(|| "unknown error".to_owned());
    HarvestError::FetchFailed {
        message: format!("{operation} failed with status {status}: {message}"),
    }
}

pub(crate) fn map_credential_status(
    provider: Provider,
    status: StatusCode,
    maybe_message: Option<String>,
) -> HarvestError {
    let message = maybe_message.map_or_else(
        || format!("{provider} returned {status}"),
        |detail| format!("{provider} returned {status} {detail}"),
    );
    HarvestError::InvalidCredential { provider, message }
}

pub(crate) fn map_transport_error(operation: &str, error: &reqwest::Error) -> HarvestError {
    if error.is_decode() {
        return HarvestError::FetchFailed {
            message: format!("{operation} returned an unexpected payload: {error}"),
        };
    }
    HarvestError::Network {
        message: format!("{operation} failed: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use rstest::rstest;

    use super::{map_credential_status, map_http_error};
    use crate::review::error::HarvestError;
    use crate::review::locator::Provider;

    #[rstest]
    #[case::unauthorised(StatusCode::UNAUTHORIZED)]
    #[case::not_found(StatusCode::NOT_FOUND)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR)]
    fn fetch_statuses_map_to_fetch_failed(#[case] status: StatusCode) {
        let error = map_http_error("merge request changes", status, Some("boom".to_owned()));
        let HarvestError::FetchFailed { message } = error else {
            panic!("expected FetchFailed, got {error:?}");
        };
        assert!(
            message.contains(status.as_str()) && message.contains("boom"),
            "message should carry status and detail: {message}"
        );
    }

    #[rstest]
    fn credential_status_names_provider() {
        let error = map_credential_status(Provider::GitLab, StatusCode::UNAUTHORIZED, None);
        assert_eq!(
            error,
            HarvestError::InvalidCredential {
                provider: Provider::GitLab,
                message: "GitLab returned 401 Unauthorized".to_owned(),
            }
        );
    }
}
