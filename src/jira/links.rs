//! Extraction of GitLab merge request links from Jira comment bodies.
//!
//! The GitLab integration posts comments such as
//! `mentioned this issue in [a merge request|https://gl.example.com/g/p/-/merge_requests/7]`.

const MERGE_REQUEST_MARKER: &str = "merge_requests";
const LINK_PREFIX: &str = "a merge request|";

/// Returns every distinct merge request link in `body`, in order of
/// appearance.
///
/// A link is the text after `a merge request|` up to the next `]` (or the
/// end of the body). Bodies that never mention `merge_requests` yield
/// nothing.
#[must_use]
pub fn merge_request_links(body: &str) -> Vec<String> {
    if !body.contains(MERGE_REQUEST_MARKER) {
        return Vec::new();
    }

    let mut links: Vec<String> = Vec::new();
    let mut rest = body;
    while let Some((_, after_prefix)) = rest.split_once(LINK_PREFIX) {
        let (candidate, remainder) = after_prefix.split_once(']').unwrap_or((after_prefix, ""));
        let link = candidate.trim();
        if !link.is_empty() && !links.iter().any(|known| known == link) {
            links.push(link.to_owned());
        }
        rest = remainder;
    }
    links
}
