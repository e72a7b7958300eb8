//! Tests for the reqwest GitLab gateway.

use rstest::rstest;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use super::{ServerFixture, server_fixture};
use crate::review::error::HarvestError;
use crate::review::gateway::{ChangeSetGateway, GitLabGateway};
use crate::review::locator::{PersonalAccessToken, Provider, ReviewKind, ReviewReference};
use crate::review::models::{ChangedFile, RetrievalMode};

const TOKEN: &str = "glpat-valid";
const COMMIT_SHA: &str = "0a1b2c3d4e5f";

fn gateway(fixture: &ServerFixture) -> GitLabGateway {
    let token = PersonalAccessToken::new(Provider::GitLab, TOKEN).expect("token should be valid");
    let api_base = GitLabGateway::api_base_for_host(&fixture.web_url(""))
        .expect("mock server URL should be a valid host");
    GitLabGateway::for_token(&token, Some(&api_base)).expect("gateway should build")
}

fn reference(fixture: &ServerFixture, kind: ReviewKind, web_path: &str) -> ReviewReference {
    ReviewReference::parse(kind, &fixture.web_url(web_path)).expect("review URL should parse")
}

#[rstest]
#[case::bare("https://gitlab.example.com", "https://gitlab.example.com/api/v4")]
#[case::trailing_slash("https://gitlab.example.com/", "https://gitlab.example.com/api/v4")]
#[case::with_port("http://localhost:8080", "http://localhost:8080/api/v4")]
fn api_base_for_host_appends_v4(#[case] host: &str, #[case] expected: &str) {
    let api_base = GitLabGateway::api_base_for_host(host).expect("host should parse");
    assert_eq!(api_base.as_str(), expected);
}

#[rstest]
fn api_base_for_host_rejects_relative_input() {
    let result = GitLabGateway::api_base_for_host("gitlab.example.com");
    assert!(
        matches!(result, Err(HarvestError::InvalidUrl(_))),
        "bare host names need a scheme"
    );
}

#[rstest]
fn validate_token_sends_private_token_header(server_fixture: ServerFixture) {
    let gateway = gateway(&server_fixture);
    server_fixture.mount(
        Mock::given(method("GET"))
            .and(path("/api/v4/personal_access_tokens/self"))
            .and(header("PRIVATE-TOKEN", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "ci-reader" })))
            .expect(1),
    );

    let identity = server_fixture
        .block_on(gateway.validate_token())
        .expect("token should validate");

    assert_eq!(identity.as_deref(), Some("ci-reader"));
}

#[rstest]
fn validate_token_rejection_is_invalid_credential(server_fixture: ServerFixture) {
    let gateway = gateway(&server_fixture);
    server_fixture.mount(
        Mock::given(method("GET"))
            .and(path("/api/v4/personal_access_tokens/self"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "401 Unauthorized" })),
            ),
    );

    let result = server_fixture.block_on(gateway.validate_token());

    assert!(
        matches!(
            &result,
            Err(HarvestError::InvalidCredential { provider: Provider::GitLab, .. })
        ),
        "expected InvalidCredential, got {result:?}"
    );
}

#[rstest]
fn validate_token_without_host_is_configuration_error(server_fixture: ServerFixture) {
    let token = PersonalAccessToken::new(Provider::GitLab, TOKEN).expect("token should be valid");
    let gateway = GitLabGateway::for_token(&token, None).expect("gateway should build");

    let result = server_fixture.block_on(gateway.validate_token());

    assert!(
        matches!(result, Err(HarvestError::Configuration { .. })),
        "expected Configuration, got {result:?}"
    );
}

#[rstest]
fn merge_request_diff_mode_returns_one_entry_per_file(server_fixture: ServerFixture) {
    let gateway = gateway(&server_fixture);
    let reference = reference(
        &server_fixture,
        ReviewKind::GitLabMergeRequest,
        "/group/project/-/merge_requests/177",
    );
    server_fixture.mount(
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fproject/merge_requests/177/changes"))
            .and(header("PRIVATE-TOKEN", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "feedface",
                "changes": [
                    { "new_path": "src/main.rs", "diff": "@@ -1 +1 @@\n-old\n+new\n" },
                    { "new_path": "README.md", "diff": "@@ -0,0 +1 @@\n+hello\n", "deleted_file": false }
                ]
            })))
            .expect(1),
    );

    let change_set = server_fixture
        .block_on(gateway.change_set(&reference, RetrievalMode::Diff))
        .expect("changes should load");

    assert_eq!(
        change_set.files,
        vec![
            ChangedFile::diff("src/main.rs", "@@ -1 +1 @@\n-old\n+new\n"),
            ChangedFile::diff("README.md", "@@ -0,0 +1 @@\n+hello\n"),
        ]
    );
}

#[rstest]
fn merge_request_full_file_mode_reads_head_revision(server_fixture: ServerFixture) {
    let gateway = gateway(&server_fixture);
    let reference = reference(
        &server_fixture,
        ReviewKind::GitLabMergeRequest,
        "/group/project/-/merge_requests/177",
    );
    server_fixture.mount(
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fproject/merge_requests/177/changes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "feedface",
                "changes": [
                    { "new_path": "src/main.rs", "diff": "@@ -1 +1 @@\n-old\n+new\n" },
                    { "new_path": "gone.txt", "diff": "@@ -1 +0,0 @@\n-bye\n", "deleted_file": true }
                ]
            }))),
    );
    server_fixture.mount(
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fproject/repository/files/src%2Fmain.rs/raw"))
            .and(query_param("ref", "feedface"))
            .respond_with(ResponseTemplate::new(200).set_body_string("fn main() {}\n"))
            .expect(1),
    );

    let change_set = server_fixture
        .block_on(gateway.change_set(&reference, RetrievalMode::FullFile))
        .expect("files should load");

    assert_eq!(
        change_set.files,
        vec![ChangedFile::full("src/main.rs", "fn main() {}\n")]
    );
}

#[rstest]
fn commit_full_file_mode_reads_commit_revision(server_fixture: ServerFixture) {
    let gateway = gateway(&server_fixture);
    let reference = reference(
        &server_fixture,
        ReviewKind::GitLabCommit,
        &format!("/group/project/-/commit/{COMMIT_SHA}"),
    );
    server_fixture.mount(
        Mock::given(method("GET"))
            .and(path(format!(
                "/api/v4/projects/group%2Fproject/repository/commits/{COMMIT_SHA}/diff"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "new_path": "src/main.rs", "diff": "@@ -1 +1 @@\n-old\n+new\n" }
            ]))),
    );
    server_fixture.mount(
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fproject/repository/files/src%2Fmain.rs/raw"))
            .and(query_param("ref", COMMIT_SHA))
            .respond_with(ResponseTemplate::new(200).set_body_string("fn main() {}\n"))
            .expect(1),
    );

    let change_set = server_fixture
        .block_on(gateway.change_set(&reference, RetrievalMode::FullFile))
        .expect("files should load");

    assert_eq!(
        change_set.files,
        vec![ChangedFile::full("src/main.rs", "fn main() {}\n")]
    );
}

#[rstest]
fn server_error_is_fetch_failure(server_fixture: ServerFixture) {
    let gateway = gateway(&server_fixture);
    let reference = reference(
        &server_fixture,
        ReviewKind::GitLabCommit,
        &format!("/group/project/-/commit/{COMMIT_SHA}"),
    );
    server_fixture.mount(
        Mock::given(method("GET"))
            .and(path(format!(
                "/api/v4/projects/group%2Fproject/repository/commits/{COMMIT_SHA}/diff"
            )))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "500 Internal Server Error" })),
            ),
    );

    let result = server_fixture.block_on(gateway.change_set(&reference, RetrievalMode::Diff));

    assert!(
        matches!(&result, Err(HarvestError::FetchFailed { message }) if message.contains("500")),
        "expected FetchFailed, got {result:?}"
    );
}
