//! Behavioural tests for harvesting GitLab merge requests.

mod support;

use std::io;

use camino::Utf8PathBuf;
use diffharvest::output::OutputTree;
use diffharvest::progress::RecordingProgressSink;
use diffharvest::review::{
    GitLabGateway, HarvestError, HarvestOptions, HarvestReport, PersonalAccessToken, Provider,
    ReviewBatch, ReviewHarvest, ReviewKind,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use serde_json::json;
use support::create_output_root;
use support::runtime::{SharedRuntime, ensure_runtime_and_server, mount, server_uri};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "glpat-scenario";
const MERGE_REQUEST_DIFF: &str = "@@ -1,2 +1,2 @@ fn mr() {\n-    old();\n+    new();\n";

#[derive(ScenarioState, Default)]
struct HarvestState {
    runtime: Slot<SharedRuntime>,
    server: Slot<MockServer>,
    temp: Slot<TempDir>,
    output_root: Slot<Utf8PathBuf>,
    report: Slot<HarvestReport>,
    error: Slot<HarvestError>,
}

#[fixture]
fn harvest_state() -> HarvestState {
    HarvestState::default()
}

fn runtime(harvest_state: &HarvestState) -> Result<SharedRuntime, io::Error> {
    ensure_runtime_and_server(&harvest_state.runtime, &harvest_state.server)
}

fn merge_request_url(harvest_state: &HarvestState, number: u64) -> Result<String, io::Error> {
    let host = server_uri(&harvest_state.server)?;
    Ok(format!("{host}/group/project/-/merge_requests/{number}"))
}

fn unquote(value: &str) -> String {
    value.trim_matches('"').replace("\\n", "\n")
}

#[given("a mock GitLab server that accepts the token")]
fn seed_accepting_server(harvest_state: &HarvestState) -> Result<(), io::Error> {
    let runtime = runtime(harvest_state)?;
    mount(
        &runtime,
        &harvest_state.server,
        Mock::given(method("GET"))
            .and(path("/api/v4/personal_access_tokens/self"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "name": "bdd" }))),
    )
}

#[given("a mock GitLab server that rejects the token")]
fn seed_rejecting_server(harvest_state: &HarvestState) -> Result<(), io::Error> {
    let runtime = runtime(harvest_state)?;
    mount(
        &runtime,
        &harvest_state.server,
        Mock::given(method("GET"))
            .and(path("/api/v4/personal_access_tokens/self"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "401 Unauthorized" })),
            ),
    )
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[given("merge request {number:u64} changes {file}")]
fn seed_merge_request(
    harvest_state: &HarvestState,
    number: u64,
    file: String,
) -> Result<(), io::Error> {
    let runtime = runtime(harvest_state)?;
    let changes = json!({
        "sha": format!("head{number}"),
        "changes": [{ "new_path": unquote(&file), "diff": MERGE_REQUEST_DIFF }]
    });
    mount(
        &runtime,
        &harvest_state.server,
        Mock::given(method("GET"))
            .and(path(format!(
                "/api/v4/projects/group%2Fproject/merge_requests/{number}/changes"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(changes)),
    )
}

#[given("merge request {number:u64} cannot be fetched")]
fn seed_failing_merge_request(harvest_state: &HarvestState, number: u64) -> Result<(), io::Error> {
    let runtime = runtime(harvest_state)?;
    mount(
        &runtime,
        &harvest_state.server,
        Mock::given(method("GET"))
            .and(path(format!(
                "/api/v4/projects/group%2Fproject/merge_requests/{number}/changes"
            )))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({ "message": "boom" })),
            ),
    )
}

fn run_batch(harvest_state: &HarvestState, batch: &ReviewBatch) -> Result<(), io::Error> {
    let runtime = runtime(harvest_state)?;
    let (temp, root) = create_output_root();
    harvest_state.temp.set(temp);
    harvest_state.output_root.set(root.clone());

    let result = runtime.block_on(async {
        let token = PersonalAccessToken::new(Provider::GitLab, TOKEN)?;
        let gateway = GitLabGateway::for_token(&token, Some(batch.api_base()?))?;
        let output = OutputTree::open(&root)?;
        let sink = RecordingProgressSink::default();
        ReviewHarvest::new(&gateway, &output, &sink, HarvestOptions::default())
            .harvest_batch(batch)
            .await
    });

    match result {
        Ok(report) => {
            drop(harvest_state.error.take());
            harvest_state.report.set(report);
        }
        Err(error) => {
            drop(harvest_state.report.take());
            harvest_state.error.set(error);
        }
    }
    Ok(())
}

#[when("merge request {number:u64} is harvested")]
fn harvest_single(harvest_state: &HarvestState, number: u64) -> Result<(), io::Error> {
    let url = merge_request_url(harvest_state, number)?;
    let batch = ReviewBatch::single(ReviewKind::GitLabMergeRequest, &url);
    run_batch(harvest_state, &batch)
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[when("merge requests {numbers} are harvested as a list")]
fn harvest_list(harvest_state: &HarvestState, numbers: String) -> Result<(), io::Error> {
    let mut urls = Vec::new();
    for number in unquote(&numbers).split(',') {
        let parsed = number
            .trim()
            .parse::<u64>()
            .map_err(|error| io::Error::other(format!("bad merge request number: {error}")))?;
        urls.push(merge_request_url(harvest_state, parsed)?);
    }
    let batch = ReviewBatch::from_urls(ReviewKind::GitLabMergeRequest, urls)
        .map_err(|error| io::Error::other(error.to_string()))?;
    run_batch(harvest_state, &batch)
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "rstest-bdd passes owned step arguments"
)]
#[then("the file {file} reads {contents}")]
fn assert_file_contents(
    harvest_state: &HarvestState,
    file: String,
    contents: String,
) -> Result<(), io::Error> {
    let root = harvest_state
        .output_root
        .get()
        .ok_or_else(|| io::Error::other("output root missing"))?;
    let written = std::fs::read_to_string(root.join(unquote(&file)))?;
    let expected = unquote(&contents);

    if written == expected {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "expected {expected:?} in {file} but found {written:?}"
        )))
    }
}

#[then("{succeeded:u64} reviews succeeded and {failed:u64} failed")]
fn assert_report_counts(
    harvest_state: &HarvestState,
    succeeded: u64,
    failed: u64,
) -> Result<(), io::Error> {
    let (actual_succeeded, actual_failed) = harvest_state
        .report
        .with_ref(|report| (report.succeeded, report.failed.len()))
        .ok_or_else(|| io::Error::other("harvest report missing"))?;

    let matches = u64::try_from(actual_succeeded).ok() == Some(succeeded)
        && u64::try_from(actual_failed).ok() == Some(failed);
    if matches {
        Ok(())
    } else {
        Err(io::Error::other(format!(
            "expected {succeeded}/{failed} but found {actual_succeeded}/{actual_failed}"
        )))
    }
}

fn recorded_error(harvest_state: &HarvestState) -> Result<HarvestError, io::Error> {
    harvest_state
        .error
        .with_ref(Clone::clone)
        .ok_or_else(|| io::Error::other("expected the harvest to fail"))
}

#[then("the harvest fails with a fetch error")]
fn assert_fetch_error(harvest_state: &HarvestState) -> Result<(), io::Error> {
    match recorded_error(harvest_state)? {
        HarvestError::FetchFailed { message } if message.contains("500") => Ok(()),
        other => Err(io::Error::other(format!(
            "expected FetchFailed with status 500, got {other:?}"
        ))),
    }
}

#[then("the harvest fails with an invalid GitLab token")]
fn assert_invalid_token(harvest_state: &HarvestState) -> Result<(), io::Error> {
    match recorded_error(harvest_state)? {
        HarvestError::InvalidCredential {
            provider: Provider::GitLab,
            ..
        } => Ok(()),
        other => Err(io::Error::other(format!(
            "expected InvalidCredential for GitLab, got {other:?}"
        ))),
    }
}

#[then("no files were written")]
fn assert_nothing_written(harvest_state: &HarvestState) -> Result<(), io::Error> {
    let root = harvest_state
        .output_root
        .get()
        .ok_or_else(|| io::Error::other("output root missing"))?;
    let entries = std::fs::read_dir(&root)?.count();

    if entries == 0 {
        Ok(())
    } else {
        Err(io::Error::other(format!("{root} holds {entries} entries")))
    }
}

#[scenario(path = "tests/features/review_harvest.feature", index = 0)]
fn single_merge_request_is_beautified(harvest_state: HarvestState) {
    let _ = harvest_state;
}

#[scenario(path = "tests/features/review_harvest.feature", index = 1)]
fn list_continues_past_failure(harvest_state: HarvestState) {
    let _ = harvest_state;
}

#[scenario(path = "tests/features/review_harvest.feature", index = 2)]
fn single_failure_aborts(harvest_state: HarvestState) {
    let _ = harvest_state;
}

#[scenario(path = "tests/features/review_harvest.feature", index = 3)]
fn rejected_token_stops_run(harvest_state: HarvestState) {
    let _ = harvest_state;
}
