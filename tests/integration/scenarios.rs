//! Full CRUD scenario runs against a conforming backend
//!
//! Verifies:
//! - Every step passes for both resource families
//! - Validation rejection stays pending when not supported
//! - Resource selection and parallel runs

use super::harness::{crudcheck, CrudcheckAssertions, FakeApi, Workspace};

#[test]
fn both_resources_pass_against_conforming_backend() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    let result = crudcheck(&workspace, &["run", "--base-url", api.base_url(), "--json"]);

    result.assert_success();
    result.assert_resource_passed("comments");
    result.assert_resource_passed("todos");
    assert_eq!(result.json()["passed"], true);
}

#[test]
fn validation_rejection_is_pending_by_default() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    let result = crudcheck(&workspace, &["run", "--base-url", api.base_url(), "--json"]);

    result.assert_step("comments", "validate_rejection", "pending");
    result.assert_step("todos", "validate_rejection", "pending");

    // Only Create and Update write; a pending rejection check sends nothing
    let requests = api.requests();
    for line in ["POST /comments", "PUT /comments/1", "POST /todos", "PUT /todos/1"] {
        let count = requests.iter().filter(|r| r.as_str() == line).count();
        assert_eq!(count, 1, "{} in {:?}", line, requests);
    }
}

#[test]
fn get_missing_is_requested_twice() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    crudcheck(&workspace, &["run", "--base-url", api.base_url(), "-r", "comments", "--json"])
        .assert_success();

    let missing = api
        .requests()
        .iter()
        .filter(|r| r.as_str() == "GET /comments/999999")
        .count();
    assert_eq!(missing, 2);
}

#[test]
fn filter_uses_server_side_query() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    crudcheck(&workspace, &["run", "--base-url", api.base_url(), "--json"]).assert_success();

    let requests = api.requests();
    assert!(requests.contains(&"GET /todos?userId=1".to_string()), "{:?}", requests);
    assert!(
        requests.iter().any(|r| r.starts_with("GET /comments?email=Eliseo")),
        "{:?}",
        requests
    );
}

#[test]
fn update_and_delete_target_conventional_id() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    crudcheck(&workspace, &["run", "--base-url", api.base_url(), "-r", "todos", "--json"])
        .assert_success();

    let requests = api.requests();
    assert!(requests.contains(&"PUT /todos/1".to_string()));
    assert!(requests.contains(&"DELETE /todos/1".to_string()));
    // The created id (21) is never reused
    assert!(!requests.iter().any(|r| r.ends_with("/todos/21")));
}

#[test]
fn selecting_one_resource_runs_only_that_resource() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    let result = crudcheck(&workspace, &["run", "--base-url", api.base_url(), "-r", "todos", "--json"]);

    result.assert_success();
    let resources = result.json()["resources"].as_array().unwrap().len();
    assert_eq!(resources, 1);
    assert!(api.requests().iter().all(|r| r.contains("/todos")));
}

#[test]
fn unknown_resource_is_a_configuration_error() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    let result = crudcheck(&workspace, &["run", "--base-url", api.base_url(), "-r", "posts"]);

    result.assert_error_contains("Unknown resource 'posts'");
    assert!(api.requests().is_empty());
}

#[test]
fn parallel_run_matches_sequential_outcome() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    let result = crudcheck(
        &workspace,
        &["run", "--base-url", api.base_url(), "--parallel", "--json"],
    );

    result.assert_success();
    result.assert_resource_passed("comments");
    result.assert_resource_passed("todos");
}

#[test]
fn human_report_lists_steps_and_summary() {
    let api = FakeApi::start();
    let workspace = Workspace::empty();

    let result = crudcheck(&workspace, &["run", "--base-url", api.base_url()]);

    result.assert_success();
    assert!(result.stdout_contains("✓ Get existing (GET /comments/1 -> 200"));
    assert!(result.stdout_contains("Validate rejection (pending)"));
    assert!(result.stdout_contains("14 passed, 0 failed, 2 pending, 0 skipped"));
}
