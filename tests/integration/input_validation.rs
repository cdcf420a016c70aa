//! Input-validation checks gated by the resource capability flag
//!
//! Verifies:
//! - Enabled checks pass against a backend that rejects bad payloads
//! - Enabled checks fail against a backend that accepts anything

use super::harness::{crudcheck, Behavior, CrudcheckAssertions, FakeApi, Workspace};

fn validation_config(base_url: &str) -> String {
    format!(
        r#"
base_url = "{}"

[resources.comments]
supports_input_validation = true

[resources.todos]
supports_input_validation = true
"#,
        base_url
    )
}

#[test]
fn strict_backend_rejections_pass() {
    let api = FakeApi::with_behavior(Behavior {
        strict_validation: true,
        ..Default::default()
    });
    let workspace = Workspace::with_project_config(&validation_config(api.base_url()));

    let result = crudcheck(&workspace, &["run", "--json"]);

    result.assert_success();
    result.assert_step("comments", "validate_rejection", "passed");
    result.assert_step("todos", "validate_rejection", "passed");
    result.assert_resource_passed("comments");
}

#[test]
fn lenient_backend_fails_enabled_validation() {
    let api = FakeApi::start();
    let workspace = Workspace::with_project_config(&validation_config(api.base_url()));

    let result = crudcheck(&workspace, &["run", "-r", "todos", "--json"]);

    result.assert_failure();
    let rejection = result.step("todos", "validate_rejection");
    assert_eq!(rejection["status"], "failed");
    assert!(rejection["failures"][0]
        .as_str()
        .unwrap()
        .contains("expected a 4xx rejection"));
    result.assert_resource_passed("todos");
}
