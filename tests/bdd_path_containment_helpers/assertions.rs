//! Assertion helpers for path containment behavioural tests.

use devcell::error::ErrorKind;
use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{ContainmentState, Resolution};

#[then("the path is allowed as {expected}")]
fn path_is_allowed(containment_state: &ContainmentState, expected: String) -> StepResult<()> {
    match resolution(containment_state)? {
        Resolution::Allowed(relative) if relative == expected => Ok(()),
        Resolution::Allowed(relative) => Err(format!("expected {expected}, got {relative}")),
        Resolution::Rejected(kind) => Err(format!("expected {expected}, got {kind:?}")),
    }
}

#[then("the path is denied")]
fn path_is_denied(containment_state: &ContainmentState) -> StepResult<()> {
    match resolution(containment_state)? {
        Resolution::Rejected(ErrorKind::PermissionDenied) => Ok(()),
        other => Err(format!("expected PermissionDenied, got {other:?}")),
    }
}

#[then("the session is rejected as {kind}")]
fn session_is_rejected(containment_state: &ContainmentState, kind: String) -> StepResult<()> {
    let actual = containment_state
        .open_error
        .get()
        .ok_or_else(|| String::from("open error should be set"))?;
    let rendered = serde_json::to_value(actual).map_err(|e| e.to_string())?;
    if rendered == serde_json::Value::String(kind.clone()) {
        Ok(())
    } else {
        Err(format!("expected {kind}, got {rendered}"))
    }
}

fn resolution(containment_state: &ContainmentState) -> StepResult<Resolution> {
    containment_state
        .resolution
        .get()
        .ok_or_else(|| String::from("resolution should be set"))
}
