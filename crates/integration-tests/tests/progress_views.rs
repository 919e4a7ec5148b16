//! Integration tests for the progress views.
//!
//! Fetches enrollment fixtures through the app state and checks that the
//! normalized report matches what the dashboards would render.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use novel_lms_client::AppState;
use novel_lms_core::{ModuleStatus, RoleClass};
use novel_lms_integration_tests::{FakeBackend, enrollment, identity, secret, test_config};

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}

async fn admin_state(backend: Arc<FakeBackend>) -> AppState {
    let state = AppState::with_backend(test_config(), backend);
    state
        .login(&identity("admin@example.com"), &secret("pw"))
        .await
        .unwrap();
    state
}

fn backend_with_admin() -> FakeBackend {
    FakeBackend::new()
        .with_user("admin@example.com", "Ada Min", "pw")
        .with_rpc_role("admin@example.com", RoleClass::Admin)
}

#[tokio::test]
async fn test_member_report_normalizes_mixed_representations() {
    // One fraction, one percentage, one bare row: all land on the 0-100
    // scale.
    let backend = Arc::new(
        backend_with_admin()
            .with_enrollment(
                "learner@example.com",
                enrollment(
                    "rust-basics",
                    Some(ModuleStatus::Completed),
                    Some(1.0),
                    None,
                ),
            )
            .with_enrollment(
                "learner@example.com",
                enrollment(
                    "async-rust",
                    Some(ModuleStatus::InProgress),
                    Some(42.5),
                    None,
                ),
            )
            .with_enrollment("learner@example.com", enrollment("macros", None, None, None)),
    );
    let state = admin_state(Arc::clone(&backend)).await;

    let report = state
        .member_progress(&identity("learner@example.com"))
        .await
        .unwrap();

    assert_eq!(report.modules.len(), 3);
    assert!(close(report.modules[0].percent, 100.0));
    assert!(close(report.modules[1].percent, 42.5));
    assert!(close(report.modules[2].percent, 0.0));

    assert_eq!(report.stats.total_modules, 3);
    assert_eq!(report.stats.completed_modules, 1);
    assert_eq!(report.stats.in_progress_modules, 1);
    assert_eq!(report.stats.not_started_modules, 1);
    assert!(close(report.stats.average_progress, 47.5));
}

#[tokio::test]
async fn test_member_report_prefers_overall_progress() {
    let backend = Arc::new(backend_with_admin().with_enrollment(
        "learner@example.com",
        enrollment(
            "rust-basics",
            Some(ModuleStatus::InProgress),
            Some(0.25),
            Some(0.75),
        ),
    ));
    let state = admin_state(Arc::clone(&backend)).await;

    let report = state
        .member_progress(&identity("learner@example.com"))
        .await
        .unwrap();

    assert!(close(report.modules[0].percent, 75.0));
}

#[tokio::test]
async fn test_completed_module_with_stale_number_is_not_clamped_up() {
    let backend = Arc::new(backend_with_admin().with_enrollment(
        "learner@example.com",
        enrollment(
            "rust-basics",
            Some(ModuleStatus::Completed),
            Some(0.4),
            None,
        ),
    ));
    let state = admin_state(Arc::clone(&backend)).await;

    let report = state
        .member_progress(&identity("learner@example.com"))
        .await
        .unwrap();

    // Completed status counts in the stats, but the number stays honest.
    assert!(close(report.modules[0].percent, 40.0));
    assert_eq!(report.stats.completed_modules, 1);
}

#[tokio::test]
async fn test_member_without_enrollments_reports_empty() {
    let backend = Arc::new(backend_with_admin());
    let state = admin_state(Arc::clone(&backend)).await;

    let report = state
        .member_progress(&identity("learner@example.com"))
        .await
        .unwrap();

    assert!(report.modules.is_empty());
    assert_eq!(report.stats.total_modules, 0);
    assert!(close(report.stats.average_progress, 0.0));
}
