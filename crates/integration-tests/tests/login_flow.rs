//! Integration tests for the session gate.
//!
//! Drives the real gate and resolver against the in-memory backend to pin
//! the state machine: redirect selection, double-submit suppression, full
//! reversion on failure, and the benign post-logout probe.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use novel_lms_client::{AppState, AuthError, LoginOutcome, SessionState};
use novel_lms_core::{RoleClass, Route};
use novel_lms_integration_tests::{FakeBackend, identity, secret, test_config};

// =============================================================================
// Redirect Selection
// =============================================================================

#[tokio::test]
async fn test_content_editor_lands_on_modules() {
    // The editor appears only in the content-editor list; the backend has
    // no permissions RPC, so classification scans the membership lists.
    let backend = Arc::new(
        FakeBackend::new()
            .with_user("editor@example.com", "Edie Tor", "pw")
            .without_permissions_rpc()
            .with_list_role("editor@example.com", RoleClass::ContentEditor),
    );
    let state = AppState::with_backend(test_config(), backend.clone());

    let outcome = state
        .login(&identity("editor@example.com"), &secret("pw"))
        .await
        .unwrap();

    match outcome {
        LoginOutcome::SignedIn {
            role, destination, ..
        } => {
            assert_eq!(role, RoleClass::ContentEditor);
            assert_eq!(destination, Route::Modules);
        }
        other => panic!("expected SignedIn, got {other:?}"),
    }
    assert_eq!(backend.role_list_calls(), 1);
    assert!(matches!(
        state.session().current_state(),
        SessionState::Authenticated { .. }
    ));
}

#[tokio::test]
async fn test_rpc_role_wins_over_membership_lists() {
    // The RPC is authoritative: it says admin even though the lists only
    // know the user as a student.
    let backend = Arc::new(
        FakeBackend::new()
            .with_user("boss@example.com", "Boss", "pw")
            .with_rpc_role("boss@example.com", RoleClass::Admin)
            .with_list_role("boss@example.com", RoleClass::Student),
    );
    let state = AppState::with_backend(test_config(), backend.clone());

    let outcome = state
        .login(&identity("boss@example.com"), &secret("pw"))
        .await
        .unwrap();

    match outcome {
        LoginOutcome::SignedIn { destination, .. } => assert_eq!(destination, Route::Home),
        other => panic!("expected SignedIn, got {other:?}"),
    }
    assert_eq!(backend.role_list_calls(), 0);
}

#[tokio::test]
async fn test_student_and_team_lead_land_on_learner_dashboard() {
    for (user, role) in [
        ("learner@example.com", RoleClass::Student),
        ("lead@example.com", RoleClass::TeamLead),
    ] {
        let backend = Arc::new(
            FakeBackend::new()
                .with_user(user, "Person", "pw")
                .with_rpc_role(user, role),
        );
        let state = AppState::with_backend(test_config(), backend);

        let outcome = state.login(&identity(user), &secret("pw")).await.unwrap();
        match outcome {
            LoginOutcome::SignedIn { destination, .. } => {
                assert_eq!(destination, Route::LearnerDashboard);
            }
            other => panic!("expected SignedIn, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_no_role_returns_to_login_with_notice() {
    // Valid credentials, but the user is in no list and the RPC has no
    // answer: back to the login screen, session torn down.
    let backend = Arc::new(FakeBackend::new().with_user("norole@example.com", "No Role", "pw"));
    let state = AppState::with_backend(test_config(), backend.clone());

    let outcome = state
        .login(&identity("norole@example.com"), &secret("pw"))
        .await
        .unwrap();

    match outcome {
        LoginOutcome::InsufficientPermissions {
            notice,
            destination,
        } => {
            assert!(notice.contains("permission"));
            assert_eq!(destination, Route::Login);
        }
        other => panic!("expected InsufficientPermissions, got {other:?}"),
    }
    assert_eq!(state.session().current_state(), SessionState::Anonymous);
    assert!(backend.logged_session().is_none());
}

// =============================================================================
// Double Submit
// =============================================================================

#[tokio::test]
async fn test_double_submit_triggers_one_login_call() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_user("learner@example.com", "L", "pw")
            .with_rpc_role("learner@example.com", RoleClass::Student)
            .with_login_delay(Duration::from_millis(100)),
    );
    let state = AppState::with_backend(test_config(), backend.clone());

    let first = {
        let state = state.clone();
        tokio::spawn(async move {
            state
                .login(&identity("learner@example.com"), &secret("pw"))
                .await
        })
    };

    // Give the first submit time to reach the backend and stall there.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(state.session().is_busy());

    let second = state
        .login(&identity("learner@example.com"), &secret("pw"))
        .await
        .unwrap();
    assert!(matches!(second, LoginOutcome::AlreadyPending));

    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, LoginOutcome::SignedIn { .. }));
    assert_eq!(backend.login_calls(), 1);
}

// =============================================================================
// Failure Reversion
// =============================================================================

#[tokio::test]
async fn test_invalid_credentials_reenable_the_form() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_user("learner@example.com", "L", "right-pw")
            .with_rpc_role("learner@example.com", RoleClass::Student),
    );
    let state = AppState::with_backend(test_config(), backend.clone());

    let err = state
        .login(&identity("learner@example.com"), &secret("wrong-pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials(_)));

    // The form is interactive again and a corrected retry goes through.
    assert!(!state.session().is_busy());
    assert!(matches!(
        state.session().current_state(),
        SessionState::Error { .. }
    ));

    let outcome = state
        .login(&identity("learner@example.com"), &secret("right-pw"))
        .await
        .unwrap();
    assert!(matches!(outcome, LoginOutcome::SignedIn { .. }));
}

#[tokio::test]
async fn test_permission_failure_reverts_the_session() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_user("learner@example.com", "L", "pw")
            .with_rpc_role("learner@example.com", RoleClass::Student),
    );
    backend.set_permissions_failing(true);
    let state = AppState::with_backend(test_config(), backend.clone());

    let err = state
        .login(&identity("learner@example.com"), &secret("pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PermissionResolution(_)));

    // No half-authenticated limbo: the fresh session was torn down and the
    // form is interactive again.
    assert!(backend.logged_session().is_none());
    assert!(!state.session().is_busy());

    // The failure was not cached; a retry resolves and signs in.
    backend.set_permissions_failing(false);
    let outcome = state
        .login(&identity("learner@example.com"), &secret("pw"))
        .await
        .unwrap();
    assert!(matches!(outcome, LoginOutcome::SignedIn { .. }));
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_clears_session_and_history() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_user("learner@example.com", "L", "pw")
            .with_rpc_role("learner@example.com", RoleClass::Student),
    );
    let state = AppState::with_backend(test_config(), backend.clone());

    state
        .login(&identity("learner@example.com"), &secret("pw"))
        .await
        .unwrap();
    assert_eq!(state.history_snapshot().len(), 1);

    state.logout().await.unwrap();

    assert_eq!(state.session().current_state(), SessionState::Anonymous);
    assert!(backend.logged_session().is_none());
    assert!(state.history_snapshot().is_empty());
}

#[tokio::test]
async fn test_post_logout_probe_failure_is_benign() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_user("learner@example.com", "L", "pw")
            .with_rpc_role("learner@example.com", RoleClass::Student),
    );
    let state = AppState::with_backend(test_config(), backend.clone());

    state
        .login(&identity("learner@example.com"), &secret("pw"))
        .await
        .unwrap();
    state.logout().await.unwrap();

    // The backend errors on the logged-user probe now that the session is
    // gone; with no current user expected that is swallowed, not surfaced.
    let refreshed = state.session().refresh_current_user().await.unwrap();
    assert!(refreshed.is_none());
    assert_eq!(backend.probe_calls(), 1);
}

#[tokio::test]
async fn test_probe_mismatch_invalidates_the_session() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_user("learner@example.com", "L", "pw")
            .with_rpc_role("learner@example.com", RoleClass::Student),
    );
    let state = AppState::with_backend(test_config(), backend.clone());

    state
        .login(&identity("learner@example.com"), &secret("pw"))
        .await
        .unwrap();

    // The backend session evaporates out from under the client.
    backend.drop_session();

    let err = state.session().refresh_current_user().await.unwrap_err();
    assert!(matches!(err, AuthError::SessionInvalidated));
    assert_eq!(state.session().current_state(), SessionState::Anonymous);
}
