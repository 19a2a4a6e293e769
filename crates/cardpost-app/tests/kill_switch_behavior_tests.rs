//! Integration tests for the runtime uploads kill switch.

mod common;

use cardpost_app::{AppError, upload_image, uploads_enabled_from_env};
use cardpost_credential::CredentialStore;
use cardpost_render::CardBoard;

#[test]
fn kill_switch_behavior_tests_disables_uploads_when_env_is_false() {
    // Safety:
    // - Integration tests mutate process env in a single-threaded test body.
    // - We reset the variable before returning.
    unsafe { std::env::set_var("CARDPOST_UPLOADS_ENABLED", "false") };
    assert!(!uploads_enabled_from_env());

    let transport = common::ScriptedTransport::new(vec![]);
    let mut orchestrator = common::orchestrator_with(&transport);
    let mut store = CredentialStore::new();
    let mut board = CardBoard::new();

    let error = upload_image(
        &mut orchestrator,
        &mut store,
        &mut board,
        &common::small_image(),
        1_000,
    )
    .expect_err("disabled uploads must be rejected");
    assert!(matches!(error, AppError::UploadsDisabled));
    assert!(transport.sent().is_empty());

    // Safety: see rationale above.
    unsafe { std::env::set_var("CARDPOST_UPLOADS_ENABLED", "true") };
    assert!(uploads_enabled_from_env());

    // Safety: see rationale above.
    unsafe { std::env::remove_var("CARDPOST_UPLOADS_ENABLED") };
    assert!(uploads_enabled_from_env());
}
