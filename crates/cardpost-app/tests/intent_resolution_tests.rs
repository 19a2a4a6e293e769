//! Integration tests for upload intent resolution from credential state.

mod common;

use cardpost_app::upload_image;
use cardpost_credential::CredentialStore;
use cardpost_render::CardBoard;

#[test]
fn intent_resolution_tests_empty_store_issues_create() {
    let transport = common::ScriptedTransport::new(vec![common::ok_response(
        201,
        "c1",
        "/img/c1.png",
    )]);
    let mut orchestrator = common::orchestrator_with(&transport);
    let mut store = CredentialStore::new();
    let mut board = CardBoard::new();

    upload_image(
        &mut orchestrator,
        &mut store,
        &mut board,
        &common::small_image(),
        1_000,
    )
    .expect("create upload should succeed");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url.path(), "/cards");
    assert!(sent[0].api_key.is_none());
}

#[test]
fn intent_resolution_tests_key_without_id_targets_key_only_replace() {
    let transport = common::ScriptedTransport::new(vec![common::ok_response(
        200,
        "c1",
        "/img/c1.png",
    )]);
    let mut orchestrator = common::orchestrator_with(&transport);
    let mut store = CredentialStore::new();
    store
        .set_key("k1", None::<String>)
        .expect("key should be stored");
    let mut board = CardBoard::new();

    upload_image(
        &mut orchestrator,
        &mut store,
        &mut board,
        &common::small_image(),
        1_000,
    )
    .expect("replace upload should succeed");

    let sent = transport.sent();
    assert_eq!(sent[0].url.path(), "/cards/replace");
    assert_eq!(sent[0].api_key.as_deref(), Some("k1"));
}

#[test]
fn intent_resolution_tests_bound_id_lands_in_path() {
    let transport = common::ScriptedTransport::new(vec![common::ok_response(
        200,
        "c1",
        "/img/c1.png",
    )]);
    let mut orchestrator = common::orchestrator_with(&transport);
    let mut store = CredentialStore::new();
    store
        .set_key("k1", Some("c1"))
        .expect("key should be stored");
    let mut board = CardBoard::new();

    upload_image(
        &mut orchestrator,
        &mut store,
        &mut board,
        &common::small_image(),
        1_000,
    )
    .expect("replace upload should succeed");

    let sent = transport.sent();
    assert_eq!(sent[0].url.path(), "/cards/c1/replace");
    assert_eq!(sent[0].api_key.as_deref(), Some("k1"));
}
