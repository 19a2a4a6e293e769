//! Integration test for the bound-id replace scenario.

mod common;

use cardpost_app::upload_image;
use cardpost_contract::CardResult;
use cardpost_credential::CredentialStore;
use cardpost_render::CardBoard;
use cardpost_upload::EffectiveOutcome;

#[test]
fn replace_flow_tests_patches_rendered_card_and_clears_credential() {
    let transport = common::ScriptedTransport::new(vec![common::ok_response(
        200,
        "c1",
        "/img/c1-2.png",
    )]);
    let mut orchestrator = common::orchestrator_with(&transport);
    let mut store = CredentialStore::new();
    store
        .set_key("k1", Some("c1"))
        .expect("key should be stored");

    let mut board = CardBoard::new();
    board.create_card(
        &CardResult {
            card_id: "c1".to_string(),
            status: "done".to_string(),
            detected_image_url: "/img/c1.png".to_string(),
            scores: None,
            updated_at: None,
            model: None,
        },
        500,
    );

    let outcome = upload_image(
        &mut orchestrator,
        &mut store,
        &mut board,
        &common::small_image(),
        1_000,
    )
    .expect("replace upload should succeed");

    assert_eq!(transport.sent_paths(), vec!["/cards/c1/replace".to_string()]);
    assert_eq!(outcome.effective, EffectiveOutcome::Replaced);

    assert_eq!(board.len(), 1);
    let patched = board.card("c1").expect("card should stay rendered");
    assert!(patched.selected);
    assert_eq!(patched.image_url, "/img/c1-2.png?_=1000");

    assert!(!store.has_key());
}
