//! Public-surface tests for pagination builders and dispatch policy.

use std::sync::Arc;

use twilight_http::Client;
use twilight_model::channel::message::component::{Button, ButtonStyle};
use twilight_model::id::Id;
use twilight_standby::Standby;

use rusty_pagination::{
    ButtonPagination, ControllerAction, PageResolvable, PaginationContext, PaginationError,
    PaginationTrigger, SendAs, SendOptions, next_index, passes_author_filter, resolve_pages,
    resolve_static_pages,
};

fn offline_context() -> PaginationContext {
    PaginationContext::new(
        Arc::new(Client::new("token".to_owned())),
        Arc::new(Standby::new()),
    )
}

fn interaction_trigger() -> PaginationTrigger {
    PaginationTrigger::Interaction(rusty_pagination::InteractionTrigger {
        id: Id::new(1),
        application_id: Id::new(2),
        token: "interaction-token".to_owned(),
        channel_id: Some(Id::new(3)),
        user_id: Some(Id::new(4)),
        acknowledged: false,
    })
}

fn nav_button(custom_id: &str) -> Button {
    Button {
        id: None,
        custom_id: Some(custom_id.to_owned()),
        disabled: false,
        emoji: None,
        label: Some(custom_id.to_owned()),
        style: ButtonStyle::Secondary,
        url: None,
        sku_id: None,
    }
}

#[tokio::test]
async fn mixed_page_inputs_resolve_in_order() {
    let pages = resolve_static_pages([
        PageResolvable::from("plain text"),
        PageResolvable::dynamic(|| async { Ok(PageResolvable::from("deferred")) }),
    ]);

    let resolved = resolve_pages(&pages).await.expect("resolution");

    assert_eq!(resolved[0].content.as_deref(), Some("plain text"));
    assert_eq!(resolved[1].content.as_deref(), Some("deferred"));
}

#[tokio::test]
async fn button_send_without_pages_fails() {
    let err = ButtonPagination::new()
        .add_button(nav_button("pages:next"), ControllerAction::NextPage)
        .send(
            offline_context(),
            SendOptions::new(interaction_trigger(), SendAs::ReplyMessage),
        )
        .await
        .expect_err("no pages");

    assert!(matches!(err, PaginationError::NoPages));
}

#[tokio::test]
async fn exported_options_rebuild_an_equivalent_unsent_builder() {
    let exported = ButtonPagination::new()
        .pages(["one".into(), "two".into(), "three".into()])
        .author_id(Id::new(9))
        .add_button(nav_button("pages:next"), ControllerAction::NextPage)
        .to_options();

    let rebuilt = ButtonPagination::from_options(exported);

    assert_eq!(rebuilt.current_page_index(), 0);
    let page = rebuilt.get_page(2).await.expect("resolution").expect("page");
    assert_eq!(page.content.as_deref(), Some("three"));
    assert!(rebuilt.get_page(3).await.expect("resolution").is_none());
}

#[test]
fn author_restricted_dispatch_ignores_other_users() {
    let owner = Some(Id::new(1));
    let intruder = Some(Id::new(2));
    let mut index = 0_usize;
    let page_count = 3_usize;

    // A "next" activation from another user is dropped before dispatch.
    if passes_author_filter(true, owner, intruder) {
        index = next_index(index, page_count);
    }
    assert_eq!(index, 0);

    // The same activation from the owner advances the cursor.
    if passes_author_filter(true, owner, owner) {
        index = ControllerAction::NextPage
            .target_index(index, page_count)
            .expect("navigation action");
    }
    assert_eq!(index, 1);
}
