#![allow(clippy::unwrap_used)]
// Integration tests for live queries against the embedded store.

use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::{Value, json};
use tokio_stream::StreamExt;

use dishpatch_core::console::collections;
use dishpatch_core::{Console, MenuCategory, QueryError, User, UserStatus};
use dishpatch_services::{Fields, MemoryDocumentStore, RuleOperation};

// ── Helpers ─────────────────────────────────────────────────────────

fn fields_of<T: Serialize>(record: &T) -> Fields {
    let mut map = match serde_json::to_value(record).unwrap() {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    };
    // The store injects the id from the document path.
    map.remove("id");
    map
}

fn sample_category(id: &str, name: &str) -> MenuCategory {
    MenuCategory {
        id: id.to_owned(),
        name: name.to_owned(),
        description: format!("{name} dishes, all day."),
        image_url: format!("https://img.example.com/{id}.png"),
        data_ai_hint: None,
    }
}

fn sample_user(id: &str, name: &str) -> User {
    User {
        id: id.to_owned(),
        name: name.to_owned(),
        email: format!("{id}@example.com"),
        avatar_url: format!("https://img.example.com/{id}.png"),
        data_ai_hint: "portrait".to_owned(),
        date_joined: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
        last_order: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
        status: UserStatus::Active,
        address: "12 Analytical Way".to_owned(),
        favorites: 4,
        promo_codes: 2,
        support_tickets: 0,
        activity_summary: "Orders weekly.".to_owned(),
    }
}

fn console_over(store: &MemoryDocumentStore) -> Console {
    Console::new(Arc::new(store.clone()))
}

// ── Ordered delivery ────────────────────────────────────────────────

#[tokio::test]
async fn test_collection_mirrors_every_mutation_in_order() {
    let store = MemoryDocumentStore::new();
    let console = console_over(&store);
    let mut categories = console.menu_categories();

    assert!(categories.changed().await.unwrap().data().unwrap().is_empty());

    let breakfast = sample_category("c1", "Breakfast");
    let lunch = sample_category("c2", "Lunch");
    store
        .upsert("menu_categories/c1", fields_of(&breakfast))
        .unwrap();
    store
        .upsert("menu_categories/c2", fields_of(&lunch))
        .unwrap();
    store.remove("menu_categories/c1").unwrap();

    // One snapshot per mutation, in publish order, nothing coalesced.
    let mut names: Vec<Vec<String>> = Vec::new();
    for _ in 0..3 {
        let state = categories.changed().await.unwrap();
        names.push(
            state
                .data()
                .unwrap()
                .iter()
                .map(|c| c.name.clone())
                .collect(),
        );
    }

    assert_eq!(
        names,
        vec![
            vec!["Breakfast".to_owned()],
            vec!["Breakfast".to_owned(), "Lunch".to_owned()],
            vec!["Lunch".to_owned()],
        ]
    );
}

// ── Teardown ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_closed_query_never_delivers() {
    let store = MemoryDocumentStore::new();
    let console = console_over(&store);
    let mut users = console.users();

    store
        .upsert("users/u1", fields_of(&sample_user("u1", "Ada")))
        .unwrap();
    users.close();

    assert!(users.changed().await.is_none());
    assert_eq!(store.collection_subscriber_count(), 0);
}

#[tokio::test]
async fn test_rebind_tears_down_before_resubscribing() {
    let store = MemoryDocumentStore::new();
    store
        .upsert("users/u1", fields_of(&sample_user("u1", "Ada")))
        .unwrap();

    let console = console_over(&store);
    let mut query = console.collection::<User>(collections::USERS);
    assert_eq!(query.changed().await.unwrap().data().unwrap().len(), 1);

    query.rebind(&store, "users_archive");
    assert!(query.state().is_loading());

    // A mutation on the old path must not reach the rebound handle.
    store
        .upsert("users/u2", fields_of(&sample_user("u2", "Grace")))
        .unwrap();

    let state = query.changed().await.unwrap();
    assert!(state.data().unwrap().is_empty());
    assert_eq!(query.path(), "users_archive");
}

// ── Error handling ──────────────────────────────────────────────────

#[tokio::test]
async fn test_document_query_reports_missing_then_recovers() {
    let store = MemoryDocumentStore::new();
    let console = console_over(&store);
    let mut user = console.user("u1");

    assert_eq!(
        user.changed().await.unwrap().error(),
        Some(&QueryError::DocumentNotFound {
            path: "users/u1".to_owned()
        })
    );

    store
        .upsert("users/u1", fields_of(&sample_user("u1", "Ada")))
        .unwrap();
    let state = user.changed().await.unwrap();
    assert_eq!(state.data().unwrap().name, "Ada");

    store.remove("users/u1").unwrap();
    assert!(matches!(
        user.changed().await.unwrap().error(),
        Some(QueryError::DocumentNotFound { .. })
    ));
}

#[tokio::test]
async fn test_permission_revocation_ends_the_query() {
    let store = MemoryDocumentStore::new();
    let console = console_over(&store);
    let mut users = console.users();
    assert!(users.changed().await.unwrap().is_ready());

    store.deny(collections::USERS);

    let state = users.changed().await.unwrap();
    match state.error().unwrap() {
        QueryError::PermissionDenied(context) => {
            assert_eq!(context.path, "users");
            assert_eq!(context.operation, RuleOperation::List);
        }
        other => panic!("expected permission denial, got {other:?}"),
    }

    assert!(users.changed().await.is_none());
    assert!(users.is_closed());
}

#[tokio::test]
async fn test_decode_failure_ends_the_query() {
    let store = MemoryDocumentStore::new();
    let fields = match json!({ "name": 42 }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    };
    store.upsert("users/u1", fields).unwrap();

    let console = console_over(&store);
    let mut users = console.users();

    let state = users.changed().await.unwrap();
    assert!(matches!(state.error(), Some(QueryError::Decode { .. })));
    assert!(users.changed().await.is_none());
}

#[tokio::test]
async fn test_invalid_path_surfaces_on_the_handle() {
    let store = MemoryDocumentStore::new();
    let console = console_over(&store);

    let mut query = console.collection::<MenuCategory>("menu_categories/c1");
    assert!(matches!(
        query.changed().await.unwrap().error(),
        Some(QueryError::InvalidPath { .. })
    ));
    assert!(query.changed().await.is_none());
}

// ── Stream adapter ──────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_adapter_yields_each_state() {
    let store = MemoryDocumentStore::new();
    let console = console_over(&store);
    let mut stream = console.menu_categories().into_stream();

    assert!(stream.next().await.unwrap().data().unwrap().is_empty());

    store
        .upsert(
            "menu_categories/c1",
            fields_of(&sample_category("c1", "Breakfast")),
        )
        .unwrap();
    let state = stream.next().await.unwrap();
    assert_eq!(state.data().unwrap().len(), 1);

    stream.get_mut().close();
    assert!(stream.next().await.is_none());
}
