//! Integration tests for reference population.

#[path = "../support/mod.rs"]
mod support;

use omega_models::{fields, FieldValue, MemoryBackend, ModelError, Namespace, Schema};
use serde_json::{json, Value};
use support::{doc, MockBackend};

fn schemas() -> Vec<(&'static str, Schema)> {
    vec![
        ("Group", Schema::new().field("name", fields::string().key())),
        (
            "User",
            Schema::new()
                .field("nick", fields::string().required().key())
                .field("friends", fields::ref_list("User"))
                .field("group", fields::reference("Group"))
                .field("mentor", fields::reference("User")),
        ),
    ]
}

async fn seeded() -> Namespace {
    let ns = Namespace::new("populate");
    ns.backend(MemoryBackend::new()).define(schemas()).unwrap();
    let group = ns.model("Group").unwrap();
    let user = ns.model("User").unwrap();

    group.create(json!({"name": "admins"})).save().await.unwrap();
    user.create(json!({"nick": "carol", "group": {"name": "admins"}}))
        .save()
        .await
        .unwrap();
    user.create(json!({"nick": "bob", "mentor": {"nick": "carol"}}))
        .save()
        .await
        .unwrap();
    user.create(json!({
        "nick": "alice",
        "friends": [{"nick": "bob"}, {"nick": "carol"}],
        "group": {"name": "admins"},
    }))
    .save()
    .await
    .unwrap();
    ns
}

#[tokio::test]
async fn populate_then_depopulate_round_trips() {
    let ns = seeded().await;
    let mut alice = ns.model("User").unwrap().find_one("alice").await.unwrap().unwrap();
    let stored = alice.to_json();

    alice.populate(false).await.unwrap();

    let group = alice.field("group").and_then(FieldValue::as_instance).unwrap();
    assert_eq!(group.get("name"), Some(json!("admins")));

    let friends = alice.field("friends").and_then(FieldValue::as_list).unwrap();
    let nicks: Vec<Value> = friends
        .iter()
        .map(|friend| friend.as_instance().unwrap().get("nick").unwrap())
        .collect();
    assert_eq!(nicks, [json!("bob"), json!("carol")]);

    // Shallow: bob's mentor is still a key.
    assert_eq!(
        alice.to_json()["friends"][0]["mentor"],
        json!({"nick": "carol"})
    );

    alice.depopulate();
    assert_eq!(alice.to_json(), stored);
}

#[tokio::test]
async fn depopulate_is_idempotent() {
    let ns = seeded().await;
    let mut alice = ns.model("User").unwrap().find_one("alice").await.unwrap().unwrap();
    alice.populate(true).await.unwrap();

    alice.depopulate();
    let once = alice.to_json();
    alice.depopulate();
    assert_eq!(alice.to_json(), once);
}

#[tokio::test]
async fn recursive_populate_resolves_nested_references() {
    let ns = seeded().await;
    let mut alice = ns.model("User").unwrap().find_one("alice").await.unwrap().unwrap();
    alice.populate(true).await.unwrap();

    let projected = alice.to_json();
    assert_eq!(projected["friends"][0]["mentor"]["nick"], json!("carol"));
    assert_eq!(
        projected["friends"][0]["mentor"]["group"],
        json!({"name": "admins"})
    );
}

#[tokio::test]
async fn populated_references_save_as_keys() {
    let ns = seeded().await;
    let user = ns.model("User").unwrap();
    let mut alice = user.find_one("alice").await.unwrap().unwrap();
    alice.populate(false).await.unwrap();

    let admins = alice.field("group").and_then(FieldValue::as_instance).cloned().unwrap();
    let mut dave = user.create(json!({"nick": "dave"}));
    dave.set("group", admins).unwrap();
    dave.set("friends", vec![alice.clone()]).unwrap();
    dave.save().await.unwrap();

    let stored = user.find_one("dave").await.unwrap().unwrap();
    assert_eq!(stored.get("group"), Some(json!({"name": "admins"})));
    assert_eq!(stored.get("friends"), Some(json!([{"nick": "alice"}])));
}

#[tokio::test]
async fn missing_and_empty_keys_are_left_alone() {
    let ns = seeded().await;
    let user = ns.model("User").unwrap();
    let mut erin = user.create(json!({
        "nick": "erin",
        "friends": [{"nick": "ghost"}, {"nick": "bob"}],
        "group": {},
    }));

    erin.populate(false).await.unwrap();

    let friends = erin.field("friends").and_then(FieldValue::as_list).unwrap();
    assert_eq!(friends[0].as_value(), Some(&json!({"nick": "ghost"})));
    assert!(friends[1].as_instance().is_some());
    assert_eq!(erin.get("group"), Some(json!({})));
    assert_eq!(erin.get("mentor"), Some(Value::Null));
}

#[tokio::test]
async fn first_failure_stops_later_fields() {
    let backend = MockBackend::new()
        .with_document("User", doc(json!({"nick": "bob"})))
        .failing_on("Group");
    let ns = Namespace::new("populate-failure");
    ns.backend(backend.clone()).define(schemas()).unwrap();

    let mut alice = ns.model("User").unwrap().create(json!({
        "nick": "alice",
        "friends": [{"nick": "bob"}],
        "group": {"name": "admins"},
        "mentor": {"nick": "bob"},
    }));

    let err = alice.populate(false).await.unwrap_err();
    assert!(matches!(err, ModelError::Backend { operation: "find", .. }));

    // Earlier field resolved, failing field kept its key, later field untouched.
    assert!(alice.field("friends").and_then(FieldValue::as_list).unwrap()[0]
        .as_instance()
        .is_some());
    assert_eq!(alice.get("group"), Some(json!({"name": "admins"})));
    assert!(alice.field("mentor").and_then(FieldValue::as_instance).is_none());
    assert_eq!(backend.finds(), 2);
}

#[tokio::test]
async fn undefined_target_model_is_reported() {
    let ns = Namespace::new("populate-undefined");
    ns.backend(MemoryBackend::new())
        .define([(
            "Post",
            Schema::new().field("author", fields::reference("Writer")),
        )])
        .unwrap();

    let mut post = ns.model("Post").unwrap().create(json!({"author": {"id": 1}}));
    let err = post.populate(false).await.unwrap_err();
    assert!(matches!(err, ModelError::Definition(_)));
}

#[tokio::test]
async fn recursive_populate_stops_at_reference_cycles() {
    let ns = Namespace::new("populate-cycle");
    ns.backend(MemoryBackend::new()).define(schemas()).unwrap();
    let user = ns.model("User").unwrap();

    user.create(json!({"nick": "alice", "mentor": {"nick": "bob"}}))
        .save()
        .await
        .unwrap();
    user.create(json!({"nick": "bob", "mentor": {"nick": "alice"}}))
        .save()
        .await
        .unwrap();

    let mut alice = user.find_one("alice").await.unwrap().unwrap();
    alice.populate(true).await.unwrap();

    let projected = alice.to_json();
    assert_eq!(projected["mentor"]["nick"], json!("bob"));
    assert_eq!(projected["mentor"]["mentor"]["nick"], json!("alice"));
    assert_eq!(projected["mentor"]["mentor"]["mentor"], json!({"nick": "bob"}));

    alice.depopulate();
    assert_eq!(alice.get("mentor"), Some(json!({"nick": "bob"})));
}
