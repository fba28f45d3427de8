//! End-to-end tests against the in-memory backend.

#[path = "../support/mod.rs"]
mod support;

use omega_models::{
    fields, Filter, IdStrategy, MemoryBackend, MemoryConfig, ModelError, Namespace, Schema,
};
use serde_json::json;
use support::doc;

fn namespace(backend: MemoryBackend) -> Namespace {
    let ns = Namespace::new("memory");
    ns.backend(backend)
        .define([
            (
                "Event",
                Schema::new()
                    .field("title", fields::string().required().max_length(40))
                    .field("tags", fields::list().of(fields::string()))
                    .field("day", fields::date())
                    .field("starts", fields::datetime())
                    .field("public", fields::boolean())
                    .field("attendance", fields::integer()),
            ),
            (
                "Reading",
                Schema::new()
                    .field("sensor", fields::string().key())
                    .field("at", fields::datetime().key())
                    .field("value", fields::float()),
            ),
            (
                "Member",
                Schema::new()
                    .field("nick", fields::string().required().key())
                    .field("age", fields::integer()),
            ),
        ])
        .unwrap();
    ns
}

#[tokio::test]
async fn store_then_find_one_returns_prepared_fields() {
    let ns = namespace(MemoryBackend::new());
    let event = ns.model("Event").unwrap();

    let mut launch = event.create(json!({
        "title": 2024,
        "tags": ["release", 1],
        "day": 1_709_164_800_000_i64,
        "starts": "2024-02-29T09:30:00+01:00",
        "public": "no",
    }));
    launch.save().await.unwrap();

    let id = launch.get("$id").unwrap();
    let found = event.find_one(id.clone()).await.unwrap().unwrap();
    assert_eq!(
        found.to_json(),
        json!({
            "title": "2024",
            "tags": ["release", "1"],
            "day": "2024-02-29",
            "starts": "2024-02-29T08:30:00.000Z",
            "public": false,
            "$id": id,
        })
    );
}

#[tokio::test]
async fn resaving_updates_in_place() {
    let backend = MemoryBackend::new();
    let ns = namespace(backend.clone());
    let event = ns.model("Event").unwrap();

    let mut meetup = event.create(json!({"title": "meetup", "attendance": 10}));
    meetup.save().await.unwrap();
    meetup.set("attendance", json!(12)).unwrap();
    meetup.save().await.unwrap();

    assert_eq!(backend.count("Event"), 1);
    let all = event.find_all().await.unwrap();
    assert_eq!(all[0].get("attendance"), Some(json!(12)));
}

#[tokio::test]
async fn composite_keys_round_trip() {
    let ns = namespace(MemoryBackend::new());
    let reading = ns.model("Reading").unwrap();

    let mut first = reading.create(json!({"sensor": "t1", "at": 0, "value": 20.5}));
    first.save().await.unwrap();
    assert_eq!(
        first.key(),
        doc(json!({"sensor": "t1", "at": "1970-01-01T00:00:00.000Z"}))
    );

    let found = reading
        .find_one(first.key())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.get("value"), Some(json!(20.5)));

    first.remove().await.unwrap();
    assert!(reading.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn configured_from_json() {
    let config: MemoryConfig =
        serde_json::from_value(json!({"name": "fixtures", "id_strategy": "sequential"})).unwrap();
    assert_eq!(config.id_strategy, IdStrategy::Sequential);

    let backend = MemoryBackend::with_config(config);
    let ns = namespace(backend);
    let event = ns.model("Event").unwrap();

    let mut a = event.create(json!({"title": "a"}));
    let mut b = event.create(json!({"title": "b"}));
    a.save().await.unwrap();
    b.save().await.unwrap();
    assert_eq!(a.get("$id"), Some(json!(1)));
    assert_eq!(b.get("$id"), Some(json!(2)));
    assert_eq!(event.find_one(2_i64).await.unwrap().unwrap().get("title"), Some(json!("b")));
}

#[tokio::test]
async fn validation_failure_stores_nothing() {
    let backend = MemoryBackend::new();
    let ns = namespace(backend.clone());
    let event = ns.model("Event").unwrap();

    let mut long = event.create(json!({"title": "x".repeat(41)}));
    assert!(long.save().await.unwrap_err().is_validation());
    assert_eq!(backend.count("Event"), 0);
    assert_eq!(long.get("$id"), Some(serde_json::Value::Null));
}

#[tokio::test]
async fn renaming_onto_a_taken_key_fails() {
    let backend = MemoryBackend::new();
    let ns = namespace(backend.clone());
    let member = ns.model("Member").unwrap();
    member.create(json!({"nick": "alice", "age": 30})).save().await.unwrap();
    member.create(json!({"nick": "bob", "age": 40})).save().await.unwrap();

    let err = member
        .find_one_and_update("alice", doc(json!({"nick": "bob"})))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Backend { operation: "find_one_and_update", .. }));

    assert_eq!(backend.count("Member"), 2);
    let alice = member.find_one("alice").await.unwrap().unwrap();
    assert_eq!(alice.get("age"), Some(json!(30)));
    let bob = member.find_one("bob").await.unwrap().unwrap();
    assert_eq!(bob.get("age"), Some(json!(40)));
}

#[tokio::test]
async fn update_that_merges_keys_writes_nothing() {
    let backend = MemoryBackend::new();
    let ns = namespace(backend.clone());
    let member = ns.model("Member").unwrap();
    member.create(json!({"nick": "alice", "age": 30})).save().await.unwrap();
    member.create(json!({"nick": "bob", "age": 40})).save().await.unwrap();

    let err = member
        .update(Filter::all(), doc(json!({"nick": "same", "age": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Backend { operation: "update", .. }));

    assert_eq!(backend.count("Member"), 2);
    assert!(member.find_one("same").await.unwrap().is_none());
    assert_eq!(member.find(json!({"age": 1})).await.unwrap().len(), 0);

    // A rename onto a free key still moves the document.
    member
        .update("bob", doc(json!({"nick": "robert"})))
        .await
        .unwrap();
    assert!(member.find_one("bob").await.unwrap().is_none());
    assert_eq!(
        member.find_one("robert").await.unwrap().unwrap().get("age"),
        Some(json!(40))
    );
}
