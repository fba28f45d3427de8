use std::sync::Arc;

use omega_models::{ModelError, Reason};
use serde_json::{json, Value};

use crate::fixture;
use crate::support::{doc, Call, MockBackend};

#[tokio::test]
async fn required_nick_blocks_save() {
    let backend = MockBackend::new();
    let ns = fixture("lifecycle-required", backend.clone());
    let user = ns.model("User").unwrap();

    let mut nameless = user.create(json!({"age": 20}));
    let err = nameless.save().await.unwrap_err();
    match err {
        ModelError::Validation(err) => {
            assert_eq!(err.field, "nick");
            assert_eq!(err.reason, Reason::Required);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(backend.calls().is_empty());
    assert_eq!(nameless.to_json(), json!({"age": 20}));

    nameless.set("nick", json!("Foo!")).unwrap();
    nameless.save().await.unwrap();
    let (model, prepared) = backend.last_store().unwrap();
    assert_eq!(model, "User");
    assert_eq!(
        Value::Object(prepared),
        json!({"nick": "Foo!", "age": 20, "admin": false})
    );
}

#[tokio::test]
async fn validators_and_bounds_surface_as_validation_errors() {
    let backend = MockBackend::new();
    let ns = fixture("lifecycle-validators", backend.clone());
    let user = ns.model("User").unwrap();

    let mut bad_email = user.create(json!({"nick": "a", "email": "nope"}));
    let err = bad_email.save().await.unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("email"));

    let mut too_young = user.create(json!({"nick": "a", "age": 5}));
    assert!(too_young.save().await.unwrap_err().is_validation());

    let mut fine = user.create(json!({"nick": "a", "email": "a@b.io", "age": "13"}));
    fine.save().await.unwrap();
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn composite_key_is_derived_from_key_fields() {
    let backend = MockBackend::new();
    let ns = fixture("lifecycle-composite", backend.clone());
    let membership = ns.model("Membership").unwrap();

    let mut alice_admins = membership.create(json!({"user": "alice", "group": "admins"}));
    assert_eq!(
        Value::Object(alice_admins.key()),
        json!({"user": "alice", "group": "admins"})
    );

    alice_admins.set("group", json!("staff")).unwrap();
    assert_eq!(
        Value::Object(alice_admins.key()),
        json!({"user": "alice", "group": "staff"})
    );

    alice_admins.remove().await.unwrap();
    assert_eq!(
        backend.last_removed(),
        Some((
            "Membership".to_string(),
            doc(json!({"user": "alice", "group": "staff"}))
        ))
    );
}

#[tokio::test]
async fn implicit_key_is_filled_after_save() {
    let backend = MockBackend::new().replying(doc(json!({"$id": "generated-1"})));
    let ns = fixture("lifecycle-implicit", backend.clone());
    let user = ns.model("User").unwrap();

    let mut alice = user.create(json!({"nick": "alice"}));
    assert_eq!(alice.key(), doc(json!({"$id": null})));

    alice.save().await.unwrap();
    assert_eq!(alice.key(), doc(json!({"$id": "generated-1"})));
    assert_eq!(alice.get("$id"), Some(json!("generated-1")));

    let (_, prepared) = backend.last_store().unwrap();
    assert!(!prepared.contains_key("$id"));
}

#[tokio::test]
async fn instance_backend_overrides_the_namespace() {
    let shared = MockBackend::new();
    let own = MockBackend::new();
    let ns = fixture("lifecycle-override", shared.clone());
    let user = ns.model("User").unwrap();

    let mut alice = user.create_with_backend(json!({"nick": "alice"}), Arc::new(own.clone()));
    alice.save().await.unwrap();
    alice.remove().await.unwrap();

    assert!(shared.calls().is_empty());
    assert_eq!(own.calls().len(), 2);
}

#[tokio::test]
async fn static_queries_normalize_filters() {
    let backend = MockBackend::new()
        .with_document("Membership", doc(json!({"user": "alice", "group": "admins"})));
    let ns = fixture("lifecycle-queries", backend.clone());
    let membership = ns.model("Membership").unwrap();
    let profile = ns.model("Profile").unwrap();

    assert!(membership.find_one("alice").await.unwrap().is_none());
    profile.find_one("bob").await.unwrap();
    profile.remove("bob").await.unwrap();
    profile
        .update(json!({"bio": ""}), doc(json!({"bio": "tbd"})))
        .await
        .unwrap();

    let found = membership.find(json!({"group": "admins"})).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("role"), Some(Value::Null));

    let calls = backend.calls();
    assert_eq!(
        calls[0],
        Call::Find {
            model: "Membership".into(),
            filter: doc(json!({"id": "alice"}))
        }
    );
    assert_eq!(
        calls[1],
        Call::Find {
            model: "Profile".into(),
            filter: doc(json!({"nick": "bob"}))
        }
    );
    assert_eq!(
        calls[2],
        Call::Remove {
            model: "Profile".into(),
            filter: doc(json!({"nick": "bob"}))
        }
    );
    assert_eq!(
        calls[3],
        Call::Update {
            model: "Profile".into(),
            filter: doc(json!({"bio": ""})),
            update: doc(json!({"bio": "tbd"}))
        }
    );
}

#[tokio::test]
async fn map_reduce_is_not_implemented_by_default() {
    let ns = fixture("lifecycle-map-reduce", MockBackend::new());
    let user = ns.model("User").unwrap();
    let err = user
        .map_reduce(|_| json!(1), |a, _| a)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::NotImplemented {
            operation: "map_reduce",
            ..
        }
    ));
}

#[tokio::test]
async fn connect_reaches_the_backend() {
    let backend = MockBackend::new();
    let ns = fixture("lifecycle-connect", backend.clone());
    ns.connect().await.unwrap();
    assert_eq!(backend.calls(), [Call::Connect]);
}
