use omega_models::{FieldKind, FieldSpec, ModelError, ID_FIELD};
use serde_json::json;

use crate::fixture;
use crate::support::MockBackend;

#[test]
fn fields_properties_and_methods_are_separated() {
    let ns = fixture("schema-tables", MockBackend::new());
    let profile = ns.model("Profile").unwrap();

    assert_eq!(profile.keys(), ["nick".to_string()]);
    assert_eq!(profile.field("bio").unwrap().kind(), FieldKind::Text);
    assert_eq!(
        profile.field("bio").unwrap().spec().options().help.as_deref(),
        Some("Shown on the profile page")
    );
    assert!(profile.field("greeting").is_none());
    assert_eq!(profile.properties().collect::<Vec<_>>(), ["greeting", "draft"]);
    assert_eq!(profile.methods().collect::<Vec<_>>(), ["rename"]);
}

#[test]
fn implicit_id_only_without_declared_keys() {
    let ns = fixture("schema-implicit", MockBackend::new());
    assert_eq!(ns.model("User").unwrap().keys(), [ID_FIELD.to_string()]);
    assert!(ns.model("Membership").unwrap().field(ID_FIELD).is_none());
}

#[test]
fn to_json_includes_properties_but_not_methods() {
    let ns = fixture("schema-json", MockBackend::new());
    let profile = ns.model("Profile").unwrap();

    let mut bob = profile.create(json!({"nick": "bob", "draft": "wip", "rename": "x"}));
    assert_eq!(
        bob.to_json(),
        json!({"nick": "bob", "greeting": "Hello, bob!", "draft": "wip"})
    );

    assert_eq!(bob.call("rename", &[json!("robert")]).unwrap(), json!("robert"));
    assert_eq!(bob.get("greeting"), Some(json!("Hello, robert!")));

    bob.set("greeting", json!("ignored")).unwrap();
    assert_eq!(bob.get("greeting"), Some(json!("Hello, robert!")));
}

#[test]
fn undeclared_attributes_are_rejected() {
    let ns = fixture("schema-frozen", MockBackend::new());
    let mut bob = ns.model("Profile").unwrap().create(json!({"nick": "bob"}));

    assert!(matches!(
        bob.set("avatar", json!("x")),
        Err(ModelError::UnknownAttribute { .. })
    ));
    assert!(matches!(
        bob.call("missing", &[]),
        Err(ModelError::UnknownAttribute { .. })
    ));
}
