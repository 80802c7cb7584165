use bpr_data::model::attribute::{Attribute, Field, Method, Property};
use bpr_data::model::history::HistoryAction;
use bpr_data::model::modeling::Model;
use bpr_data::{Discriminated, Mapping, ObjectId, Record, RecordError};
use serde_json::{json, Value};

fn mapping(value: Value) -> Mapping {
    value.as_object().cloned().unwrap()
}

fn field_mapping(name: &str) -> Value {
    json!({
        "kind": "field",
        "_id": ObjectId::new().to_hex(),
        "name": name,
        "type": "int",
        "accessModifier": "private"
    })
}

#[test]
fn field_kind_resolves_to_field_shape() {
    let attribute = Attribute::resolve(&mapping(field_mapping("age")), false).unwrap();
    match &attribute {
        Attribute::Field(field) => assert_eq!(field.name.as_deref(), Some("age")),
        other => panic!("expected a field, got {other:?}"),
    }
    assert_eq!(attribute.tag(), Field::KIND);
    assert_eq!(attribute.as_mapping().unwrap()["kind"], json!("field"));
}

#[test]
fn method_kind_resolves_from_text() {
    let text = r#"{
        "kind": "method",
        "_id": null,
        "name": "area",
        "type": "float",
        "accessModifier": "public",
        "parameters": [{ "name": "scale", "type": "float" }]
    }"#;
    let attribute = Attribute::resolve_text(text).unwrap();
    assert_eq!(attribute.tag(), Method::KIND);
    let Attribute::Method(method) = attribute else {
        panic!("expected a method");
    };
    assert_eq!(method.parameters.unwrap().len(), 1);
}

#[test]
fn unknown_attribute_kind_falls_back_to_property() {
    let attribute = Attribute::resolve(
        &mapping(json!({ "kind": "unknownvalue", "_id": null, "value": { "x": 1 } })),
        false,
    )
    .unwrap();
    let Attribute::Property(property) = &attribute else {
        panic!("expected the catch-all property, got {attribute:?}");
    };
    assert_eq!(property.kind.as_deref(), Some("unknownvalue"));
    assert_eq!(attribute.tag(), "unknownvalue");
}

#[test]
fn property_fills_missing_fields_with_null() {
    let property = Property::from_mapping(&mapping(json!({ "_id": null, "value": 1 })), true).unwrap();
    assert_eq!(property.kind, None);
    assert_eq!(property.value, json!(1));

    let empty = Property::from_mapping(&Mapping::new(), true).unwrap();
    assert_eq!(empty.value, Value::Null);
    assert_eq!(Attribute::Property(empty).tag(), "");
}

#[test]
fn unknown_history_action_is_rejected() {
    let err = HistoryAction::resolve(&mapping(json!({ "action": "renameModel" })), true).unwrap_err();
    assert!(matches!(
        err,
        RecordError::UnknownVariant { family: "HistoryAction", ref value } if value == "renameModel"
    ));
}

#[test]
fn missing_or_non_text_discriminator_is_reported() {
    assert!(matches!(
        HistoryAction::resolve(&mapping(json!({ "timestamp": "t" })), true),
        Err(RecordError::MissingDiscriminator {
            discriminator: "action",
            ..
        })
    ));
    assert!(matches!(
        Attribute::resolve(&mapping(json!({ "kind": 3 })), true),
        Err(RecordError::UnknownVariant { .. })
    ));
}

#[test]
fn resolve_value_requires_a_mapping() {
    assert!(matches!(
        Attribute::resolve_value(json!([1, 2]), false),
        Err(RecordError::TypeConversion { .. })
    ));
}

#[test]
fn model_lists_dispatch_each_element() {
    let user_id = ObjectId::new();
    let model = Model::from_mapping(
        &mapping(json!({
            "_id": ObjectId::new().to_hex(),
            "type": "class",
            "projectId": ObjectId::new().to_hex(),
            "path": "/shapes",
            "relations": [],
            "attributes": [
                field_mapping("width"),
                { "kind": "method", "_id": null, "name": "area", "type": "float",
                  "accessModifier": "public", "parameters": [] },
                { "kind": "note", "_id": null, "value": "keep me" }
            ],
            "history": [
                { "action": "createModel", "timestamp": "t0", "userId": user_id.to_hex() },
                { "action": "addAttribute", "timestamp": "t1", "userId": user_id.to_hex(),
                  "item": field_mapping("width") }
            ]
        })),
        false,
    )
    .unwrap();

    let tags = model
        .attributes
        .as_ref()
        .unwrap()
        .iter()
        .map(|attribute| attribute.tag().to_string())
        .collect::<Vec<_>>();
    assert_eq!(tags, vec!["field", "method", "note"]);

    let history = model.history.as_ref().unwrap();
    assert!(matches!(history[0], HistoryAction::CreateModel(_)));
    assert!(matches!(
        &history[1],
        HistoryAction::AddAttribute(action) if matches!(action.item, Some(Attribute::Field(_)))
    ));
    assert!(history.iter().all(|action| action.user_id() == Some(user_id)));

    let restored = Model::from_mapping(&model.as_mapping().unwrap(), false).unwrap();
    assert_eq!(restored, model);
}

#[test]
fn resolve_list_keeps_order() {
    let mappings = vec![
        mapping(json!({ "action": "createModel", "timestamp": "t0", "userId": null })),
        mapping(json!({ "action": "setAttribute", "timestamp": "t1", "userId": null,
                        "oldItem": null, "newItem": null })),
    ];
    let actions = HistoryAction::resolve_list(&mappings).unwrap();
    assert_eq!(
        actions.iter().map(|action| action.tag()).collect::<Vec<_>>(),
        vec![HistoryAction::CREATE_MODEL, HistoryAction::SET_ATTRIBUTE]
    );
}
