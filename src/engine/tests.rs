use crate::filters::strip_index_suffix;
use crate::xml::Document;
use crate::{BoundValue, FieldOptions, MapError, Mapping, QueryError, Value, ValueKind};
use pretty_assertions::assert_eq;
use serde_json::json;

const ORDERS: &str = r#"<orders>
    <order id="1" status="open"><line sku="a"/><line sku="b"/></order>
    <order id="2"><line sku="c"/></order>
</orders>"#;

fn map(mapping: &Mapping, xml: &str) -> Result<Value, MapError> {
    let doc = Document::parse(xml).unwrap();
    mapping.map(&doc, &doc.root())
}

#[test]
fn array_of_attribute_values() {
    let mut mapping = Mapping::new();
    mapping.field("ITEMS", ValueKind::Array, Some("//item/@id"));

    let xml = r#"<list><item id="a"/><item id="b"/><item id="c"/></list>"#;
    assert_eq!(map(&mapping, xml).unwrap(), json!({"ITEMS": ["a", "b", "c"]}));
    assert_eq!(map(&mapping, "<list/>").unwrap(), json!({}));
}

#[test]
fn atomic_without_match_is_omitted() {
    let mut mapping = Mapping::new();
    mapping.field("FIRST", ValueKind::Atomic, Some("//order[1]/@id")).end();
    mapping.field("MISSING", ValueKind::Atomic, Some("//order/@nope")).end();
    mapping.field("STATUSES", ValueKind::Atomic, Some("//order/@status"));

    assert_eq!(map(&mapping, ORDERS).unwrap(), json!({"FIRST": "1", "STATUSES": "open"}));
}

#[test]
fn atomic_joins_multiple_matches() {
    let mut mapping = Mapping::new();
    mapping.field("SKUS", ValueKind::Atomic, Some("//line/@sku"));
    assert_eq!(map(&mapping, ORDERS).unwrap(), json!({"SKUS": "a b c"}));
}

#[test]
fn collection_yields_one_mapping_per_element() {
    let mut mapping = Mapping::new();
    mapping
        .field("ORDERS", ValueKind::Collection, Some("//order"))
        .field("ID", ValueKind::Atomic, Some("@id"))
        .end()
        .field("SKUS", ValueKind::Array, Some("line/@sku"));

    assert_eq!(
        map(&mapping, ORDERS).unwrap(),
        json!({"ORDERS": [
            {"ID": "1", "SKUS": ["a", "b"]},
            {"ID": "2", "SKUS": ["c"]},
        ]})
    );
}

#[test]
fn collection_instances_resolve_names_independently() {
    let mut mapping = Mapping::new();
    mapping.field("ROWS", ValueKind::Collection, Some("//row")).field("{@name}", ValueKind::Atomic, Some("."));

    let xml = r#"<t><row name="a">1</row><row name="b">2</row></t>"#;
    assert_eq!(map(&mapping, xml).unwrap(), json!({"ROWS": [{"a": "1"}, {"b": "2"}]}));
}

#[test]
fn collection_keeps_empty_instances() {
    let mut mapping = Mapping::new();
    mapping.field("ORDERS", ValueKind::Collection, Some("//order")).field("STATUS", ValueKind::Atomic, Some("@status"));

    assert_eq!(map(&mapping, ORDERS).unwrap(), json!({"ORDERS": [{"STATUS": "open"}, {}]}));
}

#[test]
fn collection_without_matches_is_omitted() {
    let mut mapping = Mapping::new();
    mapping.field("ROWS", ValueKind::Collection, Some("//row")).field("ID", ValueKind::Atomic, Some("@id"));
    assert_eq!(map(&mapping, ORDERS).unwrap(), json!({}));
}

#[test]
fn dynamic_object_deep_merges_filtered_names() {
    let mut mapping = Mapping::new();
    mapping.field("FIELDS", ValueKind::DynamicObject, Some("//f")).field_with(
        "{@key}",
        ValueKind::Atomic,
        None,
        FieldOptions::new().name_filter(strip_index_suffix),
    );

    let xml = r#"<fields><f key="A_1">x</f><f key="B_1">z</f><f key="A_2">y</f></fields>"#;
    assert_eq!(map(&mapping, xml).unwrap(), json!({"FIELDS": {"A": ["x", "y"], "B": "z"}}));
}

#[test]
fn count_placeholder_in_name() {
    let mut mapping = Mapping::new();
    mapping.field("{count(//line)}_LINES", ValueKind::Array, Some("//line/@sku"));
    assert_eq!(map(&mapping, ORDERS).unwrap(), json!({"3_LINES": ["a", "b", "c"]}));
}

#[test]
fn object_without_query_groups_its_children() {
    let mut mapping = Mapping::new();
    mapping
        .field("SUMMARY", ValueKind::Object, None)
        .field("FIRST", ValueKind::Atomic, Some("//order[1]/@id"))
        .end()
        .field("LAST", ValueKind::Atomic, Some("//order[last()]/@id"));

    assert_eq!(map(&mapping, ORDERS).unwrap(), json!({"SUMMARY": {"FIRST": "1", "LAST": "2"}}));
}

#[test]
fn object_with_text_and_children_uses_positional_keys() {
    let mut mapping = Mapping::new();
    mapping.field("META", ValueKind::Object, Some("//meta")).field("KIND", ValueKind::Atomic, Some("local-name()"));

    let xml = "<doc><meta>v</meta></doc>";
    assert_eq!(map(&mapping, xml).unwrap(), json!({"META": {"0": "v", "KIND": "meta"}}));
}

#[test]
fn value_filter_transforms_non_empty_values() {
    let mut mapping = Mapping::new();
    mapping.field_with(
        "IDS",
        ValueKind::Array,
        Some("//order/@id"),
        FieldOptions::new().value_filter(|v| json!(v.as_array().map_or(0, |a| a.len()))),
    );
    mapping.end();
    mapping.field_with(
        "NONE",
        ValueKind::Array,
        Some("//nothing"),
        FieldOptions::new().value_filter(|_| json!("filled")),
    );

    assert_eq!(map(&mapping, ORDERS).unwrap(), json!({"IDS": 2}));
}

#[test]
fn result_and_apply_are_repeatable() {
    let mut mapping = Mapping::new();
    mapping.field("ORDERS", ValueKind::Collection, Some("//order")).field("ID", ValueKind::Atomic, Some("@id"));

    let doc = Document::parse(ORDERS).unwrap();
    let first = mapping.apply(&doc, &doc.root()).unwrap();
    let second = mapping.apply(&doc, &doc.root()).unwrap();

    assert_eq!(first.result().unwrap(), first.result().unwrap());
    assert_eq!(first.result().unwrap(), second.result().unwrap());
    assert_eq!(first.root(), second.root());

    let other = Document::parse(r#"<orders><order id="9"/></orders>"#).unwrap();
    assert_eq!(mapping.map(&other, &other.root()).unwrap(), json!({"ORDERS": [{"ID": "9"}]}));
    assert_eq!(first.result().unwrap(), json!({"ORDERS": [{"ID": "1"}, {"ID": "2"}]}));
}

#[test]
fn bound_tree_exposes_groups() {
    let mut mapping = Mapping::new();
    mapping.field("ORDERS", ValueKind::Collection, Some("//order")).field("ID", ValueKind::Atomic, Some("@id"));

    let doc = Document::parse(ORDERS).unwrap();
    let binding = mapping.apply(&doc, &doc.root()).unwrap();
    let orders = binding.root().child("ORDERS").unwrap();

    assert!(orders.children().is_empty());
    assert_eq!(orders.groups().len(), 2);
    assert_eq!(orders.groups()[1][0].name(), "ID");
    assert_eq!(orders.groups()[1][0].value(), &BoundValue::Matches(vec!["2".to_string()]));
    assert_eq!(Some(orders.def()), mapping.child_named(mapping.root(), "ORDERS"));
}

#[test]
fn collection_outside_node_sequence_fails_on_result() {
    let mut mapping = Mapping::new();
    mapping.field("ROWS", ValueKind::Collection, None).field("ID", ValueKind::Atomic, Some("@id"));

    let doc = Document::parse(ORDERS).unwrap();
    let binding = mapping.apply(&doc, &doc.root()).unwrap();
    match binding.result().unwrap_err() {
        MapError::UnexpandedCollection { name, kind } => {
            assert_eq!(name, "ROWS");
            assert_eq!(kind, ValueKind::Collection);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn query_errors_abort_apply() {
    let mut mapping = Mapping::new();
    mapping.field("BROKEN", ValueKind::Array, Some("//order[@id"));

    let doc = Document::parse(ORDERS).unwrap();
    let err = mapping.apply(&doc, &doc.root()).unwrap_err();
    assert!(matches!(err, MapError::Query(QueryError::Syntax { .. })));
}

#[test]
fn subtrees_can_be_reused() {
    let mut line = Mapping::with_root(crate::FieldDef::new("LINES", ValueKind::Collection, Some("line")));
    line.field("SKU", ValueKind::Atomic, Some("@sku"));

    let mut mapping = Mapping::new();
    mapping.field("ORDERS", ValueKind::Collection, Some("//order")).field("ID", ValueKind::Atomic, Some("@id")).end();
    mapping.add_subtree(&line);

    assert_eq!(
        map(&mapping, ORDERS).unwrap(),
        json!({"ORDERS": [
            {"ID": "1", "LINES": [{"SKU": "a"}, {"SKU": "b"}]},
            {"ID": "2", "LINES": [{"SKU": "c"}]},
        ]})
    );
}

#[test]
fn one_mapping_serves_several_threads() {
    let mut mapping = Mapping::new();
    mapping.field("IDS", ValueKind::Array, Some("//order/@id"));
    let docs = [ORDERS, r#"<orders><order id="7"/></orders>"#];
    let shared = &mapping;

    let results: Vec<Value> = std::thread::scope(|scope| {
        let handles: Vec<_> = docs.iter().map(|&xml| scope.spawn(move || map(shared, xml).unwrap())).collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results, [json!({"IDS": ["1", "2"]}), json!({"IDS": ["7"]})]);
}
