//! Content hash computation.
//!
//! ## Determinism Guarantees
//!
//! - Same structural content → same digest
//! - Object keys are ordered recursively, not only at the top level
//! - Array order of the four entity collections never matters; field order
//!   inside a schema does

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::canonical::form::canonicalize;
use crate::model::PackageDefinition;

/// Compute the content hash of a package definition.
///
/// Pure and total: never fails, including on empty collections.
///
/// ## Returns
///
/// Hex-encoded SHA256 digest (64 characters)
///
/// ## Example
///
/// ```
/// use schemapack_core::canonical::compute_content_hash;
/// use schemapack_core::model::PackageDefinition;
///
/// let hash = compute_content_hash(&PackageDefinition::new("pkg", "Empty"));
/// assert_eq!(hash.len(), 64);
/// ```
pub fn compute_content_hash(definition: &PackageDefinition) -> String {
    let canonical = canonicalize(definition);
    // Plain structs with string keys always serialize
    let value = serde_json::to_value(&canonical).unwrap_or(Value::Null);
    hash_string(&canonical_json(&value))
}

/// Serialize a JSON value with object keys sorted at every depth.
///
/// ```
/// use schemapack_core::canonical::canonical_json;
/// use serde_json::json;
///
/// let value = json!({"b": {"y": 1, "x": 2}, "a": [true, null]});
/// assert_eq!(canonical_json(&value), r#"{"a":[true,null],"b":{"x":2,"y":1}}"#);
/// ```
pub fn canonical_json(value: &Value) -> String {
    // A `Value` always serializes
    serde_json::to_string(&sorted(value)).unwrap_or_default()
}

/// Copy of `value` whose maps were filled in key order. The order survives
/// serialization whether `Map` is a `BTreeMap` or, with serde_json's
/// `preserve_order` feature, an insertion-ordered map.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), sorted(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        scalar => scalar.clone(),
    }
}

fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstructSchema, FieldSchema, SchemaGroup, SchemaRelationship};
    use serde_json::json;

    fn sample() -> PackageDefinition {
        PackageDefinition::new("pkg-1", "Infra")
            .with_group(SchemaGroup::new("g1", "Compute").with_color("#f00"))
            .with_schema(
                ConstructSchema::new("svc", "Service")
                    .with_group_id("g1")
                    .with_field(FieldSchema::new("port", "number")),
            )
            .with_schema(ConstructSchema::new("db", "Database"))
            .with_relationship(SchemaRelationship::new("r1", "svc", "db", "out", "in"))
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(compute_content_hash(&sample()), compute_content_hash(&sample()));
    }

    #[test]
    fn test_hash_ignores_schema_order() {
        let mut reordered = sample();
        reordered.schemas.reverse();
        assert_eq!(compute_content_hash(&sample()), compute_content_hash(&reordered));
    }

    #[test]
    fn test_hash_ignores_group_and_relationship_ids() {
        let mut renamed = sample();
        renamed.schema_groups[0].id = "other".to_string();
        renamed.schemas[0].group_id = Some("other".to_string());
        renamed.schema_relationships[0].id = "r-999".to_string();
        assert_eq!(compute_content_hash(&sample()), compute_content_hash(&renamed));
    }

    #[test]
    fn test_hash_ignores_package_id_tags() {
        let mut tagged = sample();
        for schema in &mut tagged.schemas {
            schema.package_id = Some("pkg-1".to_string());
        }
        assert_eq!(compute_content_hash(&sample()), compute_content_hash(&tagged));
    }

    #[test]
    fn test_hash_changes_with_field_type() {
        let mut changed = sample();
        changed.schemas[0].fields[0].field_type = "string".to_string();
        assert_ne!(compute_content_hash(&sample()), compute_content_hash(&changed));
    }

    #[test]
    fn test_hash_changes_with_nesting() {
        let mut nested = sample();
        nested.schema_groups.push(SchemaGroup::new("g0", "Root"));
        nested.schema_groups[0].parent_id = Some("g0".to_string());

        let mut flat = sample();
        flat.schema_groups.push(SchemaGroup::new("g0", "Root"));

        assert_ne!(compute_content_hash(&nested), compute_content_hash(&flat));
    }

    #[test]
    fn test_hash_ignores_nested_metadata_key_order() {
        let a: serde_json::Value =
            serde_json::from_str(r#"{"ui":{"w":1,"h":2},"tags":["x"]}"#).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(r#"{"tags":["x"],"ui":{"h":2,"w":1}}"#).unwrap();

        let with_a = PackageDefinition::new("p", "P")
            .with_schema(ConstructSchema::new("svc", "Service").with_metadata(a));
        let with_b = PackageDefinition::new("p", "P")
            .with_schema(ConstructSchema::new("svc", "Service").with_metadata(b));

        assert_eq!(compute_content_hash(&with_a), compute_content_hash(&with_b));
    }

    #[test]
    fn test_empty_definition_hashes() {
        let hash = compute_content_hash(&PackageDefinition::new("p", "P"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_canonical_json_uses_serde_json_escaping() {
        let value = json!({"\u{e9}": "line\nbreak", "a": [1.5, {"z": null, "y": "\u{1F600}"}]});
        assert_eq!(
            canonical_json(&value),
            "{\"a\":[1.5,{\"y\":\"\u{1F600}\",\"z\":null}],\"\u{e9}\":\"line\\nbreak\"}"
        );
    }

    #[test]
    fn test_canonical_json_escapes_keys() {
        let value = json!({"quote\"key": "v"});
        assert_eq!(canonical_json(&value), r#"{"quote\"key":"v"}"#);
    }
}
