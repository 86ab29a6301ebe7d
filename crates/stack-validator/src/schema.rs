//! Declared shape of a resource kind, derived from its `JsonSchema`.
//!
//! Only the set of known field names matters here: value types are not
//! checked, the typed decoding of the object takes care of them.

use schemars::JsonSchema;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ObjectMeta and the specs are shallow, this only protects against
// recursive definitions.
const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSchema {
    /// Free-form value, any key is accepted at any depth
    Any,
    Scalar,
    List(Box<FieldSchema>),
    /// Object with arbitrary keys, like labels or annotations
    Map(Box<FieldSchema>),
    /// Object with a closed set of keys
    Object(BTreeMap<String, FieldSchema>),
}

impl FieldSchema {
    pub fn for_type<T: JsonSchema>() -> Self {
        let schema = schemars::schema_for!(T);
        Self::from_json_schema(schema.as_value())
    }

    /// Build the shape out of a JSON schema document, resolving references
    /// against its `$defs` (or legacy `definitions`) section.
    pub fn from_json_schema(root: &Value) -> Self {
        let empty = Map::new();
        let definitions = root
            .get("$defs")
            .or_else(|| root.get("definitions"))
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        SchemaWalker { definitions }.build(root, 0)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        match self {
            FieldSchema::Object(fields) => fields.get(name),
            _ => None,
        }
    }
}

struct SchemaWalker<'a> {
    definitions: &'a Map<String, Value>,
}

impl SchemaWalker<'_> {
    fn build(&self, schema: &Value, depth: usize) -> FieldSchema {
        if depth > MAX_DEPTH {
            return FieldSchema::Any;
        }
        let Some(schema) = schema.as_object() else {
            // `true`/`false` schemas
            return FieldSchema::Any;
        };

        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            return self
                .resolve(reference)
                .map_or(FieldSchema::Any, |target| self.build(target, depth + 1));
        }

        if let Some(variants) = schema.get("allOf").and_then(Value::as_array) {
            return self.merge(variants, depth);
        }
        for keyword in ["anyOf", "oneOf"] {
            if let Some(variants) = schema.get(keyword).and_then(Value::as_array) {
                let variants: Vec<Value> = variants
                    .iter()
                    .filter(|variant| !is_null_schema(variant))
                    .cloned()
                    .collect();
                return match variants.as_slice() {
                    [] => FieldSchema::Any,
                    [single] => self.build(single, depth + 1),
                    _ => self.merge(&variants, depth),
                };
            }
        }

        let additional = schema.get("additionalProperties");
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            return match additional {
                None | Some(Value::Bool(false)) => FieldSchema::Object(
                    properties
                        .iter()
                        .map(|(name, property)| (name.clone(), self.build(property, depth + 1)))
                        .collect(),
                ),
                // known fields plus arbitrary extra ones
                Some(_) => FieldSchema::Any,
            };
        }
        match additional {
            Some(Value::Bool(false)) => return FieldSchema::Object(BTreeMap::new()),
            Some(value_schema) => {
                return FieldSchema::Map(Box::new(self.build(value_schema, depth + 1)));
            }
            None => {}
        }

        if let Some(items) = schema.get("items") {
            return FieldSchema::List(Box::new(self.build(items, depth + 1)));
        }

        match schema.get("type") {
            Some(Value::String(t)) if is_scalar_type(t) => FieldSchema::Scalar,
            Some(Value::Array(types))
                if types
                    .iter()
                    .filter_map(Value::as_str)
                    .all(|t| is_scalar_type(t) || t == "null") =>
            {
                FieldSchema::Scalar
            }
            _ => FieldSchema::Any,
        }
    }

    /// Union of the object variants, anything else makes the result free-form.
    fn merge(&self, variants: &[Value], depth: usize) -> FieldSchema {
        let mut fields = BTreeMap::new();
        for variant in variants {
            match self.build(variant, depth + 1) {
                FieldSchema::Object(variant_fields) => fields.extend(variant_fields),
                _ => return FieldSchema::Any,
            }
        }
        FieldSchema::Object(fields)
    }

    fn resolve(&self, reference: &str) -> Option<&Value> {
        let name = reference
            .strip_prefix("#/$defs/")
            .or_else(|| reference.strip_prefix("#/definitions/"))?;
        self.definitions.get(name)
    }
}

fn is_scalar_type(t: &str) -> bool {
    matches!(t, "string" | "integer" | "number" | "boolean")
}

fn is_null_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("null")
        || schema.get("const").is_some_and(Value::is_null)
}
