//! Schema nodes produced by type translation and their JSON rendering.
//!
//! Property order follows declaration order in the source, while `required`
//! lists are sorted. Both are stored explicitly so rendering is
//! deterministic regardless of map iteration order.

use serde_json::{json, Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Integer => "integer",
            PrimitiveKind::Number => "number",
            PrimitiveKind::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    /// A declaration whose shape is unknown, rendered as a bare `{}`.
    Untyped,
    Primitive(PrimitiveKind),
    /// `items` is absent for a collection that directly contains its own
    /// declaring type.
    Array { items: Option<Box<SchemaNode>> },
    /// `value` is absent under the same self-containment rule.
    Map { value: Option<Box<SchemaNode>> },
    Object {
        properties: HashMap<String, SchemaNode>,
        required: Vec<String>,
        property_order: Vec<String>,
    },
    AllOf(Vec<SchemaNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub format: Option<String>,
    pub description: Option<String>,
    /// Full id of the named declaration this node came from, when any.
    pub type_full_name: Option<String>,
    /// Field name a wrapper response nests its payload under.
    pub composed_field_key: Option<String>,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            format: None,
            description: None,
            type_full_name: None,
            composed_field_key: None,
        }
    }

    pub fn untyped() -> Self {
        Self::new(SchemaKind::Untyped)
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(SchemaKind::Primitive(kind))
    }

    /// `{"type": "object"}` without properties, used for shapes that are
    /// known to be objects but cannot be opened up.
    pub fn opaque_object() -> Self {
        Self::new(SchemaKind::Object {
            properties: HashMap::new(),
            required: Vec::new(),
            property_order: Vec::new(),
        })
    }

    pub fn string_with_format(format: &str) -> Self {
        let mut node = Self::primitive(PrimitiveKind::String);
        node.format = Some(format.to_string());
        node
    }

    pub fn with_description(mut self, description: &str) -> Self {
        if !description.is_empty() {
            self.description = Some(description.to_string());
        }
        self
    }

    /// Renders the node as an inline document fragment.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        match &self.kind {
            SchemaKind::Untyped => {}
            SchemaKind::Primitive(kind) => {
                out.insert("type".to_string(), json!(kind.as_str()));
                if let Some(format) = &self.format {
                    out.insert("format".to_string(), json!(format));
                }
                self.push_description(&mut out);
            }
            SchemaKind::Array { items } => {
                out.insert("type".to_string(), json!("array"));
                self.push_description(&mut out);
                if let Some(items) = items {
                    out.insert("items".to_string(), items.to_value());
                }
            }
            SchemaKind::Map { value } => {
                out.insert("type".to_string(), json!("object"));
                self.push_description(&mut out);
                if let Some(value) = value {
                    out.insert("additionalProperties".to_string(), value.to_value());
                }
            }
            SchemaKind::Object {
                properties,
                required,
                property_order,
            } => {
                out.insert("type".to_string(), json!("object"));
                self.push_description(&mut out);
                if !property_order.is_empty() {
                    let mut props = Map::new();
                    for name in property_order {
                        if let Some(node) = properties.get(name) {
                            props.insert(name.clone(), node.to_value());
                        }
                    }
                    out.insert("properties".to_string(), Value::Object(props));
                    if !required.is_empty() {
                        out.insert("required".to_string(), json!(required));
                    }
                    out.insert("x-apifox-orders".to_string(), json!(property_order));
                }
            }
            SchemaKind::AllOf(parts) => {
                self.push_description(&mut out);
                let rendered: Vec<Value> = parts.iter().map(|p| p.to_value()).collect();
                out.insert("allOf".to_string(), json!(rendered));
            }
        }
        Value::Object(out)
    }

    fn push_description(&self, out: &mut Map<String, Value>) {
        if let Some(description) = &self.description {
            out.insert("description".to_string(), json!(description));
        }
    }
}
