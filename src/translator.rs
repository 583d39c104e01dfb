//! Translation of Go type declarations into schema nodes.
//!
//! Translation is memoized on the type's full id, so a declaration is walked
//! once per run no matter how many annotations mention it. An in-progress
//! set breaks reference cycles: re-entering a declaration that is still
//! being translated yields an empty placeholder carrying the full id.

use crate::ast::{FieldNode, TypeExpr};
use crate::error::{Error, Result};
use crate::index::{SourceFile, TypeDecl};
use crate::resolver::Resolver;
use crate::schema::{PrimitiveKind, SchemaKind, SchemaNode};
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

lazy_static! {
    static ref TYPE_NAME_RE: Regex =
        Regex::new(r"^[A-Za-z_]\w*(\.[A-Za-z_]\w*)?$").unwrap();
    static ref TAG_ENTRY_RE: Regex = Regex::new(r#"(\w+):"([^"]*)""#).unwrap();
}

pub struct Translator {
    resolver: Resolver,
    schemas: HashMap<String, SchemaNode>,
    in_progress: HashSet<String>,
}

impl Translator {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            schemas: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Translates a type written in an annotation, such as `model.Pet`,
    /// `[]model.Pet` or `map[string]model.Pet`, as seen from `from`.
    ///
    /// Returns `Ok(None)` when the named type cannot be found. A type
    /// string that cannot be read at all is an error.
    pub fn parse_type(
        &mut self,
        reference: &str,
        from: &Rc<SourceFile>,
    ) -> Result<Option<SchemaNode>> {
        let s = reference.trim().trim_start_matches('*');
        if let Some(inner) = s.strip_prefix("[]") {
            return Ok(self.parse_type(inner, from)?.map(|node| {
                SchemaNode::new(SchemaKind::Array {
                    items: Some(Box::new(node)),
                })
            }));
        }
        if let Some(rest) = s.strip_prefix("map[") {
            let close = rest
                .find(']')
                .ok_or_else(|| Error::InvalidType(reference.to_string()))?;
            let value = &rest[close + 1..];
            return Ok(self.parse_type(value, from)?.map(|node| {
                SchemaNode::new(SchemaKind::Map {
                    value: Some(Box::new(node)),
                })
            }));
        }
        if s == "interface{}" || s == "any" {
            return Ok(Some(SchemaNode::opaque_object()));
        }
        if s == "time.Time" {
            return Ok(Some(SchemaNode::string_with_format("date-time")));
        }
        if !TYPE_NAME_RE.is_match(s) {
            return Err(Error::InvalidType(reference.to_string()));
        }
        if let Some(node) = primitive_for(s) {
            return Ok(Some(node));
        }
        match self.resolver.resolve(s, from)? {
            Some(decl) => Ok(Some(self.translate_decl(&decl)?)),
            None => Ok(None),
        }
    }

    /// Translates a resolved declaration, consulting the cache first.
    pub fn translate_decl(&mut self, decl: &Rc<TypeDecl>) -> Result<SchemaNode> {
        let full_id = decl.full_id();
        if let Some(cached) = self.schemas.get(&full_id) {
            return Ok(cached.clone());
        }
        if self.in_progress.contains(&full_id) {
            debug!("cycle at {}, emitting placeholder", full_id);
            let mut placeholder = SchemaNode::untyped();
            placeholder.type_full_name = Some(full_id);
            return Ok(placeholder);
        }

        self.in_progress.insert(full_id.clone());
        let result = self.translate_expr(&decl.expr, &decl.file, &full_id);
        self.in_progress.remove(&full_id);

        let mut node = result?;
        node.type_full_name = Some(full_id.clone());
        self.schemas.insert(full_id, node.clone());
        Ok(node)
    }

    fn translate_expr(
        &mut self,
        expr: &TypeExpr,
        file: &Rc<SourceFile>,
        self_id: &str,
    ) -> Result<SchemaNode> {
        match expr {
            TypeExpr::Pointer(inner) => self.translate_expr(inner, file, self_id),
            TypeExpr::Ident(name) => {
                if name == "any" {
                    return Ok(SchemaNode::untyped());
                }
                if let Some(node) = primitive_for(name) {
                    return Ok(node);
                }
                self.translate_ref(name, file)
            }
            TypeExpr::Selector { pkg, name } => {
                if pkg == "time" && name == "Time" {
                    return Ok(SchemaNode::string_with_format("date-time"));
                }
                self.translate_ref(&format!("{}.{}", pkg, name), file)
            }
            TypeExpr::Slice(elem) => {
                if self.refers_to(elem, file, self_id)? {
                    return Ok(SchemaNode::new(SchemaKind::Array { items: None }));
                }
                let items = self.translate_expr(elem, file, self_id)?;
                Ok(SchemaNode::new(SchemaKind::Array {
                    items: Some(Box::new(items)),
                }))
            }
            TypeExpr::Map { value, .. } => {
                if self.refers_to(value, file, self_id)? {
                    return Ok(SchemaNode::new(SchemaKind::Map { value: None }));
                }
                let value = self.translate_expr(value, file, self_id)?;
                Ok(SchemaNode::new(SchemaKind::Map {
                    value: Some(Box::new(value)),
                }))
            }
            TypeExpr::Struct(fields) => self.translate_struct(fields, file, self_id),
            TypeExpr::Interface | TypeExpr::Opaque => Ok(SchemaNode::untyped()),
        }
    }

    /// A named reference that cannot be resolved still has to render as
    /// something; an object with no properties is the neutral choice.
    fn translate_ref(&mut self, name: &str, file: &Rc<SourceFile>) -> Result<SchemaNode> {
        match self.resolver.resolve(name, file)? {
            Some(decl) => self.translate_decl(&decl),
            None => {
                debug!("unresolved reference: {}", name);
                Ok(SchemaNode::opaque_object())
            }
        }
    }

    /// Whether a collection element refers straight back to the declaration
    /// currently being translated.
    fn refers_to(
        &mut self,
        elem: &TypeExpr,
        file: &Rc<SourceFile>,
        self_id: &str,
    ) -> Result<bool> {
        let Some(name) = elem.ref_name() else {
            return Ok(false);
        };
        match self.resolver.resolve(&name, file)? {
            Some(decl) => Ok(decl.full_id() == self_id),
            None => Ok(false),
        }
    }

    fn translate_struct(
        &mut self,
        fields: &[FieldNode],
        file: &Rc<SourceFile>,
        self_id: &str,
    ) -> Result<SchemaNode> {
        let mut properties: HashMap<String, SchemaNode> = HashMap::new();
        let mut property_order: Vec<String> = Vec::new();
        let mut required: Vec<String> = Vec::new();

        for field in fields {
            if field.embedded {
                self.flatten_embedded(field, file, &mut properties, &mut property_order, &mut required)?;
                continue;
            }
            let Some(field_name) = field.names.first() else {
                continue;
            };

            let json_tag = field.tag.as_deref().and_then(|t| tag_lookup(t, "json"));
            let (mut out_name, coerce_string) = match &json_tag {
                Some(tag) => {
                    let mut parts = tag.split(',');
                    let name = parts.next().unwrap_or("");
                    let opts: Vec<&str> = parts.collect();
                    if name == "-" && opts.is_empty() {
                        continue;
                    }
                    (name.to_string(), opts.contains(&"string"))
                }
                None => (String::new(), false),
            };
            if out_name.is_empty() {
                out_name = field_name.clone();
            }

            let mut node = if matches!(field.expr, TypeExpr::Interface) {
                SchemaNode::opaque_object()
            } else {
                self.translate_expr(&field.expr, file, self_id)?
            };
            if coerce_string {
                let description = node.description.take();
                node = SchemaNode::primitive(PrimitiveKind::String);
                node.description = description;
            }
            if let Some(comment) = &field.comment {
                node = node.with_description(comment);
            }

            let validate_tag = field.tag.as_deref().and_then(|t| tag_lookup(t, "validate"));
            if validate_tag
                .map(|v| v.split(',').any(|part| part == "required"))
                .unwrap_or(false)
            {
                required.push(out_name.clone());
            }

            if properties.insert(out_name.clone(), node).is_none() {
                property_order.push(out_name);
            }
        }

        required.sort();
        required.dedup();
        Ok(SchemaNode::new(SchemaKind::Object {
            properties,
            required,
            property_order,
        }))
    }

    /// Folds an embedded type's properties into the embedding struct. An
    /// embedded type that cannot be resolved, or does not translate to an
    /// object, contributes nothing.
    fn flatten_embedded(
        &mut self,
        field: &FieldNode,
        file: &Rc<SourceFile>,
        properties: &mut HashMap<String, SchemaNode>,
        property_order: &mut Vec<String>,
        required: &mut Vec<String>,
    ) -> Result<()> {
        let Some(name) = field.expr.ref_name() else {
            return Ok(());
        };
        let Some(decl) = self.resolver.resolve(&name, file)? else {
            debug!("skipping unresolved embedded type: {}", name);
            return Ok(());
        };
        let node = self.translate_decl(&decl)?;
        let SchemaKind::Object {
            properties: inner_props,
            required: inner_required,
            property_order: inner_order,
        } = node.kind
        else {
            debug!("embedded type {} is not an object, skipping", name);
            return Ok(());
        };
        for prop_name in inner_order {
            if let Some(prop) = inner_props.get(&prop_name) {
                if properties.insert(prop_name.clone(), prop.clone()).is_none() {
                    property_order.push(prop_name);
                }
            }
        }
        required.extend(inner_required);
        Ok(())
    }
}

fn primitive_for(name: &str) -> Option<SchemaNode> {
    let kind = match name {
        "string" => PrimitiveKind::String,
        "bool" => PrimitiveKind::Boolean,
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16"
        | "uint32" | "uint64" | "uintptr" | "byte" | "rune" => PrimitiveKind::Integer,
        "float32" | "float64" => PrimitiveKind::Number,
        _ => return None,
    };
    Some(SchemaNode::primitive(kind))
}

/// Looks up one key in a Go struct tag string.
pub fn tag_lookup(tag: &str, key: &str) -> Option<String> {
    TAG_ENTRY_RE
        .captures_iter(tag)
        .find(|caps| &caps[1] == key)
        .map(|caps| caps[2].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SourceIndex;
    use crate::loader::{GoModLocator, PackageLoader};
    use crate::parser::GoParser;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_file(tmp.path(), "go.mod", "module petshop\n");
        write_file(
            tmp.path(),
            "model/pet.go",
            r#"package model

import "time"

type Pet struct {
    Id        int64     `json:"id,string" validate:"required"` // pet id
    Name      string    `json:"name" validate:"required"`      // pet name
    Price     float64   `json:"price"`
    Hidden    string    `json:"-"`
    Tags      []Tag     `json:"tags"`
    CreatedAt time.Time `json:"created_at"`
}

type Tag struct {
    Label string `json:"label"`
}
"#,
        );
        write_file(
            tmp.path(),
            "model/node.go",
            r#"package model

type Node struct {
    Name   string          `json:"name"`
    Childs []*Node         `json:"childs"`
    ByName map[string]Node `json:"by_name"`
}

type Ping struct {
    Pong *Pong `json:"pong"`
}

type Pong struct {
    Ping *Ping `json:"ping"`
}
"#,
        );
        write_file(
            tmp.path(),
            "comm/comm.go",
            r#"package comm

type HttpCode struct {
    Code int    `json:"code" validate:"required"`
    Msg  string `json:"msg"`
}
"#,
        );
        tmp
    }

    fn translator(tmp: &TempDir) -> (Translator, Rc<SourceFile>) {
        let locator = GoModLocator::new(tmp.path()).unwrap();
        let mut index = SourceIndex::new();
        let src = r#"package pet

import (
    "petshop/model"
    "petshop/comm"
)

type Wrapped struct {
    comm.HttpCode
    Missing
    Data model.Pet `json:"data"`
}
"#;
        let from = index.index_file(
            "petshop/pet",
            Path::new("/src/pet/handler.go"),
            GoParser::parse_source(src).unwrap(),
        );
        let resolver = Resolver::new(index, PackageLoader::new(Box::new(locator)));
        (Translator::new(resolver), from)
    }

    #[test]
    fn test_struct_translation() {
        let tmp = fixture();
        let (mut translator, from) = translator(&tmp);
        let node = translator
            .parse_type("model.Pet", &from)
            .unwrap()
            .expect("resolved");

        assert_eq!(node.type_full_name.as_deref(), Some("petshop/model.Pet"));
        let value = node.to_value();
        // declaration order, excluded field dropped
        assert_eq!(
            value["x-apifox-orders"],
            json!(["id", "name", "price", "tags", "created_at"])
        );
        // required is sorted
        assert_eq!(value["required"], json!(["id", "name"]));
        // ,string coerces, comment survives
        assert_eq!(
            value["properties"]["id"],
            json!({"type": "string", "description": "pet id"})
        );
        assert_eq!(value["properties"]["price"]["type"], json!("number"));
        assert_eq!(
            value["properties"]["created_at"],
            json!({"type": "string", "format": "date-time"})
        );
        assert_eq!(
            value["properties"]["tags"]["items"]["properties"]["label"]["type"],
            json!("string")
        );
    }

    #[test]
    fn test_parse_type_collections() {
        let tmp = fixture();
        let (mut translator, from) = translator(&tmp);

        let list = translator
            .parse_type("[]model.Tag", &from)
            .unwrap()
            .unwrap()
            .to_value();
        assert_eq!(list["type"], json!("array"));
        assert_eq!(list["items"]["properties"]["label"]["type"], json!("string"));

        let map = translator
            .parse_type("map[string]model.Tag", &from)
            .unwrap()
            .unwrap()
            .to_value();
        assert_eq!(map["type"], json!("object"));
        assert!(map["additionalProperties"].is_object());

        let prim = translator.parse_type("int64", &from).unwrap().unwrap();
        assert_eq!(prim.to_value(), json!({"type": "integer"}));
    }

    #[test]
    fn test_parse_type_absent_and_malformed() {
        let tmp = fixture();
        let (mut translator, from) = translator(&tmp);

        assert!(translator.parse_type("model.Missing", &from).unwrap().is_none());
        assert!(translator.parse_type("unknown.Thing", &from).unwrap().is_none());

        let err = translator.parse_type("map[string", &from).unwrap_err();
        assert!(matches!(err, Error::InvalidType(_)));
        let err = translator.parse_type("model.Pet{}", &from).unwrap_err();
        assert!(matches!(err, Error::InvalidType(_)));
    }

    #[test]
    fn test_direct_recursion_drops_item_schema() {
        let tmp = fixture();
        let (mut translator, from) = translator(&tmp);
        let value = translator
            .parse_type("model.Node", &from)
            .unwrap()
            .unwrap()
            .to_value();

        assert_eq!(value["properties"]["childs"], json!({"type": "array"}));
        assert_eq!(value["properties"]["by_name"], json!({"type": "object"}));
    }

    #[test]
    fn test_mutual_recursion_terminates_with_placeholder() {
        let tmp = fixture();
        let (mut translator, from) = translator(&tmp);
        let value = translator
            .parse_type("model.Ping", &from)
            .unwrap()
            .unwrap()
            .to_value();

        // Pong is translated in full; its back-reference to Ping collapses
        // to an empty placeholder instead of recursing.
        assert_eq!(
            value["properties"]["pong"]["properties"]["ping"],
            json!({})
        );
    }

    #[test]
    fn test_embedding_flattens_and_skips_unresolved() {
        let tmp = fixture();
        let (mut translator, from) = translator(&tmp);
        let value = translator
            .parse_type("Wrapped", &from)
            .unwrap()
            .unwrap()
            .to_value();

        // embedded comm.HttpCode fields come first, unresolvable `Missing`
        // vanishes without error
        assert_eq!(value["x-apifox-orders"], json!(["code", "msg", "data"]));
        assert_eq!(value["required"], json!(["code"]));
        assert_eq!(value["properties"]["code"]["type"], json!("integer"));
    }

    #[test]
    fn test_schema_cache_reuses_translation() {
        let tmp = fixture();
        let (mut translator, from) = translator(&tmp);

        let first = translator.parse_type("model.Pet", &from).unwrap().unwrap();
        let second = translator.parse_type("model.Pet", &from).unwrap().unwrap();
        assert_eq!(first, second);
        assert!(translator.schemas.contains_key("petshop/model.Pet"));
    }

    #[test]
    fn test_interface_field_renders_as_object() {
        let tmp = fixture();
        write_file(
            tmp.path(),
            "model/extra.go",
            "package model\n\ntype Extra struct {\n    Anything interface{} `json:\"anything\"`\n}\n",
        );
        let (mut translator, from) = translator(&tmp);
        let value = translator
            .parse_type("model.Extra", &from)
            .unwrap()
            .unwrap()
            .to_value();
        assert_eq!(value["properties"]["anything"], json!({"type": "object"}));
    }

    #[test]
    fn test_tag_lookup() {
        let tag = r#"json:"id,string" validate:"required" xorm:"pk""#;
        assert_eq!(tag_lookup(tag, "json").as_deref(), Some("id,string"));
        assert_eq!(tag_lookup(tag, "validate").as_deref(), Some("required"));
        assert_eq!(tag_lookup(tag, "yaml"), None);
    }
}
