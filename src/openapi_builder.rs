//! Assembly of the OpenAPI 2.0 document from parsed API items.
//!
//! Schemas are embedded inline in operations rather than referenced through
//! `definitions`, and folder and status land in `x-apifox-*` vendor
//! extensions, which is the layout Apifox imports best.

use crate::apiitem::{ApiItem, Parameter, BODY_TYPE_NONE, MIME_JSON};
use log::warn;
use serde_json::{json, Map, Value};

pub const X_FOLDER: &str = "x-apifox-folder";
pub const X_STATUS: &str = "x-apifox-status";

#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            title: "goapidoc".to_string(),
            version: "1.0.0".to_string(),
            description: "Generated from comments in Go source code.".to_string(),
        }
    }
}

/// Builds the complete document. Items sharing a path land in the same
/// path object under their own methods.
pub fn build_document(info: &DocumentInfo, items: &[ApiItem]) -> Value {
    let mut paths = Map::new();
    for item in items {
        let (Some(method), Some(url)) = (&item.method, &item.url) else {
            continue;
        };
        if !matches!(
            method.as_str(),
            "get" | "put" | "post" | "delete" | "options" | "head" | "patch"
        ) {
            warn!("unsupported method {} for {}", method, url);
            continue;
        }
        let path_item = paths
            .entry(url.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(path_item) = path_item {
            path_item.insert(method.clone(), operation_value(item));
        }
    }

    json!({
        "swagger": "2.0",
        "info": {
            "title": info.title,
            "description": info.description,
            "version": info.version,
        },
        "host": "",
        "basePath": "",
        "paths": Value::Object(paths),
    })
}

fn operation_value(item: &ApiItem) -> Value {
    let mut op = Map::new();
    op.insert("summary".to_string(), json!(item.title.as_deref().unwrap_or("")));

    let mut description = item.desc.join("\n");
    if !item.remark.is_empty() {
        if !description.is_empty() {
            description.push('\n');
        }
        description.push_str(&item.remark.join("\n"));
    }
    op.insert("description".to_string(), json!(description));

    op.insert(X_FOLDER.to_string(), json!(item.folder));
    op.insert(
        X_STATUS.to_string(),
        json!(item.status.as_deref().unwrap_or("")),
    );

    let consumes = vec![item
        .body_type
        .clone()
        .unwrap_or_else(|| BODY_TYPE_NONE.to_string())];
    op.insert("consumes".to_string(), json!(consumes));
    let produces = vec![item
        .content_type
        .clone()
        .unwrap_or_else(|| MIME_JSON.to_string())];
    op.insert("produces".to_string(), json!(produces));

    let mut parameters: Vec<Value> = item.params.plain().map(parameter_value).collect();
    if let Some(body) = &item.params.body {
        parameters.push(json!({
            "name": body.type_full_name.as_deref().unwrap_or(""),
            "in": "body",
            "schema": body.to_value(),
        }));
    }
    op.insert("parameters".to_string(), json!(parameters));

    let mut responses = Map::new();
    for response in &item.responses {
        let mut value = Map::new();
        value.insert("description".to_string(), json!(response.description));
        if let Some(schema) = &response.schema {
            value.insert("schema".to_string(), schema.to_value());
        }
        responses.insert(response.code.to_string(), Value::Object(value));
    }
    op.insert("responses".to_string(), Value::Object(responses));

    Value::Object(op)
}

fn parameter_value(param: &Parameter) -> Value {
    let mut out = Map::new();
    out.insert("name".to_string(), json!(param.name));
    out.insert("in".to_string(), json!(param.kind.as_str()));
    out.insert("type".to_string(), json!(param.param_type));
    out.insert("required".to_string(), json!(param.required));
    out.insert("description".to_string(), json!(param.description));
    if let Some(example) = &param.example {
        out.insert("example".to_string(), json!(example));
    }
    Value::Object(out)
}
