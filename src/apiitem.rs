//! In-memory model of one documented API operation.
//!
//! Items are built by the comment parser and merged with the file's common
//! block before the document builder renders them.

use crate::schema::{SchemaKind, SchemaNode};

pub const MIME_JSON: &str = "application/json";
pub const MIME_FORM_DATA: &str = "multipart/form-data";
pub const MIME_FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
pub const MIME_XML: &str = "application/xml";
pub const MIME_HTML: &str = "text/html";
pub const MIME_PLAIN: &str = "text/plain";
pub const MIME_BINARY: &str = "application/octet-stream";

/// Placeholder consumes value for operations without a request body.
pub const BODY_TYPE_NONE: &str = "none";

/// Field a wrapper response nests per-API payloads under when the common
/// block does not pick one.
pub const DEFAULT_COMPOSED_FIELD: &str = "data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Path,
    Query,
    Header,
    Cookie,
    FormData,
}

impl ParamKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParamKind::Path),
            "query" => Some(ParamKind::Query),
            "header" => Some(ParamKind::Header),
            "cookie" => Some(ParamKind::Cookie),
            "formData" | "form" => Some(ParamKind::FormData),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Path => "path",
            ParamKind::Query => "query",
            ParamKind::Header => "header",
            ParamKind::Cookie => "cookie",
            ParamKind::FormData => "formData",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
    pub param_type: String,
    pub required: bool,
    pub description: String,
    pub example: Option<String>,
}

#[derive(Debug, Default)]
pub struct Parameters {
    pub path: Vec<Parameter>,
    pub query: Vec<Parameter>,
    pub header: Vec<Parameter>,
    pub cookie: Vec<Parameter>,
    pub form_data: Vec<Parameter>,
    /// Request body schema, present for JSON-bodied operations.
    pub body: Option<SchemaNode>,
}

impl Parameters {
    pub fn push(&mut self, param: Parameter) {
        match param.kind {
            ParamKind::Path => self.path.push(param),
            ParamKind::Query => self.query.push(param),
            ParamKind::Header => self.header.push(param),
            ParamKind::Cookie => self.cookie.push(param),
            ParamKind::FormData => self.form_data.push(param),
        }
    }

    /// All plain parameters in the order the document lists them.
    pub fn plain(&self) -> impl Iterator<Item = &Parameter> {
        self.path
            .iter()
            .chain(self.query.iter())
            .chain(self.header.iter())
            .chain(self.cookie.iter())
            .chain(self.form_data.iter())
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub code: u16,
    pub description: String,
    pub schema: Option<SchemaNode>,
}

/// One documented operation, or the file-level common block that other
/// items in the same file inherit from.
#[derive(Debug, Default)]
pub struct ApiItem {
    pub func_name: String,
    pub title: Option<String>,
    pub folder: String,
    pub status: Option<String>,
    pub desc: Vec<String>,
    pub remark: Vec<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub body_type: Option<String>,
    pub content_type: Option<String>,
    pub params: Parameters,
    pub responses: Vec<Response>,
}

impl ApiItem {
    /// Folder-qualified display name, used in progress logging.
    pub fn name(&self) -> String {
        let title = self.title.as_deref().unwrap_or_default();
        if self.folder.is_empty() {
            title.to_string()
        } else {
            format!("{}/{}", self.folder, title)
        }
    }

    /// Only items with a title, a method and a path make it into the
    /// document.
    pub fn is_valid(&self) -> bool {
        self.title.as_deref().map_or(false, |t| !t.is_empty())
            && self.method.is_some()
            && self.url.is_some()
    }

    /// Prepends a parent folder, keeping single slashes at the join.
    pub fn add_folder(&mut self, parent: &str) {
        if parent.is_empty() {
            return;
        }
        if self.folder.is_empty() {
            self.folder = parent.to_string();
        } else {
            self.folder = format!(
                "{}/{}",
                parent.trim_end_matches('/'),
                self.folder.trim_start_matches('/')
            );
        }
    }

    pub fn add_remark(&mut self, remark: &str) {
        if !remark.is_empty() {
            self.remark.push(remark.to_string());
        }
    }

    /// Merges the file's common block into this item: folder nesting,
    /// shared remarks, shared header parameters, and the response wrapper.
    /// The common block's first response acts as the wrapper; item payloads
    /// get nested under its composed field.
    pub fn use_common(&mut self, common: &ApiItem) {
        self.add_folder(&common.folder);
        for remark in &common.remark {
            self.add_remark(remark);
        }
        self.params
            .header
            .extend(common.params.header.iter().cloned());

        let Some(wrapper) = common.responses.first() else {
            return;
        };
        let Some(wrapper_schema) = &wrapper.schema else {
            return;
        };
        if self.responses.is_empty() {
            self.responses.push(wrapper.clone());
            return;
        }
        for response in &mut self.responses {
            if let Some(payload) = response.schema.take() {
                response.schema =
                    Some(compose_wrapped(wrapper_schema.clone(), Some(payload)));
            }
        }
    }
}

/// Nests `payload` under the wrapper's composed field and joins the two
/// with `allOf`. Without a payload the wrapper stands alone.
pub fn compose_wrapped(wrapper: SchemaNode, payload: Option<SchemaNode>) -> SchemaNode {
    let Some(payload) = payload else {
        return wrapper;
    };
    let key = wrapper
        .composed_field_key
        .clone()
        .unwrap_or_else(|| DEFAULT_COMPOSED_FIELD.to_string());

    let mut properties = std::collections::HashMap::new();
    properties.insert(key.clone(), payload);
    let envelope = SchemaNode::new(SchemaKind::Object {
        properties,
        required: Vec::new(),
        property_order: vec![key],
    });
    SchemaNode::new(SchemaKind::AllOf(vec![wrapper, envelope]))
}

/// Expands an object schema into individual parameters, one per property in
/// declaration order. Non-object schemas expand to nothing.
pub fn schema_to_parameters(kind: ParamKind, schema: &SchemaNode) -> Vec<Parameter> {
    let SchemaKind::Object {
        properties,
        required,
        property_order,
    } = &schema.kind
    else {
        return Vec::new();
    };
    property_order
        .iter()
        .filter_map(|name| {
            properties.get(name).map(|node| Parameter {
                name: name.clone(),
                kind,
                param_type: scalar_type_of(node),
                required: required.contains(name),
                description: node.description.clone().unwrap_or_default(),
                example: None,
            })
        })
        .collect()
}

fn scalar_type_of(node: &SchemaNode) -> String {
    match &node.kind {
        SchemaKind::Primitive(kind) => kind.as_str().to_string(),
        SchemaKind::Array { .. } => "array".to_string(),
        _ => "string".to_string(),
    }
}
