//! Parsing of the annotation grammar in doc comments.
//!
//! A comment block is read line by line. A line starting with the function's
//! own name (case-insensitive) or `@title` sets the title; the other `@`
//! tags fill in routing, parameters and responses. Blocks on type, const
//! and var declarations form the file's common block, which every operation
//! in the file inherits through [`ApiItem::use_common`].

use crate::apiitem::{
    schema_to_parameters, ApiItem, ParamKind, Parameter, Response, MIME_BINARY, MIME_FORM_DATA,
    MIME_FORM_URLENCODED, MIME_HTML, MIME_JSON, MIME_PLAIN, MIME_XML,
};
use crate::error::{Error, Result};
use crate::index::SourceFile;
use crate::parser::strip_comment_marker;
use crate::schema::{SchemaKind, SchemaNode};
use crate::translator::Translator;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use std::collections::HashMap;
use std::rc::Rc;

lazy_static! {
    // [kind] [name] [type] [required] "[example]" "[description]"
    static ref PARAM_RE: Regex =
        Regex::new(r#"(\w+)\s+(\S+)\s+([\w\-.\\{}=,\[\s\]]+)\s+(\w+)\s+"([^"]*)"\s+"([^"]*)""#)
            .unwrap();
    // [code] "[description]" [type]
    static ref RESP_RE: Regex =
        Regex::new(r#"(\d+)\s+"([^"]+)"\s+([\w\-.\\{}=,\[\s\]]+)"#).unwrap();
    // Wrapper{field=Type,other} composition
    static ref COMBINED_RE: Regex = Regex::new(r"^([\w\-./\[\]]+)\{(.*)\}$").unwrap();
}

pub struct CommentParser {
    translator: Translator,
}

impl CommentParser {
    pub fn new(translator: Translator) -> Self {
        Self { translator }
    }

    /// Extracts every documented operation from one file. `order` is the
    /// running count across files, used for progress logging.
    pub fn parse_file(
        &mut self,
        file: &Rc<SourceFile>,
        order: &mut usize,
    ) -> Result<Vec<ApiItem>> {
        let mut common = ApiItem::default();
        for line in &file.ast.common_docs {
            self.parse_line(&mut common, file, "", line)?;
        }

        let mut items = Vec::new();
        for func in &file.ast.funcs {
            if func.doc.is_empty() {
                continue;
            }
            debug!("reading comment block on {}()", func.name);
            let mut item = ApiItem {
                func_name: func.name.clone(),
                ..ApiItem::default()
            };
            for line in &func.doc {
                self.parse_line(&mut item, file, &func.name, line)?;
            }
            if !item.is_valid() {
                debug!("ignoring comment block on {}() without title or url", func.name);
                continue;
            }
            item.use_common(&common);
            info!("documented operation ({}) {}", order, item.name());
            *order += 1;
            items.push(item);
        }
        Ok(items)
    }

    fn parse_line(
        &mut self,
        item: &mut ApiItem,
        file: &Rc<SourceFile>,
        func_name: &str,
        raw: &str,
    ) -> Result<()> {
        let comment = strip_comment_marker(raw);
        if comment.is_empty() {
            return Ok(());
        }
        let first = comment.split_whitespace().next().unwrap_or_default();
        let tag = first.to_lowercase();
        let rest = comment[first.len()..].trim();

        match tag.as_str() {
            "@title" => item.title = Some(rest.to_string()),
            t if !func_name.is_empty() && t == func_name.to_lowercase() => {
                item.title = Some(rest.to_string());
            }
            "@folder" => item.add_folder(rest),
            "@status" => item.status = Some(rest.to_string()),
            "@desc" => {
                if !rest.is_empty() {
                    item.desc.push(rest.to_string());
                }
            }
            "@remark" => item.add_remark(rest),
            "@url" => parse_url(item, rest)?,
            "@bodytype" => item.body_type = Some(mime_for(rest)?),
            "@contenttype" => item.content_type = Some(mime_for(rest)?),
            "@param" => self.parse_param(item, file, rest)?,
            "@success" => self.parse_response(item, file, 200, "OK", rest)?,
            "@resp" => {
                let caps = RESP_RE.captures(rest).ok_or_else(|| {
                    Error::Comment(format!("cannot parse response comment \"{}\"", rest))
                })?;
                let code: u16 = caps[1].parse().unwrap_or(200);
                let name = caps[2].trim().to_string();
                let type_str = caps[3].trim().to_string();
                self.parse_response(item, file, code, &name, &type_str)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// `@param` in one of two forms: a whole struct (`query Filter{}`) or a
    /// single value (`query status string true "sold" "sale status"`).
    fn parse_param(
        &mut self,
        item: &mut ApiItem,
        file: &Rc<SourceFile>,
        rest: &str,
    ) -> Result<()> {
        let bad = |msg: &str| Error::Comment(format!("cannot parse param comment \"{}\": {}", rest, msg));

        if let Some(type_str) = rest.strip_suffix("{}") {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            if fields.len() != 2 {
                return Err(bad("expected [kind] [Struct{}]"));
            }
            let kind_str = fields[0];
            let type_str = type_str.split_whitespace().last().unwrap_or_default();
            let schema = self.schema_for(type_str, file)?;
            if kind_str == "body" {
                if item.body_type.is_none() {
                    item.body_type = Some(MIME_JSON.to_string());
                }
                item.params.body = Some(schema);
                return Ok(());
            }
            let Some(kind) = ParamKind::parse(kind_str) else {
                debug!("ignoring param with unknown kind: {}", kind_str);
                return Ok(());
            };
            for param in schema_to_parameters(kind, &schema) {
                item.params.push(param);
            }
            return Ok(());
        }

        let caps = PARAM_RE.captures(rest).ok_or_else(|| bad("malformed value parameter"))?;
        let Some(kind) = ParamKind::parse(caps[1].trim()) else {
            debug!("ignoring param with unknown kind: {}", &caps[1]);
            return Ok(());
        };
        let example = caps[5].trim();
        item.params.push(Parameter {
            name: caps[2].trim().to_string(),
            kind,
            param_type: caps[3].trim().to_string(),
            required: matches!(caps[4].trim(), "true" | "1"),
            description: caps[6].trim().to_string(),
            example: if example.is_empty() {
                None
            } else {
                Some(example.to_string())
            },
        });
        Ok(())
    }

    /// `@success`/`@resp` payload types, including `Wrapper{field=Type}`
    /// composition and the bare-field form that names the composed field.
    fn parse_response(
        &mut self,
        item: &mut ApiItem,
        file: &Rc<SourceFile>,
        code: u16,
        name: &str,
        type_str: &str,
    ) -> Result<()> {
        let caps = COMBINED_RE.captures(type_str).ok_or_else(|| {
            Error::Comment(format!("cannot parse response type \"{}\"", type_str))
        })?;
        let base = &caps[1];
        let field_list = caps[2].to_string();

        let mut schema = self.schema_for(base, file)?;
        let mut composed_key: Option<String> = None;
        let mut overrides: Vec<(String, SchemaNode)> = Vec::new();
        for field in split_fields(&field_list) {
            match field.split_once('=') {
                None => composed_key = Some(field.to_string()),
                Some((key, sub_type)) => {
                    let sub = self.schema_for(sub_type, file)?;
                    overrides.push((key.to_string(), sub));
                }
            }
        }
        if !overrides.is_empty() {
            let property_order: Vec<String> =
                overrides.iter().map(|(k, _)| k.clone()).collect();
            let properties: HashMap<String, SchemaNode> = overrides.into_iter().collect();
            let envelope = SchemaNode::new(SchemaKind::Object {
                properties,
                required: Vec::new(),
                property_order,
            });
            schema = SchemaNode::new(SchemaKind::AllOf(vec![schema, envelope]));
        }
        schema.composed_field_key = composed_key;

        item.responses.push(Response {
            code,
            description: name.to_string(),
            schema: Some(schema),
        });
        Ok(())
    }

    /// Translates a type mentioned in a comment. A type that cannot be
    /// found degrades to an empty object so one missing model does not
    /// abort the run.
    fn schema_for(&mut self, type_str: &str, file: &Rc<SourceFile>) -> Result<SchemaNode> {
        match self.translator.parse_type(type_str, file)? {
            Some(schema) => Ok(schema),
            None => {
                warn!("type not found: {}", type_str);
                Ok(SchemaNode::opaque_object())
            }
        }
    }
}

/// `@url [METHOD] [path]`. POST, PUT and PATCH default to a JSON body.
fn parse_url(item: &mut ApiItem, rest: &str) -> Result<()> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(Error::Comment(format!("cannot parse url comment \"{}\"", rest)));
    }
    let method = fields[0].to_lowercase();
    if item.body_type.is_none() && matches!(method.as_str(), "post" | "put" | "patch") {
        item.body_type = Some(MIME_JSON.to_string());
    }
    item.method = Some(method);
    item.url = Some(fields[1].to_string());
    Ok(())
}

/// Maps a body or content type alias to its MIME type.
fn mime_for(alias: &str) -> Result<String> {
    let mime = match alias.to_lowercase().as_str() {
        "json" | MIME_JSON => MIME_JSON,
        "form-data" | MIME_FORM_DATA => MIME_FORM_DATA,
        "x-www-form-urlencoded" | MIME_FORM_URLENCODED => MIME_FORM_URLENCODED,
        "xml" | MIME_XML => MIME_XML,
        "html" | MIME_HTML => MIME_HTML,
        "raw" | MIME_PLAIN => MIME_PLAIN,
        "binary" | MIME_BINARY => MIME_BINARY,
        other => {
            return Err(Error::Comment(format!("unsupported content type \"{}\"", other)));
        }
    };
    Ok(mime.to_string())
}

/// Splits a composition field list on top-level commas, leaving nested
/// braces intact.
fn split_fields(s: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                if i > start {
                    fields.push(&s[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < s.len() {
        fields.push(&s[start..]);
    }
    fields.iter().map(|f| f.trim()).filter(|f| !f.is_empty()).collect()
}
