//! Parser turning Go source files into [`GoFile`] syntax trees.
//!
//! This is a deliberately small recursive-descent parser: it understands the
//! package clause, imports, type declarations and function signatures, and
//! skips everything else (function bodies, const/var initializers) by brace
//! and paren matching. Doc comment blocks and trailing field comments are
//! preserved because the documentation pipeline is built out of them.

use crate::ast::{FieldNode, FuncDecl, GoFile, ImportSpec, TypeExpr, TypeSpec};
use crate::error::{Error, Result};
use crate::token::{tokenize, Token};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Parser entry points, mirroring the one-file / many-files split of the
/// rest of the pipeline.
pub struct GoParser;

/// A successfully parsed Go file with its syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub ast: GoFile,
}

impl GoParser {
    /// Parses a single Go source file.
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Syntax`
    /// with the offending fragment if it cannot be parsed.
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("parsing file: {}", path.display());
        let content = fs::read_to_string(path)?;
        let ast = Self::parse_source(&content).map_err(|message| Error::Syntax {
            file: path.to_path_buf(),
            message,
        })?;
        Ok(ParsedFile {
            path: path.to_path_buf(),
            ast,
        })
    }

    /// Parses multiple files, continuing past individual failures so one
    /// broken file does not sink the whole run.
    pub fn parse_files(paths: &[PathBuf]) -> Vec<Result<ParsedFile>> {
        let results: Vec<Result<ParsedFile>> = paths
            .iter()
            .map(|path| match Self::parse_file(path) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("failed to parse {}: {}", path.display(), e);
                    Err(e)
                }
            })
            .collect();

        let ok = results.iter().filter(|r| r.is_ok()).count();
        debug!("parsed {} of {} files", ok, results.len());
        results
    }

    /// Parses Go source text. The error is a bare message; callers attach
    /// the file path.
    pub fn parse_source(src: &str) -> std::result::Result<GoFile, String> {
        Parser::new(tokenize(src)).parse()
    }
}

struct Parser {
    toks: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(toks: Vec<Token>) -> Self {
        Self { toks, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.toks.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn err_here(&self, what: &str) -> String {
        match self.peek() {
            Some(tok) => format!("{}, found {}", what, tok.describe()),
            None => format!("{} at end of file", what),
        }
    }

    fn expect_ident(&mut self) -> std::result::Result<String, String> {
        match self.peek() {
            Some(Token::Ident(_)) => {
                if let Some(Token::Ident(name)) = self.bump() {
                    Ok(name)
                } else {
                    unreachable!()
                }
            }
            _ => Err(self.err_here("expected identifier")),
        }
    }

    fn parse(mut self) -> std::result::Result<GoFile, String> {
        let mut file = GoFile::default();

        // Leading comments and blank lines before the package clause carry
        // no annotations.
        while matches!(
            self.peek(),
            Some(Token::LineComment(_)) | Some(Token::Newline) | Some(Token::Semi)
        ) {
            self.pos += 1;
        }
        if !self.eat(&Token::Package) {
            return Err(self.err_here("expected package clause"));
        }
        file.package_name = self.expect_ident()?;
        self.skip_to_line_end();

        // Doc block being accumulated for the next declaration. A blank
        // line detaches it.
        let mut pending_doc: Vec<String> = Vec::new();

        while let Some(tok) = self.peek() {
            match tok {
                Token::LineComment(_) => {
                    if let Some(Token::LineComment(text)) = self.bump() {
                        pending_doc.push(text);
                    }
                    // Consume the comment's own newline so a following
                    // Newline token means a genuinely blank line.
                    self.eat(&Token::Newline);
                }
                Token::Newline => {
                    self.pos += 1;
                    pending_doc.clear();
                }
                Token::Semi => {
                    self.pos += 1;
                }
                Token::Import => {
                    file.common_docs.append(&mut pending_doc);
                    self.parse_import_decl(&mut file)?;
                }
                Token::Type => {
                    file.common_docs.append(&mut pending_doc);
                    self.parse_type_decl(&mut file)?;
                }
                Token::Const | Token::Var => {
                    file.common_docs.append(&mut pending_doc);
                    self.pos += 1;
                    self.skip_simple_decl();
                }
                Token::Func => {
                    let doc = std::mem::take(&mut pending_doc);
                    self.parse_func_decl(&mut file, doc)?;
                }
                _ => {
                    // Unrecognized top-level content; drop the line.
                    pending_doc.clear();
                    self.skip_simple_decl();
                }
            }
        }

        Ok(file)
    }

    fn parse_import_decl(&mut self, file: &mut GoFile) -> std::result::Result<(), String> {
        self.pos += 1; // import
        if self.eat(&Token::LParen) {
            loop {
                match self.peek() {
                    Some(Token::Newline) | Some(Token::Semi) => {
                        self.pos += 1;
                    }
                    Some(Token::LineComment(_)) => {
                        self.pos += 1;
                    }
                    Some(Token::RParen) => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => self.parse_import_spec(file)?,
                    None => return Err("missing ) in import block".to_string()),
                }
            }
        } else {
            self.parse_import_spec(file)?;
        }
        Ok(())
    }

    fn parse_import_spec(&mut self, file: &mut GoFile) -> std::result::Result<(), String> {
        let alias = match self.peek() {
            Some(Token::Ident(_)) => {
                if let Some(Token::Ident(name)) = self.bump() {
                    Some(name)
                } else {
                    unreachable!()
                }
            }
            Some(Token::Dot) => {
                self.pos += 1;
                Some(".".to_string())
            }
            _ => None,
        };
        match self.bump() {
            Some(Token::Str(path)) => {
                file.imports.push(ImportSpec { path, alias });
                Ok(())
            }
            _ => Err("expected import path string".to_string()),
        }
    }

    fn parse_type_decl(&mut self, file: &mut GoFile) -> std::result::Result<(), String> {
        self.pos += 1; // type
        if self.eat(&Token::LParen) {
            loop {
                match self.peek() {
                    Some(Token::Newline) | Some(Token::Semi) | Some(Token::LineComment(_)) => {
                        self.pos += 1;
                    }
                    Some(Token::RParen) => {
                        self.pos += 1;
                        break;
                    }
                    Some(_) => self.parse_type_spec(file)?,
                    None => return Err("missing ) in type block".to_string()),
                }
            }
        } else {
            self.parse_type_spec(file)?;
        }
        Ok(())
    }

    fn parse_type_spec(&mut self, file: &mut GoFile) -> std::result::Result<(), String> {
        let name = self.expect_ident()?;
        // Type parameter lists are skipped; generic instantiation is not
        // modeled.
        if self.peek() == Some(&Token::LBracket) {
            self.skip_balanced(&Token::LBracket, &Token::RBracket)?;
        }
        // `type A = B` alias form
        self.eat(&Token::Punct('='));
        let expr = self.parse_type_expr()?;
        file.types.push(TypeSpec { name, expr });
        Ok(())
    }

    fn parse_func_decl(
        &mut self,
        file: &mut GoFile,
        doc: Vec<String>,
    ) -> std::result::Result<(), String> {
        self.pos += 1; // func
        if self.peek() == Some(&Token::LParen) {
            // method receiver
            self.skip_balanced(&Token::LParen, &Token::RParen)?;
        }
        let name = self.expect_ident()?;
        if self.peek() == Some(&Token::LBracket) {
            self.skip_balanced(&Token::LBracket, &Token::RBracket)?;
        }
        if self.peek() != Some(&Token::LParen) {
            return Err(self.err_here("expected parameter list"));
        }
        self.skip_balanced(&Token::LParen, &Token::RParen)?;

        // Result types, then an optional body.
        loop {
            match self.peek() {
                None | Some(Token::Newline) | Some(Token::Semi) => break,
                Some(Token::LBrace) => {
                    self.skip_balanced(&Token::LBrace, &Token::RBrace)?;
                    break;
                }
                Some(Token::LParen) => {
                    self.skip_balanced(&Token::LParen, &Token::RParen)?;
                }
                Some(Token::LBracket) => {
                    self.skip_balanced(&Token::LBracket, &Token::RBracket)?;
                }
                Some(Token::Struct) | Some(Token::Interface) => {
                    self.pos += 1;
                    if self.peek() == Some(&Token::LBrace) {
                        self.skip_balanced(&Token::LBrace, &Token::RBrace)?;
                    }
                }
                Some(_) => {
                    self.pos += 1;
                }
            }
        }

        file.funcs.push(FuncDecl { name, doc });
        Ok(())
    }

    fn parse_type_expr(&mut self) -> std::result::Result<TypeExpr, String> {
        match self.peek() {
            Some(Token::Star) => {
                self.pos += 1;
                Ok(TypeExpr::Pointer(Box::new(self.parse_type_expr()?)))
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                // Array length expression, if any, is not modeled.
                while self.peek() != Some(&Token::RBracket) {
                    if self.peek().is_none() {
                        return Err("missing ] in array type".to_string());
                    }
                    self.pos += 1;
                }
                self.pos += 1;
                Ok(TypeExpr::Slice(Box::new(self.parse_type_expr()?)))
            }
            Some(Token::Map) => {
                self.pos += 1;
                if !self.eat(&Token::LBracket) {
                    return Err(self.err_here("invalid map type: expected ["));
                }
                let key = self.parse_type_expr()?;
                if !self.eat(&Token::RBracket) {
                    return Err(self.err_here("invalid map type: expected ]"));
                }
                let value = self.parse_type_expr()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            Some(Token::Struct) => {
                self.pos += 1;
                if !self.eat(&Token::LBrace) {
                    return Err(self.err_here("expected { after struct"));
                }
                let fields = self.parse_struct_fields()?;
                Ok(TypeExpr::Struct(fields))
            }
            Some(Token::Interface) => {
                self.pos += 1;
                if self.peek() == Some(&Token::LBrace) {
                    // Method sets carry no schema information.
                    self.skip_balanced(&Token::LBrace, &Token::RBrace)?;
                }
                Ok(TypeExpr::Interface)
            }
            Some(Token::Func) => {
                self.pos += 1;
                if self.peek() == Some(&Token::LParen) {
                    self.skip_balanced(&Token::LParen, &Token::RParen)?;
                }
                self.maybe_skip_result_type()?;
                Ok(TypeExpr::Opaque)
            }
            Some(Token::Chan) => {
                self.pos += 1;
                while matches!(self.peek(), Some(Token::Punct(_))) {
                    self.pos += 1;
                }
                self.parse_type_expr()?;
                Ok(TypeExpr::Opaque)
            }
            Some(Token::Punct('<')) => {
                // receive-only channel: <-chan T
                while matches!(self.peek(), Some(Token::Punct(_))) {
                    self.pos += 1;
                }
                if !self.eat(&Token::Chan) {
                    return Err(self.err_here("expected chan"));
                }
                self.parse_type_expr()?;
                Ok(TypeExpr::Opaque)
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.parse_type_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.err_here("expected )"));
                }
                Ok(inner)
            }
            Some(Token::Ident(_)) => {
                let name = self.expect_ident()?;
                if self.eat(&Token::Dot) {
                    let sel = self.expect_ident()?;
                    Ok(TypeExpr::Selector { pkg: name, name: sel })
                } else {
                    Ok(TypeExpr::Ident(name))
                }
            }
            _ => Err(self.err_here("expected type expression")),
        }
    }

    /// After a func type's parameters: consume a result type when one is
    /// present on the same line.
    fn maybe_skip_result_type(&mut self) -> std::result::Result<(), String> {
        match self.peek() {
            Some(Token::LParen) => self.skip_balanced(&Token::LParen, &Token::RParen),
            Some(Token::Ident(_))
            | Some(Token::Star)
            | Some(Token::LBracket)
            | Some(Token::Map)
            | Some(Token::Struct)
            | Some(Token::Interface)
            | Some(Token::Func)
            | Some(Token::Chan) => {
                self.parse_type_expr()?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn parse_struct_fields(&mut self) -> std::result::Result<Vec<FieldNode>, String> {
        let mut fields = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Newline) | Some(Token::Semi) => {
                    self.pos += 1;
                }
                Some(Token::LineComment(_)) => {
                    // Comments above a field are not attached to it; only
                    // the trailing same-line comment becomes a description.
                    self.pos += 1;
                }
                Some(Token::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => fields.push(self.parse_struct_field()?),
                None => return Err("missing } in struct type".to_string()),
            }
        }
        Ok(fields)
    }

    fn parse_struct_field(&mut self) -> std::result::Result<FieldNode, String> {
        let mut names = Vec::new();
        let mut embedded = false;

        let expr = if self.peek() == Some(&Token::Star) {
            // Embedded pointer: *pkg.Type
            embedded = true;
            self.parse_type_expr()?
        } else {
            let first = self.expect_ident()?;
            match self.peek() {
                Some(Token::Comma) => {
                    names.push(first);
                    while self.eat(&Token::Comma) {
                        names.push(self.expect_ident()?);
                    }
                    self.parse_type_expr()?
                }
                Some(Token::Dot) => {
                    self.pos += 1;
                    let sel = self.expect_ident()?;
                    embedded = true;
                    TypeExpr::Selector {
                        pkg: first,
                        name: sel,
                    }
                }
                Some(Token::Ident(_))
                | Some(Token::Star)
                | Some(Token::LBracket)
                | Some(Token::Map)
                | Some(Token::Struct)
                | Some(Token::Interface)
                | Some(Token::Func)
                | Some(Token::Chan)
                | Some(Token::LParen)
                | Some(Token::Punct('<')) => {
                    names.push(first);
                    self.parse_type_expr()?
                }
                _ => {
                    // Tag, comment or line end directly after the name:
                    // an embedded same-package type.
                    embedded = true;
                    TypeExpr::Ident(first)
                }
            }
        };

        let tag = match self.peek() {
            Some(Token::RawStr(_)) | Some(Token::Str(_)) => match self.bump() {
                Some(Token::RawStr(s)) | Some(Token::Str(s)) => Some(s),
                _ => unreachable!(),
            },
            _ => None,
        };

        let mut comment = String::new();
        while let Some(Token::LineComment(_)) = self.peek() {
            if let Some(Token::LineComment(text)) = self.bump() {
                comment.push_str(strip_comment_marker(&text));
            }
        }

        match self.peek() {
            Some(Token::Newline) | Some(Token::Semi) => {
                self.pos += 1;
            }
            Some(Token::RBrace) | None => {}
            _ => return Err(self.err_here("expected end of struct field")),
        }

        Ok(FieldNode {
            names,
            expr,
            tag,
            comment: if comment.is_empty() {
                None
            } else {
                Some(comment)
            },
            embedded,
        })
    }

    /// Consume a balanced `open`..`close` group, including the delimiters.
    fn skip_balanced(&mut self, open: &Token, close: &Token) -> std::result::Result<(), String> {
        if !self.eat(open) {
            return Err(self.err_here("expected opening delimiter"));
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.bump() {
                Some(tok) if &tok == open => depth += 1,
                Some(tok) if &tok == close => depth -= 1,
                Some(_) => {}
                None => return Err("unexpected end of file in delimited group".to_string()),
            }
        }
        Ok(())
    }

    /// Consume to the end of the current logical line, honoring nesting so
    /// multiline initializers are swallowed whole.
    fn skip_simple_decl(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.peek() {
            match tok {
                Token::LParen | Token::LBrace | Token::LBracket => depth += 1,
                Token::RParen | Token::RBrace | Token::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                Token::Newline | Token::Semi if depth == 0 => {
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    fn skip_to_line_end(&mut self) {
        while let Some(tok) = self.bump() {
            if tok == Token::Newline || tok == Token::Semi {
                return;
            }
        }
    }
}

/// Strip the leading slashes and surrounding whitespace from a `//` comment.
pub fn strip_comment_marker(text: &str) -> &str {
    text.trim_start_matches('/').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(src: &str) -> GoFile {
        GoParser::parse_source(src).expect("source should parse")
    }

    #[test]
    fn test_parse_package_and_imports() {
        let file = parse(
            r#"package pet

import "petshop/model"

import (
    m "petshop/other"
    . "petshop/dot"
    _ "petshop/blank"
)
"#,
        );
        assert_eq!(file.package_name, "pet");
        assert_eq!(file.imports.len(), 4);
        assert_eq!(file.imports[0].path, "petshop/model");
        assert_eq!(file.imports[0].alias, None);
        assert_eq!(file.imports[1].alias.as_deref(), Some("m"));
        assert!(file.imports[2].is_wildcard());
        assert_eq!(file.imports[3].alias.as_deref(), Some("_"));
    }

    #[test]
    fn test_parse_struct_with_tags_and_comments() {
        let file = parse(
            r#"package model

// Pet is a pet record
type Pet struct {
    Id    int64    `json:"id,string" validate:"required"` // pet id
    Name  string   `json:"name" validate:"required"`      // pet name
    Tags  []Tag    `json:"tags"`
    Extra map[string]interface{} `json:"extra"`
}
"#,
        );
        assert_eq!(file.types.len(), 1);
        let spec = &file.types[0];
        assert_eq!(spec.name, "Pet");
        let TypeExpr::Struct(fields) = &spec.expr else {
            panic!("expected struct type");
        };
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].names, vec!["Id".to_string()]);
        assert_eq!(
            fields[0].tag.as_deref(),
            Some("json:\"id,string\" validate:\"required\"")
        );
        assert_eq!(fields[0].comment.as_deref(), Some("pet id"));
        assert_eq!(fields[2].expr, TypeExpr::Slice(Box::new(TypeExpr::Ident("Tag".to_string()))));
        assert!(matches!(fields[3].expr, TypeExpr::Map { .. }));
        // Doc comment on the type decl feeds the common block
        assert_eq!(file.common_docs, vec!["// Pet is a pet record".to_string()]);
    }

    #[test]
    fn test_parse_embedded_fields() {
        let file = parse(
            r#"package model

type Outer struct {
    Inner
    comm.HttpCode
    *Base
    Desc string `json:"desc"`
}
"#,
        );
        let TypeExpr::Struct(fields) = &file.types[0].expr else {
            panic!("expected struct");
        };
        assert_eq!(fields.len(), 4);
        assert!(fields[0].embedded);
        assert_eq!(fields[0].expr, TypeExpr::Ident("Inner".to_string()));
        assert!(fields[1].embedded);
        assert_eq!(
            fields[1].expr,
            TypeExpr::Selector {
                pkg: "comm".to_string(),
                name: "HttpCode".to_string()
            }
        );
        assert!(fields[2].embedded);
        assert_eq!(fields[2].expr.ref_name(), Some("Base".to_string()));
        assert!(!fields[3].embedded);
    }

    #[test]
    fn test_parse_grouped_types() {
        let file = parse(
            r#"package simple

type (
    SomeStruct struct {
        Bool bool `json:"bool"`
    }

    SomeOtherType string
)
"#,
        );
        assert_eq!(file.types.len(), 2);
        assert_eq!(file.types[0].name, "SomeStruct");
        assert_eq!(file.types[1].name, "SomeOtherType");
        assert_eq!(file.types[1].expr, TypeExpr::Ident("string".to_string()));
    }

    #[test]
    fn test_parse_func_docs_and_skip_bodies() {
        let file = parse(
            r#"package pet

// FindByStatus finds pets
// @url GET /pet/findByStatus
func FindByStatus(status string) (*FindByStatusRsp, error) {
    if status == "" {
        return nil, nil
    }
    return &FindByStatusRsp{}, nil
}

func (h *Handler) unexported() {}
"#,
        );
        assert_eq!(file.funcs.len(), 2);
        assert_eq!(file.funcs[0].name, "FindByStatus");
        assert_eq!(
            file.funcs[0].doc,
            vec![
                "// FindByStatus finds pets".to_string(),
                "// @url GET /pet/findByStatus".to_string()
            ]
        );
        assert_eq!(file.funcs[1].name, "unexported");
        assert!(file.funcs[1].doc.is_empty());
    }

    #[test]
    fn test_blank_line_detaches_doc() {
        let file = parse(
            r#"package pet

// stray comment

func Handler() {}
"#,
        );
        assert!(file.funcs[0].doc.is_empty());
    }

    #[test]
    fn test_parse_inline_struct_field() {
        let file = parse(
            r#"package simple

type S struct {
    Struct struct {
        X string `json:"x" validate:"required"`
    } `json:"struct"`
}
"#,
        );
        let TypeExpr::Struct(fields) = &file.types[0].expr else {
            panic!("expected struct");
        };
        let TypeExpr::Struct(inner) = &fields[0].expr else {
            panic!("expected inline struct field");
        };
        assert_eq!(inner[0].names, vec!["X".to_string()]);
        assert_eq!(fields[0].tag.as_deref(), Some("json:\"struct\""));
    }

    #[test]
    fn test_malformed_struct_is_error() {
        let result = GoParser::parse_source("package x\n\ntype T struct {\n    A string\n");
        let message = result.unwrap_err();
        assert!(message.contains("missing } in struct type"), "{}", message);
    }

    #[test]
    fn test_missing_package_clause_is_error() {
        let result = GoParser::parse_source("type T string\n");
        assert!(result.unwrap_err().contains("expected package clause"));
    }

    #[test]
    fn test_parse_file_not_found() {
        let err = GoParser::parse_file(Path::new("/nonexistent/x.go")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_const_var_docs_feed_common_block() {
        let file = parse(
            r#"package pet

// @folder petshop
// @remark shared remark
var version = "1"

const (
    a = 1
    b = 2
)
"#,
        );
        assert_eq!(
            file.common_docs,
            vec![
                "// @folder petshop".to_string(),
                "// @remark shared remark".to_string()
            ]
        );
    }
}
