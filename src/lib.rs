//! goapidoc - OpenAPI 2.0 documentation from comments in Go source code.
//!
//! This library reads a Go project, resolves the types mentioned in
//! structured doc comments, and produces an OpenAPI 2.0 (Swagger) document
//! with inline schemas and Apifox vendor extensions.
//!
//! # Architecture
//!
//! The modules form a pipeline:
//!
//! 1. [`scanner`] - Recursively scans project directories for Go files
//! 2. [`token`] / [`parser`] - Tokenizes and parses Go sources into syntax trees
//! 3. [`index`] - Indexes parsed files and type declarations by package id
//! 4. [`loader`] - Loads referenced packages on demand through a locator
//! 5. [`resolver`] - Resolves bare and qualified type references
//! 6. [`translator`] - Translates type declarations into schema nodes
//! 7. [`comment`] - Parses the `@tag` annotation grammar in doc comments
//! 8. [`apiitem`] - Models documented operations and their composition
//! 9. [`openapi_builder`] - Constructs the complete document
//! 10. [`serializer`] - Serializes the document to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use goapidoc::{
//!     comment::CommentParser,
//!     index::SourceIndex,
//!     loader::{GoModLocator, PackageLoader},
//!     openapi_builder::{build_document, DocumentInfo},
//!     parser::GoParser,
//!     resolver::Resolver,
//!     scanner::FileScanner,
//!     serializer::serialize_yaml,
//!     translator::Translator,
//! };
//! use std::path::PathBuf;
//!
//! let root = PathBuf::from("./my-go-project");
//! let gomod = GoModLocator::new(&root).unwrap();
//!
//! // Scan and index the project
//! let scan_result = FileScanner::new(root.clone()).scan().unwrap();
//! let mut index = SourceIndex::new();
//! let mut files = Vec::new();
//! for parsed in GoParser::parse_files(&scan_result.go_files).into_iter().flatten() {
//!     let pkg_id = gomod.package_id_for_dir(parsed.path.parent().unwrap()).unwrap();
//!     files.push(index.index_file(&pkg_id, &parsed.path, parsed.ast));
//! }
//!
//! // Extract documented operations
//! let resolver = Resolver::new(index, PackageLoader::new(Box::new(gomod)));
//! let mut comments = CommentParser::new(Translator::new(resolver));
//! let mut items = Vec::new();
//! let mut order = 1;
//! for file in &files {
//!     items.extend(comments.parse_file(file, &mut order).unwrap());
//! }
//!
//! // Build and serialize the document
//! let document = build_document(&DocumentInfo::default(), &items);
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete
//! CLI application.

pub mod apiitem;
pub mod ast;
pub mod cli;
pub mod comment;
pub mod error;
pub mod index;
pub mod loader;
pub mod openapi_builder;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod schema;
pub mod serializer;
pub mod token;
pub mod translator;
