//! Index of parsed Go source, keyed by package id and type name.
//!
//! A package id is the import path of the package (for example
//! `petshop/model`). A type's full id is `<package id>.<name>`, which is the
//! key used by the schema cache.

use crate::ast::{GoFile, TypeExpr};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One parsed source file, tied to the package it belongs to.
#[derive(Debug)]
pub struct SourceFile {
    pub pkg_id: String,
    pub path: PathBuf,
    pub ast: GoFile,
}

impl SourceFile {
    pub fn new(pkg_id: impl Into<String>, path: impl Into<PathBuf>, ast: GoFile) -> Self {
        Self {
            pkg_id: pkg_id.into(),
            path: path.into(),
            ast,
        }
    }
}

/// A named type declaration together with the file it was declared in. The
/// file is kept so references inside the declaration resolve against that
/// file's imports, not the referencing file's.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub pkg_id: String,
    pub name: String,
    pub file: Rc<SourceFile>,
    pub expr: TypeExpr,
}

impl TypeDecl {
    /// `<package id>.<name>`, the cache key for this declaration.
    pub fn full_id(&self) -> String {
        format!("{}.{}", self.pkg_id, self.name)
    }
}

#[derive(Debug, Default)]
pub struct Package {
    pub id: String,
    pub files: Vec<Rc<SourceFile>>,
    pub types: HashMap<String, Rc<TypeDecl>>,
}

/// All indexed packages. Packages are added as files are parsed, either up
/// front by the scanner or on demand by the loader.
#[derive(Debug, Default)]
pub struct SourceIndex {
    packages: HashMap<String, Package>,
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parsed file under its package id, registering every type it
    /// declares. Re-indexing a path already present replaces the earlier
    /// entries.
    pub fn index_file(&mut self, pkg_id: &str, path: &Path, ast: GoFile) -> Rc<SourceFile> {
        let package = self
            .packages
            .entry(pkg_id.to_string())
            .or_insert_with(|| Package {
                id: pkg_id.to_string(),
                ..Package::default()
            });

        if let Some(existing) = package.files.iter().position(|f| f.path == path) {
            let old = package.files.remove(existing);
            for spec in &old.ast.types {
                package.types.remove(&spec.name);
            }
        }

        let file = Rc::new(SourceFile::new(pkg_id, path, ast));
        for spec in &file.ast.types {
            let decl = TypeDecl {
                pkg_id: pkg_id.to_string(),
                name: spec.name.clone(),
                file: Rc::clone(&file),
                expr: spec.expr.clone(),
            };
            package.types.insert(spec.name.clone(), Rc::new(decl));
        }
        package.files.push(Rc::clone(&file));
        file
    }

    pub fn package(&self, pkg_id: &str) -> Option<&Package> {
        self.packages.get(pkg_id)
    }

    pub fn contains_package(&self, pkg_id: &str) -> bool {
        self.packages.contains_key(pkg_id)
    }

    /// Looks up a type by package id and bare name.
    pub fn lookup(&self, pkg_id: &str, name: &str) -> Option<Rc<TypeDecl>> {
        self.packages
            .get(pkg_id)
            .and_then(|pkg| pkg.types.get(name))
            .map(Rc::clone)
    }

    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::GoParser;
    use pretty_assertions::assert_eq;

    fn ast(src: &str) -> GoFile {
        GoParser::parse_source(src).expect("source should parse")
    }

    #[test]
    fn test_index_and_lookup() {
        let mut index = SourceIndex::new();
        index.index_file(
            "petshop/model",
            Path::new("/src/model/pet.go"),
            ast("package model\n\ntype Pet struct {\n    Name string `json:\"name\"`\n}\n"),
        );

        let decl = index.lookup("petshop/model", "Pet").expect("Pet indexed");
        assert_eq!(decl.full_id(), "petshop/model.Pet");
        assert_eq!(decl.file.pkg_id, "petshop/model");
        assert!(index.lookup("petshop/model", "Missing").is_none());
        assert!(index.lookup("petshop/other", "Pet").is_none());
    }

    #[test]
    fn test_reindex_replaces_earlier_entries() {
        let mut index = SourceIndex::new();
        let path = Path::new("/src/model/pet.go");
        index.index_file(
            "petshop/model",
            path,
            ast("package model\n\ntype Pet string\ntype Old string\n"),
        );
        index.index_file("petshop/model", path, ast("package model\n\ntype Pet int\n"));

        assert!(index.lookup("petshop/model", "Old").is_none());
        let decl = index.lookup("petshop/model", "Pet").expect("Pet indexed");
        assert_eq!(decl.expr, TypeExpr::Ident("int".to_string()));
        assert_eq!(index.package("petshop/model").unwrap().files.len(), 1);
    }

    #[test]
    fn test_types_span_files_in_a_package() {
        let mut index = SourceIndex::new();
        index.index_file(
            "petshop/model",
            Path::new("/src/model/pet.go"),
            ast("package model\n\ntype Pet string\n"),
        );
        index.index_file(
            "petshop/model",
            Path::new("/src/model/tag.go"),
            ast("package model\n\ntype Tag string\n"),
        );

        assert!(index.lookup("petshop/model", "Pet").is_some());
        assert!(index.lookup("petshop/model", "Tag").is_some());
        assert_eq!(index.package_count(), 1);
    }
}
