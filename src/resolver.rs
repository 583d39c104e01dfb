//! Resolution of type references to their declarations.
//!
//! A reference is either qualified (`pkg.Name`, resolved through the
//! referencing file's imports) or bare (`Name`, resolved in the file's own
//! package first, then in dot-imported packages in declaration order).
//! Packages are pulled into the index lazily as references point into them.

use crate::error::Result;
use crate::index::{SourceFile, SourceIndex, TypeDecl};
use crate::loader::PackageLoader;
use log::debug;
use std::rc::Rc;

pub struct Resolver {
    index: SourceIndex,
    loader: PackageLoader,
}

impl Resolver {
    pub fn new(index: SourceIndex, loader: PackageLoader) -> Self {
        Self { index, loader }
    }

    /// Resolves a type reference as written in `from`. Returns `Ok(None)`
    /// when no declaration can be found, which callers treat as an opaque
    /// shape rather than a failure.
    pub fn resolve(&mut self, name: &str, from: &Rc<SourceFile>) -> Result<Option<Rc<TypeDecl>>> {
        match name.split_once('.') {
            Some((pkg_short, type_name)) => self.resolve_qualified(pkg_short, type_name, from),
            None => self.resolve_bare(name, from),
        }
    }

    fn resolve_qualified(
        &mut self,
        pkg_short: &str,
        type_name: &str,
        from: &Rc<SourceFile>,
    ) -> Result<Option<Rc<TypeDecl>>> {
        let Some(import_path) = from.ast.import_path(pkg_short) else {
            debug!(
                "no import for package {} in {}",
                pkg_short,
                from.path.display()
            );
            return Ok(None);
        };
        let import_path = import_path.to_string();
        if !self.loader.ensure_loaded(&mut self.index, &import_path)? {
            return Ok(None);
        }
        Ok(self.index.lookup(&import_path, type_name))
    }

    fn resolve_bare(
        &mut self,
        type_name: &str,
        from: &Rc<SourceFile>,
    ) -> Result<Option<Rc<TypeDecl>>> {
        if let Some(decl) = self.index.lookup(&from.pkg_id, type_name) {
            return Ok(Some(decl));
        }
        let wildcard_paths: Vec<String> = from
            .ast
            .wildcard_imports()
            .into_iter()
            .map(String::from)
            .collect();
        for path in wildcard_paths {
            if !self.loader.ensure_loaded(&mut self.index, &path)? {
                continue;
            }
            if let Some(decl) = self.index.lookup(&path, type_name) {
                return Ok(Some(decl));
            }
        }
        debug!("unresolved reference {} in {}", type_name, from.path.display());
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::loader::{GoModLocator, PackageLocator};
    use crate::parser::GoParser;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct CountingLocator {
        inner: GoModLocator,
        calls: Rc<RefCell<Vec<String>>>,
    }

    impl PackageLocator for CountingLocator {
        fn locate(&self, pkg_id: &str) -> Result<Option<PathBuf>> {
            self.calls.borrow_mut().push(pkg_id.to_string());
            self.inner.locate(pkg_id)
        }
    }

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
            "package model\n\ntype Pet struct {\n    Name string `json:\"name\"`\n}\n",
        );
        write_file(
            tmp.path(),
            "comm/comm.go",
            "package comm\n\ntype HttpCode struct {\n    Code int `json:\"code\"`\n}\n",
        );
        tmp
    }

    fn resolver_with_calls(tmp: &TempDir) -> (Resolver, Rc<RefCell<Vec<String>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let locator = CountingLocator {
            inner: GoModLocator::new(tmp.path()).unwrap(),
            calls: Rc::clone(&calls),
        };
        let resolver = Resolver::new(SourceIndex::new(), PackageLoader::new(Box::new(locator)));
        (resolver, calls)
    }

    fn handler_file(resolver: &mut Resolver, src: &str) -> Rc<SourceFile> {
        let ast = GoParser::parse_source(src).unwrap();
        resolver
            .index
            .index_file("petshop/pet", Path::new("/src/pet/handler.go"), ast)
    }

    #[test]
    fn test_qualified_reference_uses_imports() {
        let tmp = fixture();
        let (mut resolver, _) = resolver_with_calls(&tmp);
        let from = handler_file(
            &mut resolver,
            "package pet\n\nimport \"petshop/model\"\n",
        );

        let decl = resolver.resolve("model.Pet", &from).unwrap().unwrap();
        assert_eq!(decl.full_id(), "petshop/model.Pet");
    }

    #[test]
    fn test_aliased_import_resolves_by_alias_only() {
        let tmp = fixture();
        let (mut resolver, _) = resolver_with_calls(&tmp);
        let from = handler_file(
            &mut resolver,
            "package pet\n\nimport m \"petshop/model\"\n",
        );

        assert!(resolver.resolve("m.Pet", &from).unwrap().is_some());
        assert!(resolver.resolve("model.Pet", &from).unwrap().is_none());
    }

    #[test]
    fn test_bare_reference_prefers_own_package() {
        let tmp = fixture();
        let (mut resolver, _) = resolver_with_calls(&tmp);
        let from = handler_file(
            &mut resolver,
            "package pet\n\nimport . \"petshop/model\"\n\ntype Pet string\n",
        );

        let decl = resolver.resolve("Pet", &from).unwrap().unwrap();
        assert_eq!(decl.pkg_id, "petshop/pet");
    }

    #[test]
    fn test_bare_reference_falls_back_to_dot_imports() {
        let tmp = fixture();
        let (mut resolver, _) = resolver_with_calls(&tmp);
        let from = handler_file(
            &mut resolver,
            "package pet\n\nimport . \"petshop/model\"\n",
        );

        let decl = resolver.resolve("Pet", &from).unwrap().unwrap();
        assert_eq!(decl.full_id(), "petshop/model.Pet");
    }

    #[test]
    fn test_unknown_reference_is_none_not_error() {
        let tmp = fixture();
        let (mut resolver, _) = resolver_with_calls(&tmp);
        let from = handler_file(&mut resolver, "package pet\n");

        assert!(resolver.resolve("Mystery", &from).unwrap().is_none());
        assert!(resolver.resolve("fmt.Stringer", &from).unwrap().is_none());
    }

    #[test]
    fn test_packages_load_once() {
        let tmp = fixture();
        let (mut resolver, calls) = resolver_with_calls(&tmp);
        let from = handler_file(
            &mut resolver,
            "package pet\n\nimport \"petshop/model\"\n",
        );

        resolver.resolve("model.Pet", &from).unwrap();
        resolver.resolve("model.Pet", &from).unwrap();
        resolver.resolve("model.Missing", &from).unwrap();

        let model_loads = calls
            .borrow()
            .iter()
            .filter(|p| p.as_str() == "petshop/model")
            .count();
        assert_eq!(model_loads, 1);
    }

    #[test]
    fn test_locator_failure_propagates() {
        struct BrokenLocator;
        impl PackageLocator for BrokenLocator {
            fn locate(&self, _pkg_id: &str) -> Result<Option<PathBuf>> {
                Err(Error::Toolchain("locator unavailable".to_string()))
            }
        }

        let mut resolver =
            Resolver::new(SourceIndex::new(), PackageLoader::new(Box::new(BrokenLocator)));
        let ast = GoParser::parse_source("package pet\n\nimport \"petshop/model\"\n").unwrap();
        let from = resolver
            .index
            .index_file("petshop/pet", Path::new("/src/pet/handler.go"), ast);

        let err = resolver.resolve("model.Pet", &from).unwrap_err();
        assert!(matches!(err, Error::Toolchain(_)));
    }
}
