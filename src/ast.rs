//! Syntax tree for the slice of Go that matters to documentation generation:
//! the package clause, imports, type declarations and the doc comments that
//! annotate them. Function bodies and expressions are deliberately absent.

/// A parsed Go source file.
#[derive(Debug, Clone, Default)]
pub struct GoFile {
    /// Short package name from the `package` clause
    pub package_name: String,
    /// Imports in declaration order
    pub imports: Vec<ImportSpec>,
    /// Top-level type declarations in declaration order
    pub types: Vec<TypeSpec>,
    /// Top-level functions, bodies discarded, doc comments kept
    pub funcs: Vec<FuncDecl>,
    /// Doc comment lines on non-function declarations (imports, types,
    /// consts, vars), in file order. These feed the per-file common
    /// annotation block.
    pub common_docs: Vec<String>,
}

/// One import statement.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// The quoted import path
    pub path: String,
    /// Explicit alias if present. `.` marks a wildcard import, `_` a
    /// side-effect-only import.
    pub alias: Option<String>,
}

impl ImportSpec {
    pub fn is_wildcard(&self) -> bool {
        self.alias.as_deref() == Some(".")
    }

    /// Last segment of the import path, the conventional package name
    pub fn conventional_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A named type declaration, e.g. `type Pet struct { ... }`.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: String,
    pub expr: TypeExpr,
}

/// A top-level function, kept only for its doc comment block.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: String,
    /// Raw `//` comment lines immediately above the declaration
    pub doc: Vec<String>,
}

/// The structural definition of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// Bare name: a primitive or a type in the same package
    Ident(String),
    /// Qualified name: `pkg.Name`
    Selector { pkg: String, name: String },
    Pointer(Box<TypeExpr>),
    /// Slice or fixed-size array; the length is not modeled
    Slice(Box<TypeExpr>),
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Struct(Vec<FieldNode>),
    Interface,
    /// Anything the schema model cannot express (func, chan, ...)
    Opaque,
}

impl TypeExpr {
    /// The dotted reference string for a named type, looking through
    /// pointers. `None` for structural types.
    pub fn ref_name(&self) -> Option<String> {
        match self {
            TypeExpr::Ident(name) => Some(name.clone()),
            TypeExpr::Selector { pkg, name } => Some(format!("{}.{}", pkg, name)),
            TypeExpr::Pointer(inner) => inner.ref_name(),
            _ => None,
        }
    }
}

/// One field inside a struct literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    /// Declared names; empty for embedded fields. Only the first name is
    /// exported to the schema, matching the upstream behavior for
    /// multi-name fields.
    pub names: Vec<String>,
    pub expr: TypeExpr,
    /// Backtick tag string, backticks stripped
    pub tag: Option<String>,
    /// Trailing same-line comment, `//` and whitespace stripped
    pub comment: Option<String>,
    /// Anonymous field whose properties get promoted into the parent
    pub embedded: bool,
}

impl GoFile {
    /// Resolve a short package name used in this file to its import path.
    ///
    /// Aliased imports are matched first. An alias of `_` is never matched
    /// as an alias (code cannot reference it), but the import still
    /// resolves through its conventional name so comments may reference
    /// types from side-effect-only imports.
    pub fn import_path(&self, short_name: &str) -> Option<&str> {
        for spec in &self.imports {
            if let Some(alias) = &spec.alias {
                if alias != "_" {
                    if alias == short_name {
                        return Some(&spec.path);
                    }
                    continue;
                }
            }
            if spec.conventional_name() == short_name {
                return Some(&spec.path);
            }
        }
        None
    }

    /// Paths of `.` imports, in declaration order
    pub fn wildcard_imports(&self) -> Vec<&str> {
        self.imports
            .iter()
            .filter(|s| s.is_wildcard())
            .map(|s| s.path.as_str())
            .collect()
    }
}
