//! Declaration tree types.
//!
//! Front-end independent model of what a parsed unit declares: classes,
//! their members in declaration order, free functions and namespaces.

use serde::{Deserialize, Serialize};

/// Position of a declaration (1-indexed line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// `class`, `struct` or `union`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Class,
    Struct,
    Union,
}

impl ClassKind {
    /// Access tier in effect before the first access specifier.
    pub fn default_access(self) -> Access {
        match self {
            ClassKind::Class => Access::Private,
            ClassKind::Struct | ClassKind::Union => Access::Public,
        }
    }
}

/// C++ access specifier tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text.trim().trim_end_matches(':').trim() {
            "public" => Some(Access::Public),
            "protected" => Some(Access::Protected),
            "private" => Some(Access::Private),
            _ => None,
        }
    }
}

/// A function parameter: name and declared type spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDecl {
    /// Parameter name; empty when unnamed.
    pub name: String,
    /// Type spelling, e.g. `const ca::Packer &`.
    pub type_name: String,
}

impl ParamDecl {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A free function or a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    /// Return type spelling; empty for constructors and destructors.
    pub return_type: String,
    pub params: Vec<ParamDecl>,
    /// Unified symbol id. Its last character encodes cv/restrict
    /// qualifiers; see [`crate::decl::qualifiers`].
    pub usr: String,
    pub location: DeclLocation,
}

/// A data member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: String,
    pub location: DeclLocation,
}

/// Class body entry, kept in declaration order so the access tier of each
/// member can be recovered by scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Member {
    Access(Access),
    Field(FieldDecl),
    Method(FunctionDecl),
}

/// A class, struct or union definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDecl {
    pub kind: ClassKind,
    pub name: String,
    /// Direct base type names, access keywords stripped.
    pub bases: Vec<String>,
    pub members: Vec<Member>,
    pub location: DeclLocation,
}

/// A named namespace with its direct declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceDecl {
    pub name: String,
    pub declarations: Vec<Declaration>,
    pub location: DeclLocation,
}

/// Top-level (or namespace-level) declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Declaration {
    Class(ClassDecl),
    Function(FunctionDecl),
    Namespace(NamespaceDecl),
}

impl Declaration {
    pub fn location(&self) -> &DeclLocation {
        match self {
            Declaration::Class(c) => &c.location,
            Declaration::Function(f) => &f.location,
            Declaration::Namespace(n) => &n.location,
        }
    }
}

/// Everything a front end extracted from one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationTree {
    pub declarations: Vec<Declaration>,
}
