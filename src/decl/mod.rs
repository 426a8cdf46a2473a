//! Declaration query facade.
//!
//! - [`types`]: front-end independent declaration tree
//! - [`extract`]: tree-sitter-cpp extraction into that tree
//! - [`index`]: read-only queries used by structural probes
//! - [`qualifiers`]: cv/restrict encoding in symbol ids

pub mod extract;
pub mod index;
pub mod qualifiers;
pub mod types;

pub use extract::{extract_declarations, parse_cpp, CppExtractor, SyntaxError};
pub use index::DeclarationIndex;
pub use qualifiers::{decode_qualifiers, Qualifiers};
pub use types::{
    Access, ClassDecl, ClassKind, DeclLocation, Declaration, DeclarationTree, FieldDecl,
    FunctionDecl, Member, NamespaceDecl, ParamDecl,
};
