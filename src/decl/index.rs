//! Read-only queries over a parsed declaration tree.
//!
//! Only declarations whose file is the unit's own file are visible; anything
//! a front end reports from included headers is ignored.

use rustc_hash::FxHashMap;

use crate::decl::qualifiers::{decode_qualifiers, Qualifiers};
use crate::decl::types::{
    Access, ClassDecl, Declaration, DeclarationTree, FieldDecl, FunctionDecl, Member,
    NamespaceDecl,
};

/// Query facade used by structural probes.
#[derive(Debug)]
pub struct DeclarationIndex<'t> {
    classes: Vec<&'t ClassDecl>,
    class_by_name: FxHashMap<&'t str, Vec<usize>>,
    functions: Vec<&'t FunctionDecl>,
    namespaces: FxHashMap<&'t str, Vec<&'t NamespaceDecl>>,
}

impl<'t> DeclarationIndex<'t> {
    /// Index the top-level declarations of `tree` that belong to `file`.
    pub fn new(tree: &'t DeclarationTree, file: &str) -> Self {
        let mut index = Self {
            classes: Vec::new(),
            class_by_name: FxHashMap::default(),
            functions: Vec::new(),
            namespaces: FxHashMap::default(),
        };

        for decl in &tree.declarations {
            if decl.location().file != file {
                continue;
            }
            match decl {
                Declaration::Class(class) => {
                    index
                        .class_by_name
                        .entry(class.name.as_str())
                        .or_default()
                        .push(index.classes.len());
                    index.classes.push(class);
                }
                Declaration::Function(func) => index.functions.push(func),
                Declaration::Namespace(ns) => {
                    index.namespaces.entry(ns.name.as_str()).or_default().push(ns)
                }
            }
        }
        index
    }

    /// Top-level classes, structs and unions, optionally by exact name.
    pub fn classes(&self, name: Option<&str>) -> Vec<&'t ClassDecl> {
        match name {
            None => self.classes.clone(),
            Some(name) => self
                .class_by_name
                .get(name)
                .map(|ids| ids.iter().map(|&i| self.classes[i]).collect())
                .unwrap_or_default(),
        }
    }

    /// First class definition with this name.
    pub fn class(&self, name: &str) -> Option<&'t ClassDecl> {
        self.class_by_name
            .get(name)
            .and_then(|ids| ids.first())
            .map(|&i| self.classes[i])
    }

    /// Fields of `class` declared under the given access tier.
    pub fn fields<'c>(&self, class: &'c ClassDecl, access: Access) -> Vec<&'c FieldDecl> {
        members_with_access(class)
            .filter_map(|(tier, member)| match member {
                Member::Field(field) if tier == access => Some(field),
                _ => None,
            })
            .collect()
    }

    /// Methods of `class` in declaration order, optionally only public ones.
    pub fn methods<'c>(&self, class: &'c ClassDecl, public_only: bool) -> Vec<&'c FunctionDecl> {
        members_with_access(class)
            .filter_map(|(tier, member)| match member {
                Member::Method(method) if !public_only || tier == Access::Public => Some(method),
                _ => None,
            })
            .collect()
    }

    /// Top-level free functions.
    pub fn functions(&self) -> &[&'t FunctionDecl] {
        &self.functions
    }

    /// Functions declared directly in every top-level namespace block with
    /// this name.
    pub fn namespace_functions(&self, namespace: &str) -> Vec<&'t FunctionDecl> {
        self.namespaces
            .get(namespace)
            .into_iter()
            .flatten()
            .flat_map(|ns| ns.declarations.iter())
            .filter_map(|decl| match decl {
                Declaration::Function(func) => Some(func),
                _ => None,
            })
            .collect()
    }

    /// Qualifier triple of a function.
    pub fn qualifiers(&self, function: &FunctionDecl) -> Qualifiers {
        decode_qualifiers(&function.usr)
    }
}

/// Members paired with the access tier in effect at their position.
fn members_with_access(class: &ClassDecl) -> impl Iterator<Item = (Access, &Member)> {
    let mut tier = class.kind.default_access();
    class.members.iter().filter_map(move |member| match member {
        Member::Access(access) => {
            tier = *access;
            None
        }
        other => Some((tier, other)),
    })
}
