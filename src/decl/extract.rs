//! Declaration extraction from C++ source with tree-sitter-cpp.
//!
//! Walks the parsed unit and builds a [`DeclarationTree`]: classes with their
//! members in declaration order, free functions and namespaces. Type
//! spellings are normalized to the compiler's style (`const ca::Packer &`,
//! `char *`) so that probes can compare them as strings.
//!
//! Also reports syntax errors (ERROR and MISSING nodes) for the in-process
//! front end.

use phf::phf_set;
use tree_sitter::{Node, Parser, Tree};

use crate::decl::qualifiers::{encode_qualifiers, Qualifiers};
use crate::decl::types::{
    Access, ClassDecl, ClassKind, DeclLocation, Declaration, DeclarationTree, FieldDecl,
    FunctionDecl, Member, NamespaceDecl, ParamDecl,
};
use crate::error::{Result, VerifyError};

/// Wrapper nodes whose named children are declarations of the enclosing
/// scope.
static TRANSPARENT_CONTAINERS: phf::Set<&'static str> = phf_set! {
    "preproc_if", "preproc_ifdef", "preproc_else", "preproc_elif",
    "linkage_specification", "declaration_list",
};

/// Declarator kinds that sit between a declaration's type and the name.
static DECLARATOR_WRAPPERS: phf::Set<&'static str> = phf_set! {
    "pointer_declarator", "reference_declarator", "parenthesized_declarator",
    "abstract_pointer_declarator", "abstract_reference_declarator",
};

/// Where a function was found, for its symbol id.
#[derive(Debug, Clone, Copy)]
enum Scope<'s> {
    Global,
    Namespace(&'s str),
    Class(&'s str),
}

/// A syntax problem found in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// Create a parser configured for C++.
pub fn cpp_parser() -> Result<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_cpp::LANGUAGE.into())
        .map_err(|e| VerifyError::TreeSitter(e.to_string()))?;
    Ok(parser)
}

/// Parse C++ text into a tree.
pub fn parse_cpp(source: &str) -> Result<Tree> {
    let mut parser = cpp_parser()?;
    parser
        .parse(source, None)
        .ok_or_else(|| VerifyError::TreeSitter("parser returned no tree".to_string()))
}

/// Extractor for one source text attributed to `file`.
pub struct CppExtractor<'a> {
    source: &'a [u8],
    file: &'a str,
}

impl<'a> CppExtractor<'a> {
    pub fn new(source: &'a str, file: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            file,
        }
    }

    /// Build the declaration tree of a parsed unit.
    pub fn extract(&self, tree: &Tree) -> DeclarationTree {
        let mut declarations = Vec::new();
        self.collect_items(tree.root_node(), Scope::Global, &mut declarations);
        DeclarationTree { declarations }
    }

    /// Syntax errors in document order, outermost first.
    pub fn syntax_errors(&self, tree: &Tree) -> Vec<SyntaxError> {
        let mut errors = Vec::new();
        if tree.root_node().has_error() {
            self.collect_syntax_errors(tree.root_node(), &mut errors);
        }
        errors
    }

    // =========================================================================
    // Text helpers
    // =========================================================================

    #[inline]
    fn get_text(&self, node: Node) -> &'a str {
        std::str::from_utf8(&self.source[node.start_byte()..node.end_byte()]).unwrap_or("")
    }

    /// Node text with whitespace runs collapsed.
    fn normalized_text(&self, node: Node) -> String {
        self.get_text(node).split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn location(&self, node: Node) -> DeclLocation {
        let pos = node.start_position();
        DeclLocation {
            file: self.file.to_string(),
            line: pos.row as u32 + 1,
            column: pos.column as u32 + 1,
        }
    }

    // =========================================================================
    // Scope walking
    // =========================================================================

    fn collect_items(&self, container: Node, scope: Scope, out: &mut Vec<Declaration>) {
        let mut cursor = container.walk();
        for child in container.named_children(&mut cursor) {
            self.collect_item(child, scope, out);
        }
    }

    fn collect_item(&self, node: Node, scope: Scope, out: &mut Vec<Declaration>) {
        match node.kind() {
            "class_specifier" | "struct_specifier" | "union_specifier" => {
                if let Some(class) = self.extract_class(node) {
                    out.push(Declaration::Class(class));
                }
            }
            "function_definition" => {
                if let Some(func) = self.extract_function(node, scope) {
                    out.push(Declaration::Function(func));
                }
            }
            "declaration" => {
                // `struct T { ... } t;` declares the class too.
                if let Some(ty) = node.child_by_field_name("type") {
                    if let Some(class) = self.extract_class(ty) {
                        out.push(Declaration::Class(class));
                    }
                }
                if let Some(func) = self.extract_function(node, scope) {
                    out.push(Declaration::Function(func));
                }
            }
            "template_declaration" => {
                let mut cursor = node.walk();
                let inner: Vec<Node> = node
                    .named_children(&mut cursor)
                    .filter(|c| c.kind() != "template_parameter_list")
                    .collect();
                for child in inner {
                    self.collect_item(child, scope, out);
                }
            }
            "namespace_definition" => {
                if let Some(ns) = self.extract_namespace(node) {
                    out.push(Declaration::Namespace(ns));
                }
            }
            kind if TRANSPARENT_CONTAINERS.contains(kind) => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.collect_items(body, scope, out);
                } else {
                    self.collect_items(node, scope, out);
                }
            }
            _ => {}
        }
    }

    fn extract_namespace(&self, node: Node) -> Option<NamespaceDecl> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.normalized_text(name_node);
        let mut declarations = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            self.collect_items(body, Scope::Namespace(&name), &mut declarations);
        }
        Some(NamespaceDecl {
            name: name.clone(),
            declarations,
            location: self.location(name_node),
        })
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn extract_class(&self, node: Node) -> Option<ClassDecl> {
        let kind = match node.kind() {
            "class_specifier" => ClassKind::Class,
            "struct_specifier" => ClassKind::Struct,
            "union_specifier" => ClassKind::Union,
            _ => return None,
        };
        // Forward declarations and elaborated type uses have no body.
        let body = node.child_by_field_name("body")?;
        let name_node = node.child_by_field_name("name")?;
        let name = self.normalized_text(name_node);

        let mut members = Vec::new();
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            match child.kind() {
                "access_specifier" => {
                    if let Some(access) = Access::from_keyword(self.get_text(child)) {
                        members.push(Member::Access(access));
                    }
                }
                "field_declaration" | "declaration" | "function_definition" => {
                    if let Some(method) = self.extract_function(child, Scope::Class(&name)) {
                        members.push(Member::Method(method));
                    } else if child.kind() == "field_declaration" {
                        members.extend(self.extract_fields(child).into_iter().map(Member::Field));
                    }
                }
                "template_declaration" => {
                    let mut inner_cursor = child.walk();
                    for inner in child.named_children(&mut inner_cursor) {
                        if let Some(method) = self.extract_function(inner, Scope::Class(&name)) {
                            members.push(Member::Method(method));
                        }
                    }
                }
                _ => {}
            }
        }

        Some(ClassDecl {
            kind,
            bases: self.extract_base_classes(node),
            name,
            members,
            location: self.location(name_node),
        })
    }

    /// Direct base type names from a `base_class_clause`.
    fn extract_base_classes(&self, node: Node) -> Vec<String> {
        let mut bases = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() != "base_class_clause" {
                continue;
            }
            let mut base_cursor = child.walk();
            for base in child.named_children(&mut base_cursor) {
                match base.kind() {
                    "type_identifier" | "qualified_type_identifier" | "qualified_identifier"
                    | "template_type" => bases.push(self.normalized_text(base)),
                    // Older grammars wrap each base in its own node.
                    "base_class_specifier" => {
                        let text = self.normalized_text(base);
                        let name = text
                            .split_whitespace()
                            .filter(|w| {
                                !matches!(*w, "public" | "protected" | "private" | "virtual")
                            })
                            .collect::<Vec<_>>()
                            .join(" ");
                        if !name.is_empty() {
                            bases.push(name);
                        }
                    }
                    _ => {}
                }
            }
        }
        bases
    }

    fn extract_fields(&self, node: Node) -> Vec<FieldDecl> {
        let Some(type_node) = node.child_by_field_name("type") else {
            return Vec::new();
        };
        let base = self.base_type(node, type_node);

        let mut fields = Vec::new();
        let mut cursor = node.walk();
        for declarator in node.children_by_field_name("declarator", &mut cursor) {
            let (name_node, sigils) = self.unwrap_declarator(declarator);
            let Some(name_node) = name_node else {
                continue;
            };
            let name = match name_node.kind() {
                "array_declarator" => name_node
                    .child_by_field_name("declarator")
                    .map(|n| self.get_text(n).to_string())
                    .unwrap_or_default(),
                _ => self.get_text(name_node).to_string(),
            };
            if name.is_empty() {
                continue;
            }
            fields.push(FieldDecl {
                name,
                type_name: spell_type(&base, &sigils),
                location: self.location(name_node),
            });
        }
        fields
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Extract a function from a definition or a prototype.
    ///
    /// Returns `None` for declarations that do not declare a function and for
    /// out-of-line member definitions (`T::f() { ... }`), which belong to
    /// their class rather than to the enclosing scope.
    fn extract_function(&self, node: Node, scope: Scope) -> Option<FunctionDecl> {
        let declarator = node.child_by_field_name("declarator")?;
        let (inner, sigils) = self.unwrap_declarator(declarator);
        let func_declarator = inner.filter(|n| n.kind() == "function_declarator")?;

        let name_node = func_declarator.child_by_field_name("declarator")?;
        if name_node.kind() == "qualified_identifier" && !matches!(scope, Scope::Class(_)) {
            return None;
        }
        let name = self.normalized_text(name_node);

        let return_type = match node.child_by_field_name("type") {
            Some(type_node) => spell_type(&self.base_type(node, type_node), &sigils),
            None => String::new(),
        };

        let params = func_declarator
            .child_by_field_name("parameters")
            .map(|p| self.extract_params(p))
            .unwrap_or_default();

        let mut qualifiers = Qualifiers::NONE;
        let mut cursor = func_declarator.walk();
        for child in func_declarator.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                qualifiers.add_keyword(self.get_text(child));
            }
        }

        let usr = symbol_id(scope, &name, &params, qualifiers);
        Some(FunctionDecl {
            name,
            return_type,
            params,
            usr,
            location: self.location(name_node),
        })
    }

    /// Extract parameters from a parameter_list node.
    fn extract_params(&self, node: Node) -> Vec<ParamDecl> {
        let mut params = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" | "optional_parameter_declaration" => {
                    if let Some(param) = self.extract_parameter(child) {
                        params.push(param);
                    }
                }
                "variadic_parameter_declaration" => {
                    params.push(ParamDecl::new("", "..."));
                }
                _ => {}
            }
        }
        params
    }

    /// Extract a single parameter declaration.
    ///
    /// `void f(void)` yields no parameter.
    fn extract_parameter(&self, node: Node) -> Option<ParamDecl> {
        let type_node = node.child_by_field_name("type")?;
        let base = self.base_type(node, type_node);

        let (name, sigils) = match node.child_by_field_name("declarator") {
            Some(declarator) => {
                let (name_node, sigils) = self.unwrap_declarator(declarator);
                let name = name_node
                    .map(|n| match n.kind() {
                        "array_declarator" => n
                            .child_by_field_name("declarator")
                            .map(|d| self.get_text(d).to_string())
                            .unwrap_or_default(),
                        _ => self.get_text(n).to_string(),
                    })
                    .unwrap_or_default();
                (name, sigils)
            }
            None => (String::new(), String::new()),
        };

        if base == "void" && name.is_empty() && sigils.is_empty() {
            return None;
        }
        Some(ParamDecl {
            name,
            type_name: spell_type(&base, &sigils),
        })
    }

    /// Type text with the declaration's own cv-qualifiers in front.
    fn base_type(&self, decl: Node, type_node: Node) -> String {
        let mut parts = Vec::new();
        let mut cursor = decl.walk();
        for child in decl.children(&mut cursor) {
            if child.kind() == "type_qualifier" {
                parts.push(self.normalized_text(child));
            }
        }
        parts.push(self.normalized_text(type_node));
        parts.join(" ")
    }

    /// Peel pointer/reference declarators off `node`.
    ///
    /// Returns the innermost declarator (identifier, function_declarator, ...)
    /// and the pointer/reference sigils in spelling order.
    fn unwrap_declarator<'n>(&self, node: Node<'n>) -> (Option<Node<'n>>, String) {
        let mut sigils = String::new();
        let mut current = node;
        loop {
            if !DECLARATOR_WRAPPERS.contains(current.kind()) {
                return (Some(current), sigils);
            }
            match current.kind() {
                "pointer_declarator" | "abstract_pointer_declarator" => {
                    sigils.push('*');
                    let mut cursor = current.walk();
                    for child in current.children(&mut cursor) {
                        if child.kind() == "type_qualifier" {
                            sigils.push_str(self.get_text(child));
                        }
                    }
                }
                "reference_declarator" | "abstract_reference_declarator" => {
                    if self.get_text(current).trim_start().starts_with("&&") {
                        sigils.push_str("&&");
                    } else {
                        sigils.push('&');
                    }
                }
                _ => {}
            }
            let next = current.child_by_field_name("declarator").or_else(|| {
                let mut cursor = current.walk();
                let found = current.named_children(&mut cursor).next();
                found
            });
            match next {
                Some(next) => current = next,
                None => return (None, sigils),
            }
        }
    }

    // =========================================================================
    // Syntax errors
    // =========================================================================

    fn collect_syntax_errors(&self, node: Node, out: &mut Vec<SyntaxError>) {
        if node.is_missing() {
            let pos = node.start_position();
            out.push(SyntaxError {
                line: pos.row as u32 + 1,
                column: pos.column as u32 + 1,
                message: format!("expected '{}'", node.kind()),
            });
            return;
        }
        if node.is_error() {
            let pos = node.start_position();
            let text = self.normalized_text(node);
            let snippet: String = text.chars().take(40).collect();
            out.push(SyntaxError {
                line: pos.row as u32 + 1,
                column: pos.column as u32 + 1,
                message: format!("syntax error near '{}'", snippet),
            });
            return;
        }
        if !node.has_error() {
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_syntax_errors(child, out);
        }
    }
}

/// Join a base type and pointer/reference sigils the way compilers print
/// them: `int`, `char *`, `const ca::Packer &`.
fn spell_type(base: &str, sigils: &str) -> String {
    if sigils.is_empty() {
        base.to_string()
    } else {
        format!("{} {}", base, sigils)
    }
}

/// Build the unified symbol id of a function, qualifier suffix included.
fn symbol_id(scope: Scope, name: &str, params: &[ParamDecl], qualifiers: Qualifiers) -> String {
    let mut usr = String::from("c:");
    match scope {
        Scope::Global => {}
        Scope::Namespace(ns) => {
            usr.push_str("@N@");
            usr.push_str(ns);
        }
        Scope::Class(class) => {
            usr.push_str("@S@");
            usr.push_str(class);
        }
    }
    usr.push_str("@F@");
    usr.push_str(name);
    usr.push('#');
    let types: Vec<&str> = params.iter().map(|p| p.type_name.as_str()).collect();
    usr.push_str(&types.join(","));
    encode_qualifiers(&mut usr, qualifiers);
    usr
}

/// Parse `source` and extract its declarations in one step.
pub fn extract_declarations(source: &str, file: &str) -> Result<DeclarationTree> {
    let tree = parse_cpp(source)?;
    Ok(CppExtractor::new(source, file).extract(&tree))
}
