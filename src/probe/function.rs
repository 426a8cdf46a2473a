//! Function, method and macro existence probes.

use crate::decl::{DeclLocation, DeclarationIndex, FunctionDecl, ParamDecl, Qualifiers};
use crate::locator::SourceLocator;
use crate::probe::{base_type_name, CheckContext};

/// An exact free-function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionProbe {
    pub name: String,
    pub return_type: String,
    pub params: Vec<ParamDecl>,
    pub qualifiers: Qualifiers,
    pub origin: Option<SourceLocator>,
}

impl FunctionProbe {
    pub fn new(
        name: impl Into<String>,
        return_type: impl Into<String>,
        params: Vec<ParamDecl>,
        qualifiers: Qualifiers,
    ) -> Self {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params,
            qualifiers,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: SourceLocator) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Whether `function` has exactly this signature: name, qualifiers,
    /// return type, and every parameter's name and type in order.
    pub fn matches(&self, index: &DeclarationIndex, function: &FunctionDecl) -> bool {
        function.name == self.name
            && index.qualifiers(function) == self.qualifiers
            && function.return_type == self.return_type
            && function.params == self.params
    }

    pub fn check(&self, ctx: &mut CheckContext) -> bool {
        let index = ctx.index();
        let functions = index.functions();
        if functions.iter().any(|f| self.matches(index, f)) {
            return true;
        }
        let location = functions
            .iter()
            .find(|f| f.name == self.name)
            .map(|f| f.location.clone());
        ctx.set_failure(format!("Function '{}' not found", self.name), location);
        false
    }
}

/// A method signature on a named type, searched on the type and its direct
/// bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodProbe {
    pub class_name: String,
    pub signature: FunctionProbe,
    pub origin: Option<SourceLocator>,
}

impl MethodProbe {
    pub fn new(class_name: impl Into<String>, signature: FunctionProbe) -> Self {
        Self {
            class_name: class_name.into(),
            signature,
            origin: None,
        }
    }

    /// Types searched for the method: the probed type, then each direct base
    /// in base-list order. Bases of bases are not followed.
    pub fn candidate_types(&self, index: &DeclarationIndex) -> Vec<String> {
        let mut types = vec![self.class_name.clone()];
        if let Some(class) = index.class(&self.class_name) {
            types.extend(class.bases.iter().cloned());
        }
        types
    }

    fn class_location(&self, index: &DeclarationIndex) -> Option<DeclLocation> {
        index.class(&self.class_name).map(|c| c.location.clone())
    }

    /// Whether any public method of a candidate type matches.
    pub fn find(&self, index: &DeclarationIndex) -> bool {
        self.candidate_types(index).iter().any(|ty| {
            index.classes(Some(ty.as_str())).iter().any(|class| {
                index
                    .methods(class, true)
                    .iter()
                    .any(|m| self.signature.matches(index, m))
            })
        })
    }

    pub fn check(&self, ctx: &mut CheckContext) -> bool {
        let index = ctx.index();
        if self.find(index) {
            return true;
        }
        ctx.set_failure(
            format!(
                "Method '{}::{}' not found",
                self.class_name, self.signature.name
            ),
            self.class_location(index),
        );
        false
    }
}

/// A free-function overload in the library namespace, matched on its first
/// parameter only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroProbe {
    pub namespace: String,
    pub name: String,
    /// Type candidates; only the first one is ever compared.
    pub types: Vec<String>,
    pub origin: Option<SourceLocator>,
}

impl MacroProbe {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, types: Vec<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            types,
            origin: None,
        }
    }

    /// Same macro probed for another type.
    pub fn for_type(&self, type_name: &str) -> Self {
        Self {
            types: vec![type_name.to_string()],
            ..self.clone()
        }
    }

    pub fn find(&self, index: &DeclarationIndex) -> bool {
        let expected = self.types.first().map(|t| base_type_name(t));
        index
            .namespace_functions(&self.namespace)
            .iter()
            .filter(|f| f.name == self.name)
            .any(|f| match (&expected, f.params.first()) {
                (None, _) => true,
                (Some(expected), Some(param)) => base_type_name(&param.type_name) == *expected,
                (Some(_), None) => false,
            })
    }

    pub fn check(&self, ctx: &mut CheckContext) -> bool {
        let index = ctx.index();
        if self.find(index) {
            return true;
        }
        let type_name = self.types.first().map(String::as_str).unwrap_or("");
        ctx.set_failure(
            format!(
                "Function '{}::{}' not defined for type '{}'",
                self.namespace, self.name, type_name
            ),
            None,
        );
        false
    }
}

/// A capability satisfied either by a method or by a library overload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodOrMacroProbe {
    pub method: MethodProbe,
    pub macro_probe: MacroProbe,
    /// Capability name used in the failure message.
    pub capability: String,
    pub origin: Option<SourceLocator>,
}

impl MethodOrMacroProbe {
    pub fn new(method: MethodProbe, macro_probe: MacroProbe, capability: impl Into<String>) -> Self {
        Self {
            method,
            macro_probe,
            capability: capability.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: SourceLocator) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Macro probes tried after the method search fails: one per candidate
    /// type of the method search, in order.
    pub fn fallback_macros(&self, index: &DeclarationIndex) -> Vec<MacroProbe> {
        self.method
            .candidate_types(index)
            .iter()
            .map(|ty| self.macro_probe.for_type(ty))
            .collect()
    }

    pub fn check(&self, ctx: &mut CheckContext) -> bool {
        let index = ctx.index();
        if self.method.find(index) {
            return true;
        }
        if self.fallback_macros(index).iter().any(|m| m.find(index)) {
            return true;
        }
        ctx.set_failure(
            format!(
                "Function '{}' not defined for type '{}'",
                self.capability, self.method.class_name
            ),
            self.method.class_location(index),
        );
        false
    }
}
