//! Check algebra.
//!
//! A [`Probe`] is one declarative check. Statement probes are written into
//! the unit and succeed when the compiler accepts them; every other variant
//! is structural and is evaluated directly against the declaration index.
//!
//! Structural probes report through [`CheckContext::set_failure`]. The sink
//! keeps only the last message, which trace probes rely on.

mod function;
mod statement;
mod trace;

pub use function::{FunctionProbe, MacroProbe, MethodOrMacroProbe, MethodProbe};
pub use statement::StatementProbe;
pub use trace::{TraceProbe, DEFAULT_TRACE_RETURN_TYPES};

use crate::decl::{DeclLocation, DeclarationIndex};
use crate::locator::SourceLocator;

/// A failure recorded by a structural probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeFailure {
    pub message: String,
    /// Declaration the failure points at, when there is one.
    pub location: Option<DeclLocation>,
}

/// What a probe sees while it checks itself.
pub struct CheckContext<'a, 't> {
    index: &'a DeclarationIndex<'t>,
    failure: Option<ProbeFailure>,
}

impl<'a, 't> CheckContext<'a, 't> {
    pub fn new(index: &'a DeclarationIndex<'t>) -> Self {
        Self {
            index,
            failure: None,
        }
    }

    pub fn index(&self) -> &'a DeclarationIndex<'t> {
        self.index
    }

    /// Record a failure, replacing any earlier one.
    pub fn set_failure(&mut self, message: impl Into<String>, location: Option<DeclLocation>) {
        self.failure = Some(ProbeFailure {
            message: message.into(),
            location,
        });
    }

    pub fn failure(&self) -> Option<&ProbeFailure> {
        self.failure.as_ref()
    }

    pub fn take_failure(&mut self) -> Option<ProbeFailure> {
        self.failure.take()
    }
}

/// Closed set of probe kinds.
#[derive(Debug, Clone)]
pub enum Probe {
    Statement(StatementProbe),
    Function(FunctionProbe),
    Method(MethodProbe),
    Macro(MacroProbe),
    MethodOrMacro(MethodOrMacroProbe),
    Trace(TraceProbe),
}

impl Probe {
    /// Evaluate the probe.
    ///
    /// Statement probes always pass here; their verdict comes from the
    /// compiler diagnostics that land inside their range.
    pub fn check(&self, ctx: &mut CheckContext) -> bool {
        match self {
            Probe::Statement(_) => true,
            Probe::Function(p) => p.check(ctx),
            Probe::Method(p) => p.check(ctx),
            Probe::Macro(p) => p.check(ctx),
            Probe::MethodOrMacro(p) => p.check(ctx),
            Probe::Trace(p) => p.check(ctx),
        }
    }

    /// Locator that caused the probe to exist, if the caller supplied one.
    pub fn origin(&self) -> Option<&SourceLocator> {
        match self {
            Probe::Statement(p) => Some(&p.origin),
            Probe::Function(p) => p.origin.as_ref(),
            Probe::Method(p) => p.origin.as_ref(),
            Probe::Macro(p) => p.origin.as_ref(),
            Probe::MethodOrMacro(p) => p.origin.as_ref(),
            Probe::Trace(p) => p.origin.as_ref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Probe::Statement(_) => "statement",
            Probe::Function(_) => "function",
            Probe::Method(_) => "method",
            Probe::Macro(_) => "macro",
            Probe::MethodOrMacro(_) => "method-or-macro",
            Probe::Trace(_) => "trace",
        }
    }
}

/// Type spelling with top-level `const`/`volatile`, references, pointers
/// and whitespace removed: `const ca::Packer &` becomes `ca::Packer`.
pub fn base_type_name(type_name: &str) -> String {
    let stripped = type_name.trim_end_matches(|c: char| c == '&' || c == '*' || c.is_whitespace());
    stripped
        .split_whitespace()
        .filter(|word| !matches!(*word, "const" | "volatile"))
        .collect::<Vec<_>>()
        .join(" ")
        .replace(" <", "<")
        .replace("< ", "<")
        .replace(" >", ">")
}
