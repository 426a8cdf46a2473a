//! C/C++ front ends.
//!
//! A front end parses the synthesized unit once and returns its declaration
//! tree and diagnostics. Two implementations exist:
//!
//! - [`CompilerFrontEnd`]: runs `g++`/`clang++ -fsyntax-only` on the unit
//!   file for semantic diagnostics; declarations come from tree-sitter.
//! - [`SyntaxFrontEnd`]: tree-sitter only, in process. Reports syntax errors
//!   but cannot type-check.

mod compiler;
mod syntax;

pub use compiler::{parse_compiler_output, CompilerFrontEnd};
pub use syntax::SyntaxFrontEnd;

use serde::{Deserialize, Serialize};

use crate::config::{FrontEndKind, VerifierConfig};
use crate::decl::DeclarationTree;
use crate::error::Result;
use crate::unit::Unit;

/// Diagnostic severity on the usual 0 (ignored) to 4 (fatal) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ignored = 0,
    Note = 1,
    Warning = 2,
    Error = 3,
    Fatal = 4,
}

impl Severity {
    /// Map a compiler's severity word.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "fatal error" | "fatal" => Severity::Fatal,
            "error" => Severity::Error,
            "warning" => Severity::Warning,
            "note" | "remark" => Severity::Note,
            _ => Severity::Ignored,
        }
    }
}

/// A single front-end diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// File the diagnostic is reported against.
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl Diagnostic {
    /// Only errors and fatal errors fail a run.
    #[inline]
    pub fn is_actionable(&self) -> bool {
        self.severity > Severity::Warning
    }
}

/// Result of parsing a unit.
#[derive(Debug, Clone, Default)]
pub struct ParsedUnit {
    pub declarations: DeclarationTree,
    /// Diagnostics in the order the front end reported them.
    pub diagnostics: Vec<Diagnostic>,
}

/// Something that parses C/C++ text into declarations and diagnostics.
pub trait FrontEnd {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether the front end can run at all.
    fn is_available(&self) -> bool;

    /// Parse `unit` with the extra search-path and flag arguments.
    fn parse(&self, unit: &Unit, args: &[String]) -> Result<ParsedUnit>;
}

/// Build the front end selected by `config`.
pub fn front_end_for(config: &VerifierConfig) -> Box<dyn FrontEnd> {
    match config.frontend {
        FrontEndKind::Compiler => Box::new(CompilerFrontEnd::from_config(config)),
        FrontEndKind::Syntax => Box::new(SyntaxFrontEnd::new()),
    }
}
