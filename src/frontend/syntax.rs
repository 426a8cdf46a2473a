use tracing::debug;

use crate::decl::{parse_cpp, CppExtractor};
use crate::error::Result;
use crate::frontend::{Diagnostic, FrontEnd, ParsedUnit, Severity};
use crate::unit::Unit;

/// In-process front end backed by tree-sitter-cpp.
///
/// Syntax errors become error diagnostics against the unit file. Name
/// lookup and type checking are not performed, so statement probes only
/// fail on malformed code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxFrontEnd;

impl SyntaxFrontEnd {
    pub fn new() -> Self {
        Self
    }
}

impl FrontEnd for SyntaxFrontEnd {
    fn name(&self) -> &str {
        "tree-sitter"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn parse(&self, unit: &Unit, _args: &[String]) -> Result<ParsedUnit> {
        let file_name = unit.file_name();
        let tree = parse_cpp(unit.text())?;
        let extractor = CppExtractor::new(unit.text(), &file_name);

        let diagnostics: Vec<Diagnostic> = extractor
            .syntax_errors(&tree)
            .into_iter()
            .map(|err| Diagnostic {
                severity: Severity::Error,
                file: file_name.clone(),
                line: err.line,
                column: err.column,
                message: err.message,
            })
            .collect();
        debug!(diagnostics = diagnostics.len(), "tree-sitter parse finished");

        Ok(ParsedUnit {
            declarations: extractor.extract(&tree),
            diagnostics,
        })
    }
}
