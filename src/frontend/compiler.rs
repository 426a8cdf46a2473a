use std::path::PathBuf;
use std::process::{Command, Stdio};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::VerifierConfig;
use crate::decl::extract_declarations;
use crate::error::{Result, VerifyError};
use crate::frontend::{Diagnostic, FrontEnd, ParsedUnit, Severity};
use crate::unit::Unit;

/// GCC/Clang output format: file:line:col: severity: message
static COMPILER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?):(\d+):(\d+):\s*(fatal error|error|warning|note):\s*(.+)$")
        .expect("Invalid compiler regex pattern")
});

/// Compilers tried, in order, when none is configured.
const DEFAULT_COMPILERS: &[&str] = &["g++", "clang++"];

/// External compiler used as a syntax and type checker.
#[derive(Debug, Clone)]
pub struct CompilerFrontEnd {
    /// Resolved executable; `None` when nothing usable was found.
    compiler: Option<PathBuf>,
    /// What was asked for, for the unavailability message.
    requested: String,
}

impl CompilerFrontEnd {
    /// Resolve the configured compiler, or the first default found on PATH.
    pub fn from_config(config: &VerifierConfig) -> Self {
        match &config.compiler {
            Some(name) => Self {
                compiler: which::which(name).ok(),
                requested: name.clone(),
            },
            None => Self {
                compiler: DEFAULT_COMPILERS
                    .iter()
                    .find_map(|name| which::which(name).ok()),
                requested: DEFAULT_COMPILERS.join(" or "),
            },
        }
    }

    pub fn with_compiler(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            requested: path.display().to_string(),
            compiler: Some(path),
        }
    }

    pub fn compiler(&self) -> Option<&PathBuf> {
        self.compiler.as_ref()
    }
}

impl FrontEnd for CompilerFrontEnd {
    fn name(&self) -> &str {
        "compiler"
    }

    fn is_available(&self) -> bool {
        self.compiler.is_some()
    }

    fn parse(&self, unit: &Unit, args: &[String]) -> Result<ParsedUnit> {
        let compiler = self.compiler.as_ref().ok_or_else(|| {
            VerifyError::FrontEndUnavailable(format!("compiler '{}' not found", self.requested))
        })?;

        std::fs::write(unit.path(), unit.text())
            .map_err(|e| VerifyError::io_with_path(e, unit.path()))?;

        let file_name = unit.file_name();
        let mut command = Command::new(compiler);
        command
            .args(["-fsyntax-only", "-x", "c++"])
            .args(args)
            .arg(&file_name)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!(compiler = %compiler.display(), ?args, unit = %file_name, "running front end");

        let output = command.output().map_err(|e| {
            VerifyError::FrontEndUnavailable(format!(
                "failed to run '{}': {}",
                compiler.display(),
                e
            ))
        })?;
        let stderr = fast_utf8_to_string(&output.stderr);
        let diagnostics = parse_compiler_output(&stderr);
        debug!(
            status = ?output.status.code(),
            diagnostics = diagnostics.len(),
            "front end finished"
        );

        if !output.status.success() && !diagnostics.iter().any(Diagnostic::is_actionable) {
            return Err(VerifyError::FrontEndFailed {
                program: compiler.display().to_string(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ParsedUnit {
            declarations: extract_declarations(unit.text(), &file_name)?,
            diagnostics,
        })
    }
}

/// Parse compiler stderr into diagnostics, in output order.
///
/// Lines that are not located diagnostics (`In file included from`,
/// source excerpts, caret lines) are skipped.
pub fn parse_compiler_output(stderr: &str) -> Vec<Diagnostic> {
    stderr
        .lines()
        .filter_map(|line| {
            let caps = COMPILER_RE.captures(line)?;
            Some(Diagnostic {
                file: caps.get(1)?.as_str().to_string(),
                line: caps.get(2)?.as_str().parse().ok()?,
                column: caps.get(3)?.as_str().parse().ok()?,
                severity: Severity::from_label(caps.get(4)?.as_str()),
                message: caps.get(5)?.as_str().trim().to_string(),
            })
        })
        .collect()
}

/// Convert bytes to String using fast SIMD UTF-8 validation.
#[inline]
fn fast_utf8_to_string(bytes: &[u8]) -> String {
    match simdutf8::basic::from_utf8(bytes) {
        Ok(valid_str) => valid_str.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
