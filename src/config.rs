//! `fragcheck.toml` configuration file support.
//!
//! Provides deserialization, discovery (walk up to `.git` root) and the
//! derived values the verifier needs: compiler arguments, the unit's
//! temporary path and the library namespaces probes are written against.
//!
//! # Example config
//!
//! ```toml
//! compiler = "clang++"
//! frontend = "compiler"
//! include_dirs = ["/opt/kaira/lib", "/opt/kaira/libsim"]
//! flags = ["-std=c++11"]
//! prelude_includes = ["cailie.h"]
//! library_types = ["int", "double", "std::string", "std::vector<*>"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VerifyError};

/// Name of the config file.
pub const CONFIG_FILE_NAME: &str = "fragcheck.toml";

/// Types the runtime library gives a token name. An entry ending in `<*>`
/// matches every instantiation of that template.
pub const DEFAULT_LIBRARY_TYPES: &[&str] = &[
    "bool",
    "char",
    "short",
    "int",
    "long",
    "long long",
    "unsigned char",
    "unsigned short",
    "unsigned int",
    "unsigned long",
    "unsigned long long",
    "float",
    "double",
    "std::string",
    "std::vector<*>",
    "std::pair<*>",
];

/// Which front end parses the unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrontEndKind {
    /// External compiler for diagnostics, tree-sitter for declarations.
    #[default]
    Compiler,
    /// tree-sitter only: syntax errors and declarations, no type checking.
    Syntax,
}

/// Verifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Compiler executable name or path. When absent, `g++` then `clang++`
    /// are looked up on PATH.
    pub compiler: Option<String>,

    pub frontend: FrontEndKind,

    /// Passed as `-I` arguments.
    pub include_dirs: Vec<PathBuf>,

    /// Extra compiler flags, passed verbatim.
    pub flags: Vec<String>,

    /// Headers included at the top of the unit, before any fragment.
    pub prelude_includes: Vec<String>,

    /// Namespace of the runtime library (`ca::pack`, `ca::token_name`).
    pub library_namespace: String,

    /// Namespace of the host-environment conversions.
    pub host_namespace: String,

    /// Host-environment value type.
    pub host_value_type: String,

    /// Namespace wrapping node functions; empty writes them at top level.
    pub hidden_namespace: String,

    /// Return types accepted for trace functions.
    pub trace_return_types: Vec<String>,

    /// Types whose token name comes from the runtime library headers.
    /// Their token-name capability is not probed structurally.
    pub library_types: Vec<String>,

    /// Directory for the unit file. Defaults to the system temp dir.
    pub temp_dir: Option<PathBuf>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            compiler: None,
            frontend: FrontEndKind::Compiler,
            include_dirs: Vec::new(),
            flags: Vec::new(),
            prelude_includes: vec!["cailie.h".to_string()],
            library_namespace: "ca".to_string(),
            host_namespace: "caoctave".to_string(),
            host_value_type: "octave_value".to_string(),
            hidden_namespace: "__fragcheck__".to_string(),
            trace_return_types: crate::probe::DEFAULT_TRACE_RETURN_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            library_types: DEFAULT_LIBRARY_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            temp_dir: None,
        }
    }
}

impl VerifierConfig {
    /// Parse a config from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| VerifyError::io_with_path(e, path))?;
        Self::parse(&content)
    }

    /// Validate constraints the TOML schema cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.library_namespace.trim().is_empty() {
            return Err(VerifyError::Config(
                "library_namespace must not be empty".to_string(),
            ));
        }
        if self.trace_return_types.is_empty() {
            return Err(VerifyError::Config(
                "trace_return_types must list at least one type".to_string(),
            ));
        }
        if let Some(compiler) = &self.compiler {
            if compiler.trim().is_empty() {
                return Err(VerifyError::Config("compiler must not be empty".to_string()));
            }
        }
        Ok(())
    }

    /// Arguments passed to the front end before the unit path.
    pub fn compiler_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.include_dirs.len() * 2 + self.flags.len());
        for dir in &self.include_dirs {
            args.push("-I".to_string());
            args.push(dir.display().to_string());
        }
        args.extend(self.flags.iter().cloned());
        args
    }

    /// Path of the unit file, unique per process owner.
    pub fn unit_path(&self) -> PathBuf {
        let dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        dir.join(format!("fragcheck-{}.cpp", owner_key()))
    }

    /// Whether the token name of `type_name` is provided by the library.
    pub fn is_library_type(&self, type_name: &str) -> bool {
        let name = type_name.split_whitespace().collect::<Vec<_>>().join(" ");
        self.library_types
            .iter()
            .any(|pattern| library_type_matches(pattern.trim(), &name))
    }

    /// Generate a commented default config.
    pub fn default_toml() -> &'static str {
        r#"# brrr-fragcheck configuration file

# Compiler used for semantic diagnostics (default: g++, then clang++).
# compiler = "g++"

# "compiler" or "syntax" (tree-sitter only, no type checking).
frontend = "compiler"

# include_dirs = ["/opt/kaira/lib"]
# flags = ["-std=c++11"]

prelude_includes = ["cailie.h"]
library_namespace = "ca"
host_namespace = "caoctave"
host_value_type = "octave_value"
hidden_namespace = "__fragcheck__"
trace_return_types = ["int", "double", "std::string"]
library_types = [
    "bool", "char", "short", "int", "long", "long long",
    "unsigned char", "unsigned short", "unsigned int", "unsigned long",
    "unsigned long long", "float", "double", "std::string",
    "std::vector<*>", "std::pair<*>",
]

# temp_dir = "/tmp"
"#
    }
}

/// Exact match, or a template-head match for `name<*>` patterns.
fn library_type_matches(pattern: &str, type_name: &str) -> bool {
    match pattern.strip_suffix("<*>") {
        Some(head) => type_name
            .strip_prefix(head)
            .map(str::trim_start)
            .is_some_and(|args| args.starts_with('<') && args.ends_with('>')),
        None => pattern == type_name,
    }
}

/// Identity of the process owner, for the per-user unit file name.
fn owner_key() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|name| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
        .unwrap_or_else(|| std::process::id().to_string())
}

// ---------------------------------------------------------------------------
// Config file discovery
// ---------------------------------------------------------------------------

/// Discover a `fragcheck.toml` by walking up from `start_dir` to the
/// repository root (directory containing `.git`).
pub fn discover_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = if start_dir.is_file() {
        start_dir.parent()?.to_path_buf()
    } else {
        start_dir.to_path_buf()
    };

    loop {
        let candidate = current.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if current.join(".git").exists() {
            return None;
        }
        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => return None,
        }
    }
}

/// Load the explicit config, or the discovered one, or the defaults.
pub fn load_config(explicit: Option<&Path>, start_dir: &Path) -> Result<VerifierConfig> {
    match explicit {
        Some(path) => VerifierConfig::load(path),
        None => match discover_config(start_dir) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "using discovered config");
                VerifierConfig::load(&path)
            }
            None => Ok(VerifierConfig::default()),
        },
    }
}
