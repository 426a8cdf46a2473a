//! Source locators: user-facing pointers into fragments.
//!
//! A locator is the string an editor needs to re-open the failing fragment
//! at the failing position:
//!
//! ```text
//! "*" , (fragment-id | "head" | "param" | "communication-model") ,
//! ["/" , role] , [":" , line , ":" , column]
//! ```
//!
//! Examples: `*head:3:7`, `*12/init_function:2:1`, `*12/type`, `*param`.
//!
//! The check algebra treats locators as opaque; they only get compared
//! (lexicographically, to pick a deterministic origin) and displayed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin name of the shared prelude fragment.
pub const HEAD: &str = "head";
/// Origin name of the run-parameter struct fragment.
pub const PARAM: &str = "param";
/// Origin name of the communication-model fragment.
pub const COMMUNICATION_MODEL: &str = "communication-model";

/// Role suffix for node initializer bodies.
pub const ROLE_INIT: &str = "init_function";
/// Role suffix for node handler bodies.
pub const ROLE_FUNCTION: &str = "function";
/// Role suffix for errors in a node's declared type.
pub const ROLE_TYPE: &str = "type";

/// Opaque textual pointer to a fragment and an optional position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceLocator(String);

/// Parsed view of a locator, for callers that display it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorParts<'a> {
    pub origin: &'a str,
    pub role: Option<&'a str>,
    pub position: Option<(u32, u32)>,
}

impl SourceLocator {
    /// Wrap an already-formatted locator supplied by the project model.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Build a locator from its parts.
    pub fn build(origin: &str, role: Option<&str>, position: Option<(u32, u32)>) -> Self {
        let mut text = format!("*{}", origin);
        if let Some(role) = role {
            text.push('/');
            text.push_str(role);
        }
        if let Some((line, column)) = position {
            text.push_str(&format!(":{}:{}", line, column));
        }
        Self(text)
    }

    /// Position inside the head fragment.
    pub fn head(line: u32, column: u32) -> Self {
        Self::build(HEAD, None, Some((line, column)))
    }

    /// The head fragment as a whole.
    pub fn head_unpositioned() -> Self {
        Self::build(HEAD, None, None)
    }

    /// The parameter struct fragment.
    pub fn param() -> Self {
        Self::build(PARAM, None, None)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the locator back into origin, role and position.
    ///
    /// Returns `None` for text that does not start with `*`.
    pub fn parts(&self) -> Option<LocatorParts<'_>> {
        let rest = self.0.strip_prefix('*')?;

        // Position is the trailing ":line:column" pair, if both are numeric.
        let mut position = None;
        let mut head = rest;
        if let Some((before, column)) = rest.rsplit_once(':') {
            if let Some((path, line)) = before.rsplit_once(':') {
                if let (Ok(line), Ok(column)) = (line.parse(), column.parse()) {
                    position = Some((line, column));
                    head = path;
                }
            }
        }

        let (origin, role) = match head.split_once('/') {
            Some((origin, role)) => (origin, Some(role)),
            None => (head, None),
        };

        Some(LocatorParts {
            origin,
            role,
            position,
        })
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceLocator {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}
