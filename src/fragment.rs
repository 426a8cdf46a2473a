//! User-authored code fragments and how they are written into a unit.
//!
//! Fragments belong to the external project model; the verifier only reads
//! their id, header and body. Node fragments are wrapped in their canonical
//! function header (rendered by the project's generator) and, optionally, in
//! a hidden namespace so they cannot clash with names from the head.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locator::{self, SourceLocator};
use crate::unit::{LineRange, WriteEntity};

/// Header of the communication-model function when the caller does not
/// supply one.
pub const DEFAULT_COMMUNICATION_MODEL_HEADER: &str =
    "ca::IntTime packet_time(casr::Context &ctx, int source_id, int target_id, size_t size)";

/// What a fragment is for, which decides its wrapper and its locators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentRole {
    /// The shared head code.
    Prelude,
    /// Struct describing run parameters, rendered by the generator.
    Param,
    /// Body of the simulated-network packet timing function.
    CommunicationModel,
    /// Initializer body of a node.
    NodeInit,
    /// Handler body of a node.
    NodeHandler,
}

impl FragmentRole {
    /// Whether the fragment body lives inside a rendered function header.
    pub fn has_header(self) -> bool {
        matches!(
            self,
            FragmentRole::CommunicationModel | FragmentRole::NodeInit | FragmentRole::NodeHandler
        )
    }
}

impl fmt::Display for FragmentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FragmentRole::Prelude => "prelude",
            FragmentRole::Param => "param",
            FragmentRole::CommunicationModel => "communication-model",
            FragmentRole::NodeInit => "node-init",
            FragmentRole::NodeHandler => "node-handler",
        };
        f.write_str(name)
    }
}

/// Renders the canonical declaration header of a node fragment.
///
/// This is the generator's job; the verifier only asks for the text.
pub trait HeaderRenderer {
    fn render_header(&self, id: &str, role: FragmentRole) -> Option<String>;
}

impl<F> HeaderRenderer for F
where
    F: Fn(&str, FragmentRole) -> Option<String>,
{
    fn render_header(&self, id: &str, role: FragmentRole) -> Option<String> {
        self(id, role)
    }
}

/// One independently edited block of code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub id: String,
    pub role: FragmentRole,
    /// Rendered function header; empty for roles without one.
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub body: String,
}

impl Fragment {
    pub fn new(
        id: impl Into<String>,
        role: FragmentRole,
        header: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            header: header.into(),
            body: body.into(),
        }
    }

    pub fn head(body: impl Into<String>) -> Self {
        Self::new(locator::HEAD, FragmentRole::Prelude, "", body)
    }

    pub fn param(body: impl Into<String>) -> Self {
        Self::new(locator::PARAM, FragmentRole::Param, "", body)
    }

    pub fn communication_model(body: impl Into<String>) -> Self {
        Self::new(
            locator::COMMUNICATION_MODEL,
            FragmentRole::CommunicationModel,
            DEFAULT_COMMUNICATION_MODEL_HEADER,
            body,
        )
    }

    /// Node fragment whose header comes from the project's generator.
    pub fn node(
        id: impl Into<String>,
        role: FragmentRole,
        renderer: &dyn HeaderRenderer,
        body: impl Into<String>,
    ) -> Option<Self> {
        let id = id.into();
        let header = renderer.render_header(&id, role)?;
        Some(Self::new(id, role, header, body))
    }

    /// Locator for a diagnostic at `line`/`column` of the unit, given the
    /// range this fragment was written to.
    ///
    /// Lines inside the rendered header point at the node's type rather than
    /// at a body position.
    pub fn locator_at(&self, range: &LineRange, line: u32, column: u32) -> SourceLocator {
        let position = Some((range.content_line(line), column));
        match self.role {
            FragmentRole::Prelude => SourceLocator::build(locator::HEAD, None, position),
            FragmentRole::Param => SourceLocator::param(),
            FragmentRole::CommunicationModel => {
                SourceLocator::build(locator::COMMUNICATION_MODEL, None, position)
            }
            FragmentRole::NodeInit if range.in_content(line) => {
                SourceLocator::build(&self.id, Some(locator::ROLE_INIT), position)
            }
            FragmentRole::NodeInit => SourceLocator::build(&self.id, Some(locator::ROLE_TYPE), None),
            FragmentRole::NodeHandler if range.in_content(line) => {
                SourceLocator::build(&self.id, Some(locator::ROLE_FUNCTION), position)
            }
            FragmentRole::NodeHandler => {
                SourceLocator::build(&self.id, Some(locator::ROLE_FUNCTION), None)
            }
        }
    }
}

/// A fragment as it is written into the unit.
pub struct FragmentEntity<'a> {
    pub fragment: &'a Fragment,
    /// Namespace wrapping node functions; `None` writes them at top level.
    pub namespace: Option<&'a str>,
}

impl FragmentEntity<'_> {
    fn wrapped_in_namespace(&self) -> Option<&str> {
        match self.fragment.role {
            FragmentRole::NodeInit | FragmentRole::NodeHandler => {
                self.namespace.filter(|ns| !ns.is_empty())
            }
            _ => None,
        }
    }
}

impl WriteEntity for FragmentEntity<'_> {
    fn write_prologue(&self, out: &mut String) {
        if !self.fragment.role.has_header() {
            return;
        }
        if let Some(ns) = self.wrapped_in_namespace() {
            out.push_str(&format!("namespace {} {{\n", ns));
        }
        out.push_str(&self.fragment.header);
        if !self.fragment.header.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("{\n");
    }

    fn write_content(&self, out: &mut String) {
        out.push_str(&self.fragment.body);
    }

    fn write_epilogue(&self, out: &mut String) {
        if !self.fragment.role.has_header() {
            return;
        }
        out.push_str("}\n");
        if self.wrapped_in_namespace().is_some() {
            out.push_str("}\n");
        }
    }
}
