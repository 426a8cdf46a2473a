//! JSON project manifest.
//!
//! The CLI reads fragments and check requests from a manifest exported by
//! the modeling tool:
//!
//! ```json
//! {
//!   "param": "struct param { };",
//!   "head": "struct Point { int x; };",
//!   "nodes": [
//!     { "id": "3", "role": "node-init",
//!       "header": "void place_fn_3(ca::Context &ctx, std::vector<Point> &place)",
//!       "body": "place.push_back(Point());" }
//!   ],
//!   "types": [
//!     { "name": "Point", "locator": "*3/type", "capabilities": ["pack", "token_name"] }
//!   ],
//!   "expressions": [
//!     { "expression": "x + 1", "locals": [{ "name": "x", "type": "int" }],
//!       "return_type": "int", "locator": "*4/function:2:1" }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capability::Capability;
use crate::decl::{ParamDecl, Qualifiers};
use crate::error::{Result, VerifyError};
use crate::fragment::{Fragment, FragmentRole};
use crate::locator::SourceLocator;
use crate::probe::{FunctionProbe, Probe};
use crate::verifier::Verifier;

/// A local variable available to a checked expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Local {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeCheck {
    pub name: String,
    pub locator: SourceLocator,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpressionRequest {
    pub expression: String,
    #[serde(default)]
    pub locals: Vec<Local>,
    /// Target type, or container type for vector checks.
    pub return_type: String,
    pub locator: SourceLocator,
    #[serde(default)]
    pub message: Option<String>,
}

impl ExpressionRequest {
    fn locals(&self) -> Vec<(String, String)> {
        self.locals
            .iter()
            .map(|l| (l.name.clone(), l.type_name.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceCheck {
    pub name: String,
    pub place_type: String,
    #[serde(default)]
    pub locator: Option<SourceLocator>,
}

/// Exact free-function signature that must be declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionCheck {
    pub name: String,
    pub return_type: String,
    #[serde(default)]
    pub params: Vec<Local>,
    #[serde(default)]
    pub qualifiers: Qualifiers,
    #[serde(default)]
    pub locator: Option<SourceLocator>,
}

/// Everything the CLI verifies in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Project {
    /// Rendered run-parameter struct.
    pub param: Option<String>,
    pub head: String,
    pub communication_model: Option<String>,
    pub nodes: Vec<Fragment>,
    pub types: Vec<TypeCheck>,
    pub expressions: Vec<ExpressionRequest>,
    pub vectors: Vec<ExpressionRequest>,
    pub traces: Vec<TraceCheck>,
    pub functions: Vec<FunctionCheck>,
}

impl Project {
    pub fn parse(s: &str) -> Result<Self> {
        let project: Self = serde_json::from_str(s)?;
        project.validate()?;
        Ok(project)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| VerifyError::io_with_path(e, path))?;
        Self::parse(&content)
    }

    /// Node fragments must have a header and a node role.
    pub fn validate(&self) -> Result<()> {
        for node in &self.nodes {
            if !matches!(node.role, FragmentRole::NodeInit | FragmentRole::NodeHandler) {
                return Err(VerifyError::Config(format!(
                    "node '{}' has role '{}', expected node-init or node-handler",
                    node.id, node.role
                )));
            }
            if node.header.trim().is_empty() {
                return Err(VerifyError::Config(format!(
                    "node '{}' has no header",
                    node.id
                )));
            }
        }
        Ok(())
    }

    /// Register every fragment and request with `verifier`.
    pub fn apply(&self, verifier: &mut Verifier) {
        if let Some(param) = &self.param {
            verifier.add_fragment(Fragment::param(param.clone()));
        }
        verifier.add_fragment(Fragment::head(self.head.clone()));
        if let Some(model) = &self.communication_model {
            verifier.add_fragment(Fragment::communication_model(model.clone()));
        }
        for node in &self.nodes {
            verifier.add_fragment(node.clone());
        }

        for check in &self.types {
            verifier.check_type(
                &check.name,
                check.locator.clone(),
                check.capabilities.iter().copied(),
            );
        }
        for request in &self.expressions {
            verifier.check_expression(
                &request.expression,
                request.locals(),
                &request.return_type,
                request.locator.clone(),
                request.message.clone(),
            );
        }
        for request in &self.vectors {
            verifier.check_may_form_vector(
                &request.expression,
                request.locals(),
                &request.return_type,
                request.locator.clone(),
                request.message.clone(),
            );
        }
        for trace in &self.traces {
            verifier.check_trace_fn(&trace.name, &trace.place_type, trace.locator.clone());
        }
        for function in &self.functions {
            let params = function
                .params
                .iter()
                .map(|p| ParamDecl::new(p.name.clone(), p.type_name.clone()))
                .collect();
            let mut probe = FunctionProbe::new(
                function.name.clone(),
                function.return_type.clone(),
                params,
                function.qualifiers,
            );
            probe.origin = function.locator.clone();
            verifier.add_probe(Probe::Function(probe));
        }
    }
}
