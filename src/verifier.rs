//! Verification pipeline.
//!
//! Callers register fragments and checks, then call [`Verifier::verify`].
//! Each run synthesizes a fresh unit, parses it once and reports the first
//! failure:
//!
//! 1. an actionable diagnostic in a file other than the unit,
//! 2. the first actionable diagnostic inside the unit,
//! 3. the first failing structural probe, in registration order.

use tracing::{debug, info, warn};

use crate::capability::{Capability, TypeRequirements};
use crate::config::VerifierConfig;
use crate::decl::DeclarationIndex;
use crate::error::{Result, VerifyError};
use crate::fragment::{Fragment, FragmentEntity, FragmentRole};
use crate::frontend::{front_end_for, FrontEnd};
use crate::ids::IdGenerator;
use crate::locator::SourceLocator;
use crate::probe::{CheckContext, Probe, StatementProbe, TraceProbe};
use crate::remap::{Remapper, Written};
use crate::unit::{Unit, UnitWriter};

/// Default message of a rejected expression conversion.
pub const INVALID_EXPRESSION: &str = "Invalid type of expression";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpressionKind {
    /// `return (static_cast<R >(expr));`
    Convert,
    /// `v.push_back(expr);` with `v` of the given type.
    FormVector,
}

#[derive(Debug, Clone)]
struct ExpressionCheck {
    kind: ExpressionKind,
    expression: String,
    locals: Vec<(String, String)>,
    return_type: String,
    origin: SourceLocator,
    message: Option<String>,
}

/// Everything one run writes or evaluates, in order.
struct Plan<'v> {
    fragments: Vec<&'v Fragment>,
    statements: Vec<StatementProbe>,
    structural: Vec<Probe>,
}

/// Write-order reference into a [`Plan`].
#[derive(Clone, Copy)]
enum Slot {
    Fragment(usize),
    Statement(usize),
}

/// Embedded-code verifier.
pub struct Verifier {
    config: VerifierConfig,
    front_end: Box<dyn FrontEnd>,
    fragments: Vec<Fragment>,
    types: TypeRequirements,
    expressions: Vec<ExpressionCheck>,
    probes: Vec<Probe>,
}

impl Verifier {
    pub fn new(config: VerifierConfig, front_end: Box<dyn FrontEnd>) -> Self {
        Self {
            config,
            front_end,
            fragments: Vec::new(),
            types: TypeRequirements::new(),
            expressions: Vec::new(),
            probes: Vec::new(),
        }
    }

    /// Verifier with the front end selected by the config.
    pub fn from_config(config: VerifierConfig) -> Self {
        let front_end = front_end_for(&config);
        Self::new(config, front_end)
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    pub fn front_end(&self) -> &dyn FrontEnd {
        self.front_end.as_ref()
    }

    /// Register a fragment. A fragment with the same id and role replaces
    /// the earlier one.
    pub fn add_fragment(&mut self, fragment: Fragment) {
        match self
            .fragments
            .iter_mut()
            .find(|f| f.id == fragment.id && f.role == fragment.role)
        {
            Some(existing) => *existing = fragment,
            None => self.fragments.push(fragment),
        }
    }

    /// Require `type_name` to be a valid type providing `capabilities`.
    pub fn check_type(
        &mut self,
        type_name: &str,
        locator: SourceLocator,
        capabilities: impl IntoIterator<Item = Capability>,
    ) {
        self.types.check_type(type_name, locator, capabilities);
    }

    pub fn type_requirements(&self) -> &TypeRequirements {
        &self.types
    }

    /// Require `expression` to compile with `locals` in scope and to convert
    /// to `return_type`.
    pub fn check_expression(
        &mut self,
        expression: &str,
        locals: Vec<(String, String)>,
        return_type: &str,
        origin: SourceLocator,
        message: Option<String>,
    ) {
        self.expressions.push(ExpressionCheck {
            kind: ExpressionKind::Convert,
            expression: expression.to_string(),
            locals,
            return_type: return_type.to_string(),
            origin,
            message,
        });
    }

    /// Require `expression` to compile and to be insertable into a
    /// container of type `container_type`.
    pub fn check_may_form_vector(
        &mut self,
        expression: &str,
        locals: Vec<(String, String)>,
        container_type: &str,
        origin: SourceLocator,
        message: Option<String>,
    ) {
        self.expressions.push(ExpressionCheck {
            kind: ExpressionKind::FormVector,
            expression: expression.to_string(),
            locals,
            return_type: container_type.to_string(),
            origin,
            message,
        });
    }

    /// Require a trace function `name` over values of `place_type`.
    pub fn check_trace_fn(&mut self, name: &str, place_type: &str, origin: Option<SourceLocator>) {
        let mut probe = TraceProbe::new(name, place_type)
            .with_return_types(self.config.trace_return_types.clone());
        probe.origin = origin;
        self.probes.push(Probe::Trace(probe));
    }

    /// Register an arbitrary probe.
    pub fn add_probe(&mut self, probe: Probe) {
        self.probes.push(probe);
    }

    /// Text of the unit a run would parse.
    pub fn render_unit(&self) -> String {
        let mut ids = IdGenerator::new();
        let plan = self.plan(&mut ids);
        let (unit, _) = self.write(&plan);
        unit.text().to_string()
    }

    /// Run the verification.
    pub fn verify(&self) -> Result<()> {
        self.config.validate()?;
        if !self.front_end.is_available() {
            return Err(VerifyError::FrontEndUnavailable(format!(
                "front end '{}' cannot run",
                self.front_end.name()
            )));
        }

        let mut ids = IdGenerator::new();
        let plan = self.plan(&mut ids);
        let (unit, slots) = self.write(&plan);
        debug!(
            lines = unit.ranges().last().map(|r| r.end).unwrap_or(1),
            entities = slots.len(),
            ids = ids.issued(),
            "synthesized unit"
        );

        let parsed = self
            .front_end
            .parse(&unit, &self.config.compiler_args())?;

        let written = slots
            .iter()
            .map(|slot| match *slot {
                Slot::Fragment(i) => Written::Fragment(plan.fragments[i]),
                Slot::Statement(i) => Written::Statement(&plan.statements[i]),
            })
            .collect();
        let remapper = Remapper::new(&unit, written);

        if let Some(err) = remapper.resolve(&parsed.diagnostics) {
            info!(kind = err.kind(), "verification failed");
            return Err(err);
        }

        let file_name = unit.file_name();
        let index = DeclarationIndex::new(&parsed.declarations, &file_name);
        for probe in &plan.structural {
            let mut ctx = CheckContext::new(&index);
            if probe.check(&mut ctx) {
                continue;
            }
            let (message, location) = match ctx.take_failure() {
                Some(failure) => (failure.message, failure.location),
                None => {
                    warn!(kind = probe.kind(), "probe failed without a message");
                    (format!("Check '{}' failed", probe.kind()), None)
                }
            };
            let locator = location
                .and_then(|loc| remapper.locate_declaration(&loc))
                .or_else(|| probe.origin().cloned())
                .unwrap_or_else(SourceLocator::head_unpositioned);
            info!(kind = probe.kind(), %locator, "structural check failed");
            return Err(VerifyError::CapabilityMissing { locator, message });
        }

        info!(
            fragments = plan.fragments.len(),
            probes = plan.statements.len() + plan.structural.len(),
            "verification passed"
        );
        Ok(())
    }

    /// Order fragments and expand every request into probes.
    fn plan(&self, ids: &mut IdGenerator) -> Plan<'_> {
        let rank = |role: FragmentRole| match role {
            FragmentRole::Param => 0,
            FragmentRole::Prelude => 1,
            FragmentRole::CommunicationModel => 2,
            FragmentRole::NodeInit | FragmentRole::NodeHandler => 3,
        };
        let mut fragments: Vec<&Fragment> = self.fragments.iter().collect();
        fragments.sort_by_key(|f| rank(f.role));

        let mut statements = Vec::new();
        let mut structural = self.probes.clone();

        for requirement in self.types.iter() {
            if let Probe::Statement(probe) = requirement.validity_probe(ids) {
                statements.push(probe);
            }
            for probe in requirement.add_checks(ids, &self.config) {
                match probe {
                    Probe::Statement(probe) => statements.push(probe),
                    other => structural.push(other),
                }
            }
        }

        for check in &self.expressions {
            let message = check.message.clone();
            let plain = StatementProbe::new(
                ids,
                format!("{};", check.expression),
                check.locals.clone(),
                "void",
                check.origin.clone(),
            );
            statements.push(match &message {
                Some(m) => plain.with_message(m.clone()),
                None => plain,
            });

            let typed = match check.kind {
                ExpressionKind::Convert => StatementProbe::new(
                    ids,
                    format!(
                        "return (static_cast<{} >({}));",
                        check.return_type, check.expression
                    ),
                    check.locals.clone(),
                    check.return_type.as_str(),
                    check.origin.clone(),
                ),
                ExpressionKind::FormVector => {
                    let container = ids.next_id();
                    let mut locals = check.locals.clone();
                    locals.push((container.clone(), check.return_type.clone()));
                    StatementProbe::new(
                        ids,
                        format!("{}.push_back({});", container, check.expression),
                        locals,
                        "void",
                        check.origin.clone(),
                    )
                }
            };
            let message = message.unwrap_or_else(|| INVALID_EXPRESSION.to_string());
            statements.push(typed.with_message(message));
        }

        Plan {
            fragments,
            statements,
            structural,
        }
    }

    /// Write a plan into a unit.
    fn write(&self, plan: &Plan<'_>) -> (Unit, Vec<Slot>) {
        let mut writer = UnitWriter::new();
        for include in &self.config.prelude_includes {
            writer.raw(&format!("#include <{}>", include));
        }

        let namespace = Some(self.config.hidden_namespace.as_str());
        let mut slots = Vec::with_capacity(plan.fragments.len() + plan.statements.len());
        for (i, fragment) in plan.fragments.iter().copied().enumerate() {
            writer.write(&FragmentEntity {
                fragment,
                namespace,
            });
            slots.push(Slot::Fragment(i));
        }
        for (i, probe) in plan.statements.iter().enumerate() {
            writer.write(probe);
            slots.push(Slot::Statement(i));
        }

        (writer.finish(self.config.unit_path()), slots)
    }
}
