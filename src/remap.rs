//! Diagnostic remapping.
//!
//! Turns a position in the synthesized unit back into the fragment (or
//! statement probe) that produced it, and the front end's diagnostic list
//! into at most one [`VerifyError`].

use tracing::debug;

use crate::decl::DeclLocation;
use crate::error::VerifyError;
use crate::fragment::Fragment;
use crate::frontend::Diagnostic;
use crate::locator::SourceLocator;
use crate::probe::StatementProbe;
use crate::unit::{EntityId, Unit};

/// What a written entity was.
#[derive(Debug, Clone, Copy)]
pub enum Written<'v> {
    Fragment(&'v Fragment),
    Statement(&'v StatementProbe),
}

/// Maps unit positions to user-facing locators.
pub struct Remapper<'v> {
    unit: &'v Unit,
    /// Indexed by [`EntityId`], parallel to the unit's ranges.
    written: Vec<Written<'v>>,
}

impl<'v> Remapper<'v> {
    pub fn new(unit: &'v Unit, written: Vec<Written<'v>>) -> Self {
        debug_assert_eq!(unit.ranges().len(), written.len());
        Self { unit, written }
    }

    /// Entity whose lines contain `line`.
    pub fn locate(&self, line: u32) -> Option<EntityId> {
        self.unit.locate(line)
    }

    /// Locator for a position inside `entity`.
    pub fn locator_for(&self, entity: EntityId, line: u32, column: u32) -> SourceLocator {
        match self.written[entity.0] {
            Written::Fragment(fragment) => {
                fragment.locator_at(&self.unit.range(entity), line, column)
            }
            Written::Statement(probe) => probe.origin.clone(),
        }
    }

    /// Locator for a declaration found by a structural probe, when it lies
    /// in the unit.
    pub fn locate_declaration(&self, location: &DeclLocation) -> Option<SourceLocator> {
        if location.file != self.unit.file_name() {
            return None;
        }
        let entity = self.locate(location.line)?;
        Some(self.locator_for(entity, location.line, location.column))
    }

    /// Pick the error a diagnostic list amounts to.
    ///
    /// An actionable diagnostic in another file wins over everything.
    /// Otherwise the first actionable diagnostic in the unit is attributed
    /// to the entity that contains it.
    pub fn resolve(&self, diagnostics: &[Diagnostic]) -> Option<VerifyError> {
        let unit_file = self.unit.file_name();

        if let Some(foreign) = diagnostics
            .iter()
            .find(|d| d.is_actionable() && d.file != unit_file)
        {
            debug!(file = %foreign.file, line = foreign.line, "diagnostic outside the unit");
            return Some(VerifyError::ForeignFile {
                file: foreign.file.clone(),
                line: foreign.line,
                column: foreign.column,
                message: foreign.message.clone(),
            });
        }

        let diag = diagnostics.iter().find(|d| d.is_actionable())?;
        let Some(entity) = self.locate(diag.line) else {
            return Some(VerifyError::Unattributable {
                line: diag.line,
                message: diag.message.clone(),
            });
        };
        let locator = self.locator_for(entity, diag.line, diag.column);
        debug!(line = diag.line, %locator, "diagnostic attributed");

        Some(match self.written[entity.0] {
            Written::Statement(probe) if probe.capability => VerifyError::CapabilityMissing {
                locator,
                message: probe.failure_message(&diag.message),
            },
            Written::Statement(probe) => VerifyError::Expression {
                locator,
                message: probe.failure_message(&diag.message),
            },
            Written::Fragment(_) => VerifyError::Expression {
                locator,
                message: diag.message.clone(),
            },
        })
    }
}
