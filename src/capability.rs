//! Per-type capability requirements.
//!
//! Every place a user type is used may demand capabilities of it. Usages of
//! the same type name merge into one [`TypeRequirement`], which expands into
//! one probe per capability, all attributed to the smallest usage locator so
//! that repeated runs report the same origin.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::VerifierConfig;
use crate::decl::Qualifiers;
use crate::error::VerifyError;
use crate::ids::IdGenerator;
use crate::locator::SourceLocator;
use crate::probe::{
    FunctionProbe, MacroProbe, MethodOrMacroProbe, MethodProbe, Probe, StatementProbe,
};

/// A structural requirement on a user type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    TokenName,
    Pack,
    Unpack,
    FromOctaveValue,
    ToOctaveValue,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::TokenName,
        Capability::Pack,
        Capability::Unpack,
        Capability::FromOctaveValue,
        Capability::ToOctaveValue,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::TokenName => "token_name",
            Capability::Pack => "pack",
            Capability::Unpack => "unpack",
            Capability::FromOctaveValue => "from_octave_value",
            Capability::ToOctaveValue => "to_octave_value",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| VerifyError::Config(format!("Unknown capability '{}'", s)))
    }
}

/// Everything demanded of one type name in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRequirement {
    pub type_name: String,
    pub capabilities: BTreeSet<Capability>,
    pub locators: BTreeSet<SourceLocator>,
}

impl TypeRequirement {
    pub fn new(
        type_name: impl Into<String>,
        locator: SourceLocator,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            capabilities: capabilities.into_iter().collect(),
            locators: BTreeSet::from([locator]),
        }
    }

    /// Fold another usage of the same type into this one.
    pub fn merge(
        &mut self,
        locator: SourceLocator,
        capabilities: impl IntoIterator<Item = Capability>,
    ) {
        self.locators.insert(locator);
        self.capabilities.extend(capabilities);
    }

    /// Lexicographically smallest usage locator.
    pub fn origin(&self) -> SourceLocator {
        self.locators
            .first()
            .cloned()
            .unwrap_or_else(SourceLocator::head_unpositioned)
    }

    /// Statement probe declaring a pointer to the type, which fails when the
    /// type name does not name a type at all.
    pub fn validity_probe(&self, ids: &mut IdGenerator) -> Probe {
        let expression = format!("{} *{};", self.type_name, ids.next_id());
        Probe::Statement(
            StatementProbe::new(ids, expression, Vec::new(), "void", self.origin())
                .with_message(format!("Invalid type '{}'", self.type_name)),
        )
    }

    /// One probe per required capability, in capability order.
    pub fn add_checks(&self, ids: &mut IdGenerator, config: &VerifierConfig) -> Vec<Probe> {
        let origin = self.origin();
        let ty = &self.type_name;
        let lib = &config.library_namespace;
        let host = &config.host_namespace;
        let value = ids.next_id();
        let missing =
            |function: String| format!("Function '{}' not defined for type '{}'", function, ty);
        let value_local = (value.clone(), format!("{} &", ty));

        let mut probes = Vec::with_capacity(self.capabilities.len());
        for capability in &self.capabilities {
            match capability {
                Capability::TokenName => {
                    if config.is_library_type(ty) {
                        tracing::debug!(type_name = %ty, "token name provided by the library");
                        continue;
                    }
                    let method = MethodProbe::new(
                        ty.as_str(),
                        FunctionProbe::new(
                            "token_name",
                            "std::string",
                            Vec::new(),
                            Qualifiers::CONST,
                        ),
                    );
                    let macro_probe =
                        MacroProbe::new(lib.as_str(), "token_name", vec![ty.clone()]);
                    probes.push(Probe::MethodOrMacro(
                        MethodOrMacroProbe::new(method, macro_probe, capability.as_str())
                            .with_origin(origin.clone()),
                    ));
                }
                Capability::Pack => {
                    let locals = vec![
                        value_local.clone(),
                        ("packer".to_string(), format!("{}::Packer &", lib)),
                    ];
                    let probe = StatementProbe::new(
                        ids,
                        format!("{}::pack(packer, {});", lib, value),
                        locals,
                        "void",
                        origin.clone(),
                    )
                    .with_message(missing(format!("{}::pack", lib)))
                    .as_capability();
                    probes.push(Probe::Statement(probe));
                }
                Capability::Unpack => {
                    let locals = vec![
                        value_local.clone(),
                        ("unpacker".to_string(), format!("{}::Unpacker &", lib)),
                    ];
                    let probe = StatementProbe::new(
                        ids,
                        format!("{}::unpack(unpacker, {});", lib, value),
                        locals,
                        "void",
                        origin.clone(),
                    )
                    .with_message(missing(format!("{}::unpack", lib)))
                    .as_capability();
                    probes.push(Probe::Statement(probe));
                }
                Capability::FromOctaveValue => {
                    let host_value = ids.next_id();
                    let locals = vec![
                        value_local.clone(),
                        (host_value.clone(), format!("{} &", config.host_value_type)),
                    ];
                    let probe = StatementProbe::new(
                        ids,
                        format!("{}::from_octave_value({}, {});", host, value, host_value),
                        locals,
                        "void",
                        origin.clone(),
                    )
                    .with_message(missing(format!("{}::from_octave_value", host)))
                    .as_capability();
                    probes.push(Probe::Statement(probe));
                }
                Capability::ToOctaveValue => {
                    let probe = StatementProbe::new(
                        ids,
                        format!("return {}::to_octave_value({});", host, value),
                        vec![value_local.clone()],
                        config.host_value_type.as_str(),
                        origin.clone(),
                    )
                    .with_message(missing(format!("{}::to_octave_value", host)))
                    .as_capability();
                    probes.push(Probe::Statement(probe));
                }
            }
        }
        probes
    }
}

/// Requirements keyed by type name, in first-seen order.
#[derive(Debug, Default)]
pub struct TypeRequirements {
    requirements: Vec<TypeRequirement>,
    by_name: FxHashMap<String, usize>,
}

impl TypeRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a usage into the requirement for `type_name`, creating it on
    /// first use.
    pub fn check_type(
        &mut self,
        type_name: &str,
        locator: SourceLocator,
        capabilities: impl IntoIterator<Item = Capability>,
    ) {
        match self.by_name.get(type_name) {
            Some(&idx) => self.requirements[idx].merge(locator, capabilities),
            None => {
                self.by_name
                    .insert(type_name.to_string(), self.requirements.len());
                self.requirements
                    .push(TypeRequirement::new(type_name, locator, capabilities));
            }
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&TypeRequirement> {
        self.by_name.get(type_name).map(|&idx| &self.requirements[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeRequirement> {
        self.requirements.iter()
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}
