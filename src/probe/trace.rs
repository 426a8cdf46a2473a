use crate::locator::SourceLocator;
use crate::probe::{base_type_name, CheckContext};

/// Return types a trace function may have unless configured otherwise.
pub const DEFAULT_TRACE_RETURN_TYPES: &[&str] = &["int", "double", "std::string"];

/// A user trace function over the values of one place type.
///
/// Every free function with the given name is examined. A candidate passes
/// with exactly one parameter of the place type (ignoring top-level `const`
/// and references) and a whitelisted return type. Each failing candidate
/// overwrites the reported reason, even when an earlier one passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceProbe {
    pub name: String,
    pub place_type: String,
    pub return_types: Vec<String>,
    pub origin: Option<SourceLocator>,
}

impl TraceProbe {
    pub fn new(name: impl Into<String>, place_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            place_type: place_type.into(),
            return_types: DEFAULT_TRACE_RETURN_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            origin: None,
        }
    }

    pub fn with_return_types(mut self, return_types: Vec<String>) -> Self {
        self.return_types = return_types;
        self
    }

    pub fn with_origin(mut self, origin: SourceLocator) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn check(&self, ctx: &mut CheckContext) -> bool {
        let index = ctx.index();
        let expected = base_type_name(&self.place_type);
        let mut found = false;
        let mut seen = false;

        for func in index.functions().iter().filter(|f| f.name == self.name) {
            seen = true;
            let location = Some(func.location.clone());
            if func.params.len() != 1 {
                ctx.set_failure(
                    format!(
                        "Trace function '{}' must have exactly one parameter",
                        self.name
                    ),
                    location,
                );
            } else if base_type_name(&func.params[0].type_name) != expected {
                ctx.set_failure(
                    format!(
                        "Parameter of trace function '{}' must be of type '{}'",
                        self.name, self.place_type
                    ),
                    location,
                );
            } else if !self.return_types.contains(&func.return_type) {
                ctx.set_failure(
                    format!(
                        "Trace function '{}' must return one of: {}",
                        self.name,
                        self.return_types.join(", ")
                    ),
                    location,
                );
            } else {
                found = true;
            }
        }

        if !seen {
            ctx.set_failure(format!("Trace function '{}' not found", self.name), None);
        }
        found
    }
}
