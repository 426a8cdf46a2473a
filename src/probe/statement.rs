use crate::ids::IdGenerator;
use crate::locator::SourceLocator;
use crate::unit::WriteEntity;

/// A statement compiled inside a synthetic function.
///
/// Written as
///
/// ```text
/// R ____fragcheck____N(T1 a, T2 b) {
/// <expression>
/// }
/// ```
///
/// and accepted when no actionable diagnostic lands in its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementProbe {
    /// Name of the synthetic function.
    pub function_name: String,
    pub expression: String,
    /// Parameters of the wrapper, `(name, type)` in order.
    pub locals: Vec<(String, String)>,
    pub return_type: String,
    pub origin: SourceLocator,
    /// Message reported instead of the compiler's one.
    pub message: Option<String>,
    /// Failure means a missing capability rather than a bad expression.
    pub capability: bool,
}

impl StatementProbe {
    pub fn new(
        ids: &mut IdGenerator,
        expression: impl Into<String>,
        locals: Vec<(String, String)>,
        return_type: impl Into<String>,
        origin: SourceLocator,
    ) -> Self {
        Self {
            function_name: ids.next_id(),
            expression: expression.into(),
            locals,
            return_type: return_type.into(),
            origin,
            message: None,
            capability: false,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn as_capability(mut self) -> Self {
        self.capability = true;
        self
    }

    /// Message to report for a compiler diagnostic in this probe.
    pub fn failure_message(&self, diagnostic: &str) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| diagnostic.to_string())
    }
}

impl WriteEntity for StatementProbe {
    fn write_prologue(&self, out: &mut String) {
        let params = self
            .locals
            .iter()
            .map(|(name, ty)| format!("{} {}", ty, name))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{} {}({}) {{\n",
            self.return_type, self.function_name, params
        ));
    }

    fn write_content(&self, out: &mut String) {
        out.push_str(&self.expression);
    }

    fn write_epilogue(&self, out: &mut String) {
        out.push_str("}\n");
    }
}
