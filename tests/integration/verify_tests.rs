//! Verification pipeline tests.
//!
//! Runs whole verifications through the in-process tree-sitter front end
//! and through a stub front end that reports fixed diagnostics.

use std::path::Path;

use brrr_fragcheck::decl::{DeclarationTree, ParamDecl, Qualifiers};
use brrr_fragcheck::probe::FunctionProbe;
use brrr_fragcheck::unit::Unit;
use brrr_fragcheck::{
    Capability, Diagnostic, Fragment, FragmentRole, FrontEnd, FrontEndKind, ParsedUnit, Probe,
    Severity, SourceLocator, Verifier, VerifierConfig, VerifyError,
};

fn syntax_config(dir: &Path) -> VerifierConfig {
    VerifierConfig {
        frontend: FrontEndKind::Syntax,
        prelude_includes: Vec::new(),
        temp_dir: Some(dir.to_path_buf()),
        ..VerifierConfig::default()
    }
}

fn syntax_verifier(dir: &Path) -> Verifier {
    Verifier::from_config(syntax_config(dir))
}

fn node(id: &str, body: &str) -> Fragment {
    Fragment::new(
        id,
        FragmentRole::NodeInit,
        format!("void place_fn_{}(ca::Context &ctx, std::vector<int> &place)", id),
        body,
    )
}

/// Front end that reports one error on a unit line chosen from the text.
struct Stub {
    file: Option<String>,
    line: fn(&str) -> u32,
    message: &'static str,
}

impl FrontEnd for Stub {
    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn parse(&self, unit: &Unit, _args: &[String]) -> brrr_fragcheck::Result<ParsedUnit> {
        Ok(ParsedUnit {
            declarations: DeclarationTree::default(),
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                file: self.file.clone().unwrap_or_else(|| unit.file_name()),
                line: (self.line)(unit.text()),
                column: 3,
                message: self.message.to_string(),
            }],
        })
    }
}

/// 1-based line of the first line equal to `needle`.
fn line_of(text: &str, needle: &str) -> u32 {
    text.lines()
        .position(|l| l == needle)
        .map(|i| i as u32 + 1)
        .unwrap_or(0)
}

// =============================================================================
// Capability checks
// =============================================================================

#[test]
fn test_token_name_method_satisfies_capability() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(
        "struct Point {\n    int x;\n    std::string token_name() const { return \"p\"; }\n};\n",
    ));
    verifier.add_fragment(node("3", "place.push_back(1);\n"));
    verifier.check_type("Point", SourceLocator::new("*3/type"), [Capability::TokenName]);

    assert!(verifier.verify().is_ok());
}

#[test]
fn test_token_name_library_overload_satisfies_capability() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(
        "struct Point { int x; };\n\
         namespace ca {\n\
         std::string token_name(const Point &p) { return \"p\"; }\n\
         }\n",
    ));
    verifier.check_type("Point", SourceLocator::new("*3/type"), [Capability::TokenName]);

    assert!(verifier.verify().is_ok());
}

#[test]
fn test_token_name_overload_for_base_class() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(
        "struct Shape { int id; };\n\
         struct Circle : public Shape { double r; };\n\
         namespace ca {\n\
         std::string token_name(const Shape &s) { return \"s\"; }\n\
         }\n",
    ));
    verifier.check_type("Circle", SourceLocator::new("*2/type"), [Capability::TokenName]);

    assert!(verifier.verify().is_ok());
}

#[test]
fn test_missing_token_name_reported_at_type_declaration() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head("struct Point { int x; };\n"));
    verifier.check_type("Point", SourceLocator::new("*3/type"), [Capability::TokenName]);

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.kind(), "capability-missing");
    assert_eq!(err.locator().map(|l| l.as_str()), Some("*head:1:8"));
    assert_eq!(
        err.message(),
        "Function 'token_name' not defined for type 'Point'"
    );
}

#[test]
fn test_library_types_skip_token_name() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(""));
    verifier.check_type("int", SourceLocator::new("*1/type"), [Capability::TokenName]);
    verifier.check_type("double", SourceLocator::new("*2/type"), [Capability::TokenName]);
    verifier.check_type(
        "std::vector<int>",
        SourceLocator::new("*3/type"),
        [Capability::TokenName],
    );

    assert!(verifier.verify().is_ok());
}

#[test]
fn test_vector_of_user_type_uses_library_token_name() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(
        "struct Point {\n  int x;\n  std::string token_name() const { return \"p\"; }\n};\n",
    ));
    verifier.check_type(
        "std::vector<Point>",
        SourceLocator::new("*3/type"),
        [Capability::TokenName],
    );
    verifier.check_type("Point", SourceLocator::new("*4/type"), [Capability::TokenName]);

    assert!(verifier.verify().is_ok());
}

#[test]
fn test_capabilities_merge_across_calls() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.check_type("Point", SourceLocator::new("*9/type"), [Capability::Pack]);
    verifier.check_type("Point", SourceLocator::new("*4/type"), [Capability::TokenName]);

    let requirements = verifier.type_requirements();
    assert_eq!(requirements.len(), 1);
    let point = requirements.get("Point").unwrap();
    assert_eq!(point.origin().as_str(), "*4/type");
    assert!(point.capabilities.contains(&Capability::Pack));
    assert!(point.capabilities.contains(&Capability::TokenName));
}

// =============================================================================
// Function and trace probes
// =============================================================================

#[test]
fn test_function_return_type_mismatch() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head("void f() {}\n"));
    verifier.add_probe(Probe::Function(FunctionProbe::new(
        "f",
        "int",
        Vec::new(),
        Qualifiers::NONE,
    )));

    let err = verifier.verify().unwrap_err();
    assert!(matches!(err, VerifyError::CapabilityMissing { .. }));
    assert_eq!(err.locator().map(|l| l.as_str()), Some("*head:1:6"));
    assert_eq!(err.message(), "Function 'f' not found");
}

#[test]
fn test_function_exact_signature() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(
        "int scale(int value, double factor) { return value * factor; }\n",
    ));
    verifier.add_probe(Probe::Function(FunctionProbe::new(
        "scale",
        "int",
        vec![ParamDecl::new("value", "int"), ParamDecl::new("factor", "double")],
        Qualifiers::NONE,
    )));

    assert!(verifier.verify().is_ok());
}

#[test]
fn test_trace_function_accepted() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(
        "struct Point { int x; };\nint trace_x(const Point &p) { return p.x; }\n",
    ));
    verifier.check_trace_fn("trace_x", "Point", None);

    assert!(verifier.verify().is_ok());
}

#[test]
fn test_trace_function_wrong_return_type() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(
        "struct Point { int x; };\nfloat trace_x(const Point &p) { return 0; }\n",
    ));
    verifier.check_trace_fn("trace_x", "Point", Some(SourceLocator::new("*5/type")));

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.locator().map(|l| l.as_str()), Some("*head:2:7"));
    assert_eq!(
        err.message(),
        "Trace function 'trace_x' must return one of: int, double, std::string"
    );
}

#[test]
fn test_trace_function_missing_uses_origin() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head("struct Point { int x; };\n"));
    verifier.check_trace_fn("trace_x", "Point", Some(SourceLocator::new("*5/type")));

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.locator().map(|l| l.as_str()), Some("*5/type"));
    assert_eq!(err.message(), "Trace function 'trace_x' not found");
}

// =============================================================================
// Syntax diagnostics
// =============================================================================

#[test]
fn test_syntax_error_in_node_body() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head("struct Point { int x; };\n"));
    verifier.add_fragment(node("3", "int a = 1;\nint b = ;\n"));

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.kind(), "expression");
    let locator = err.locator().unwrap().to_string();
    assert!(
        locator.starts_with("*3/init_function:2:"),
        "unexpected locator {}",
        locator
    );
}

#[test]
fn test_malformed_expression_reported_at_origin() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(""));
    verifier.check_expression(
        "x +",
        vec![("x".to_string(), "int".to_string())],
        "int",
        SourceLocator::new("*6/function:1:1"),
        None,
    );

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.kind(), "expression");
    assert_eq!(err.locator().map(|l| l.as_str()), Some("*6/function:1:1"));
}

#[test]
fn test_well_formed_expressions_pass() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(Fragment::head(""));
    let locals = vec![("x".to_string(), "int".to_string())];
    verifier.check_expression(
        "x + 1",
        locals.clone(),
        "double",
        SourceLocator::new("*6/function:1:1"),
        None,
    );
    verifier.check_may_form_vector(
        "x * 2",
        locals,
        "std::vector<int>",
        SourceLocator::new("*7/function:1:1"),
        None,
    );

    assert!(verifier.verify().is_ok());
}

#[test]
fn test_replaced_fragment_is_verified() {
    let tmp = tempfile::tempdir().unwrap();
    let mut verifier = syntax_verifier(tmp.path());
    verifier.add_fragment(node("3", "int b = ;\n"));
    verifier.add_fragment(node("3", "int b = 2;\n"));

    assert!(verifier.verify().is_ok());
    assert_eq!(verifier.render_unit().matches("place_fn_3").count(), 1);
}

// =============================================================================
// Remapping through a stub front end
// =============================================================================

#[test]
fn test_diagnostic_in_second_fragment_maps_to_it() {
    let tmp = tempfile::tempdir().unwrap();
    let front_end = Stub {
        file: None,
        line: |text| line_of(text, "foo();"),
        message: "'foo' was not declared in this scope",
    };
    let mut verifier = Verifier::new(syntax_config(tmp.path()), Box::new(front_end));
    verifier.add_fragment(Fragment::head(""));
    verifier.add_fragment(node("1", "foo();\nbar();\n"));

    let err = verifier.verify().unwrap_err();
    assert_eq!(
        err.to_string(),
        "*1/init_function:1:3: 'foo' was not declared in this scope"
    );
}

#[test]
fn test_diagnostic_outside_every_fragment() {
    let tmp = tempfile::tempdir().unwrap();
    let front_end = Stub {
        file: None,
        line: |_| 999,
        message: "stray diagnostic",
    };
    let mut verifier = Verifier::new(syntax_config(tmp.path()), Box::new(front_end));
    verifier.add_fragment(Fragment::head("int x;\n"));

    let err = verifier.verify().unwrap_err();
    assert!(matches!(err, VerifyError::Unattributable { line: 999, .. }));
    assert_eq!(err.kind(), "internal");
}

#[test]
fn test_diagnostic_in_included_header() {
    let tmp = tempfile::tempdir().unwrap();
    let front_end = Stub {
        file: Some("/opt/ca/cailie.h".to_string()),
        line: |_| 12,
        message: "expected ';'",
    };
    let mut verifier = Verifier::new(syntax_config(tmp.path()), Box::new(front_end));
    verifier.add_fragment(Fragment::head("int x;\n"));

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.kind(), "foreign-file");
    assert_eq!(err.to_string(), "/opt/ca/cailie.h:12:3: expected ';'");
}

#[test]
fn test_rendered_unit_layout() {
    let tmp = tempfile::tempdir().unwrap();
    let config = VerifierConfig {
        prelude_includes: vec!["cailie.h".to_string()],
        ..syntax_config(tmp.path())
    };
    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(node("3", "place.push_back(1);\n"));
    verifier.add_fragment(Fragment::head("struct Point { int x; };\n"));
    verifier.check_type("Point", SourceLocator::new("*3/type"), [Capability::Pack]);

    let text = verifier.render_unit();
    assert!(text.starts_with("#include <cailie.h>\nstruct Point { int x; };\n"));
    assert!(text.contains("namespace __fragcheck__ {\nvoid place_fn_3("));
    assert!(text.contains("Point *____fragcheck____"));
    assert!(text.contains("ca::pack(packer, ____fragcheck____"));
    assert_eq!(text, verifier.render_unit());
}

#[test]
fn test_invalid_config_fails_before_synthesis() {
    let tmp = tempfile::tempdir().unwrap();
    let config = VerifierConfig {
        library_namespace: String::new(),
        ..syntax_config(tmp.path())
    };
    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head("struct Point { int x; };\n"));
    verifier.check_type("Point", SourceLocator::new("*3/type"), [Capability::Pack]);

    let err = verifier.verify().unwrap_err();
    assert!(matches!(err, VerifyError::Config(_)), "{:?}", err);
    assert_eq!(err.kind(), "configuration");
}
