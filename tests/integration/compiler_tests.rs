//! Verification against a real C++ compiler.
//!
//! Each test skips when neither g++ nor clang++ is on PATH.

use std::fs;
use std::path::{Path, PathBuf};

use brrr_fragcheck::{
    Capability, Fragment, FragmentRole, FrontEndKind, SourceLocator, Verifier, VerifierConfig,
    VerifyError,
};

/// Library stand-in declaring what the capability probes call.
const RUNTIME_HEAD: &str = "namespace ca {\n\
struct Context {};\n\
struct Packer {};\n\
struct Unpacker {};\n\
}\n\
struct Point { int x; };\n\
namespace ca {\n\
inline void pack(Packer &packer, const Point &p) {}\n\
}\n";

fn find_compiler() -> Option<PathBuf> {
    which::which("g++").or_else(|_| which::which("clang++")).ok()
}

fn compiler_config(dir: &Path) -> Option<VerifierConfig> {
    let compiler = find_compiler()?;
    Some(VerifierConfig {
        compiler: Some(compiler.display().to_string()),
        frontend: FrontEndKind::Compiler,
        prelude_includes: vec!["vector".to_string()],
        temp_dir: Some(dir.to_path_buf()),
        ..VerifierConfig::default()
    })
}

macro_rules! require_compiler {
    ($dir:expr) => {
        match compiler_config($dir) {
            Some(config) => config,
            None => {
                eprintln!("Skipping compiler test: no g++ or clang++ found");
                return;
            }
        }
    };
}

fn node(id: &str, body: &str) -> Fragment {
    Fragment::new(
        id,
        FragmentRole::NodeInit,
        format!("void place_fn_{}(ca::Context &ctx, std::vector<Point> &place)", id),
        body,
    )
}

#[test]
fn test_clean_project_passes() {
    let tmp = tempfile::tempdir().unwrap();
    let config = require_compiler!(tmp.path());
    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head(RUNTIME_HEAD));
    verifier.add_fragment(node("3", "Point p;\np.x = 1;\nplace.push_back(p);\n"));
    verifier.check_type("Point", SourceLocator::new("*3/type"), [Capability::Pack]);

    let result = verifier.verify();
    assert!(result.is_ok(), "unexpected failure: {:?}", result);
}

#[test]
fn test_undeclared_identifier_in_node() {
    let tmp = tempfile::tempdir().unwrap();
    let config = require_compiler!(tmp.path());
    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head(RUNTIME_HEAD));
    verifier.add_fragment(node("3", "int a = 0;\nundefined_fn(a);\n"));

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.kind(), "expression");
    assert_eq!(
        err.locator().map(|l| l.as_str()),
        Some("*3/init_function:2:1")
    );
    assert!(err.message().contains("undefined_fn"));
}

#[test]
fn test_missing_unpack_capability() {
    let tmp = tempfile::tempdir().unwrap();
    let config = require_compiler!(tmp.path());
    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head(RUNTIME_HEAD));
    verifier.check_type(
        "Point",
        SourceLocator::new("*7/type"),
        [Capability::Pack, Capability::Unpack],
    );

    let err = verifier.verify().unwrap_err();
    assert!(matches!(err, VerifyError::CapabilityMissing { .. }));
    assert_eq!(err.locator().map(|l| l.as_str()), Some("*7/type"));
    assert_eq!(
        err.message(),
        "Function 'ca::unpack' not defined for type 'Point'"
    );
}

#[test]
fn test_unknown_type_is_invalid() {
    let tmp = tempfile::tempdir().unwrap();
    let config = require_compiler!(tmp.path());
    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head(RUNTIME_HEAD));
    verifier.check_type("Missing", SourceLocator::new("*2/type"), [Capability::Pack]);

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.locator().map(|l| l.as_str()), Some("*2/type"));
    assert_eq!(err.message(), "Invalid type 'Missing'");
}

#[test]
fn test_expression_conversion_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let config = require_compiler!(tmp.path());
    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head(RUNTIME_HEAD));
    verifier.check_expression(
        "p",
        vec![("p".to_string(), "Point".to_string())],
        "int",
        SourceLocator::new("*4/function:3:5"),
        None,
    );

    let err = verifier.verify().unwrap_err();
    assert_eq!(err.kind(), "expression");
    assert_eq!(err.locator().map(|l| l.as_str()), Some("*4/function:3:5"));
    assert_eq!(err.message(), "Invalid type of expression");
}

#[test]
fn test_vector_element_type_checked() {
    let tmp = tempfile::tempdir().unwrap();
    let config = require_compiler!(tmp.path());
    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head(RUNTIME_HEAD));
    let locals = vec![("p".to_string(), "Point".to_string())];
    verifier.check_may_form_vector(
        "p",
        locals.clone(),
        "std::vector<Point>",
        SourceLocator::new("*5/function:1:1"),
        None,
    );
    assert!(verifier.verify().is_ok());

    verifier.check_may_form_vector(
        "p",
        locals,
        "std::vector<int>",
        SourceLocator::new("*6/function:1:1"),
        Some("Cannot form a vector of int".to_string()),
    );
    let err = verifier.verify().unwrap_err();
    assert_eq!(
        err.to_string(),
        "*6/function:1:1: Cannot form a vector of int"
    );
}

#[test]
fn test_broken_header_is_foreign_file_error() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = require_compiler!(tmp.path());
    let include = tmp.path().join("include");
    fs::create_dir(&include).unwrap();
    fs::write(include.join("broken.h"), "int broken = ;\n").unwrap();
    config.include_dirs = vec![include];
    config.prelude_includes = vec!["broken.h".to_string()];

    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head("int fine = 1;\n"));

    let err = verifier.verify().unwrap_err();
    match err {
        VerifyError::ForeignFile { file, line, .. } => {
            assert!(file.ends_with("broken.h"), "unexpected file {}", file);
            assert_eq!(line, 1);
        }
        other => panic!("expected foreign-file error, got {:?}", other),
    }
}

#[test]
fn test_rejected_flag_fails_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = require_compiler!(tmp.path());
    config.flags = vec!["--definitely-not-a-flag".to_string()];

    let mut verifier = Verifier::from_config(config);
    verifier.add_fragment(Fragment::head("int a = ;\n"));

    let err = verifier.verify().unwrap_err();
    match &err {
        VerifyError::FrontEndFailed { stderr, .. } => {
            assert!(
                stderr.contains("definitely-not-a-flag"),
                "unexpected stderr {}",
                stderr
            );
        }
        other => panic!("expected front-end failure, got {:?}", other),
    }
    assert_eq!(err.kind(), "front-end");
    assert!(err.locator().is_none());
}
