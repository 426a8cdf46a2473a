//! brrr-fragcheck - semantic verifier for embedded C/C++ fragments.
//!
//! Code fragments authored separately in a modeling tool (a shared head,
//! per-node initializer and handler bodies, a communication model) are
//! synthesized into one translation unit, parsed once by a C++ front end,
//! and checked for type errors and required type capabilities. Any failure
//! is reported as a single [`VerifyError`] whose [`SourceLocator`] points
//! back into the fragment the user edited.
//!
//! ```no_run
//! use brrr_fragcheck::{Capability, Fragment, SourceLocator, Verifier, VerifierConfig};
//!
//! let mut verifier = Verifier::from_config(VerifierConfig::default());
//! verifier.add_fragment(Fragment::head("struct Point { int x; };"));
//! verifier.check_type("Point", SourceLocator::new("*3/type"), [Capability::Pack]);
//! if let Err(e) = verifier.verify() {
//!     eprintln!("{}", e);
//! }
//! ```

pub mod capability;
pub mod config;
pub mod decl;
pub mod error;
pub mod fragment;
pub mod frontend;
pub mod ids;
pub mod locator;
pub mod probe;
pub mod project;
pub mod remap;
pub mod unit;
pub mod verifier;

pub use capability::{Capability, TypeRequirement, TypeRequirements};
pub use config::{discover_config, load_config, FrontEndKind, VerifierConfig, CONFIG_FILE_NAME};
pub use error::{Result, VerifyError};
pub use fragment::{Fragment, FragmentRole, HeaderRenderer};
pub use frontend::{
    CompilerFrontEnd, Diagnostic, FrontEnd, ParsedUnit, Severity, SyntaxFrontEnd,
};
pub use ids::IdGenerator;
pub use locator::SourceLocator;
pub use probe::Probe;
pub use project::Project;
pub use verifier::Verifier;
