// Public API
pub use document::{DocumentService, InMemoryDocumentService};
pub use sandbox::{
    check_safety, validate_submission, ReferenceRunner, SafetyCheck, TestCase, TestReport,
    TestResult, TestRunner, TestSuite,
};
pub use syntax::{check_syntax, SyntaxError};

// Internal modules
mod document;
mod sandbox;
mod syntax;
