//! High-precision analysis of files and diffs.
//!
//! Six detectors, nothing speculative: secret token shapes, private key
//! markers, committed env/SSH-key files, destructive Laravel migrations,
//! auth middleware removal in route files, and dependency lockfile changes.
//! Every finding carries redacted `(file, line, snippet)` evidence that a
//! reviewer can verify independently.

pub mod analyzer;
pub mod redact;
pub mod types;

pub use analyzer::{AnalyzerConfig, DEFAULT_SKIP_PATHS, RiskAnalyzer};
pub use redact::{redact_line, redact_secret, truncate_snippet};
pub use types::{Category, Confidence, Evidence, Finding, Severity};
