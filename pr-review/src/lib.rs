//! Pull-request risk review.
//!
//! Diff in, report out: added-line scoping, the six high-precision
//! detectors, an optional model phrasing pass for critical findings, and a
//! deterministic verdict (`RequestChanges` iff any critical finding). A
//! clean diff produces a positive report, not an empty error.

pub mod diff;
pub mod errors;
pub mod report;
pub mod review;

pub use diff::{added_lines, looks_like_binary_patch};
pub use errors::{ReviewError, ReviewResult};
pub use report::{ReviewReport, SeverityCounts, Verdict};
pub use review::{ReviewConfig, ReviewOrchestrator, ReviewOutcome};
