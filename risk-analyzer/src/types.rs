//! Finding model shared by the analyzer and the review orchestrator.

use serde::{Deserialize, Serialize};

/// Finding severity. Only `Critical` findings change a review verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// The six high-precision finding categories. Nothing else is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SecretExposure,
    MigrationDestructive,
    AuthMiddlewareRemoved,
    DependencyChanged,
    EnvLeaked,
    PrivateKeyExposed,
}

/// How a finding was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// A specific token shape matched exactly.
    ExactMatch,
    /// Identified by position and context, not a unique token.
    Structural,
    /// Heuristic regex, not guaranteed unique.
    Pattern,
}

/// Supporting evidence for a finding. Secret material is always redacted
/// before it reaches this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// The matched line with in-place redaction, at most 500 characters.
    pub snippet: String,
    /// Human name of the matched pattern, e.g. `Stripe Live Secret Key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_name: Option<String>,
    /// Redacted matched text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<String>,
    pub reason: String,
    pub confidence: Confidence,
    /// Schema operation label for destructive migrations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Target table/column for destructive migrations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Removed middleware name for auth findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middleware: Option<String>,
    /// Optional model-phrased explanation added by the review orchestrator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One analyzer finding bound to a file and line range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub category: Category,
    pub file_path: String,
    /// 1-based inclusive line range.
    pub start_line: u32,
    pub end_line: u32,
    pub evidence: Evidence,
}
