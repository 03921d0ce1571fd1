//! Review report assembly and markdown rendering.

use risk_analyzer::{Finding, Severity};
use serde::Serialize;

/// Review outcome: request changes iff any critical finding exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    RequestChanges,
    Comment,
}

/// Finding counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

/// Structured review summary for a pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReport {
    pub pr_number: u64,
    pub head_commit: String,
    pub base_commit: String,
    pub files_analyzed: usize,
    /// Files that could not be fetched or scanned, with the scrubbed reason.
    pub files_skipped: Vec<(String, String)>,
    pub counts: SeverityCounts,
    pub findings: Vec<Finding>,
    pub verdict: Verdict,
}

impl ReviewReport {
    pub fn from_findings(
        pr_number: u64,
        head_commit: String,
        base_commit: String,
        files_analyzed: usize,
        files_skipped: Vec<(String, String)>,
        findings: Vec<Finding>,
    ) -> Self {
        let mut counts = SeverityCounts::default();
        for finding in &findings {
            match finding.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        let verdict = if counts.critical > 0 {
            Verdict::RequestChanges
        } else {
            Verdict::Comment
        };
        Self {
            pr_number,
            head_commit,
            base_commit,
            files_analyzed,
            files_skipped,
            counts,
            findings,
            verdict,
        }
    }

    /// Renders the report as markdown for an external integration to post.
    pub fn render_markdown(&self) -> String {
        let mut out = String::from("**Repolens Review**\n");

        if self.findings.is_empty() {
            out.push_str("\nNo high-risk issues detected.\n");
            return out;
        }

        let sections: [(&str, Severity, usize); 3] = [
            (":red_circle: Critical", Severity::Critical, self.counts.critical),
            (":yellow_circle: Warnings", Severity::Warning, self.counts.warning),
            (":blue_circle: Info", Severity::Info, self.counts.info),
        ];
        for (title, severity, count) in sections {
            if count == 0 {
                continue;
            }
            out.push_str(&format!("\n### {title} ({count})\n"));
            for finding in self.findings.iter().filter(|f| f.severity == severity) {
                let label = finding
                    .evidence
                    .pattern_name
                    .clone()
                    .unwrap_or_else(|| format!("{:?}", finding.category));
                out.push_str(&format!(
                    "- **{}** in `{}:{}`\n  {}\n",
                    label, finding.file_path, finding.start_line, finding.evidence.reason,
                ));
                if let Some(explanation) = &finding.evidence.explanation {
                    out.push_str(&format!("  _{explanation}_\n"));
                }
                out.push_str(&format!("  ```\n  {}\n  ```\n", finding.evidence.snippet));
            }
        }

        if !self.files_skipped.is_empty() {
            out.push_str(&format!("\n_{} file(s) skipped._\n", self.files_skipped.len()));
        }
        out
    }
}
