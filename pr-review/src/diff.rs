//! Unified-diff helpers: added-line computation and binary heuristics.
//!
//! Works on hunks-only patches (provider `patch` fields carry no ---/+++
//! headers). Only `@@` headers are required; `\ No newline at end of file`
//! markers are ignored.

use std::collections::BTreeSet;

/// Collects the new-file line numbers added by a patch.
///
/// Walks `@@ -a,b +c,d @@` hunk headers: `+` lines take and advance the
/// new-file counter, context lines advance it, `-` lines do not.
pub fn added_lines(patch: &str) -> BTreeSet<u32> {
    let mut out = BTreeSet::new();
    let mut new_line = 0u32;
    let mut in_hunk = false;

    for line in patch.lines() {
        if line.starts_with("@@") {
            if let Some(start) = parse_new_start(line) {
                new_line = start;
                in_hunk = true;
            }
            continue;
        }
        if !in_hunk || line.starts_with("\\ ") {
            continue;
        }
        if line.starts_with('+') {
            out.insert(new_line);
            new_line += 1;
        } else if line.starts_with('-') {
            // Old-file line only.
        } else {
            new_line += 1;
        }
    }
    out
}

/// Extracts `c` from `@@ -a,b +c,d @@`.
fn parse_new_start(header: &str) -> Option<u32> {
    let plus = header.find('+')?;
    let rest = &header[plus + 1..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Heuristic for binary patches or binary-change messages.
pub fn looks_like_binary_patch(patch: &str) -> bool {
    patch.contains("GIT binary patch")
        || patch.starts_with("Binary files ")
        || (patch.starts_with("Files ") && patch.contains(" differ"))
}
