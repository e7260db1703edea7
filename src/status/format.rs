//! Human-readable rendering of aggregated reports.
//!
//! The detail block looks like:
//!
//! ```text
//! 1 out of 2
//!
//!   Total job count:     2
//!     jobs: ["ci-lint" "ci-test"]
//!   Completed job count: 1
//!     jobs: ["ci-lint"]
//!   Failed job count:    1
//!     jobs: ["ci-test"]
//! ```
//!
//! followed, when any jobs are ignored, by a `--` separator and the ignored
//! names.

use std::fmt::{self, Write};

use super::report::AggregatedReport;

impl AggregatedReport {
    /// Renders the multi-line detail block.
    pub fn detail(&self) -> String {
        let mut out = format!(
            "{} out of {}\n\n  Total job count:     {}\n    jobs: {}\n  Completed job count: {}\n    jobs: {}\n  Failed job count:    {}\n    jobs: {}\n",
            self.complete_jobs.len(),
            self.total_jobs.len(),
            self.total_jobs.len(),
            quoted_list(&self.total_jobs),
            self.complete_jobs.len(),
            quoted_list(&self.complete_jobs),
            self.failed_jobs.len(),
            quoted_list(&self.failed_jobs),
        );
        if !self.ignored_jobs.is_empty() {
            out.push_str("\n\n  --\n  Ignored jobs: ");
            out.push_str(&quoted_list(&self.ignored_jobs));
        }
        out
    }

    /// Renders the detail block plus the jobs still outstanding.
    pub fn summary(&self) -> String {
        let incomplete = self.incomplete_jobs();
        let mut out = self.detail();
        if !incomplete.is_empty() {
            if !self.ignored_jobs.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!(
                "  Incomplete jobs:     {}\n",
                quoted_list(incomplete)
            ));
        }
        out
    }
}

impl fmt::Display for AggregatedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail())
    }
}

/// Formats names as `["a" "b"]`, escaping anything outside printable ASCII.
pub fn quoted_list<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> String {
    let quoted: Vec<String> = names.into_iter().map(|n| quote_ascii(n.as_ref())).collect();
    format!("[{}]", quoted.join(" "))
}

fn quote_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' '..='~' => out.push(c),
            c if (c as u32) < 0x80 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if (c as u32) < 0x10000 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
        }
    }
    out.push('"');
    out
}
