//! Severity markers in scanner output.
//!
//! The output is treated as opaque text: a finding is any occurrence of
//! `"Severity": "<LEVEL>"`, whatever surrounds it.

use std::{collections::BTreeMap, fmt};

use crate::{Result, error::FindingsSnafu};

const SEVERITY_MARKER: &str = r#""Severity": ""#;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    severities: BTreeMap<String, usize>,
}

impl ScanReport {
    pub fn from_output(output: &str) -> Self {
        let mut severities = BTreeMap::new();
        for (start, marker) in output.match_indices(SEVERITY_MARKER) {
            let rest = &output[start + marker.len()..];
            if let Some(end) = rest.find('"') {
                *severities.entry(rest[..end].to_owned()).or_default() += 1;
            }
        }
        Self { severities }
    }

    pub fn count(&self, severity: &str) -> usize {
        self.severities.get(severity).copied().unwrap_or_default()
    }

    pub fn contains(&self, severity: &str) -> bool {
        self.count(severity) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.severities.is_empty()
    }

    /// Fail when any of the `blocked` severities was reported.
    pub fn check<S: AsRef<str>>(&self, blocked: &[S]) -> Result<()> {
        let findings = blocked
            .iter()
            .map(AsRef::as_ref)
            .filter(|severity| self.contains(severity))
            .map(|severity| format!("{} {}", self.count(severity), severity))
            .collect::<Vec<_>>();

        if findings.is_empty() {
            Ok(())
        } else {
            FindingsSnafu {
                findings: findings.join(", "),
            }
            .fail()
        }
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no findings");
        }
        let counts = self
            .severities
            .iter()
            .map(|(severity, count)| format!("{severity}={count}"))
            .collect::<Vec<_>>();
        write!(f, "{}", counts.join(", "))
    }
}
