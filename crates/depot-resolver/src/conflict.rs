//! Version conflict reporting.

use std::fmt;

/// Every version that conflict resolution replaced during one `resolve` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub conflicts: Vec<VersionConflict>,
}

/// A module that was selected at one version but resolved at another,
/// because a higher version of it was resolved elsewhere in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
    pub group: String,
    pub name: String,
    pub requested: String,
    pub resolved: String,
    pub reason: String,
}

impl ConflictReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a conflict; repeating one updates its resolved version.
    pub fn add(&mut self, conflict: VersionConflict) {
        let existing = self.conflicts.iter_mut().find(|c| {
            c.group == conflict.group && c.name == conflict.name && c.requested == conflict.requested
        });
        match existing {
            Some(c) => c.resolved = conflict.resolved,
            None => self.conflicts.push(conflict),
        }
    }

    /// Point every recorded conflict for `group:name` at the final winner.
    pub fn settle(&mut self, group: &str, name: &str, winner: &str) {
        for c in self
            .conflicts
            .iter_mut()
            .filter(|c| c.group == group && c.name == name)
        {
            c.resolved = winner.to_string();
        }
        self.conflicts
            .retain(|c| !(c.group == group && c.name == name && c.requested == winner));
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conflicts.is_empty() {
            return write!(f, "No version conflicts.");
        }
        writeln!(f, "Version conflicts ({}):", self.conflicts.len())?;
        for c in &self.conflicts {
            writeln!(f, "  {c}")?;
        }
        Ok(())
    }
}

impl fmt::Display for VersionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} requested {} but resolved {} ({})",
            self.group, self.name, self.requested, self.resolved, self.reason
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(requested: &str, resolved: &str) -> VersionConflict {
        VersionConflict {
            group: "org.jsoup".to_string(),
            name: "jsoup".to_string(),
            requested: requested.to_string(),
            resolved: resolved.to_string(),
            reason: "highest version wins".to_string(),
        }
    }

    #[test]
    fn empty_report() {
        let report = ConflictReport::new();
        assert!(report.is_empty());
        assert_eq!(report.len(), 0);
        assert_eq!(report.to_string(), "No version conflicts.");
    }

    #[test]
    fn report_with_conflicts() {
        let mut report = ConflictReport::new();
        report.add(conflict("1.8.1", "1.8.3"));
        assert_eq!(report.len(), 1);
        let s = report.to_string();
        assert!(s.contains("org.jsoup:jsoup"));
        assert!(s.contains("requested 1.8.1 but resolved 1.8.3"));
    }

    #[test]
    fn duplicate_replacements_are_recorded_once() {
        let mut report = ConflictReport::new();
        report.add(conflict("1.8.1", "1.8.3"));
        report.add(conflict("1.8.1", "1.9.0"));
        assert_eq!(report.len(), 1);
        assert_eq!(report.conflicts[0].resolved, "1.9.0");
    }

    #[test]
    fn settle_updates_winner_and_drops_self_conflicts() {
        let mut report = ConflictReport::new();
        report.add(conflict("1.8.1", "1.8.3"));
        report.add(conflict("1.8.3", "1.9.0"));
        report.settle("org.jsoup", "jsoup", "1.8.3");
        assert_eq!(report.len(), 1);
        assert_eq!(report.conflicts[0].requested, "1.8.1");
        assert_eq!(report.conflicts[0].resolved, "1.8.3");
    }
}
