//! Partner file converters.

use crate::domain::model::PartnerPair;
use crate::domain::ports::PartnerSource;
use crate::utils::error::Result;
use crate::utils::validation::validate_range;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum PartnerFormat {
    /// Course roster export with one partner column per assignment.
    #[default]
    Roster,
    /// Two columns, one pair per row.
    Pairs,
}

/// Roster layout:
/// `"StudentID","UCInetID","Last Name","First Name","Lab","1",...,"10"`.
/// Partner cells hold an e-mail address; only the local part is kept.
#[derive(Debug, Clone, Copy)]
pub struct RosterPartnerSource {
    pub assignment: usize,
}

impl RosterPartnerSource {
    const FIRST_ASSIGNMENT_COLUMN: usize = 5;
    const ASSIGNMENTS: usize = 10;
}

impl PartnerSource for RosterPartnerSource {
    fn load(&self, path: &Path) -> Result<Vec<PartnerPair>> {
        validate_range("partners.assignment", self.assignment, 1, Self::ASSIGNMENTS)?;
        let column = Self::FIRST_ASSIGNMENT_COLUMN + self.assignment - 1;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut pairs = BTreeSet::new();
        for record in reader.records() {
            let record = record?;
            let (Some(student), Some(partner)) = (record.get(1), record.get(column)) else {
                continue;
            };
            let partner = partner.split('@').next().unwrap_or_default();
            if student.is_empty() || partner.is_empty() {
                continue;
            }
            pairs.insert(PartnerPair::new(student, partner));
        }

        tracing::info!("👥 Loaded {} partner pairs for assignment {}", pairs.len(), self.assignment);
        Ok(pairs.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PairListPartnerSource;

impl PartnerSource for PairListPartnerSource {
    fn load(&self, path: &Path) -> Result<Vec<PartnerPair>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_path(path)?;

        let mut pairs = BTreeSet::new();
        for record in reader.records() {
            let record = record?;
            match (record.get(0), record.get(1)) {
                (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
                    pairs.insert(PartnerPair::new(a, b));
                }
                _ => tracing::warn!("Skipping partner row without two students: {:?}", record),
            }
        }

        tracing::info!("👥 Loaded {} partner pairs", pairs.len());
        Ok(pairs.into_iter().collect())
    }
}

pub fn load_partners(format: PartnerFormat, path: &Path, assignment: usize) -> Result<Vec<PartnerPair>> {
    match format {
        PartnerFormat::Roster => RosterPartnerSource { assignment }.load(path),
        PartnerFormat::Pairs => PairListPartnerSource.load(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_roster_reads_assignment_column() {
        let file = write_temp(concat!(
            "\"StudentID\",\"UCInetID\",\"Last Name\",\"First Name\",\"Lab\",\"1\",\"2\",\"3\",\"4\",\"5\",\"6\",\"7\",\"8\",\"9\",\"10\"\n",
            "\"1001\",\"adoe\",\"Doe\",\"Ann\",\"1\",\"bsmith@uci.edu\",\"cwu@uci.edu\",,,,,,,,\n",
            "\"1002\",\"bsmith\",\"Smith\",\"Bo\",\"1\",\"adoe@uci.edu\",,,,,,,,,\n",
        ));

        let pairs = RosterPartnerSource { assignment: 1 }.load(file.path()).unwrap();
        assert_eq!(pairs, vec![PartnerPair::new("adoe", "bsmith")]);

        let pairs = RosterPartnerSource { assignment: 2 }.load(file.path()).unwrap();
        assert_eq!(pairs, vec![PartnerPair::new("adoe", "cwu")]);
    }

    #[test]
    fn test_roster_rejects_unknown_assignment() {
        let file = write_temp("a,b\n");
        assert!(RosterPartnerSource { assignment: 0 }.load(file.path()).is_err());
        assert!(RosterPartnerSource { assignment: 11 }.load(file.path()).is_err());
    }

    #[test]
    fn test_pair_list() {
        let file = write_temp("# partners\nalice, bob\ncarol\nbob,alice\n");
        let pairs = load_partners(PartnerFormat::Pairs, file.path(), 1).unwrap();
        assert_eq!(pairs, vec![PartnerPair::new("alice", "bob")]);
    }

    #[test]
    fn test_closure_partner_source() {
        let source = |_: &Path| -> Result<Vec<PartnerPair>> { Ok(vec![PartnerPair::new("x", "y")]) };
        let pairs = source.load(Path::new("ignored.csv")).unwrap();
        assert_eq!(pairs.len(), 1);
    }
}
