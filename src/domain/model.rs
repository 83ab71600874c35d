use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// One row of the report's result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Index in extraction order.
    pub position: usize,
    /// Number the service embeds in the resource name (`match<N>.html`).
    pub match_number: u32,
    pub result_url: String,
    pub student1: String,
    pub percent1: u8,
    pub student2: String,
    pub percent2: u8,
    pub lines: u32,
}

impl Match {
    pub fn meets_threshold(&self, threshold: i32) -> bool {
        i32::from(self.percent1) >= threshold || i32::from(self.percent2) >= threshold
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub date: String,
    pub options: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReport {
    pub result_id: String,
    pub metadata: ReportMetadata,
    pub matches: Vec<Match>,
}

/// A maximal set of students connected through one or more matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Network {
    members: BTreeSet<String>,
}

impl Network {
    pub fn new(members: BTreeSet<String>) -> Self {
        Self { members }
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    pub fn contains(&self, student: &str) -> bool {
        self.members.contains(student)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// 事先申報的合作組合 (無序)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartnerPair {
    members: BTreeSet<String>,
}

impl PartnerPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        let members = [first.into(), second.into()].into_iter().collect();
        Self { members }
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    pub fn is_pair(&self, first: &str, second: &str) -> bool {
        let other: BTreeSet<&str> = [first, second].into_iter().collect();
        self.members.len() == other.len() && self.members.iter().all(|m| other.contains(m.as_str()))
    }

    /// True when the network consists of exactly this pair.
    pub fn covers(&self, network: &Network) -> bool {
        &self.members == network.members()
    }

    pub fn map_members(&self, f: impl Fn(&str) -> String) -> Self {
        Self {
            members: self.members.iter().map(|m| f(m)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub student1: String,
    pub student2: String,
    pub percent1: u8,
    pub percent2: u8,
    pub lines: u32,
    pub result_url: String,
    pub partnered: bool,
}

/// A report line: an entry or the boundary between two networks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReportRow {
    Entry(Entry),
    GroupBoundary,
}

impl ReportRow {
    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            ReportRow::Entry(entry) => Some(entry),
            ReportRow::GroupBoundary => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub original_count: usize,
    pub retained_count: usize,
    pub filtered_count: usize,
}

impl ReportStats {
    pub fn new(original_count: usize, retained_count: usize) -> Self {
        Self {
            original_count,
            retained_count,
            filtered_count: original_count.saturating_sub(retained_count),
        }
    }
}

/// Ordered matches of one surviving network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchGroup {
    pub matches: Vec<Match>,
}

impl MatchGroup {
    pub fn top_match(&self) -> Option<&Match> {
        self.matches.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredReport {
    pub result_id: String,
    pub metadata: ReportMetadata,
    pub groups: Vec<MatchGroup>,
    pub stats: ReportStats,
}

/// Mapping handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub date: String,
    pub options: String,
    pub result_id: String,
    pub entries: Vec<ReportRow>,
    pub original_count: usize,
    pub retained_count: usize,
    pub filtered_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Base,
    Current,
    Historical,
}

/// A file named in configuration, before it is added to a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub name: String,
}

impl FileSpec {
    /// Parses `path[=display name]`.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once('=') {
            Some((path, name)) => Self {
                path: PathBuf::from(path.trim()),
                name: name.trim().to_string(),
            },
            None => Self {
                path: PathBuf::from(spec.trim()),
                name: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedFile {
    pub path: PathBuf,
    pub display_name: String,
    pub category: FileCategory,
}

/// Service-side options sent with every submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MossOptions {
    pub max_matches: u32,
    pub directory_mode: bool,
    pub experimental: bool,
    pub show: u32,
    pub comment: String,
}

impl Default for MossOptions {
    fn default() -> Self {
        Self {
            max_matches: 10,
            directory_mode: false,
            experimental: false,
            show: 250,
            comment: String::new(),
        }
    }
}

/// Everything the detection service needs for one query.
#[derive(Debug, Clone)]
pub struct SubmissionPayload {
    pub account: String,
    pub language: String,
    pub options: MossOptions,
    pub base_files: Vec<SubmittedFile>,
    pub files: Vec<SubmittedFile>,
}
