//! Result-table scraper for MOSS report pages.
//!
//! The page layout is fixed by the service, so extraction is a single pass of
//! one row pattern over the lower-cased document. The date and option strings
//! are read from the raw text before case normalization.

use crate::domain::model::{Match, ParsedReport, ReportMetadata};
use regex::Regex;
use std::sync::LazyLock;

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Moss Results<p>\s*(?P<date>.+?)\s*<p>\s*Options").expect("valid date pattern")
});

static OPTIONS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<p>\s*Options (?P<options>.+?)\s*<HR>").expect("valid options pattern")
});

static ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"<tr><td><a href="(?P<url>[^"]*?/match(?P<match_num>\d+)\.html)">"#,
        r#"(?P<student1>[^<]+?) \((?P<perc1>\d{1,3})%\)</a>\s*"#,
        r#"<td><a href="[^"]*?/match\d+\.html">"#,
        r#"(?P<student2>[^<]+?) \((?P<perc2>\d{1,3})%\)</a>\s*"#,
        r#"<td align=right>(?P<lines>\d+)"#,
    ))
    .expect("valid row pattern")
});

/// Case-normalized identity used when comparing students across sources.
pub fn normalize_identity(identity: &str) -> String {
    identity.trim().to_lowercase()
}

/// Last non-empty path segment of the report location.
pub fn result_id(report_url: &str) -> String {
    report_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn extract_metadata(content: &str) -> ReportMetadata {
    let date = DATE_PATTERN
        .captures(content)
        .map(|caps| caps["date"].to_string());
    let options = OPTIONS_PATTERN
        .captures(content)
        .map(|caps| caps["options"].to_string());

    if date.is_none() || options.is_none() {
        tracing::warn!("Report header incomplete (date: {}, options: {})", date.is_some(), options.is_some());
    }

    ReportMetadata {
        date: date.unwrap_or_default(),
        options: options.unwrap_or_default(),
    }
}

pub fn extract_matches(content: &str) -> Vec<Match> {
    let normalized = content.to_lowercase();
    let mut matches = Vec::new();

    for caps in ROW_PATTERN.captures_iter(&normalized) {
        // 數字欄位已由 pattern 限定為純數字
        let parsed = (
            caps["match_num"].parse::<u32>(),
            caps["perc1"].parse::<u8>(),
            caps["perc2"].parse::<u8>(),
            caps["lines"].parse::<u32>(),
        );
        let (Ok(match_number), Ok(percent1), Ok(percent2), Ok(lines)) = parsed else {
            tracing::warn!("Skipping unparsable result row: {}", &caps[0]);
            continue;
        };
        if percent1 > 100 || percent2 > 100 {
            tracing::warn!("Skipping result row with out-of-range percentage: {}", &caps[0]);
            continue;
        }

        matches.push(Match {
            position: matches.len(),
            match_number,
            result_url: caps["url"].to_string(),
            student1: caps["student1"].trim().to_string(),
            percent1,
            student2: caps["student2"].trim().to_string(),
            percent2,
            lines,
        });
    }

    matches
}

pub fn parse_report(content: &str, report_url: &str) -> ParsedReport {
    let metadata = extract_metadata(content);
    let matches = extract_matches(content);
    tracing::debug!("Scraped {} matches from {}", matches.len(), report_url);

    ParsedReport {
        result_id: result_id(report_url),
        metadata,
        matches,
    }
}
