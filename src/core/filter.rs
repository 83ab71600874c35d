//! Network policy: activity, partner and threshold filters, then ranking.

use crate::core::network::resolve_networks;
use crate::domain::model::{
    Entry, Match, MatchGroup, Network, PartnerPair, ReportRow, ReportStats,
};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
pub struct FilterPolicy<'a> {
    pub enabled: bool,
    /// `None` when current-quarter tracking is deactivated.
    pub current_students: Option<&'a HashSet<String>>,
    pub partners: &'a [PartnerPair],
    /// Minimum similarity percentage; `<= 0` keeps every match.
    pub threshold: i32,
}

impl<'a> FilterPolicy<'a> {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            current_students: None,
            partners: &[],
            threshold: 0,
        }
    }

    fn is_active(&self, network: &Network) -> bool {
        match self.current_students {
            None => true,
            Some(current) => network.members().iter().any(|s| current.contains(s)),
        }
    }

    fn is_partnership(&self, network: &Network) -> bool {
        self.partners.iter().any(|pair| pair.covers(network))
    }
}

/// How entry links are resolved.
#[derive(Debug, Clone, Copy)]
pub enum LinkStyle<'a> {
    /// Absolute link under the report location.
    Remote { report_url: &'a str },
    /// Relative link into the archived `group<N>` directory.
    Archived,
}

pub fn match_resource_url(report_url: &str, match_number: u32, variant: &str) -> String {
    format!(
        "{}/match{}{}.html",
        report_url.trim_end_matches('/'),
        match_number,
        variant
    )
}

pub fn match_resource_path(group: usize, match_number: u32, variant: &str) -> String {
    format!("group{}/match{}{}.html", group, match_number, variant)
}

/// Orders surviving networks by decreasing importance.
pub fn rank_networks(matches: &[Match], policy: &FilterPolicy<'_>) -> Vec<MatchGroup> {
    if !policy.enabled {
        if matches.is_empty() {
            return Vec::new();
        }
        return vec![MatchGroup {
            matches: matches.to_vec(),
        }];
    }

    let networks = resolve_networks(matches);
    let mut groups: Vec<MatchGroup> = networks
        .iter()
        .filter(|network| policy.is_active(network))
        .filter(|network| !policy.is_partnership(network))
        .filter_map(|network| {
            let mut selected: Vec<Match> = matches
                .iter()
                .filter(|m| network.contains(&m.student1) || network.contains(&m.student2))
                .filter(|m| m.meets_threshold(policy.threshold))
                .cloned()
                .collect();
            if selected.is_empty() {
                return None;
            }
            selected.sort_by(|a, b| b.lines.cmp(&a.lines).then(a.position.cmp(&b.position)));
            Some(MatchGroup { matches: selected })
        })
        .collect();

    groups.sort_by(|a, b| match (a.top_match(), b.top_match()) {
        (Some(x), Some(y)) => y.lines.cmp(&x.lines).then(x.position.cmp(&y.position)),
        _ => std::cmp::Ordering::Equal,
    });

    tracing::debug!(
        "{} of {} networks survived filtering",
        groups.len(),
        networks.len()
    );
    groups
}

pub fn assemble_entries(
    groups: &[MatchGroup],
    partners: &[PartnerPair],
    links: LinkStyle<'_>,
) -> Vec<ReportRow> {
    let mut rows = Vec::new();

    for (group_index, group) in groups.iter().enumerate() {
        if group_index > 0 {
            rows.push(ReportRow::GroupBoundary);
        }
        for m in &group.matches {
            let result_url = match links {
                LinkStyle::Remote { report_url } => match_resource_url(report_url, m.match_number, ""),
                LinkStyle::Archived => match_resource_path(group_index, m.match_number, ""),
            };
            rows.push(ReportRow::Entry(Entry {
                student1: m.student1.clone(),
                student2: m.student2.clone(),
                percent1: m.percent1,
                percent2: m.percent2,
                lines: m.lines,
                result_url,
                partnered: partners.iter().any(|p| p.is_pair(&m.student1, &m.student2)),
            }));
        }
    }

    rows
}

pub fn summarize(original_count: usize, groups: &[MatchGroup]) -> ReportStats {
    let retained: usize = groups.iter().map(|g| g.matches.len()).sum();
    ReportStats::new(original_count, retained)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(position: usize, a: &str, p1: u8, b: &str, p2: u8, lines: u32) -> Match {
        Match {
            position,
            match_number: position as u32,
            result_url: format!("http://moss/results/1/match{}.html", position),
            student1: a.to_string(),
            percent1: p1,
            student2: b.to_string(),
            percent2: p2,
            lines,
        }
    }

    fn policy<'a>(
        current: Option<&'a HashSet<String>>,
        partners: &'a [PartnerPair],
        threshold: i32,
    ) -> FilterPolicy<'a> {
        FilterPolicy {
            enabled: true,
            current_students: current,
            partners,
            threshold,
        }
    }

    fn entries(rows: &[ReportRow]) -> Vec<&Entry> {
        rows.iter().filter_map(ReportRow::as_entry).collect()
    }

    #[test]
    fn test_chain_forms_single_network_ordered_by_lines() {
        let matches = vec![m(0, "s1", 90, "s2", 85, 15), m(1, "s2", 88, "s3", 70, 40)];
        let groups = rank_networks(&matches, &policy(None, &[], -1));
        let rows = assemble_entries(&groups, &[], LinkStyle::Archived);

        assert_eq!(groups.len(), 1);
        let lines: Vec<u32> = entries(&rows).iter().map(|e| e.lines).collect();
        assert_eq!(lines, vec![40, 15]);
        assert!(!rows.contains(&ReportRow::GroupBoundary));
    }

    #[test]
    fn test_partner_only_network_is_dropped() {
        let matches = vec![m(0, "a", 99, "b", 99, 100)];
        let partners = vec![PartnerPair::new("b", "a")];

        let groups = rank_networks(&matches, &policy(None, &partners, -1));
        assert!(groups.is_empty());
        assert_eq!(summarize(matches.len(), &groups).filtered_count, 1);

        let groups = rank_networks(&matches, &policy(None, &[], -1));
        assert_eq!(groups.len(), 1);
    }

    #[test]
    fn test_partner_pair_inside_larger_network_is_kept_and_marked() {
        let matches = vec![m(0, "a", 60, "b", 60, 30), m(1, "b", 50, "c", 50, 20)];
        let partners = vec![PartnerPair::new("a", "b")];

        let groups = rank_networks(&matches, &policy(None, &partners, -1));
        let rows = assemble_entries(&groups, &partners, LinkStyle::Archived);
        let rows = entries(&rows);

        assert_eq!(rows.len(), 2);
        assert!(rows[0].partnered);
        assert!(!rows[1].partnered);
    }

    #[test]
    fn test_activity_filter_requires_current_student() {
        let matches = vec![m(0, "b", 50, "c", 50, 5)];
        let current: HashSet<String> = ["a".to_string()].into_iter().collect();

        assert!(rank_networks(&matches, &policy(Some(&current), &[], -1)).is_empty());
        assert_eq!(rank_networks(&matches, &policy(None, &[], -1)).len(), 1);

        let current: HashSet<String> = ["c".to_string()].into_iter().collect();
        assert_eq!(rank_networks(&matches, &policy(Some(&current), &[], -1)).len(), 1);
    }

    #[test]
    fn test_threshold_compares_percentages() {
        let matches = vec![
            m(0, "a", 30, "b", 20, 200),
            m(1, "b", 10, "c", 55, 5),
            m(2, "x", 40, "y", 40, 90),
        ];
        let groups = rank_networks(&matches, &policy(None, &[], 50));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].matches.len(), 1);
        assert_eq!(groups[0].matches[0].position, 1);
        assert_eq!(summarize(3, &groups).filtered_count, 2);
    }

    #[test]
    fn test_non_positive_threshold_keeps_everything() {
        let matches = vec![m(0, "a", 0, "b", 0, 1)];
        assert_eq!(rank_networks(&matches, &policy(None, &[], 0)).len(), 1);
        assert_eq!(rank_networks(&matches, &policy(None, &[], -1)).len(), 1);
    }

    #[test]
    fn test_networks_ordered_by_decreasing_top_lines() {
        let matches = vec![
            m(0, "a", 50, "b", 50, 10),
            m(1, "c", 50, "d", 50, 80),
            m(2, "e", 50, "f", 50, 30),
            m(3, "a", 50, "g", 50, 5),
        ];
        let groups = rank_networks(&matches, &policy(None, &[], -1));
        let tops: Vec<u32> = groups.iter().map(|g| g.matches[0].lines).collect();
        assert_eq!(tops, vec![80, 30, 10]);

        let rows = assemble_entries(&groups, &[], LinkStyle::Archived);
        assert_eq!(
            rows.iter().filter(|r| **r == ReportRow::GroupBoundary).count(),
            2
        );
        assert_ne!(rows.last(), Some(&ReportRow::GroupBoundary));
    }

    #[test]
    fn test_equal_top_lines_fall_back_to_report_order() {
        let matches = vec![m(0, "c", 50, "d", 50, 10), m(1, "a", 50, "b", 50, 10)];
        let groups = rank_networks(&matches, &policy(None, &[], -1));
        assert_eq!(groups[0].matches[0].position, 0);
        assert_eq!(groups[1].matches[0].position, 1);
    }

    #[test]
    fn test_disabled_filter_keeps_report_order() {
        let matches = vec![
            m(0, "a", 99, "b", 99, 1),
            m(1, "c", 10, "d", 10, 500),
            m(2, "a", 50, "b", 50, 20),
        ];
        let partners = vec![PartnerPair::new("a", "b")];
        let groups = rank_networks(&matches, &FilterPolicy::disabled());
        let rows = assemble_entries(
            &groups,
            &partners,
            LinkStyle::Remote {
                report_url: "http://moss/results/1/",
            },
        );
        let rows = entries(&rows);

        let lines: Vec<u32> = rows.iter().map(|e| e.lines).collect();
        assert_eq!(lines, vec![1, 500, 20]);
        assert_eq!(rows[1].result_url, "http://moss/results/1/match1.html");
        assert!(rows[0].partnered);
        assert_eq!(summarize(3, &groups).filtered_count, 0);
    }

    #[test]
    fn test_archived_links_use_group_index() {
        let matches = vec![m(0, "a", 50, "b", 50, 10), m(7, "c", 50, "d", 50, 80)];
        let groups = rank_networks(&matches, &policy(None, &[], -1));
        let rows = assemble_entries(&groups, &[], LinkStyle::Archived);
        let rows = entries(&rows);

        assert_eq!(rows[0].result_url, "group0/match7.html");
        assert_eq!(rows[1].result_url, "group1/match0.html");
    }

    #[test]
    fn test_zero_matches() {
        let enabled = rank_networks(&[], &policy(None, &[], -1));
        let disabled = rank_networks(&[], &FilterPolicy::disabled());
        assert!(enabled.is_empty());
        assert!(disabled.is_empty());
        assert_eq!(summarize(0, &enabled), ReportStats::default());
    }
}
