use crate::domain::model::{Match, Network};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Undirected graph of students, one edge per reported match.
#[derive(Debug, Clone, Default)]
pub struct StudentGraph {
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl StudentGraph {
    pub fn from_matches(matches: &[Match]) -> Self {
        let mut graph = Self::default();
        for m in matches {
            graph.add_edge(&m.student1, &m.student2);
        }
        graph
    }

    pub fn add_edge(&mut self, a: &str, b: &str) {
        self.adjacency
            .entry(a.to_string())
            .or_default()
            .insert(b.to_string());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string());
    }

    pub fn neighbors(&self, student: &str) -> Option<&BTreeSet<String>> {
        self.adjacency.get(student)
    }

    pub fn students(&self) -> impl Iterator<Item = &String> {
        self.adjacency.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Breadth-first reachable set, including `start` itself.
    pub fn reachable(&self, start: &str) -> BTreeSet<String> {
        let mut reached = BTreeSet::new();
        let mut queue = VecDeque::from([start.to_string()]);

        while let Some(student) = queue.pop_front() {
            if !reached.insert(student.clone()) {
                continue;
            }
            if let Some(next) = self.neighbors(&student) {
                queue.extend(next.iter().filter(|n| !reached.contains(*n)).cloned());
            }
        }

        reached
    }

    /// Connected components, ordered by their smallest member.
    pub fn networks(&self) -> Vec<Network> {
        let mut assigned: BTreeSet<&str> = BTreeSet::new();
        let mut networks = Vec::new();

        for student in self.students() {
            // 已歸屬的學生其可達集合必然相同
            if assigned.contains(student.as_str()) {
                continue;
            }
            let members = self.reachable(student);
            for member in &members {
                if let Some((key, _)) = self.adjacency.get_key_value(member) {
                    assigned.insert(key.as_str());
                }
            }
            networks.push(Network::new(members));
        }

        networks
    }
}

pub fn resolve_networks(matches: &[Match]) -> Vec<Network> {
    let networks = StudentGraph::from_matches(matches).networks();
    tracing::debug!("Resolved {} networks from {} matches", networks.len(), matches.len());
    networks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn m(position: usize, a: &str, b: &str) -> Match {
        Match {
            position,
            match_number: position as u32,
            result_url: format!("http://moss/results/1/match{}.html", position),
            student1: a.to_string(),
            percent1: 50,
            student2: b.to_string(),
            percent2: 50,
            lines: 10,
        }
    }

    #[test]
    fn test_graph_is_symmetric() {
        let graph = StudentGraph::from_matches(&[m(0, "a", "b")]);
        assert!(graph.neighbors("a").unwrap().contains("b"));
        assert!(graph.neighbors("b").unwrap().contains("a"));
    }

    #[test]
    fn test_transitive_chain_forms_one_network() {
        let matches = vec![m(0, "s1", "s2"), m(1, "s2", "s3"), m(2, "s3", "s4")];
        let networks = resolve_networks(&matches);

        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].len(), 4);
        assert!(networks[0].contains("s1"));
        assert!(networks[0].contains("s4"));
    }

    #[test]
    fn test_networks_partition_all_students() {
        let matches = vec![
            m(0, "a", "b"),
            m(1, "c", "d"),
            m(2, "e", "a"),
            m(3, "f", "g"),
            m(4, "d", "h"),
            m(5, "b", "e"),
        ];
        let networks = resolve_networks(&matches);

        let mut seen = HashSet::new();
        for network in &networks {
            for member in network.members() {
                assert!(seen.insert(member.clone()), "{} appears in two networks", member);
            }
        }

        let all: HashSet<String> = matches
            .iter()
            .flat_map(|m| [m.student1.clone(), m.student2.clone()])
            .collect();
        assert_eq!(seen, all);
        assert_eq!(networks.len(), 3);
    }

    #[test]
    fn test_networks_ordered_by_smallest_member() {
        let networks = resolve_networks(&[m(0, "z", "y"), m(1, "b", "c")]);
        assert!(networks[0].contains("b"));
        assert!(networks[1].contains("y"));
    }

    #[test]
    fn test_no_matches_no_networks() {
        let graph = StudentGraph::from_matches(&[]);
        assert!(graph.is_empty());
        assert!(graph.networks().is_empty());
    }
}
