//! Conversation Talk/Segment/Option graph (spec §3, §9). Grounded in
//! `original_source/sandrock/structures/conversation.py`'s `ConvTalk`/
//! `ConvSegment`/`_ConvOption` and its `_find_common_elements`/
//! `_find_first_convergence` branch-convergence heuristic (Open Question
//! #5 in DESIGN.md). Stored as id-keyed maps per spec §9 rather than
//! embedding object references, with all traversal carrying an explicit
//! visited set to break back-edges.

use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostics::{self, FindingKey};

/// `_ConvOption.choice_type`: only `4` ("Flirt") is named in the original;
/// everything else passes through untyped (Open Question #3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceKind {
    Flirt,
    Other(i64),
}

impl ChoiceKind {
    pub fn from_raw(raw: i64) -> ChoiceKind {
        match raw {
            4 => ChoiceKind::Flirt,
            other => ChoiceKind::Other(other),
        }
    }
}

/// One choice leading out of a `ConversationSegment`.
#[derive(Debug, Clone)]
pub struct ConversationOption {
    pub id: String,
    pub choice_kind: ChoiceKind,
    /// `None` when the option terminates the conversation rather than
    /// continuing to another talk.
    pub next_talk_id: Option<i64>,
}

/// `ConvSegment`: zero or more options, or a terminal segment with none.
#[derive(Debug, Clone)]
pub struct ConversationSegment {
    pub id: i64,
    pub options: Vec<ConversationOption>,
}

impl ConversationSegment {
    pub fn is_terminal(&self) -> bool {
        self.options.is_empty()
    }
}

/// `ConvTalk`: an ordered list of segment ids, and the talks immediately
/// reachable from it (`next_talk_ids`'s length equals the number of
/// choices, or 1 for a linear continuation).
#[derive(Debug, Clone)]
pub struct ConversationTalk {
    pub id: i64,
    pub segment_ids: Vec<i64>,
    pub next_talk_ids: Vec<i64>,
}

impl ConversationTalk {
    pub fn is_branching(&self) -> bool {
        self.next_talk_ids.len() > 1
    }
}

/// The whole graph for one conversation (`c_id`), id-keyed per spec §9.
#[derive(Debug, Clone, Default)]
pub struct ConversationGraph {
    pub talks: BTreeMap<i64, ConversationTalk>,
    pub segments: BTreeMap<i64, ConversationSegment>,
}

impl ConversationGraph {
    pub fn new() -> ConversationGraph {
        ConversationGraph::default()
    }

    pub fn insert_talk(&mut self, talk: ConversationTalk) {
        self.talks.insert(talk.id, talk);
    }

    pub fn insert_segment(&mut self, segment: ConversationSegment) {
        self.segments.insert(segment.id, segment);
    }

    /// Visits every talk reachable from `start`, cycle-safe via an explicit
    /// visited set (spec §9: "traversal carries a visited set to break
    /// loops").
    pub fn reachable_talks(&self, start: i64) -> BTreeSet<i64> {
        let mut visited = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(talk_id) = stack.pop() {
            if !visited.insert(talk_id) {
                continue;
            }
            if let Some(talk) = self.talks.get(&talk_id) {
                stack.extend(talk.next_talk_ids.iter().copied());
            }
        }
        visited
    }

    /// Builds the full downstream talk-id path for each of a branching
    /// talk's options, stopping each path the first time it revisits a
    /// talk already on its own path (cycle guard), for convergence search.
    fn branch_paths(&self, branch_talk_ids: &[i64]) -> Vec<Vec<i64>> {
        branch_talk_ids
            .iter()
            .map(|&start| {
                let mut path = Vec::new();
                let mut seen = BTreeSet::new();
                let mut current = Some(start);
                while let Some(id) = current {
                    if !seen.insert(id) {
                        break;
                    }
                    path.push(id);
                    current = self.talks.get(&id).and_then(|t| t.next_talk_ids.first().copied());
                }
                path
            })
            .collect()
    }

    /// `_find_first_convergence`: given the talk ids a choice's options
    /// lead into, finds the first talk id common to every branch's
    /// downstream path — the point where divergent dialogue options
    /// rejoin a shared continuation. Returns `None` (and records a
    /// diagnostic) when the branches never reconverge, matching spec §9's
    /// "edge cases where branches never reconverge are flagged but not
    /// perfectly handled".
    pub fn find_convergence(&self, branch_talk_ids: &[i64]) -> Option<i64> {
        if branch_talk_ids.len() < 2 {
            return branch_talk_ids.first().copied();
        }

        let paths = self.branch_paths(branch_talk_ids);
        let Some(first_path) = paths.first() else { return None };

        let convergence = first_path.iter().find(|candidate| paths.iter().all(|path| path.contains(candidate)));

        if convergence.is_none() {
            diagnostics::warn(FindingKey::AmbiguousConversationConvergence)
                .msg(format!("branches {branch_talk_ids:?} never reconverge"))
                .push();
        }

        convergence.copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn talk(id: i64, next: &[i64]) -> ConversationTalk {
        ConversationTalk { id, segment_ids: vec![], next_talk_ids: next.to_vec() }
    }

    #[test]
    fn reachable_talks_stops_at_cycles() {
        let mut graph = ConversationGraph::new();
        graph.insert_talk(talk(1, &[2]));
        graph.insert_talk(talk(2, &[1]));
        let reachable = graph.reachable_talks(1);
        assert_eq!(reachable, BTreeSet::from([1, 2]));
    }

    #[test]
    fn finds_first_common_convergence_point() {
        let mut graph = ConversationGraph::new();
        graph.insert_talk(talk(10, &[30]));
        graph.insert_talk(talk(20, &[30]));
        graph.insert_talk(talk(30, &[]));
        assert_eq!(graph.find_convergence(&[10, 20]), Some(30));
    }

    #[test]
    fn branches_that_never_reconverge_return_none() {
        let mut graph = ConversationGraph::new();
        graph.insert_talk(talk(10, &[11]));
        graph.insert_talk(talk(11, &[]));
        graph.insert_talk(talk(20, &[21]));
        graph.insert_talk(talk(21, &[]));
        assert_eq!(graph.find_convergence(&[10, 20]), None);
    }

    #[test]
    fn choice_kind_only_names_flirt() {
        assert_eq!(ChoiceKind::from_raw(4), ChoiceKind::Flirt);
        assert_eq!(ChoiceKind::from_raw(0), ChoiceKind::Other(0));
    }
}
