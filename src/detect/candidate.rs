//! Record candidate ranking
//!
//! Pure bookkeeping, no I/O: the scanner feeds a [`CandidateScan`] with what
//! it sees directly under one element, then asks it to [`judge`] whether a
//! repeating child (or a deeper candidate) dominates enough to be the record.
//!
//! [`judge`]: CandidateScan::judge

use crate::types::DetectConfig;
use indexmap::IndexMap;

/// A repeating element path and how often it repeated under one parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: Vec<String>,
    pub count: usize,
}

impl Candidate {
    pub fn new(path: Vec<String>, count: usize) -> Self {
        Candidate { path, count }
    }
}

/// Outcome of judging one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Found(Candidate),
    NotFound,
}

impl Detection {
    pub fn into_candidate(self) -> Option<Candidate> {
        match self {
            Detection::Found(candidate) => Some(candidate),
            Detection::NotFound => None,
        }
    }
}

/// Sort by count, most frequent first. Equal counts keep their order.
pub fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.count.cmp(&a.count));
}

/// Tallies for the direct content of one element
#[derive(Debug, Default)]
pub struct CandidateScan {
    text_nodes: usize,
    child_elements: usize,
    child_counts: IndexMap<String, usize>,
    descendants: Vec<Candidate>,
}

impl CandidateScan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a character event; whitespace-only text doesn't count
    pub fn record_text(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.text_nodes += 1;
        }
    }

    pub fn record_child(&mut self, local_name: &str) {
        self.child_elements += 1;
        *self.child_counts.entry(local_name.to_string()).or_insert(0) += 1;
    }

    /// Keep a candidate found somewhere below a child
    pub fn add_descendant(&mut self, candidate: Candidate) {
        self.descendants.push(candidate);
    }

    pub fn is_mixed(&self) -> bool {
        self.text_nodes > 0 && self.child_elements > 0
    }

    /// Decide whether this element (at `path`) holds a dominant record candidate.
    ///
    /// Mixed content never qualifies. Otherwise, if a handful of child tags
    /// repeat, the most frequent wins outright when its count divided by the
    /// number of repeating tags exceeds the dominance ratio; a non-dominant
    /// winner joins the descendant pool, whose best member must in turn beat
    /// the ratio against the pool size.
    pub fn judge(mut self, path: &[String], config: &DetectConfig) -> Detection {
        if self.is_mixed() {
            return Detection::NotFound;
        }

        let mut immediate: Vec<Candidate> = self
            .child_counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(name, count)| {
                let mut child_path = path.to_vec();
                child_path.push(name.clone());
                Candidate::new(child_path, *count)
            })
            .collect();

        if !immediate.is_empty() && immediate.len() < config.max_distinct_tags {
            rank_candidates(&mut immediate);
            let distinct = immediate.len();
            let top = immediate.swap_remove(0);
            if top.count / distinct > config.dominance_ratio {
                return Detection::Found(top);
            }
            self.descendants.push(top);
        }

        if !self.descendants.is_empty() {
            rank_candidates(&mut self.descendants);
            let pool = self.descendants.len();
            let top = self.descendants.swap_remove(0);
            if top.count / pool > config.dominance_ratio {
                return Detection::Found(top);
            }
        }

        Detection::NotFound
    }
}
