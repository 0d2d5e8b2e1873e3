use std::collections::HashSet;

use tracing::debug;

use crate::error::Result;
use crate::interface::Guard;
use crate::lattice::CandidateLattice;
use crate::transaction::{ItemHasher, Itemset, TransactionSet};

/// Frequent itemsets of one size with their counts, in canonical order.
pub type Level = Vec<(Itemset, u64)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Seeded,
    Counting(usize),
    Done,
}

/// Level-wise search: count, filter, join, until a join yields nothing.
pub struct FrequentItemsetMiner<'t> {
    lattice: CandidateLattice<'t>,
    support_threshold: u64, // absolute transaction count
    max_length: Option<usize>,
    guard: Guard,
    state: LevelState,
}
impl<'t> FrequentItemsetMiner<'t> {
    pub fn new(transactions: &'t TransactionSet, support_threshold: u64) -> Self {
        Self {
            lattice: CandidateLattice::new(transactions),
            support_threshold,
            max_length: None,
            guard: Guard::default(),
            state: LevelState::Seeded,
        }
    }
    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }
    pub fn state(&self) -> LevelState {
        self.state
    }
    pub fn mine(&mut self) -> Result<Vec<Level>> {
        let mut levels: Vec<Level> = Vec::new();
        let mut candidates = self.lattice.seed();
        self.state = LevelState::Seeded;
        let mut depth = 1;
        while !candidates.is_empty() {
            self.guard.check()?;
            self.state = LevelState::Counting(depth);
            let mut frequent: Level = self
                .lattice
                .count_support(&candidates)
                .into_iter()
                .filter(|(_, count)| *count >= self.support_threshold)
                .collect();
            frequent.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            debug!(
                level = depth,
                candidates = candidates.len(),
                frequent = frequent.len(),
                "counted level"
            );
            if frequent.is_empty() {
                break;
            }
            let itemsets: Vec<Itemset> = frequent.iter().map(|(i, _)| i.clone()).collect();
            levels.push(frequent);
            if self.max_length.is_some_and(|max| depth >= max) {
                break;
            }
            let known: HashSet<Itemset, ItemHasher> = itemsets.iter().cloned().collect();
            candidates = CandidateLattice::prune(CandidateLattice::next_level(&itemsets), &known);
            depth += 1;
        }
        self.state = LevelState::Done;
        Ok(levels)
    }
}
