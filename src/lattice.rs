use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::transaction::{ItemHasher, Itemset, TransactionSet};

pub type ItemsetCount = HashMap<Itemset, u64, ItemHasher>;

// ------------- Combinations -------------
/// Ascending position combinations of `k` out of `n`, in lexicographic order.
#[derive(Debug)]
pub struct Combinations {
    n: usize,
    positions: Vec<usize>,
    done: bool,
}
impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            positions: (0..k).collect(),
            done: k > n,
        }
    }
}
impl Iterator for Combinations {
    type Item = Vec<usize>;
    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let current = self.positions.clone();
        let k = self.positions.len();
        // advance the rightmost position that still has room
        let mut i = k;
        loop {
            if i == 0 {
                self.done = true;
                break;
            }
            i -= 1;
            if self.positions[i] < self.n - k + i {
                self.positions[i] += 1;
                for j in i + 1..k {
                    self.positions[j] = self.positions[j - 1] + 1;
                }
                break;
            }
        }
        Some(current)
    }
}

// ------------- CandidateLattice -------------
/// Generates itemset candidates level by level and counts them against a corpus.
#[derive(Debug, Clone, Copy)]
pub struct CandidateLattice<'t> {
    transactions: &'t TransactionSet,
}
impl<'t> CandidateLattice<'t> {
    pub fn new(transactions: &'t TransactionSet) -> Self {
        Self { transactions }
    }
    /// One singleton per distinct item in the corpus, in label order.
    pub fn seed(&self) -> Vec<Itemset> {
        self.transactions
            .items()
            .into_iter()
            .map(Itemset::singleton)
            .collect()
    }
    /// Joins every unordered pair of the current level whose union grows by exactly one item.
    pub fn next_level(frequent: &[Itemset]) -> Vec<Itemset> {
        let mut seen: HashSet<Itemset, ItemHasher> = HashSet::default();
        let mut candidates = Vec::new();
        for (x, a) in frequent.iter().enumerate() {
            for b in &frequent[x + 1..] {
                let union = a.union(b);
                if union.len() == a.len() + 1 && seen.insert(union.clone()) {
                    candidates.push(union);
                }
            }
        }
        trace!(parents = frequent.len(), candidates = candidates.len(), "joined level");
        candidates
    }
    /// Drops candidates with a (k-1)-subset missing from the frequent level below.
    pub fn prune(candidates: Vec<Itemset>, frequent: &HashSet<Itemset, ItemHasher>) -> Vec<Itemset> {
        candidates
            .into_iter()
            .filter(|candidate| {
                candidate.len() < 2
                    || Combinations::new(candidate.len(), 1)
                        .all(|dropped| frequent.contains(&candidate.without(&dropped)))
            })
            .collect()
    }
    pub fn count_support(&self, candidates: &[Itemset]) -> ItemsetCount {
        let mut counts = ItemsetCount::default();
        for candidate in candidates {
            counts.insert(candidate.clone(), self.transactions.support_count(candidate));
        }
        counts
    }
}
