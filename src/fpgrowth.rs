use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::Result;
use crate::interface::Guard;
use crate::transaction::{ItemHasher, TransactionSet};

/// A pattern as the tree discovers it: labels in suffix order, not sorted.
pub type Pattern = (Vec<String>, u64);

// Items inside the tree are ranks: 0 is the most frequent item of the corpus.
type Rank = usize;

const ROOT: usize = 0;

#[derive(Debug)]
struct Node {
    rank: Rank,
    count: u64,
    parent: Option<usize>,
    children: HashMap<Rank, usize, ItemHasher>,
}
impl Node {
    fn new(rank: Rank, parent: Option<usize>) -> Self {
        Self {
            rank,
            count: 0,
            parent,
            children: HashMap::default(),
        }
    }
}

// ------------- FpTree -------------
#[derive(Debug)]
struct FpTree {
    nodes: Vec<Node>,
    header: Vec<Vec<usize>>, // rank -> nodes carrying it
    counts: Vec<u64>,        // rank -> summed count in this tree
}
impl FpTree {
    /// Builds a tree from weighted rank paths, each sorted by ascending rank.
    fn build(paths: &[(Vec<Rank>, u64)], ranks: usize, min_count: u64) -> Self {
        let mut totals = vec![0u64; ranks];
        for (path, weight) in paths {
            for &rank in path {
                totals[rank] += weight;
            }
        }
        let mut tree = FpTree {
            nodes: vec![Node::new(Rank::MAX, None)],
            header: vec![Vec::new(); ranks],
            counts: vec![0u64; ranks],
        };
        for (path, weight) in paths {
            let mut at = ROOT;
            for &rank in path.iter().filter(|&&r| totals[r] >= min_count) {
                at = tree.child(at, rank);
                tree.nodes[at].count += weight;
                tree.counts[rank] += weight;
            }
        }
        tree
    }
    fn child(&mut self, parent: usize, rank: Rank) -> usize {
        if let Some(&existing) = self.nodes[parent].children.get(&rank) {
            return existing;
        }
        let index = self.nodes.len();
        self.nodes.push(Node::new(rank, Some(parent)));
        self.nodes[parent].children.insert(rank, index);
        self.header[rank].push(index);
        index
    }
    /// Prefix paths leading to every node of `rank`, weighted by that node's count.
    fn conditional_paths(&self, rank: Rank) -> Vec<(Vec<Rank>, u64)> {
        let mut paths = Vec::with_capacity(self.header[rank].len());
        for &node in &self.header[rank] {
            let mut path = Vec::new();
            let mut at = self.nodes[node].parent;
            while let Some(index) = at {
                if index == ROOT {
                    break;
                }
                path.push(self.nodes[index].rank);
                at = self.nodes[index].parent;
            }
            path.reverse();
            paths.push((path, self.nodes[node].count));
        }
        paths
    }
}

// ------------- FpGrowth -------------
/// Pattern-growth miner over a frequent-pattern tree.
pub struct FpGrowth<'t> {
    transactions: &'t TransactionSet,
    min_count: u64,
    max_length: Option<usize>,
    guard: Guard,
}
impl<'t> FpGrowth<'t> {
    pub fn new(transactions: &'t TransactionSet, min_count: u64) -> Self {
        Self {
            transactions,
            min_count,
            max_length: None,
            guard: Guard::default(),
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
    pub fn mine(&self) -> Result<Vec<Pattern>> {
        // rank items by descending count, ties by label
        let mut ranked: Vec<(&str, u64)> = self
            .transactions
            .items()
            .into_iter()
            .map(|item| (item, self.transactions.tids(item).map_or(0, |t| t.len())))
            .filter(|&(_, count)| count > 0 && count >= self.min_count)
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let names: Vec<String> = ranked.iter().map(|(item, _)| item.to_string()).collect();
        let rank_of: HashMap<&str, Rank, ItemHasher> =
            ranked.iter().enumerate().map(|(rank, (item, _))| (*item, rank)).collect();

        let paths: Vec<(Vec<Rank>, u64)> = self
            .transactions
            .transactions()
            .iter()
            .map(|t| {
                let mut path: Vec<Rank> = t
                    .labels()
                    .iter()
                    .filter_map(|l| rank_of.get(l.as_str()).copied())
                    .collect();
                path.sort_unstable();
                (path, 1)
            })
            .filter(|(path, _)| !path.is_empty())
            .collect();
        let tree = FpTree::build(&paths, names.len(), self.min_count);
        debug!(items = names.len(), nodes = tree.nodes.len(), "built pattern tree");

        let mut patterns = Vec::new();
        self.grow(&tree, &mut Vec::new(), &names, &mut patterns)?;
        Ok(patterns)
    }
    fn grow(
        &self,
        tree: &FpTree,
        suffix: &mut Vec<Rank>,
        names: &[String],
        patterns: &mut Vec<Pattern>,
    ) -> Result<()> {
        // least frequent first, as in a bottom-up header walk
        for rank in (0..names.len()).rev() {
            if tree.header[rank].is_empty() || tree.counts[rank] < self.min_count {
                continue;
            }
            self.guard.check()?;
            suffix.push(rank);
            patterns.push((
                suffix.iter().map(|&r| names[r].clone()).collect(),
                tree.counts[rank],
            ));
            if self.max_length.is_none_or(|max| suffix.len() < max) {
                let conditional = FpTree::build(&tree.conditional_paths(rank), names.len(), self.min_count);
                if conditional.nodes.len() > 1 {
                    trace!(suffix = ?suffix, nodes = conditional.nodes.len(), "conditional tree");
                    self.grow(&conditional, suffix, names, patterns)?;
                }
            }
            suffix.pop();
        }
        Ok(())
    }
}
