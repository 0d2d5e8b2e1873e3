use std::time::Instant;

use tracing::info;

use crate::apriori::FrequentItemsetMiner;
use crate::error::Result;
use crate::fpgrowth::FpGrowth;
use crate::interface::Guard;
use crate::normalize::{normalize, LatticeRaw, MiningResult, RawOutput, TreePatternRaw};
use crate::rules::RuleGenerator;
use crate::settings::{check_threshold, Algorithm, MinerConfig};
use crate::transaction::{Itemset, TransactionSet};

/// Runs one search strategy, derives rules and normalizes the outcome.
/// Holds no state between calls, so one miner may serve any number of corpora.
#[derive(Debug, Clone)]
pub struct Miner {
    config: MinerConfig,
    guard: Guard,
}
impl Miner {
    pub fn new(config: MinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            guard: Guard::default(),
        })
    }
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }
    /// The strategy's own output, before normalization.
    pub fn mine_raw(&self, transactions: &TransactionSet) -> Result<RawOutput> {
        let transaction_count = transactions.len() as u64;
        let min_count = transactions.min_count(self.config.support_threshold);
        let confidence = self.config.confidence_threshold;
        match self.config.algorithm {
            Algorithm::Apriori => {
                let levels = FrequentItemsetMiner::new(transactions, min_count)
                    .with_max_length(self.config.max_length)
                    .with_guard(self.guard.clone())
                    .mine()?;
                let rules = RuleGenerator::new(levels.iter().flatten().cloned(), transaction_count, confidence)
                    .generate()?;
                Ok(RawOutput::Lattice(LatticeRaw {
                    levels,
                    rules,
                    transaction_count,
                }))
            }
            Algorithm::FpGrowth => {
                let patterns = FpGrowth::new(transactions, min_count)
                    .with_max_length(self.config.max_length)
                    .with_guard(self.guard.clone())
                    .mine()?;
                let counted = patterns
                    .iter()
                    .map(|(labels, count)| (Itemset::new(labels.iter().cloned()), *count));
                let rules = RuleGenerator::new(counted, transaction_count, confidence).derive()?;
                Ok(RawOutput::TreePattern(TreePatternRaw {
                    patterns,
                    rules,
                    transaction_count,
                }))
            }
        }
    }
    pub fn mine(&self, transactions: &TransactionSet) -> Result<MiningResult> {
        let started = Instant::now();
        let result = normalize(self.mine_raw(transactions)?)?;
        info!(
            algorithm = %self.config.algorithm,
            transactions = transactions.len(),
            itemsets = result.itemsets.len(),
            rules = result.rules.len(),
            ms = started.elapsed().as_secs_f64() * 1000.0,
            "mining complete"
        );
        Ok(result)
    }
}

/// Mines frequent itemsets and rules with the level-wise strategy.
///
/// Both thresholds are fractions in (0, 1]. The support threshold is turned into an
/// absolute transaction count by rounding `support_threshold × N` up.
pub fn mine<T, I, S>(
    transactions: T,
    support_threshold: f64,
    confidence_threshold: f64,
) -> Result<MiningResult>
where
    T: IntoIterator<Item = I>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    check_threshold("support_threshold", support_threshold)?;
    check_threshold("confidence_threshold", confidence_threshold)?;
    let transactions = TransactionSet::new(transactions)?;
    Miner::new(MinerConfig::new(support_threshold, confidence_threshold))?.mine(&transactions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MiningError;
    use crate::interface::CancelToken;

    #[test]
    fn thresholds_are_checked_before_transactions() {
        let err = mine(vec![vec![""]], 0.0, 0.5).unwrap_err();
        assert!(matches!(err, MiningError::InvalidThreshold { name: "support_threshold", .. }));
        let err = mine(vec![vec![""]], 0.5, 0.5).unwrap_err();
        assert!(matches!(err, MiningError::InvalidTransaction { index: 0, .. }));
    }

    #[test]
    fn empty_input_is_empty_result() {
        let result = mine(Vec::<Vec<String>>::new(), 0.5, 0.5).unwrap();
        assert_eq!(result, MiningResult::default());
    }

    #[test]
    fn raw_outputs_differ_by_strategy() {
        let set = TransactionSet::new(vec![vec!["a", "b"], vec!["a", "b"], vec!["a"]]).unwrap();
        let lattice = Miner::new(MinerConfig::new(0.5, 0.5)).unwrap().mine_raw(&set).unwrap();
        let tree = Miner::new(MinerConfig::new(0.5, 0.5).with_algorithm(Algorithm::FpGrowth))
            .unwrap()
            .mine_raw(&set)
            .unwrap();
        match (lattice, tree) {
            (RawOutput::Lattice(l), RawOutput::TreePattern(t)) => {
                assert!(l.rules.iter().all(|r| r.lift.is_some() && r.conviction.is_some()));
                assert!(t.rules.iter().all(|r| r.lift.is_none() && r.conviction.is_none()));
                assert_eq!(l.rules.len(), t.rules.len());
            }
            _ => panic!("unexpected raw output variants"),
        }
    }

    #[test]
    fn cancelled_guard_aborts() {
        let set = TransactionSet::new(vec![vec!["a", "b"]]).unwrap();
        let token = CancelToken::new();
        token.cancel();
        for algorithm in [Algorithm::Apriori, Algorithm::FpGrowth] {
            let miner = Miner::new(MinerConfig::new(0.5, 0.5).with_algorithm(algorithm))
                .unwrap()
                .with_guard(Guard::default().with_cancel(token.clone()));
            assert_eq!(miner.mine(&set), Err(MiningError::Cancelled));
        }
    }
}
