use std::fmt;

use tracing::{debug, error};

use crate::error::{MiningError, Result};
use crate::lattice::{Combinations, ItemsetCount};
use crate::metrics::MetricCalculator;
use crate::transaction::Itemset;

// ------------- Rule -------------
/// A directed rule `antecedent -> consequent` with disjoint sides.
/// Lift and conviction are absent until some stage computes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    pub support: f64,
    pub confidence: f64,
    pub lift: Option<f64>,
    pub conviction: Option<f64>,
}
impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.antecedent, self.consequent)
    }
}

/// Every split of an itemset into a non-empty antecedent and consequent, consequents
/// enumerated by size and then lexicographically by position.
pub fn partitions(itemset: &Itemset) -> impl Iterator<Item = (Itemset, Itemset)> + '_ {
    let n = itemset.len();
    (1..n).flat_map(move |k| {
        Combinations::new(n, k).map(move |picked| (itemset.without(&picked), itemset.pick(&picked)))
    })
}

// ------------- RuleGenerator -------------
pub struct RuleGenerator {
    counts: ItemsetCount,
    order: Vec<Itemset>, // canonical: size, then labels
    calculator: MetricCalculator,
    confidence_threshold: f64,
}
impl RuleGenerator {
    pub fn new<I>(frequent: I, transaction_count: u64, confidence_threshold: f64) -> Self
    where
        I: IntoIterator<Item = (Itemset, u64)>,
    {
        let counts: ItemsetCount = frequent.into_iter().collect();
        let mut order: Vec<Itemset> = counts.keys().cloned().collect();
        order.sort_unstable();
        Self {
            counts,
            order,
            calculator: MetricCalculator::new(transaction_count),
            confidence_threshold,
        }
    }
    pub fn count(&self, itemset: &Itemset) -> Result<u64> {
        self.counts.get(itemset).copied().ok_or_else(|| {
            MiningError::Invariant(format!("no count recorded for subset {}", itemset))
        })
    }
    /// Rules at or above the confidence threshold, carrying support and confidence only.
    pub fn derive(&self) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();
        for itemset in self.order.iter().filter(|i| i.len() >= 2) {
            let joint = self.count(itemset)?;
            // a zero-count itemset cannot reach a positive confidence
            if joint == 0 {
                continue;
            }
            for (antecedent, consequent) in partitions(itemset) {
                let confidence = self
                    .calculator
                    .confidence(joint, self.count(&antecedent)?)
                    .inspect_err(|e| error!(%itemset, %e, "frequent itemset with unsupported antecedent"))?;
                if confidence >= self.confidence_threshold {
                    rules.push(Rule {
                        antecedent,
                        consequent,
                        support: self.calculator.support(joint)?,
                        confidence,
                        lift: None,
                        conviction: None,
                    });
                }
            }
        }
        debug!(itemsets = self.order.len(), rules = rules.len(), "derived rules");
        Ok(rules)
    }
    /// Same rules as `derive`, with lift and conviction filled in.
    pub fn generate(&self) -> Result<Vec<Rule>> {
        let mut rules = self.derive()?;
        for rule in rules.iter_mut() {
            let joint = self.count(&rule.antecedent.union(&rule.consequent))?;
            let metrics = self.calculator.evaluate(
                joint,
                self.count(&rule.antecedent)?,
                self.count(&rule.consequent)?,
            )?;
            rule.lift = Some(metrics.lift);
            rule.conviction = Some(metrics.conviction);
        }
        Ok(rules)
    }
}
