use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::apriori::Level;
use crate::error::{MiningError, Result};
use crate::fpgrowth::Pattern;
use crate::lattice::ItemsetCount;
use crate::metrics::MetricCalculator;
use crate::rules::Rule;
use crate::transaction::Itemset;

// ------------- Raw outputs -------------
/// What the level-wise miner hands over: sorted levels and fully measured rules.
#[derive(Debug, Clone)]
pub struct LatticeRaw {
    pub levels: Vec<Level>,
    pub rules: Vec<Rule>,
    pub transaction_count: u64,
}

/// What the tree miner hands over: unsorted patterns and rules without lift or conviction.
#[derive(Debug, Clone)]
pub struct TreePatternRaw {
    pub patterns: Vec<Pattern>,
    pub rules: Vec<Rule>,
    pub transaction_count: u64,
}

#[derive(Debug, Clone)]
pub enum RawOutput {
    Lattice(LatticeRaw),
    TreePattern(TreePatternRaw),
}

// ------------- Canonical result -------------
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleRecord {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub confidence: f64,
    pub support: f64,
    pub lift: f64,
    pub conviction: f64,
    #[serde(rename = "displayLabel")]
    pub display_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MiningResult {
    pub itemsets: BTreeMap<String, u64>, // keyed by sorted, comma-joined labels
    pub rules: Vec<RuleRecord>,
}
impl MiningResult {
    pub fn itemset(&self, label: &str) -> Option<u64> {
        self.itemsets.get(label).copied()
    }
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

fn display_label(rule: &Rule, lift: f64, conviction: f64) -> String {
    format!(
        "{} (conf: {:.3}, supp: {:.3}, lift: {:.3}, conv: {:.3})",
        rule, rule.confidence, rule.support, lift, conviction
    )
}

/// Brings either miner's raw output into the canonical shape, computing lift and
/// conviction from the miner's own counts wherever it did not provide them.
pub fn normalize(raw: RawOutput) -> Result<MiningResult> {
    let (counts, rules, transaction_count): (ItemsetCount, Vec<Rule>, u64) = match raw {
        RawOutput::Lattice(raw) => (
            raw.levels.into_iter().flatten().collect(),
            raw.rules,
            raw.transaction_count,
        ),
        RawOutput::TreePattern(raw) => (
            raw.patterns
                .into_iter()
                .map(|(labels, count)| (Itemset::new(labels), count))
                .collect(),
            raw.rules,
            raw.transaction_count,
        ),
    };
    let calculator = MetricCalculator::new(transaction_count);
    let count = |itemset: &Itemset| {
        counts.get(itemset).copied().ok_or_else(|| {
            MiningError::Invariant(format!("rule refers to uncounted itemset {}", itemset))
        })
    };

    let mut records = Vec::with_capacity(rules.len());
    for rule in rules {
        let (lift, conviction) = match (rule.lift, rule.conviction) {
            (Some(lift), Some(conviction)) => (lift, conviction),
            _ => {
                trace!(%rule, "backfilling metrics");
                let metrics = calculator.evaluate(
                    count(&rule.antecedent.union(&rule.consequent))?,
                    count(&rule.antecedent)?,
                    count(&rule.consequent)?,
                )?;
                (metrics.lift, metrics.conviction)
            }
        };
        records.push(RuleRecord {
            antecedent: rule.antecedent.items().to_vec(),
            consequent: rule.consequent.items().to_vec(),
            confidence: rule.confidence,
            support: rule.support,
            lift,
            conviction,
            display_label: display_label(&rule, lift, conviction),
        });
    }
    let itemsets = counts
        .iter()
        .map(|(itemset, count)| (itemset.label(), *count))
        .collect();
    Ok(MiningResult {
        itemsets,
        rules: records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(antecedent: &[&str], consequent: &[&str], support: f64, confidence: f64) -> Rule {
        Rule {
            antecedent: Itemset::new(antecedent.iter().copied()),
            consequent: Itemset::new(consequent.iter().copied()),
            support,
            confidence,
            lift: None,
            conviction: None,
        }
    }

    fn strings(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn tree_patterns_are_canonicalized_and_backfilled() {
        let raw = RawOutput::TreePattern(TreePatternRaw {
            patterns: vec![
                (strings(&["Milk"]), 6),
                (strings(&["Milk", "Butter"]), 4),
                (strings(&["Milk", "Butter", "Bread"]), 4),
                (strings(&["Butter"]), 5),
                (strings(&["Bread", "Milk"]), 5),
                (strings(&["Bread", "Butter"]), 5),
                (strings(&["Bread"]), 6),
            ],
            rules: vec![rule(&["Butter"], &["Milk", "Bread"], 0.4, 0.8)],
            transaction_count: 10,
        });
        let result = normalize(raw).unwrap();
        assert_eq!(result.itemset("Bread,Butter,Milk"), Some(4));
        assert_eq!(result.itemset("Butter,Milk"), Some(4));
        assert_eq!(result.itemset("Milk,Butter"), None);
        let record = &result.rules[0];
        assert_eq!(record.consequent, strings(&["Bread", "Milk"]));
        assert!((record.lift - 1.6).abs() < 1e-9);
        assert!((record.conviction - 2.5).abs() < 1e-9);
        assert_eq!(
            record.display_label,
            "{Butter} -> {Bread, Milk} (conf: 0.800, supp: 0.400, lift: 1.600, conv: 2.500)"
        );
    }

    #[test]
    fn lattice_metrics_are_kept() {
        let mut measured = rule(&["a"], &["b"], 0.5, 1.0);
        measured.lift = Some(2.0);
        measured.conviction = Some(1.0);
        let raw = RawOutput::Lattice(LatticeRaw {
            levels: vec![
                vec![(Itemset::new(["a"]), 1), (Itemset::new(["b"]), 1)],
                vec![(Itemset::new(["a", "b"]), 1)],
            ],
            rules: vec![measured],
            transaction_count: 2,
        });
        let result = normalize(raw).unwrap();
        assert_eq!(result.rules[0].lift, 2.0);
        assert_eq!(result.itemsets.keys().collect::<Vec<_>>(), vec!["a", "a,b", "b"]);
    }

    #[test]
    fn serializes_with_display_label_key() {
        let raw = RawOutput::Lattice(LatticeRaw {
            levels: vec![vec![(Itemset::new(["a"]), 2)]],
            rules: Vec::new(),
            transaction_count: 2,
        });
        let json = normalize(raw).unwrap().to_json().unwrap();
        assert_eq!(json, serde_json::json!({"itemsets": {"a": 2}, "rules": []}));

        let record = RuleRecord {
            antecedent: strings(&["a"]),
            consequent: strings(&["b"]),
            confidence: 1.0,
            support: 0.5,
            lift: 1.0,
            conviction: 1.0,
            display_label: "x".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["displayLabel"], "x");
        assert!(json.get("display_label").is_none());
    }

    #[test]
    fn uncounted_rule_itemset_is_an_invariant_violation() {
        let raw = RawOutput::TreePattern(TreePatternRaw {
            patterns: vec![(strings(&["a"]), 1)],
            rules: vec![rule(&["a"], &["b"], 0.5, 1.0)],
            transaction_count: 2,
        });
        assert!(matches!(normalize(raw), Err(MiningError::Invariant(_))));
    }
}
