use serde::Serialize;

use crate::error::{MiningError, Result};

/// Conviction reported for rules that always hold. The true value is infinite, which
/// does not survive JSON, so it is clamped to the independence baseline instead.
pub const CONVICTION_CLAMP: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleMetrics {
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub conviction: f64,
}

/// support(A∪B) / (support(A) × support(B)), or 0 when any of the supports is 0.
pub fn lift(joint_support: f64, antecedent_support: f64, consequent_support: f64) -> f64 {
    if joint_support == 0.0 || antecedent_support == 0.0 || consequent_support == 0.0 {
        return 0.0;
    }
    joint_support / (antecedent_support * consequent_support)
}

/// (1 − support(B)) / (1 − confidence), clamped to [`CONVICTION_CLAMP`] at confidence 1.
pub fn conviction(consequent_support: f64, confidence: f64) -> f64 {
    if confidence >= 1.0 {
        return CONVICTION_CLAMP;
    }
    (1.0 - consequent_support) / (1.0 - confidence)
}

/// Turns raw itemset counts into rate metrics for a corpus of known size.
#[derive(Debug, Clone, Copy)]
pub struct MetricCalculator {
    transaction_count: u64,
}
impl MetricCalculator {
    pub fn new(transaction_count: u64) -> Self {
        Self { transaction_count }
    }
    pub fn support(&self, count: u64) -> Result<f64> {
        if self.transaction_count == 0 {
            return Err(MiningError::DivisionByZero { what: "support" });
        }
        Ok(count as f64 / self.transaction_count as f64)
    }
    // count(A∪B) / count(A) is support(A∪B) / support(A) with N cancelled out
    pub fn confidence(&self, joint_count: u64, antecedent_count: u64) -> Result<f64> {
        if antecedent_count == 0 {
            return Err(MiningError::DivisionByZero { what: "confidence" });
        }
        Ok(joint_count as f64 / antecedent_count as f64)
    }
    pub fn evaluate(
        &self,
        joint_count: u64,
        antecedent_count: u64,
        consequent_count: u64,
    ) -> Result<RuleMetrics> {
        let confidence = self.confidence(joint_count, antecedent_count)?;
        let support = self.support(joint_count)?;
        let consequent_support = self.support(consequent_count)?;
        Ok(RuleMetrics {
            support,
            confidence,
            lift: lift(support, self.support(antecedent_count)?, consequent_support),
            conviction: conviction(consequent_support, confidence),
        })
    }
}
