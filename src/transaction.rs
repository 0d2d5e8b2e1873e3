// other keepers use HashSet or HashMap
use core::hash::BuildHasherDefault;
use std::collections::{HashMap, HashSet};
use seahash::SeaHasher;

// custom made ordering for itemsets
use std::cmp::Ordering;

// used to print out readable forms of an itemset
use std::fmt;

// transaction ids per item, intersected when counting support
use roaring::RoaringTreemap;

use serde_json::Value;

use crate::error::{MiningError, Result};

pub type ItemHasher = BuildHasherDefault<SeaHasher>;
pub type Tid = u64;

// ------------- Itemset -------------
/// A duplicate-free set of item labels, kept sorted so that equality and hashing
/// depend on content only.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct Itemset {
    items: Vec<String>,
}
impl Itemset {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut items: Vec<String> = items.into_iter().map(Into::into).collect();
        items.sort_unstable();
        items.dedup();
        Self { items }
    }
    pub fn singleton(item: &str) -> Self {
        Self {
            items: vec![item.to_owned()],
        }
    }
    pub fn items(&self) -> &[String] {
        &self.items
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    pub fn contains(&self, item: &str) -> bool {
        self.items
            .binary_search_by(|probe| probe.as_str().cmp(item))
            .is_ok()
    }
    // both sides are sorted, so a single merge walk decides containment
    pub fn is_subset_of(&self, other: &Itemset) -> bool {
        if self.len() > other.len() {
            return false;
        }
        let mut theirs = other.items.iter();
        'ours: for item in &self.items {
            for candidate in theirs.by_ref() {
                match candidate.cmp(item) {
                    Ordering::Less => continue,
                    Ordering::Equal => continue 'ours,
                    Ordering::Greater => return false,
                }
            }
            return false;
        }
        true
    }
    pub fn union(&self, other: &Itemset) -> Itemset {
        let mut items = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.items.len() && j < other.items.len() {
            match self.items[i].cmp(&other.items[j]) {
                Ordering::Less => {
                    items.push(self.items[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    items.push(other.items[j].clone());
                    j += 1;
                }
                Ordering::Equal => {
                    items.push(self.items[i].clone());
                    i += 1;
                    j += 1;
                }
            }
        }
        items.extend_from_slice(&self.items[i..]);
        items.extend_from_slice(&other.items[j..]);
        Itemset { items }
    }
    /// The members at the given (ascending) positions.
    pub fn pick(&self, positions: &[usize]) -> Itemset {
        Itemset {
            items: positions.iter().map(|&p| self.items[p].clone()).collect(),
        }
    }
    /// The members not at the given (ascending) positions.
    pub fn without(&self, positions: &[usize]) -> Itemset {
        let mut skip = positions.iter().peekable();
        let mut items = Vec::with_capacity(self.len().saturating_sub(positions.len()));
        for (p, item) in self.items.iter().enumerate() {
            if skip.peek() == Some(&&p) {
                skip.next();
            } else {
                items.push(item.clone());
            }
        }
        Itemset { items }
    }
    /// Sorted, comma-joined labels, e.g. `Bread,Butter,Milk`.
    pub fn label(&self) -> String {
        self.items.join(",")
    }
}
impl Ord for Itemset {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.len(), &self.items).cmp(&(other.len(), &other.items))
    }
}
impl PartialOrd for Itemset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl fmt::Display for Itemset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}}}", self.items.join(", "))
    }
}

// ------------- Transaction -------------
#[derive(Debug, Clone)]
pub struct Transaction {
    labels: Vec<String>, // first-seen order, duplicates dropped
    members: Itemset,
}
impl Transaction {
    fn new(labels: Vec<String>) -> Self {
        let mut seen: HashSet<&str, ItemHasher> = HashSet::default();
        let mut kept = Vec::with_capacity(labels.len());
        for label in &labels {
            if seen.insert(label.as_str()) {
                kept.push(label.clone());
            }
        }
        let members = Itemset::new(kept.iter().cloned());
        Self {
            labels: kept,
            members,
        }
    }
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
    pub fn members(&self) -> &Itemset {
        &self.members
    }
    pub fn contains_all(&self, itemset: &Itemset) -> bool {
        itemset.is_subset_of(&self.members)
    }
}

// ------------- TransactionSet -------------
/// Read-only corpus of transactions together with an item to transaction-id index.
#[derive(Debug)]
pub struct TransactionSet {
    transactions: Vec<Transaction>,
    index: HashMap<String, RoaringTreemap, ItemHasher>,
}
impl TransactionSet {
    pub fn new<T, I, S>(raw: T) -> Result<Self>
    where
        T: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut transactions = Vec::new();
        for (index, labels) in raw.into_iter().enumerate() {
            let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
            if labels.iter().any(|l| l.is_empty()) {
                return Err(MiningError::InvalidTransaction {
                    index,
                    reason: "empty item label".into(),
                });
            }
            transactions.push(Transaction::new(labels));
        }
        let mut index: HashMap<String, RoaringTreemap, ItemHasher> = HashMap::default();
        for (tid, transaction) in transactions.iter().enumerate() {
            for label in transaction.labels() {
                index
                    .entry(label.clone())
                    .or_insert_with(RoaringTreemap::new)
                    .insert(tid as Tid);
            }
        }
        Ok(Self {
            transactions,
            index,
        })
    }
    /// Accepts an untyped payload, which must be an array of arrays of non-empty strings.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let rows = payload.as_array().ok_or_else(|| MiningError::InvalidTransaction {
            index: 0,
            reason: "payload is not an array of transactions".into(),
        })?;
        let mut raw = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let items = row.as_array().ok_or_else(|| MiningError::InvalidTransaction {
                index,
                reason: format!("expected an array of items, found {}", row),
            })?;
            let mut labels = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(label) => labels.push(label.to_owned()),
                    None => {
                        return Err(MiningError::InvalidTransaction {
                            index,
                            reason: format!("item {} is not a string", item),
                        })
                    }
                }
            }
            raw.push(labels);
        }
        Self::new(raw)
    }
    pub fn len(&self) -> usize {
        self.transactions.len()
    }
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
    /// Distinct item labels in lexicographic order.
    pub fn items(&self) -> Vec<&str> {
        let mut items: Vec<&str> = self.index.keys().map(String::as_str).collect();
        items.sort_unstable();
        items
    }
    pub fn tids(&self, item: &str) -> Option<&RoaringTreemap> {
        self.index.get(item)
    }
    /// Number of transactions that are supersets of the itemset, by bitmap intersection.
    pub fn support_count(&self, itemset: &Itemset) -> u64 {
        let mut members = itemset.items().iter();
        let Some(first) = members.next() else {
            return self.transactions.len() as u64;
        };
        let Some(first) = self.index.get(first) else {
            return 0;
        };
        let mut tids = first.clone();
        for item in members {
            match self.index.get(item) {
                Some(other) => tids &= other,
                None => return 0,
            }
            if tids.is_empty() {
                return 0;
            }
        }
        tids.len()
    }
    /// Same count as `support_count`, by scanning every transaction.
    pub fn scan_count(&self, itemset: &Itemset) -> u64 {
        self.transactions
            .iter()
            .filter(|t| t.contains_all(itemset))
            .count() as u64
    }
    /// Converts a fractional support threshold into an absolute transaction count.
    /// Any positive fraction of a non-empty corpus needs at least one transaction.
    pub fn min_count(&self, fraction: f64) -> u64 {
        if self.transactions.is_empty() {
            return 0;
        }
        let n = self.transactions.len() as f64;
        (fraction * n - 1e-9).ceil().max(1.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> TransactionSet {
        TransactionSet::new(vec![
            vec!["Milk", "Bread", "Butter"],
            vec!["Beer", "Diapers", "Beer"],
            vec!["Milk", "Diapers", "Beer", "Cola"],
        ])
        .unwrap()
    }

    #[test]
    fn itemset_identity_ignores_order() {
        let a = Itemset::new(["b", "a", "c"]);
        let b = Itemset::new(["c", "b", "a", "a"]);
        assert_eq!(a, b);
        assert_eq!(a.label(), "a,b,c");
        assert_eq!(a.to_string(), "{a, b, c}");
    }

    #[test]
    fn subset_and_union() {
        let ab = Itemset::new(["a", "b"]);
        let abc = Itemset::new(["a", "b", "c"]);
        let bd = Itemset::new(["b", "d"]);
        assert!(ab.is_subset_of(&abc));
        assert!(!abc.is_subset_of(&ab));
        assert!(!bd.is_subset_of(&abc));
        assert_eq!(ab.union(&bd), Itemset::new(["a", "b", "d"]));
        assert_eq!(abc.pick(&[0, 2]), Itemset::new(["a", "c"]));
        assert_eq!(abc.without(&[0, 2]), Itemset::new(["b"]));
    }

    #[test]
    fn duplicates_within_a_transaction_are_ignored() {
        let set = corpus();
        assert_eq!(set.transactions()[1].labels(), &["Beer", "Diapers"]);
        assert_eq!(set.transactions()[1].members(), &Itemset::new(["Diapers", "Beer"]));
        assert_eq!(set.support_count(&Itemset::singleton("Beer")), 2);
    }

    #[test]
    fn bitmap_count_matches_scan() {
        let set = corpus();
        for itemset in [
            Itemset::new(["Milk"]),
            Itemset::new(["Beer", "Diapers"]),
            Itemset::new(["Milk", "Cola"]),
            Itemset::new(["Bread", "Beer"]),
            Itemset::new(["Unknown"]),
            Itemset::new(Vec::<String>::new()),
        ] {
            assert_eq!(set.support_count(&itemset), set.scan_count(&itemset), "{}", itemset);
        }
    }

    #[test]
    fn empty_label_is_rejected() {
        let err = TransactionSet::new(vec![vec!["a"], vec!["b", ""]]).unwrap_err();
        assert!(matches!(err, MiningError::InvalidTransaction { index: 1, .. }));
    }

    #[test]
    fn json_payload_rejects_non_strings() {
        let ok = TransactionSet::from_json(&serde_json::json!([["a", "b"], ["b"]])).unwrap();
        assert_eq!(ok.len(), 2);
        assert_eq!(ok.items(), vec!["a", "b"]);
        let err = TransactionSet::from_json(&serde_json::json!([["a"], ["b", 3]])).unwrap_err();
        assert!(matches!(err, MiningError::InvalidTransaction { index: 1, .. }));
        assert!(TransactionSet::from_json(&serde_json::json!({"a": 1})).is_err());
    }

    #[test]
    fn min_count_rounds_up() {
        let set = TransactionSet::new((0..10).map(|_| vec!["x"])).unwrap();
        assert_eq!(set.min_count(0.2), 2);
        assert_eq!(set.min_count(0.25), 3);
        assert_eq!(set.min_count(1.0), 10);
        assert_eq!(set.min_count(0.01), 1);
        assert_eq!(set.min_count(1e-12), 1);
        let empty = TransactionSet::new(Vec::<Vec<String>>::new()).unwrap();
        assert_eq!(empty.min_count(0.5), 0);
    }
}
