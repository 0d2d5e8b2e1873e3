//! Basket – frequent itemset discovery and association rule derivation.
//!
//! Given a corpus of transactions (each a set of item labels) basket finds the
//! itemsets that co-occur in at least a minimum number of transactions and derives
//! directed rules `antecedent -> consequent` from them, measured by:
//! * support – fraction of transactions containing both sides,
//! * confidence – support of both sides over support of the antecedent,
//! * lift – observed joint support over the support expected under independence,
//! * conviction – `(1 − support(consequent)) / (1 − confidence)`.
//!
//! ## Modules
//! * [`transaction`] – [`transaction::Itemset`] and the read-only
//!   [`transaction::TransactionSet`] with its per-item bitmap index.
//! * [`lattice`] – candidate generation (seed, join, prune) and support counting.
//! * [`apriori`] – the level-wise [`apriori::FrequentItemsetMiner`].
//! * [`fpgrowth`] – a frequent-pattern tree miner producing the same itemsets.
//! * [`rules`] and [`metrics`] – rule derivation and the rate metrics.
//! * [`normalize`] – reconciles both miners' raw outputs into one [`MiningResult`].
//! * [`settings`] – [`MinerConfig`] loaded from a file and `BASKET_*` variables.
//! * [`interface`] – cancellation and a thread-per-request runner.
//!
//! ## Conventions
//! Rules use every split of an itemset into two non-empty sides. A rule that always
//! holds has infinite conviction; it is reported as 1 so that results stay
//! serializable. Lift is 0 whenever one of its supports is 0.
//!
//! ## Quick Start
//! ```
//! let result = basket::mine(
//!     vec![vec!["Milk", "Bread"], vec!["Milk", "Bread"], vec!["Milk"]],
//!     0.5,
//!     0.6,
//! ).unwrap();
//! assert_eq!(result.itemset("Bread,Milk"), Some(2));
//! assert_eq!(result.rules[1].display_label,
//!     "{Bread} -> {Milk} (conf: 1.000, supp: 0.667, lift: 1.000, conv: 1.000)");
//! ```

pub mod apriori;
pub mod error;
pub mod fpgrowth;
pub mod interface;
pub mod lattice;
pub mod metrics;
pub mod miner;
pub mod normalize;
pub mod rules;
pub mod settings;
pub mod transaction;

pub use error::{MiningError, Result};
pub use miner::{mine, Miner};
pub use normalize::{MiningResult, RuleRecord};
pub use settings::{Algorithm, MinerConfig};
pub use transaction::{Itemset, TransactionSet};
