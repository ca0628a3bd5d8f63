//! Seeded random forest classifier.
//!
//! CART trees grown on bootstrap samples in parallel, with Gini or entropy
//! splits over a random feature subset. Prediction averages the leaf class
//! distributions of every tree.

mod config;
mod error;
mod forest;
mod node;
mod predict;
mod split;
mod tree;

pub use config::{ForestConfig, MaxFeatures};
pub use error::RfError;
pub use forest::RandomForest;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::ClassDistribution;
pub use split::SplitCriterion;
pub use tree::DecisionTree;
