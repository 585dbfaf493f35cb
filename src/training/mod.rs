//! Model training
//!
//! Full-batch SGD fits, grouped cross-validation, and evaluation metrics.

pub mod cross_validation;
pub mod metrics;
pub mod trainer;

pub use cross_validation::{balanced_class_weights, GroupKFold};
pub use metrics::{accuracy, roc_auc, CrossValReport, FoldReport};
pub use trainer::{analyze_match_stats, cross_validate, train_models, Standardization};
