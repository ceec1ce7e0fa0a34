//! Core components: histories, models, policies and the VM itself.

pub mod availability_policies;
pub mod availability_policy;
pub mod bucket;
pub mod config;
pub mod decimal;
pub mod error;
pub mod estimator;
pub mod history;
pub mod predictor;
pub mod product_usage;
pub mod resource_view;
pub mod scheduler;
pub mod vm;
