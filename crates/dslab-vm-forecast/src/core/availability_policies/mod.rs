//! Implementations of availability policies.

pub mod arma_fixed;
pub mod batch_table;
pub mod current;
pub mod foar_dual_channel;
pub mod gratis_ar2;
