//! Helpers for running the forecasting components outside of a full simulation.

pub mod trace_scheduler;
