//! Forecasting configuration.

pub mod config_value;
pub mod forecast_config;

pub use config_value::ConfigValue;
pub use forecast_config::ForecastConfig;
