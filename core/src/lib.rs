pub mod day;
pub mod history_csv;
pub mod metrics;
pub mod models;
pub mod service;
pub mod store;
pub mod units;
