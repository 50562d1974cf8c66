pub mod api;
pub mod data_collector;
pub mod database_sqlx;
pub mod extractors;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod tickers;
