pub mod aggregator;
pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod favorites;
pub mod models;
pub mod providers;
pub mod routes;
