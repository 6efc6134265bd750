pub mod app;
pub mod audit;
pub mod config;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod metadata;
pub mod orchestrator;
pub mod output;
pub mod reconcile;
pub mod resolver;
pub mod tabular;
pub mod transport;
