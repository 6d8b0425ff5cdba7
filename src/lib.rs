pub mod api;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod geo;
pub mod ledger;
pub mod location;
pub mod models;
pub mod observability;
pub mod state;
pub mod store;
