pub mod api;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod discovery;
pub mod facilitator;
pub mod model;
pub mod observability;
pub mod search;
pub mod store;
