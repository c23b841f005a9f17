pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod entities;
pub mod error;
pub mod external;
pub mod repository;
pub mod search;
pub mod seed;
pub mod server;
pub mod store;
