//! Client library for the Ethiopian Electric Utility complaint-management
//! backend: action dispatch with a demo fallback, field normalization,
//! derived analytics and the development proxies.

pub mod analytics;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod logger;
pub mod proxy;
pub mod state;
pub mod utils;
