pub mod api;
pub mod app;
pub mod balance;
pub mod config;
pub mod context;
pub mod forecast;
pub mod importers;
pub mod narrative;
pub mod series;
pub mod services;
