pub mod catalog;
pub mod config;
pub mod error;
pub mod sale;
pub mod service;
pub mod types;
pub mod utils;
