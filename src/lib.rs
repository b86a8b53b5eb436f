//! Petstead - a small REST API for users, pets and households
//!
//! Users adopt any number of pets (a pet may have several owners) and live
//! in at most one household.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod schema;
pub mod services;
