//! Shared infrastructure used across features

pub mod models;
