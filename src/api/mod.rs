//! Task service REST client

pub mod client;

pub use client::{ApiError, GraphClient};
