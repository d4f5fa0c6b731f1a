//! mstodo - a command-line client for Microsoft To Do
//!
//! This library provides the core functionality for mstodo, including:
//! - Natural-language date parsing ("last monday", "2/Jan/2021 at 9:00")
//! - Range filters ("start monday; end friday") and their evaluation
//! - Data models for task lists and tasks
//! - The REST client and OAuth sign-in with a local token cache
//! - CLI command parsing, execution and table output
//!
//! # Example
//!
//! ```no_run
//! use mstodo::datetime::{DateParser, ParseMode};
//!
//! let parser = DateParser::system();
//! let range = parser.parse_range("start last monday; end friday", ParseMode::Date).unwrap();
//! println!("{:?}", range);
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod datetime;
pub mod filter;
pub mod models;
