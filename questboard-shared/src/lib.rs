//! # Questboard Shared Library
//!
//! This crate contains the data model and persistence layer shared by the
//! Questboard reconciliation engine and the document server.
//!
//! ## Module Organization
//!
//! - `models`: Tasks, categories, shop and storage items, the user document
//! - `store`: The `DocumentStore` seam with memory and HTTP implementations,
//!   store configuration and call timeouts
//! - `repository`: Typed load/save operations over a document store

pub mod models;
pub mod repository;
pub mod store;

/// Current version of the Questboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
