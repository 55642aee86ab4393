//! # Questboard Document Server Library
//!
//! HTTP document store for Questboard: one JSON document per user, read
//! whole and updated one top-level field at a time. The engine's
//! `HttpDocumentStore` is its client.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
