//! Bookmark Sync Server Library
//!
//! Two-way reconciliation of tagged bookmark collections, plus the
//! storage and HTTP layers the server binary is built from.
//!
//! # Modules
//!
//! - `sync`: The merge engine, sync cycle and replica traits
//! - `db`: SQLite persistence for the local collection
//! - `routes`: HTTP API

pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
pub mod sync;
