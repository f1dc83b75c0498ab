//! SQLite storage implementation for cardsync.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `cardsync-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for all domain entities
//! - Database-specific row types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the workspace where Diesel dependencies
//! exist. The `core` and `connect` crates are database-agnostic and work
//! with traits.
//!
//! ```text
//! core (domain)          connect (sync)
//!       │                      │
//!       └──────────┬───────────┘
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod aprs;
pub mod cards;
pub mod connections;
pub mod cycles;
pub mod leases;
pub mod transactions;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from cardsync-core for convenience
pub use cardsync_core::errors::{DatabaseError, Error, Result};
