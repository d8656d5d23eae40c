//! # Lunchly Database Crate
//!
//! This crate is the application-specific interface to the PostgreSQL
//! database holding customers and their reservations.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. Callers see repositories and domain
//!   types from `core-types`, never rows or queries.
//! - **Injected store:** Repositories are built on a `CustomerStore` /
//!   `ReservationStore` handed in at construction. `PgStore` runs against a
//!   pooled `PgPool`; `MemoryStore` keeps the same semantics in process.
//! - **Fail fast:** Driver errors propagate unchanged inside `DbError::Sqlx`.
//!   Missing rows become `DbError::NotFound`, whose `status()` is 404.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool setup and schema migrations.
//! - `CustomerRepository`: list, get, save, search and rank customers.
//! - `ReservationRepository`: the bookings a customer owns.
//! - `DbError`: the error type returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{ConnectOptions, connect, run_migrations};
pub use error::DbError;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use repository::{CustomerRepository, ReservationRepository, TOP_CUSTOMER_LIMIT};
pub use store::{CustomerRow, CustomerStore, ReservationRow, ReservationStore};
