pub mod customer;
pub mod error;
pub mod reservation;
pub mod search;

// Re-export the core types to provide a clean public API.
pub use customer::{Customer, CustomerId};
pub use error::CoreError;
pub use reservation::{Reservation, ReservationId};
pub use search::{NameQuery, SearchTerm};
