//! The query capability repositories are built on.
//!
//! Repositories never reach for a global pool; they receive a store at
//! construction. `PgStore` runs the real SQL, `MemoryStore` keeps the same
//! semantics in process.

use crate::DbError;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use core_types::{Customer, CustomerId, Reservation, ReservationId};
use sqlx::FromRow;

/// A row from the `customers` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CustomerRow {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub notes: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: Some(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            notes: row.notes,
        }
    }
}

/// A row from the `reservations` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ReservationRow {
    pub id: ReservationId,
    pub customer_id: CustomerId,
    pub start_at: NaiveDateTime,
    pub num_guests: i32,
    pub notes: String,
}

impl From<ReservationRow> for Reservation {
    fn from(row: ReservationRow) -> Self {
        Reservation {
            id: Some(row.id),
            customer_id: row.customer_id,
            start_at: row.start_at,
            num_guests: row.num_guests,
            notes: row.notes,
        }
    }
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Every customer, ordered by last name then first name. Names compare
    /// under the store's collation, so mixed-case names may order differently
    /// in `PgStore` (database default) and `MemoryStore` (byte-wise).
    async fn all_customers(&self) -> Result<Vec<CustomerRow>, DbError>;

    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<CustomerRow>, DbError>;

    /// Inserts the mutable fields of `customer` and returns the generated id.
    async fn insert_customer(&self, customer: &Customer) -> Result<CustomerId, DbError>;

    /// Overwrites the mutable fields of row `id`. Returns the number of rows touched.
    async fn update_customer(&self, id: CustomerId, customer: &Customer) -> Result<u64, DbError>;

    /// Exact, case-sensitive match on both names. The lowest id wins when names repeat.
    async fn customer_id_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<CustomerId>, DbError>;

    /// Customers with the most reservations, count descending then id ascending.
    async fn most_reserved_customers(&self, limit: i64) -> Result<Vec<CustomerRow>, DbError>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Reservations of one customer, earliest first.
    async fn reservations_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ReservationRow>, DbError>;

    async fn reservation_by_id(&self, id: ReservationId)
        -> Result<Option<ReservationRow>, DbError>;

    async fn insert_reservation(&self, reservation: &Reservation)
        -> Result<ReservationId, DbError>;

    async fn update_reservation(
        &self,
        id: ReservationId,
        reservation: &Reservation,
    ) -> Result<u64, DbError>;
}
