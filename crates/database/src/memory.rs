use crate::DbError;
use crate::store::{CustomerRow, CustomerStore, ReservationRow, ReservationStore};
use async_trait::async_trait;
use core_types::{Customer, CustomerId, Reservation, ReservationId};
use sqlx::error::{DatabaseError, ErrorKind};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::error::Error as StdError;
use tokio::sync::RwLock;

const CUSTOMER_FOREIGN_KEY: &str = "reservations_customer_id_fkey";
const FOREIGN_KEY_MESSAGE: &str = "insert or update on table \"reservations\" violates foreign key constraint \"reservations_customer_id_fkey\"";

/// The driver error PostgreSQL raises when `reservations.customer_id` points
/// at no customer (SQLSTATE 23503).
#[derive(Debug, thiserror::Error)]
#[error("{}", FOREIGN_KEY_MESSAGE)]
struct ForeignKeyViolation;

impl DatabaseError for ForeignKeyViolation {
    fn message(&self) -> &str {
        FOREIGN_KEY_MESSAGE
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23503"))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(CUSTOMER_FOREIGN_KEY)
    }

    fn table(&self) -> Option<&str> {
        Some("reservations")
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::ForeignKeyViolation
    }
}

fn foreign_key_violation() -> DbError {
    DbError::Sqlx(sqlx::Error::Database(Box::new(ForeignKeyViolation)))
}

#[derive(Debug, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, CustomerRow>,
    reservations: BTreeMap<ReservationId, ReservationRow>,
    next_customer_id: i32,
    next_reservation_id: i32,
}

/// An in-process store with the same ordering and tie-break rules as the
/// SQL queries in `PgStore`. Ids start at 1 and are never reused.
///
/// String comparison is byte-wise, which matches a `C` collation. A
/// reservation whose customer does not exist fails with the same driver
/// error PostgreSQL raises for the foreign key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn all_customers(&self) -> Result<Vec<CustomerRow>, DbError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<CustomerRow> = tables.customers.values().cloned().collect();
        rows.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(rows)
    }

    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<CustomerRow>, DbError> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<CustomerId, DbError> {
        let mut tables = self.tables.write().await;
        tables.next_customer_id += 1;
        let id = CustomerId(tables.next_customer_id);
        tables.customers.insert(
            id,
            CustomerRow {
                id,
                first_name: customer.first_name.clone(),
                last_name: customer.last_name.clone(),
                phone: customer.phone.clone(),
                notes: customer.notes.clone(),
            },
        );
        Ok(id)
    }

    async fn update_customer(&self, id: CustomerId, customer: &Customer) -> Result<u64, DbError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables.customers.get_mut(&id) else {
            return Ok(0);
        };
        row.first_name = customer.first_name.clone();
        row.last_name = customer.last_name.clone();
        row.phone = customer.phone.clone();
        row.notes = customer.notes.clone();
        Ok(1)
    }

    async fn customer_id_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<CustomerId>, DbError> {
        // BTreeMap iterates in id order, so the first hit is the lowest id.
        Ok(self
            .tables
            .read()
            .await
            .customers
            .values()
            .find(|row| row.first_name == first_name && row.last_name == last_name)
            .map(|row| row.id))
    }

    async fn most_reserved_customers(&self, limit: i64) -> Result<Vec<CustomerRow>, DbError> {
        let tables = self.tables.read().await;

        let mut counts: HashMap<CustomerId, usize> = HashMap::new();
        for reservation in tables.reservations.values() {
            *counts.entry(reservation.customer_id).or_default() += 1;
        }

        let mut ranked: Vec<(CustomerId, usize)> = counts.into_iter().collect();
        ranked.sort_by(|(a_id, a_count), (b_id, b_count)| {
            b_count.cmp(a_count).then_with(|| a_id.cmp(b_id))
        });

        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(ranked
            .into_iter()
            .filter_map(|(id, _)| tables.customers.get(&id).cloned())
            .take(limit)
            .collect())
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn reservations_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ReservationRow>, DbError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ReservationRow> = tables
            .reservations
            .values()
            .filter(|row| row.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.start_at);
        Ok(rows)
    }

    async fn reservation_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<ReservationRow>, DbError> {
        Ok(self.tables.read().await.reservations.get(&id).cloned())
    }

    async fn insert_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<ReservationId, DbError> {
        let mut tables = self.tables.write().await;
        // Mirrors the foreign key on reservations.customer_id.
        if !tables.customers.contains_key(&reservation.customer_id) {
            return Err(foreign_key_violation());
        }
        tables.next_reservation_id += 1;
        let id = ReservationId(tables.next_reservation_id);
        tables.reservations.insert(
            id,
            ReservationRow {
                id,
                customer_id: reservation.customer_id,
                start_at: reservation.start_at,
                num_guests: reservation.num_guests,
                notes: reservation.notes.clone(),
            },
        );
        Ok(id)
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        reservation: &Reservation,
    ) -> Result<u64, DbError> {
        let mut tables = self.tables.write().await;
        // An update that matches no row never reaches the constraint check.
        if !tables.reservations.contains_key(&id) {
            return Ok(0);
        }
        if !tables.customers.contains_key(&reservation.customer_id) {
            return Err(foreign_key_violation());
        }
        let Some(row) = tables.reservations.get_mut(&id) else {
            return Ok(0);
        };
        row.customer_id = reservation.customer_id;
        row.start_at = reservation.start_at;
        row.num_guests = reservation.num_guests;
        row.notes = reservation.notes.clone();
        Ok(1)
    }
}
