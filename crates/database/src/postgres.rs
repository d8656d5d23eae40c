use crate::DbError;
use crate::store::{CustomerRow, CustomerStore, ReservationRow, ReservationStore};
use async_trait::async_trait;
use core_types::{Customer, CustomerId, Reservation, ReservationId};
use sqlx::postgres::PgPool;

/// The PostgreSQL-backed store. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn all_customers(&self) -> Result<Vec<CustomerRow>, DbError> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, first_name, last_name, phone, notes
            FROM customers
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn customer_by_id(&self, id: CustomerId) -> Result<Option<CustomerRow>, DbError> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, first_name, last_name, phone, notes FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_customer(&self, customer: &Customer) -> Result<CustomerId, DbError> {
        let id = sqlx::query_scalar::<_, CustomerId>(
            r#"
            INSERT INTO customers (first_name, last_name, phone, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.phone.as_deref())
        .bind(&customer.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_customer(&self, id: CustomerId, customer: &Customer) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE customers SET first_name = $1, last_name = $2, phone = $3, notes = $4
            WHERE id = $5
            "#,
        )
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.phone.as_deref())
        .bind(&customer.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn customer_id_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<CustomerId>, DbError> {
        let id = sqlx::query_scalar::<_, CustomerId>(
            r#"
            SELECT id FROM customers
            WHERE first_name = $1 AND last_name = $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(id)
    }

    async fn most_reserved_customers(&self, limit: i64) -> Result<Vec<CustomerRow>, DbError> {
        // Grouping by the primary key lets the other customer columns through.
        let rows = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT c.id, c.first_name, c.last_name, c.phone, c.notes
            FROM reservations AS r
            JOIN customers AS c ON c.id = r.customer_id
            GROUP BY c.id
            ORDER BY COUNT(r.id) DESC, c.id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn reservations_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<ReservationRow>, DbError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, customer_id, start_at, num_guests, notes
            FROM reservations
            WHERE customer_id = $1
            ORDER BY start_at
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn reservation_by_id(
        &self,
        id: ReservationId,
    ) -> Result<Option<ReservationRow>, DbError> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, customer_id, start_at, num_guests, notes FROM reservations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_reservation(
        &self,
        reservation: &Reservation,
    ) -> Result<ReservationId, DbError> {
        let id = sqlx::query_scalar::<_, ReservationId>(
            r#"
            INSERT INTO reservations (customer_id, start_at, num_guests, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(reservation.customer_id)
        .bind(reservation.start_at)
        .bind(reservation.num_guests)
        .bind(&reservation.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_reservation(
        &self,
        id: ReservationId,
        reservation: &Reservation,
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE reservations SET customer_id = $1, start_at = $2, num_guests = $3, notes = $4
            WHERE id = $5
            "#,
        )
        .bind(reservation.customer_id)
        .bind(reservation.start_at)
        .bind(reservation.num_guests)
        .bind(&reservation.notes)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
