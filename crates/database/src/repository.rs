use crate::DbError;
use crate::store::{CustomerStore, ReservationStore};
use core_types::{Customer, CustomerId, NameQuery, Reservation, ReservationId, SearchTerm};
use std::sync::Arc;

/// Number of customers `CustomerRepository::top_ten` returns.
pub const TOP_CUSTOMER_LIMIT: i64 = 10;

/// Persistence for reservations. Customers reach their bookings through it.
#[derive(Clone)]
pub struct ReservationRepository {
    store: Arc<dyn ReservationStore>,
}

impl ReservationRepository {
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    /// All reservations belonging to `customer_id`, earliest first.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn for_customer(&self, customer_id: CustomerId) -> Result<Vec<Reservation>, DbError> {
        let rows = self.store.reservations_for_customer(customer_id).await?;
        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: ReservationId) -> Result<Reservation, DbError> {
        self.store
            .reservation_by_id(id)
            .await?
            .map(Reservation::from)
            .ok_or_else(|| DbError::not_found("reservation", id))
    }

    /// Inserts the reservation when it has no id yet (back-filling the id),
    /// otherwise overwrites the stored row.
    #[tracing::instrument(level = "debug", skip_all, fields(id = ?reservation.id))]
    pub async fn save(&self, reservation: &mut Reservation) -> Result<(), DbError> {
        reservation.validate()?;

        match reservation.id {
            None => {
                let id = self.store.insert_reservation(reservation).await?;
                reservation.id = Some(id);
            }
            Some(id) => {
                if self.store.update_reservation(id, reservation).await? == 0 {
                    return Err(DbError::not_found("reservation", id));
                }
            }
        }
        Ok(())
    }
}

/// The `CustomerRepository` encapsulates every query the application runs
/// against the `customers` table.
#[derive(Clone)]
pub struct CustomerRepository {
    store: Arc<dyn CustomerStore>,
    reservations: ReservationRepository,
}

impl CustomerRepository {
    pub fn new(store: Arc<dyn CustomerStore>, reservation_store: Arc<dyn ReservationStore>) -> Self {
        Self::with_reservations(store, ReservationRepository::new(reservation_store))
    }

    pub fn with_reservations(
        store: Arc<dyn CustomerStore>,
        reservations: ReservationRepository,
    ) -> Self {
        Self {
            store,
            reservations,
        }
    }

    /// Fetches every customer, ordered by last name and then first name.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn all(&self) -> Result<Vec<Customer>, DbError> {
        let rows = self.store.all_customers().await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    /// Fetches a single customer by id.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, id: CustomerId) -> Result<Customer, DbError> {
        self.store
            .customer_by_id(id)
            .await?
            .map(Customer::from)
            .ok_or_else(|| DbError::not_found("customer", id))
    }

    /// Fetches the reservations of `customer`. A customer that was never
    /// saved cannot own any, so the store is not consulted.
    #[tracing::instrument(level = "debug", skip_all, fields(id = ?customer.id))]
    pub async fn reservations(&self, customer: &Customer) -> Result<Vec<Reservation>, DbError> {
        match customer.id {
            Some(id) => self.reservations.for_customer(id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Inserts an unsaved customer and back-fills its id, or overwrites the
    /// stored row of a saved one.
    #[tracing::instrument(level = "debug", skip_all, fields(id = ?customer.id))]
    pub async fn save(&self, customer: &mut Customer) -> Result<(), DbError> {
        match customer.id {
            None => {
                let id = self.store.insert_customer(customer).await?;
                customer.id = Some(id);
            }
            Some(id) => {
                if self.store.update_customer(id, customer).await? == 0 {
                    return Err(DbError::not_found("customer", id));
                }
            }
        }
        Ok(())
    }

    /// Finds a customer by "first last" name and returns their id.
    #[tracing::instrument(level = "debug", skip_all, fields(search = %term.search))]
    pub async fn search(&self, term: &SearchTerm) -> Result<CustomerId, DbError> {
        let query = NameQuery::try_from(term)?;

        self.store
            .customer_id_by_name(&query.first_name, &query.last_name)
            .await?
            .ok_or_else(|| {
                DbError::not_found("customer", format!("{} {}", query.first_name, query.last_name))
            })
    }

    /// The ten customers with the most reservations, busiest first. Equal
    /// counts are ordered by id.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn top_ten(&self) -> Result<Vec<Customer>, DbError> {
        let rows = self.store.most_reserved_customers(TOP_CUSTOMER_LIMIT).await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    pub fn reservation_repository(&self) -> &ReservationRepository {
        &self.reservations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::{NaiveDate, NaiveDateTime};

    fn repositories() -> CustomerRepository {
        let store = Arc::new(MemoryStore::new());
        CustomerRepository::new(store.clone(), store)
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    async fn add(repo: &CustomerRepository, first: &str, last: &str) -> Customer {
        let mut customer = Customer::new(first, last, None, "");
        repo.save(&mut customer).await.unwrap();
        customer
    }

    async fn book(repo: &CustomerRepository, customer_id: CustomerId, times: usize) {
        for i in 0..times {
            let mut reservation = Reservation::new(customer_id, at(1 + i as u32 % 28, 19), 2, "");
            repo.reservation_repository()
                .save(&mut reservation)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn save_back_fills_id_and_get_round_trips() {
        let repo = repositories();
        let mut customer = Customer::new("Jane", "Doe", Some("555-0100".into()), "likes the patio");

        repo.save(&mut customer).await.unwrap();

        let id = customer.id.expect("id assigned on insert");
        let fetched = repo.get(id).await.unwrap();
        assert_eq!(fetched, customer);
    }

    #[tokio::test]
    async fn get_missing_customer_is_not_found() {
        let repo = repositories();
        let err = repo.get(CustomerId(99)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "customer", .. }));
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn all_orders_by_last_then_first_name() {
        let repo = repositories();
        add(&repo, "Zed", "Adams").await;
        add(&repo, "Bea", "Young").await;
        add(&repo, "Amy", "Adams").await;
        add(&repo, "Carl", "Baker").await;

        let names: Vec<String> = repo
            .all()
            .await
            .unwrap()
            .iter()
            .map(Customer::full_name)
            .collect();
        assert_eq!(names, ["Amy Adams", "Zed Adams", "Carl Baker", "Bea Young"]);
    }

    #[tokio::test]
    async fn save_updates_existing_row() {
        let repo = repositories();
        let mut customer = add(&repo, "Jane", "Doe").await;

        customer.phone = Some("555-0123".into());
        customer.notes = "allergic to nuts".into();
        repo.save(&mut customer).await.unwrap();

        let fetched = repo.get(customer.id.unwrap()).await.unwrap();
        assert_eq!(fetched.phone.as_deref(), Some("555-0123"));
        assert_eq!(fetched.notes, "allergic to nuts");
    }

    #[tokio::test]
    async fn saving_unchanged_customer_twice_leaves_row_alone() {
        let repo = repositories();
        let mut customer = add(&repo, "Jane", "Doe").await;
        let id = customer.id;

        repo.save(&mut customer).await.unwrap();
        repo.save(&mut customer).await.unwrap();

        assert_eq!(customer.id, id);
        assert_eq!(repo.get(id.unwrap()).await.unwrap(), customer);
        assert_eq!(repo.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_with_unknown_id_is_not_found() {
        let repo = repositories();
        let mut customer = Customer::new("Ghost", "Row", None, "");
        customer.id = Some(CustomerId(41));

        let err = repo.save(&mut customer).await.unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn search_returns_id_of_capitalized_match() {
        let repo = repositories();
        add(&repo, "John", "Smith").await;
        let jane = add(&repo, "Jane", "Doe").await;

        let id = repo.search(&SearchTerm::new("jane doe")).await.unwrap();
        assert_eq!(Some(id), jane.id);
    }

    #[tokio::test]
    async fn search_matches_multi_word_last_names() {
        let repo = repositories();
        let anna = add(&repo, "Anna", "Van Der Berg").await;

        let id = repo
            .search(&SearchTerm::new("anna van der berg"))
            .await
            .unwrap();
        assert_eq!(Some(id), anna.id);
    }

    #[tokio::test]
    async fn search_with_single_token_is_a_validation_error() {
        let repo = repositories();
        add(&repo, "Jane", "Doe").await;

        let err = repo.search(&SearchTerm::new("janedoe")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(err.status(), 400);
    }

    #[tokio::test]
    async fn search_without_match_is_not_found() {
        let repo = repositories();
        add(&repo, "Jane", "Doe").await;

        let err = repo.search(&SearchTerm::new("john doe")).await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "No such customer: John Doe");
    }

    #[tokio::test]
    async fn search_is_case_sensitive_beyond_the_initial() {
        let repo = repositories();
        add(&repo, "McKenzie", "Doe").await;

        let err = repo.search(&SearchTerm::new("mckenzie doe")).await.unwrap_err();
        assert_eq!(err.status(), 404);
        assert!(repo.search(&SearchTerm::new("mcKenzie doe")).await.is_ok());
    }

    #[tokio::test]
    async fn search_prefers_lowest_id_for_duplicate_names() {
        let repo = repositories();
        let first = add(&repo, "Jane", "Doe").await;
        add(&repo, "Jane", "Doe").await;

        let id = repo.search(&SearchTerm::new("jane doe")).await.unwrap();
        assert_eq!(Some(id), first.id);
    }

    #[tokio::test]
    async fn top_ten_ranks_by_reservation_count() {
        let repo = repositories();
        let mut customers = Vec::new();
        for n in 1..=15 {
            let customer = add(&repo, &format!("Guest{n}"), "Regular").await;
            book(&repo, customer.id.unwrap(), n).await;
            customers.push(customer);
        }

        let top = repo.top_ten().await.unwrap();

        let expected: Vec<Option<CustomerId>> =
            customers.iter().rev().take(10).map(|c| c.id).collect();
        let actual: Vec<Option<CustomerId>> = top.iter().map(|c| c.id).collect();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn top_ten_breaks_ties_by_id_and_skips_customers_without_bookings() {
        let repo = repositories();
        let a = add(&repo, "Ann", "A").await;
        let b = add(&repo, "Bob", "B").await;
        add(&repo, "Cat", "C").await;
        book(&repo, b.id.unwrap(), 2).await;
        book(&repo, a.id.unwrap(), 2).await;

        let ids: Vec<Option<CustomerId>> =
            repo.top_ten().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, [a.id, b.id]);
    }

    #[tokio::test]
    async fn reservations_of_customer_without_bookings_is_empty() {
        let repo = repositories();
        let customer = add(&repo, "Jane", "Doe").await;

        assert!(repo.reservations(&customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reservations_of_unsaved_customer_is_empty() {
        let repo = repositories();
        let customer = Customer::new("Not", "Saved", None, "");

        assert!(repo.reservations(&customer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reservations_belong_to_their_customer_only() {
        let repo = repositories();
        let jane = add(&repo, "Jane", "Doe").await;
        let john = add(&repo, "John", "Doe").await;
        book(&repo, jane.id.unwrap(), 3).await;
        book(&repo, john.id.unwrap(), 1).await;

        let bookings = repo.reservations(&jane).await.unwrap();
        assert_eq!(bookings.len(), 3);
        assert!(bookings.iter().all(|r| Some(r.customer_id) == jane.id));
        assert!(bookings.windows(2).all(|w| w[0].start_at <= w[1].start_at));
    }

    #[tokio::test]
    async fn reservation_save_rejects_empty_party() {
        let repo = repositories();
        let jane = add(&repo, "Jane", "Doe").await;
        let mut reservation = Reservation::new(jane.id.unwrap(), at(3, 12), 0, "");

        let err = repo
            .reservation_repository()
            .save(&mut reservation)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 400);
        assert_eq!(reservation.id, None);
    }

    #[tokio::test]
    async fn reservation_save_updates_and_get_reads_back() {
        let repo = repositories();
        let jane = add(&repo, "Jane", "Doe").await;
        let reservations = repo.reservation_repository();
        let mut reservation = Reservation::new(jane.id.unwrap(), at(3, 12), 2, "");
        reservations.save(&mut reservation).await.unwrap();

        reservation.num_guests = 6;
        reservation.notes = "birthday".into();
        reservations.save(&mut reservation).await.unwrap();

        let fetched = reservations.get(reservation.id.unwrap()).await.unwrap();
        assert_eq!(fetched.num_guests, 6);
        assert_eq!(fetched.notes, "birthday");
    }

    #[tokio::test]
    async fn missing_reservation_is_not_found() {
        let repo = repositories();
        let err = repo
            .reservation_repository()
            .get(ReservationId(5))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "reservation", .. }));
    }

    fn is_foreign_key_violation(err: &DbError) -> bool {
        matches!(err, DbError::Sqlx(sqlx::Error::Database(db)) if db.is_foreign_key_violation())
    }

    #[tokio::test]
    async fn reservation_for_unknown_customer_is_a_driver_error() {
        let repo = repositories();
        let mut reservation = Reservation::new(CustomerId(77), at(3, 12), 2, "");

        let err = repo
            .reservation_repository()
            .save(&mut reservation)
            .await
            .unwrap_err();
        assert!(is_foreign_key_violation(&err), "unexpected error: {err:?}");
        assert_eq!(err.status(), 500);
        assert_eq!(reservation.id, None);
    }

    #[tokio::test]
    async fn moving_reservation_to_unknown_customer_is_a_driver_error() {
        let repo = repositories();
        let jane = add(&repo, "Jane", "Doe").await;
        let reservations = repo.reservation_repository();
        let mut reservation = Reservation::new(jane.id.unwrap(), at(3, 12), 2, "");
        reservations.save(&mut reservation).await.unwrap();

        reservation.customer_id = CustomerId(77);
        let err = reservations.save(&mut reservation).await.unwrap_err();
        assert!(is_foreign_key_violation(&err), "unexpected error: {err:?}");

        let stored = reservations.get(reservation.id.unwrap()).await.unwrap();
        assert_eq!(stored.customer_id, jane.id.unwrap());
    }

    #[tokio::test]
    async fn updating_missing_reservation_is_not_found_even_for_unknown_customer() {
        let repo = repositories();
        let mut reservation = Reservation::new(CustomerId(77), at(3, 12), 2, "");
        reservation.id = Some(ReservationId(9));

        let err = repo
            .reservation_repository()
            .save(&mut reservation)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "reservation", .. }));
    }
}
