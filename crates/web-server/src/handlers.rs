use crate::{AppState, error::AppError};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDateTime;
use core_types::{Customer, CustomerId, Reservation, SearchTerm};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A customer as rendered by the API, with the derived display name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    #[serde(flatten)]
    pub customer: Customer,
    pub full_name: String,
}

impl From<Customer> for CustomerView {
    fn from(customer: Customer) -> Self {
        let full_name = customer.full_name();
        Self {
            customer,
            full_name,
        }
    }
}

/// Body of `POST /api/customers` and `PUT /api/customers/:id`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub notes: String,
}

impl CustomerForm {
    fn validate(&self) -> Result<(), AppError> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "firstName and lastName are required".to_string(),
            ));
        }
        Ok(())
    }

    fn apply_to(self, customer: &mut Customer) {
        customer.first_name = self.first_name;
        customer.last_name = self.last_name;
        customer.phone = blank_to_none(self.phone);
        customer.notes = self.notes;
    }
}

fn blank_to_none(phone: Option<String>) -> Option<String> {
    phone.filter(|phone| !phone.trim().is_empty())
}

impl From<CustomerForm> for Customer {
    fn from(form: CustomerForm) -> Self {
        let phone = blank_to_none(form.phone);
        Customer::new(form.first_name, form.last_name, phone, form.notes)
    }
}

/// Body of `POST /api/customers/:id/reservations`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationForm {
    pub start_at: NaiveDateTime,
    pub num_guests: i32,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: CustomerId,
}

/// # GET /api/customers
pub async fn list_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CustomerView>>, AppError> {
    let customers = state.customers.all().await?;
    Ok(Json(customers.into_iter().map(CustomerView::from).collect()))
}

/// # POST /api/customers
pub async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(form): Json<CustomerForm>,
) -> Result<(StatusCode, Json<CustomerView>), AppError> {
    form.validate()?;
    let mut customer = Customer::from(form);

    state.customers.save(&mut customer).await?;
    tracing::info!(id = ?customer.id, "Customer created.");
    Ok((StatusCode::CREATED, Json(customer.into())))
}

/// # GET /api/customers/search?search=jane+doe
/// Resolves a "first last" name to the matching customer's id.
pub async fn search_customers(
    State(state): State<Arc<AppState>>,
    Query(term): Query<SearchTerm>,
) -> Result<Json<SearchResult>, AppError> {
    let id = state.customers.search(&term).await?;
    Ok(Json(SearchResult { id }))
}

/// # GET /api/customers/top-ten
pub async fn top_customers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CustomerView>>, AppError> {
    let customers = state.customers.top_ten().await?;
    Ok(Json(customers.into_iter().map(CustomerView::from).collect()))
}

/// # GET /api/customers/:id
pub async fn get_customer(
    Path(id): Path<CustomerId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<CustomerView>, AppError> {
    let customer = state.customers.get(id).await?;
    Ok(Json(customer.into()))
}

/// # PUT /api/customers/:id
pub async fn update_customer(
    Path(id): Path<CustomerId>,
    State(state): State<Arc<AppState>>,
    Json(form): Json<CustomerForm>,
) -> Result<Json<CustomerView>, AppError> {
    form.validate()?;
    let mut customer = state.customers.get(id).await?;
    form.apply_to(&mut customer);

    state.customers.save(&mut customer).await?;
    Ok(Json(customer.into()))
}

/// # GET /api/customers/:id/reservations
pub async fn customer_reservations(
    Path(id): Path<CustomerId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let customer = state.customers.get(id).await?;
    let reservations = state.customers.reservations(&customer).await?;
    Ok(Json(reservations))
}

/// # POST /api/customers/:id/reservations
pub async fn create_reservation(
    Path(id): Path<CustomerId>,
    State(state): State<Arc<AppState>>,
    Json(form): Json<ReservationForm>,
) -> Result<(StatusCode, Json<Reservation>), AppError> {
    // 404 for an unknown customer rather than a foreign key violation.
    state.customers.get(id).await?;

    let mut reservation = Reservation::new(id, form.start_at, form.num_guests, form.notes);
    state.reservations.save(&mut reservation).await?;
    tracing::info!(id = ?reservation.id, customer = %id, "Reservation created.");
    Ok((StatusCode::CREATED, Json(reservation)))
}
