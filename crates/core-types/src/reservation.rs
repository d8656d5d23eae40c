use crate::customer::CustomerId;
use crate::error::CoreError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ReservationId(pub i32);

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A booking made by a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ReservationId>,
    pub customer_id: CustomerId,
    pub start_at: NaiveDateTime,
    pub num_guests: i32,
    #[serde(default)]
    pub notes: String,
}

impl Reservation {
    pub fn new(
        customer_id: CustomerId,
        start_at: NaiveDateTime,
        num_guests: i32,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            customer_id,
            start_at,
            num_guests,
            notes: notes.into(),
        }
    }

    /// Checks the fields the `reservations` table constrains.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.num_guests < 1 {
            return Err(CoreError::invalid_input(
                "num_guests",
                format!("a reservation needs at least one guest, got {}", self.num_guests),
            ));
        }
        Ok(())
    }

    /// Start time rendered for listings, e.g. "March 4 2024, 6:30 PM".
    pub fn formatted_start_at(&self) -> String {
        self.start_at.format("%B %-d %Y, %-I:%M %p").to_string()
    }
}
