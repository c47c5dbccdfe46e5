//! Ticket types and purchased tickets.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TicketType {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: u64,
    pub max_per_person: u64,
    pub sold_count: u64,
    /// Derived from `quantity - sold_count`; recomputed on every read.
    #[serde(default)]
    pub available_count: u64,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TicketType {
    pub fn available(&self) -> u64 {
        self.quantity.saturating_sub(self.sold_count)
    }

    pub fn with_availability(mut self) -> Self {
        self.available_count = self.available();
        self
    }
}

fn one() -> u64 {
    1
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TicketTypeCreate {
    pub event_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    pub quantity: u64,
    #[serde(default = "one")]
    pub max_per_person: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BuyerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TicketPurchase {
    pub ticket_type_id: String,
    pub buyer_info: BuyerInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: String,
    pub ticket_type_id: String,
    pub event_id: String,
    pub buyer_id: String,
    pub buyer_info: BuyerInfo,
    pub ticket_number: String,
    pub purchase_date: Timestamp,
    pub is_valid: bool,
    pub checked_in: bool,
    pub checked_in_at: Option<Timestamp>,
    /// `ticket_type:buyer:n`, one of the buyer's `max_per_person` slots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder_slot: Option<String>,
}
