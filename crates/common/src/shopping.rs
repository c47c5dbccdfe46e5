//! Who brings what to an event.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::Timestamp;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShoppingItem {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    pub name: String,
    pub quantity: u64,
    pub unit: Option<String>,
    pub arrival_time: Option<NaiveTime>,
    pub notes: Option<String>,
    pub is_brought: bool,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ShoppingItemCreate {
    pub event_id: String,
    pub name: String,
    pub quantity: u64,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<NaiveTime>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ShoppingItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<NaiveTime>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_brought: Option<bool>,
}

/// Shopping list of one event with progress counters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ShoppingList {
    pub event_id: String,
    pub total_items: usize,
    pub brought_items: usize,
    pub pending_items: usize,
    pub items: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn new(event_id: impl Into<String>, items: Vec<ShoppingItem>) -> Self {
        let brought_items = items.iter().filter(|item| item.is_brought).count();
        Self {
            event_id: event_id.into(),
            total_items: items.len(),
            brought_items,
            pending_items: items.len() - brought_items,
            items,
        }
    }
}
