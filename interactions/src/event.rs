use crate::error::{InteractionError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Kind of interaction a user had with a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    View,
    #[serde(alias = "cart_add")]
    AddToCart,
    Purchase,
}

/// One row of the interaction feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub user_id: String,

    pub product_id: String,

    #[serde(alias = "interaction_type")]
    pub event_type: EventType,

    /// Opaque timestamp as delivered by the feed; never interpreted here
    #[serde(default)]
    pub timestamp: String,
}

impl InteractionEvent {
    pub fn new(
        user_id: impl Into<String>,
        product_id: impl Into<String>,
        event_type: EventType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            product_id: product_id.into(),
            event_type,
            timestamp: String::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }
}

/// Snapshot of the interaction feed for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct InteractionLog {
    events: Vec<InteractionEvent>,
}

impl InteractionLog {
    /// Build a log, rejecting events with blank ids
    pub fn from_events(events: Vec<InteractionEvent>) -> Result<Self> {
        for (idx, event) in events.iter().enumerate() {
            if event.user_id.trim().is_empty() {
                return Err(InteractionError::InvalidRecord(format!(
                    "event {idx} has an empty user_id"
                )));
            }
            if event.product_id.trim().is_empty() {
                return Err(InteractionError::InvalidRecord(format!(
                    "event {idx} has an empty product_id"
                )));
            }
        }
        Ok(Self { events })
    }

    /// Load a JSON array of events
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let events: Vec<InteractionEvent> = serde_json::from_str(&content)?;
        let log = Self::from_events(events)?;
        info!(
            "Loaded {} interactions from {} users",
            log.len(),
            log.total_users()
        );
        Ok(log)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.events)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn events(&self) -> &[InteractionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether any event of the given type was recorded
    pub fn contains_event_type(&self, event_type: EventType) -> bool {
        self.events.iter().any(|e| e.event_type == event_type)
    }

    /// Distinct products touched by each user, regardless of event type
    pub fn products_by_user(&self) -> BTreeMap<&str, BTreeSet<&str>> {
        let mut by_user: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for event in &self.events {
            by_user
                .entry(event.user_id.as_str())
                .or_default()
                .insert(event.product_id.as_str());
        }
        by_user
    }

    /// Number of distinct users who touched each product
    pub fn product_frequencies(&self) -> BTreeMap<String, usize> {
        let mut users_by_product: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for event in &self.events {
            users_by_product
                .entry(event.product_id.as_str())
                .or_default()
                .insert(event.user_id.as_str());
        }
        users_by_product
            .into_iter()
            .map(|(product, users)| (product.to_string(), users.len()))
            .collect()
    }

    /// Number of distinct users in the whole log
    pub fn total_users(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.user_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }
}
