//! Conversation context management
//!
//! This module holds the application context shared by every handler and the
//! per-user dialogue state persisted between turns.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::database::Store;
use crate::models::ParseEnumError;
use crate::services::{ChatRegistry, FinanceReporter, MessagingGateway, OrderEngine};
use crate::utils::errors::Result;

/// Application-wide context containing collaborators and settings
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub store: Arc<dyn Store>,
    pub gateway: Arc<dyn MessagingGateway>,
    pub orders: OrderEngine,
    pub registry: ChatRegistry,
    pub finance: FinanceReporter,
}

impl AppContext {
    pub fn new(settings: Settings, store: Arc<dyn Store>, gateway: Arc<dyn MessagingGateway>) -> Self {
        let orders = OrderEngine::new(store.clone(), gateway.clone(), settings.orders.clone());
        let registry = ChatRegistry::new(store.clone(), gateway.clone(), settings.bot.admin_user_id);
        let finance = FinanceReporter::new(store.clone(), settings.finance.clone());

        Self {
            settings,
            store,
            gateway,
            orders,
            registry,
            finance,
        }
    }
}

/// Step of a multi-turn dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueStep {
    SelectingCategory,
    SelectingProduct,
    EnteringUsername,
    EnteringLocation,
    ConfirmingOrder,
    ConfirmingOrderRelevance,
    EnteringDeliveryTime,
    SeniorAddingStaff,
    SeniorCreatingAnnouncement,
    ManagementAddingCategory,
    ManagementDeletingCategory,
    ManagementAddingProductCategory,
    ManagementAddingProductDetails,
    ManagementDeletingProduct,
    ManagementCreatingPost,
}

impl DialogueStep {
    pub const ALL: [DialogueStep; 15] = [
        DialogueStep::SelectingCategory,
        DialogueStep::SelectingProduct,
        DialogueStep::EnteringUsername,
        DialogueStep::EnteringLocation,
        DialogueStep::ConfirmingOrder,
        DialogueStep::ConfirmingOrderRelevance,
        DialogueStep::EnteringDeliveryTime,
        DialogueStep::SeniorAddingStaff,
        DialogueStep::SeniorCreatingAnnouncement,
        DialogueStep::ManagementAddingCategory,
        DialogueStep::ManagementDeletingCategory,
        DialogueStep::ManagementAddingProductCategory,
        DialogueStep::ManagementAddingProductDetails,
        DialogueStep::ManagementDeletingProduct,
        DialogueStep::ManagementCreatingPost,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DialogueStep::SelectingCategory => "selecting_category",
            DialogueStep::SelectingProduct => "selecting_product",
            DialogueStep::EnteringUsername => "entering_username",
            DialogueStep::EnteringLocation => "entering_location",
            DialogueStep::ConfirmingOrder => "confirming_order",
            DialogueStep::ConfirmingOrderRelevance => "confirming_order_relevance",
            DialogueStep::EnteringDeliveryTime => "entering_delivery_time",
            DialogueStep::SeniorAddingStaff => "senior_adding_staff",
            DialogueStep::SeniorCreatingAnnouncement => "senior_creating_announcement",
            DialogueStep::ManagementAddingCategory => "management_adding_category",
            DialogueStep::ManagementDeletingCategory => "management_deleting_category",
            DialogueStep::ManagementAddingProductCategory => "management_adding_product_cat",
            DialogueStep::ManagementAddingProductDetails => "management_adding_product",
            DialogueStep::ManagementDeletingProduct => "management_deleting_product",
            DialogueStep::ManagementCreatingPost => "management_creating_post",
        }
    }

    /// Steps continued inside a staff group chat rather than in private
    pub fn is_group_flow(self) -> bool {
        matches!(
            self,
            DialogueStep::SeniorAddingStaff
                | DialogueStep::SeniorCreatingAnnouncement
                | DialogueStep::ManagementAddingCategory
                | DialogueStep::ManagementDeletingCategory
                | DialogueStep::ManagementAddingProductCategory
                | DialogueStep::ManagementAddingProductDetails
                | DialogueStep::ManagementDeletingProduct
                | DialogueStep::ManagementCreatingPost
        )
    }
}

impl fmt::Display for DialogueStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialogueStep {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DialogueStep::ALL
            .into_iter()
            .find(|step| step.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("dialogue step", s))
    }
}

/// Persisted dialogue state of one user; no row means idle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub user_id: i64,
    pub state: String,
    pub data: Map<String, Value>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(user_id: i64, step: DialogueStep) -> Self {
        Self {
            user_id,
            state: step.as_str().to_string(),
            data: Map::new(),
            updated_at: Utc::now(),
        }
    }

    /// Parsed step, `None` when the stored name is unknown
    pub fn step(&self) -> Option<DialogueStep> {
        self.state.parse().ok()
    }

    /// Move to another step keeping the collected data
    pub fn advance(mut self, step: DialogueStep) -> Self {
        self.state = step.as_str().to_string();
        self.updated_at = Utc::now();
        self
    }

    pub fn with_data<T: Serialize>(mut self, key: &str, value: T) -> Result<Self> {
        self.set_data(key, value)?;
        Ok(self)
    }

    pub fn set_data<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), json_value);
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn get_data<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.data.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.data.get(key).and_then(Value::as_i64)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.data.get(key).and_then(Value::as_str).map(str::to_string)
    }
}
