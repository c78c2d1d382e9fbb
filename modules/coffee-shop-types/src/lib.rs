//! Shared types for the coffee terminal backend and its HTTP clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

fn default_agent_type() -> String {
    "chat".to_string()
}

fn default_max_results() -> u32 {
    5
}

// =====================================================
// Domain Types
// =====================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub origin: String,
    pub description: String,
    pub price: f64,
    #[serde(default = "default_true")]
    pub available: bool,
}

impl MenuItem {
    pub fn new(name: &str, origin: &str, description: &str, price: f64) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            origin: origin.to_string(),
            description: description.to_string(),
            price,
            available: true,
        }
    }
}

/// Order lifecycle label. Only `Pending` is assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Ready,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub coffee_id: String,
    pub coffee_name: String,
    pub quantity: u32,
    pub total_price: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    /// Build a pending order, snapshotting the item's name and price.
    pub fn place(request: &OrderCreate, item: &MenuItem) -> Self {
        Self {
            id: new_id(),
            customer_name: request.customer_name.clone(),
            coffee_id: item.id.clone(),
            coffee_name: item.name.clone(),
            quantity: request.quantity,
            total_price: item.price * f64::from(request.quantity),
            timestamp: Utc::now(),
            status: OrderStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub id: String,
    pub client_name: String,
    pub timestamp: DateTime<Utc>,
}

impl StatusCheck {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            client_name: client_name.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopInfo {
    pub name: String,
    pub description: String,
    pub location: String,
    pub hours: String,
    pub philosophy: String,
    pub commands: Vec<String>,
}

// =====================================================
// Request Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_name: String,
    pub coffee_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusCheckCreate {
    pub client_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_agent_type")]
    pub agent_type: String,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

// =====================================================
// Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub response: String,
    pub agent_type: String,
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn failed(agent_type: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: String::new(),
            agent_type: agent_type.into(),
            capabilities: vec![],
            metadata: Map::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Map<String, Value>>,
    pub sources_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn failed(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            query: query.into(),
            summary: String::new(),
            search_results: None,
            sources_count: 0,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub search_agent: Vec<String>,
    pub chat_agent: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CapabilitiesResponse {
    pub success: bool,
    pub capabilities: AgentCapabilities,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub storage: String,
    pub uptime_secs: u64,
}
