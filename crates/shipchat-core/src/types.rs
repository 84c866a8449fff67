use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ShipchatError;

// =============================================================================
// Enums
// =============================================================================

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Classified purpose of a user message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateShipment,
    TrackShipment,
    CancelShipment,
    GetShipments,
    GetOrders,
    GetProfile,
    Search,
    Pricing,
    Help,
    Greeting,
    Thanks,
    /// General information; also the low-confidence fallback.
    Info,
}

impl Intent {
    /// The action a resolved intent leads to.
    pub fn action_type(self) -> ActionType {
        match self {
            Intent::CreateShipment => ActionType::CreateShipment,
            Intent::TrackShipment => ActionType::TrackShipment,
            Intent::CancelShipment => ActionType::CancelShipment,
            Intent::GetShipments => ActionType::GetShipments,
            Intent::GetOrders => ActionType::GetOrders,
            Intent::GetProfile => ActionType::GetProfile,
            Intent::Search => ActionType::Search,
            Intent::Pricing | Intent::Help | Intent::Info => ActionType::Info,
            Intent::Greeting | Intent::Thanks => ActionType::None,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::CreateShipment => "create_shipment",
            Intent::TrackShipment => "track_shipment",
            Intent::CancelShipment => "cancel_shipment",
            Intent::GetShipments => "get_shipments",
            Intent::GetOrders => "get_orders",
            Intent::GetProfile => "get_profile",
            Intent::Search => "search",
            Intent::Pricing => "pricing",
            Intent::Help => "help",
            Intent::Greeting => "greeting",
            Intent::Thanks => "thanks",
            Intent::Info => "info",
        };
        f.write_str(name)
    }
}

impl FromStr for Intent {
    type Err = ShipchatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_shipment" => Ok(Intent::CreateShipment),
            "track_shipment" => Ok(Intent::TrackShipment),
            "cancel_shipment" => Ok(Intent::CancelShipment),
            "get_shipments" => Ok(Intent::GetShipments),
            "get_orders" => Ok(Intent::GetOrders),
            "get_profile" => Ok(Intent::GetProfile),
            "search" => Ok(Intent::Search),
            "pricing" => Ok(Intent::Pricing),
            "help" => Ok(Intent::Help),
            "greeting" => Ok(Intent::Greeting),
            "thanks" => Ok(Intent::Thanks),
            "info" | "general" => Ok(Intent::Info),
            _ => Err(ShipchatError::UnknownName {
                kind: "intent",
                value: s.to_string(),
            }),
        }
    }
}

/// Remote operation kinds carried on an assistant message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CreateShipment,
    TrackShipment,
    CancelShipment,
    GetShipments,
    GetOrders,
    GetProfile,
    Search,
    Info,
    None,
}

impl ActionType {
    /// Whether this action is executed by a remote business endpoint.
    pub fn is_remote(self) -> bool {
        !matches!(self, ActionType::Info | ActionType::None)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::CreateShipment => "create_shipment",
            ActionType::TrackShipment => "track_shipment",
            ActionType::CancelShipment => "cancel_shipment",
            ActionType::GetShipments => "get_shipments",
            ActionType::GetOrders => "get_orders",
            ActionType::GetProfile => "get_profile",
            ActionType::Search => "search",
            ActionType::Info => "info",
            ActionType::None => "none",
        };
        f.write_str(name)
    }
}

impl FromStr for ActionType {
    type Err = ShipchatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_shipment" => Ok(ActionType::CreateShipment),
            "track_shipment" => Ok(ActionType::TrackShipment),
            "cancel_shipment" => Ok(ActionType::CancelShipment),
            "get_shipments" => Ok(ActionType::GetShipments),
            "get_orders" => Ok(ActionType::GetOrders),
            "get_profile" => Ok(ActionType::GetProfile),
            "search" => Ok(ActionType::Search),
            "info" => Ok(ActionType::Info),
            "none" => Ok(ActionType::None),
            _ => Err(ShipchatError::UnknownName {
                kind: "action type",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle of an action. `Success` and `Error` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    Processing,
    Success,
    Error,
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ActionStatus::Success | ActionStatus::Error)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "pending"),
            ActionStatus::Processing => write!(f, "processing"),
            ActionStatus::Success => write!(f, "success"),
            ActionStatus::Error => write!(f, "error"),
        }
    }
}

/// Slot and entity names. Serialized in the camelCase form used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    ReceiverName,
    ReceiverPhone,
    City,
    Address,
    Weight,
    Price,
    Email,
    Company,
    TrackingNumber,
    ShipmentId,
    PaymentMethod,
    ShipmentType,
    SearchTerm,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::ReceiverName => "receiverName",
            Field::ReceiverPhone => "receiverPhone",
            Field::City => "city",
            Field::Address => "address",
            Field::Weight => "weight",
            Field::Price => "price",
            Field::Email => "email",
            Field::Company => "company",
            Field::TrackingNumber => "trackingNumber",
            Field::ShipmentId => "shipmentId",
            Field::PaymentMethod => "paymentMethod",
            Field::ShipmentType => "shipmentType",
            Field::SearchTerm => "searchTerm",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ShipchatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "receiverName" => Ok(Field::ReceiverName),
            "receiverPhone" => Ok(Field::ReceiverPhone),
            "city" => Ok(Field::City),
            "address" => Ok(Field::Address),
            "weight" => Ok(Field::Weight),
            "price" => Ok(Field::Price),
            "email" => Ok(Field::Email),
            "company" => Ok(Field::Company),
            "trackingNumber" => Ok(Field::TrackingNumber),
            "shipmentId" => Ok(Field::ShipmentId),
            "paymentMethod" => Ok(Field::PaymentMethod),
            "shipmentType" => Ok(Field::ShipmentType),
            "searchTerm" => Ok(Field::SearchTerm),
            _ => Err(ShipchatError::UnknownName {
                kind: "field",
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Entities and memory
// =============================================================================

/// A typed value extracted from free text. Weights are kilograms, prices SAR.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    Number(f64),
    Text(String),
}

impl EntityValue {
    pub fn text(value: impl Into<String>) -> Self {
        EntityValue::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntityValue::Text(s) => Some(s),
            EntityValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            EntityValue::Number(n) => Some(*n),
            EntityValue::Text(s) => s.parse().ok(),
        }
    }

    /// Empty strings and non-finite numbers carry no information.
    pub fn is_meaningful(&self) -> bool {
        match self {
            EntityValue::Text(s) => !s.trim().is_empty(),
            EntityValue::Number(n) => n.is_finite(),
        }
    }
}

impl fmt::Display for EntityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityValue::Text(s) => f.write_str(s),
            EntityValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            EntityValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Entities extracted from a single message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityBag(BTreeMap<Field, EntityValue>);

impl EntityBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value; meaningless values (empty text, NaN) are dropped.
    pub fn insert(&mut self, field: Field, value: EntityValue) {
        if value.is_meaningful() {
            self.0.insert(field, value);
        }
    }

    pub fn get(&self, field: Field) -> Option<&EntityValue> {
        self.0.get(&field)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(EntityValue::as_text)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &EntityValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

impl FromIterator<(Field, EntityValue)> for EntityBag {
    fn from_iter<I: IntoIterator<Item = (Field, EntityValue)>>(iter: I) -> Self {
        let mut bag = EntityBag::new();
        for (field, value) in iter {
            bag.insert(field, value);
        }
        bag
    }
}

/// Conversation-scoped accumulator of slot values.
///
/// Owned by exactly one conversation. Values are only replaced by newly
/// extracted values, never removed by their absence in a later turn.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextMemory(BTreeMap<Field, EntityValue>);

impl ContextMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Promote the entities of one turn into memory. Returns the fields whose
    /// value was added or changed.
    pub fn merge(&mut self, entities: &EntityBag) -> Vec<Field> {
        let mut changed = Vec::new();
        for (field, value) in entities.iter() {
            if self.0.get(&field) != Some(value) {
                self.0.insert(field, value.clone());
                changed.push(field);
            }
        }
        changed
    }

    pub fn get(&self, field: Field) -> Option<&EntityValue> {
        self.0.get(&field)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        self.get(field).and_then(EntityValue::as_text)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn forget(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &EntityValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Opaque bearer token. Never printed: `Debug` and `Display` are redacted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for building request headers and wire payloads only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

// =============================================================================
// Actions and messages
// =============================================================================

/// Structured result of a completed remote operation, one variant per action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionOutcome {
    ShipmentCreated {
        shipment_id: Option<String>,
        tracking_number: Option<String>,
    },
    TrackingStatus {
        tracking_number: String,
        status: Option<String>,
        location: Option<String>,
    },
    ShipmentCancelled {
        shipment_id: String,
    },
    ShipmentList {
        count: usize,
    },
    OrderList {
        count: usize,
    },
    Profile {
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
    },
    SearchResults {
        term: String,
        count: usize,
    },
}

/// An operation attached to an assistant message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub status: ActionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ActionOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Action {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            status: ActionStatus::Pending,
            result: None,
            error: None,
        }
    }
}

/// One chat turn. Immutable once appended to a conversation's history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            role: Role::User,
            timestamp: Utc::now(),
            action: None,
        }
    }

    pub fn assistant(content: impl Into<String>, action: Option<Action>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            role: Role::Assistant,
            timestamp: Utc::now(),
            action,
        }
    }
}

/// Caller-supplied conversation context.
#[derive(Clone, Debug, Default)]
pub struct ConversationContext {
    pub token: Credential,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub history: Vec<Message>,
}

impl ConversationContext {
    pub fn new(token: Credential) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }
}
