//! Core data types for freight loads
//!
//! This module defines the records read from the `loads` table:
//! - `Load`: One freight shipment row
//! - `Stop`: A pickup or delivery waypoint inside `raw_data`
//! - `LoadStatus`: Pipeline state set by the external ingest process
//! - `LoadPatch`: The only write payload the dashboard sends

use serde::{Deserialize, Deserializer, Serialize};

/// Status value the ingest pipeline writes once a load reached the TMS
pub const PUSHED_TO_TMS: &str = "PUSHED_TO_TMS";

/// A freight load row
///
/// `id`, `created_at`, `status` and `raw_data` are owned by the store and the
/// ingest pipeline. The dashboard only ever changes the three fields carried
/// by [`LoadPatch`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Load {
    /// Opaque identifier assigned by the store (numeric keys read as text)
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Creation timestamp, kept exactly as the store returned it
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Human-readable load number
    #[serde(default, deserialize_with = "null_as_default")]
    pub load_reference: String,
    /// Agreed rate; `None` when the store has no amount yet
    #[serde(default)]
    pub rate_amount: Option<f64>,
    /// Free-text commodity description
    #[serde(default, deserialize_with = "null_as_default")]
    pub commodity: String,
    #[serde(default)]
    pub status: LoadStatus,
    /// Semi-structured document extracted from the rate confirmation
    #[serde(default)]
    pub raw_data: serde_json::Value,
}

impl Load {
    /// Create a load with the given id and empty fields
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: String::new(),
            load_reference: String::new(),
            rate_amount: None,
            commodity: String::new(),
            status: LoadStatus::default(),
            raw_data: serde_json::Value::Null,
        }
    }

    /// Builder method: set the reference
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.load_reference = reference.into();
        self
    }

    /// Builder method: set the rate
    pub fn rate(mut self, amount: f64) -> Self {
        self.rate_amount = Some(amount);
        self
    }

    /// Builder method: set the commodity
    pub fn commodity(mut self, commodity: impl Into<String>) -> Self {
        self.commodity = commodity.into();
        self
    }

    /// Builder method: set the creation timestamp
    pub fn created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = created_at.into();
        self
    }

    /// Builder method: set the status
    pub fn status(mut self, status: LoadStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder method: replace `raw_data` with a document holding these stops
    pub fn stops(mut self, stops: Vec<Stop>) -> Self {
        self.raw_data = serde_json::json!({ "stops": stops });
        self
    }

    /// Stops listed in `raw_data.stops`, in document order
    ///
    /// Missing or malformed documents yield no stops; elements that are not
    /// objects read as empty stops so positions stay aligned.
    pub fn route_stops(&self) -> Vec<Stop> {
        self.raw_data
            .get("stops")
            .and_then(|s| s.as_array())
            .map(|stops| stops.iter().map(Stop::from_value).collect())
            .unwrap_or_default()
    }

    /// Rate counted towards revenue; absent amounts count as zero
    pub fn rate_or_zero(&self) -> f64 {
        self.rate_amount.unwrap_or(0.0)
    }

    /// The three mutable fields as an update payload
    pub fn patch(&self) -> LoadPatch {
        LoadPatch {
            rate_amount: self.rate_amount,
            load_reference: self.load_reference.clone(),
            commodity: self.commodity.clone(),
        }
    }
}

/// A route waypoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stop {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Stop {
    pub fn new(city: impl Into<String>, state: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            city: Some(city.into()),
            state: Some(state.into()),
            date: Some(date.into()),
        }
    }

    fn from_value(value: &serde_json::Value) -> Self {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        };

        Self {
            city: field("city"),
            state: field("state"),
            date: field("date"),
        }
    }
}

/// Pipeline status of a load
///
/// Only the pushed state is distinguished; every other value the pipeline
/// writes is shown as still processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum LoadStatus {
    /// The load was pushed to the transport management system
    PushedToTms,
    /// Any other pipeline value, kept verbatim
    Processing(String),
}

impl LoadStatus {
    /// Whether the load reached its terminal state
    pub fn is_synced(&self) -> bool {
        matches!(self, LoadStatus::PushedToTms)
    }

    /// Label shown on the load card
    pub fn label(&self) -> &'static str {
        if self.is_synced() {
            "Synced to TMS"
        } else {
            "Processing"
        }
    }

    /// Style class for the status dot
    pub fn css_class(&self) -> &'static str {
        if self.is_synced() {
            "success"
        } else {
            "pending"
        }
    }

    /// The raw status string as stored
    pub fn as_str(&self) -> &str {
        match self {
            LoadStatus::PushedToTms => PUSHED_TO_TMS,
            LoadStatus::Processing(raw) => raw,
        }
    }
}

impl Default for LoadStatus {
    fn default() -> Self {
        LoadStatus::Processing(String::new())
    }
}

impl From<Option<String>> for LoadStatus {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) if s == PUSHED_TO_TMS => LoadStatus::PushedToTms,
            Some(s) => LoadStatus::Processing(s),
            None => LoadStatus::default(),
        }
    }
}

impl From<LoadStatus> for String {
    fn from(status: LoadStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Partial update of the three user-editable fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadPatch {
    pub rate_amount: Option<f64>,
    pub load_reference: String,
    pub commodity: String,
}

/// Treat JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a text or numeric key; PostgREST sends `bigint` ids as numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, got {}",
            other
        ))),
    }
}
