// Copyright (c) 2024-2025 Jesse Morgan
// Licensed under the MIT License. See LICENSE file for details.

//! Canonical wire types shared by the API client, the CLI and the exporters.
//!
//! Field names follow the backend's camelCase JSON. Every read model is lenient:
//! missing fields fall back to `Default`, and numeric fields that older backend
//! revisions sent as strings are accepted too.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Placeholder shown for any missing text field.
pub const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// TEAMS
// ============================================================================

/// A work group ("team", called "module" in older revisions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub num_persons: i64,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub load_days: Option<f64>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub total_days: Option<f64>,
}

/// Maximum value of the remaining-days gauge on the team dashboard.
pub const GAUGE_MAX_DAYS: f64 = 5.0;

/// Load classification used to colour the team dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadLevel {
    /// Less than half a day of work left
    Critical,
    /// Less than a full day left
    Low,
    /// Up to a week of work queued
    OnTrack,
    /// More than a week queued
    Overloaded,
}

impl LoadLevel {
    pub fn from_days(load_days: f64) -> Self {
        if load_days <= 0.49 {
            LoadLevel::Critical
        } else if load_days <= 0.99 {
            LoadLevel::Low
        } else if load_days <= 7.0 {
            LoadLevel::OnTrack
        } else {
            LoadLevel::Overloaded
        }
    }
}

impl std::fmt::Display for LoadLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadLevel::Critical => write!(f, "CRITICAL"),
            LoadLevel::Low => write!(f, "LOW"),
            LoadLevel::OnTrack => write!(f, "ON TRACK"),
            LoadLevel::Overloaded => write!(f, "OVERLOADED"),
        }
    }
}

impl Team {
    pub fn load_level(&self) -> LoadLevel {
        LoadLevel::from_days(self.load_days.unwrap_or(0.0))
    }

    /// Remaining load days clamped to the gauge range `0..=5`.
    pub fn gauge_value(&self) -> f64 {
        self.load_days.unwrap_or(0.0).clamp(0.0, GAUGE_MAX_DAYS)
    }
}

/// A team reference embedded in a product: either the full object or, in
/// older payloads, just its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeamRef {
    Team(Team),
    Name(String),
}

impl TeamRef {
    pub fn name(&self) -> &str {
        match self {
            TeamRef::Team(team) if team.name.is_empty() => NOT_AVAILABLE,
            TeamRef::Team(team) => &team.name,
            TeamRef::Name(name) => name,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            TeamRef::Team(team) => Some(team.id),
            TeamRef::Name(_) => None,
        }
    }
}

// ============================================================================
// PRODUCTS
// ============================================================================

/// A product line of a production order, as returned by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub assigned_date: Option<String>,
    pub plant_entry_date: Option<String>,
    pub reference: Option<String>,
    pub brand: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub op: Option<String>,
    pub campaign: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub size: Option<String>,
    pub module: Option<TeamRef>,
    pub team: Option<TeamRef>,
    pub status: Option<String>,
    pub size_quantities: Option<BTreeMap<String, i64>>,
    pub stoppage_reason: Option<String>,
    pub actual_delivery_date: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub sam: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub cycle_calculated: Option<String>,
    pub quantity_made: Option<i64>,
    pub missing: Option<i64>,
    pub quantity_pending: Option<i64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub delivery_percentage: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub load_days: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_load_days: Option<f64>,
    pub num_persons: Option<i64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub sam_total: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub total_price: Option<f64>,
}

impl Product {
    /// The assigned team, whichever of `module` / `team` the backend filled.
    pub fn assigned_team(&self) -> Option<&TeamRef> {
        self.module.as_ref().or(self.team.as_ref())
    }

    pub fn team_name(&self) -> String {
        self.assigned_team()
            .map(|t| t.name().to_string())
            .unwrap_or_else(|| "Unassigned".to_string())
    }

    pub fn op_label(&self) -> &str {
        self.op.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// Fill every missing display field so downstream rendering never has to
    /// care about absent values.
    pub fn normalized(mut self) -> Self {
        fn text(field: &mut Option<String>, fallback: &str) {
            if field.as_deref().map_or(true, |s| s.trim().is_empty()) {
                *field = Some(fallback.to_string());
            }
        }

        text(&mut self.reference, NOT_AVAILABLE);
        text(&mut self.brand, NOT_AVAILABLE);
        text(&mut self.op, NOT_AVAILABLE);
        text(&mut self.campaign, NOT_AVAILABLE);
        text(&mut self.product_type, NOT_AVAILABLE);
        text(&mut self.description, "No description");
        text(&mut self.stoppage_reason, NOT_AVAILABLE);
        text(&mut self.status, NOT_AVAILABLE);

        self.price.get_or_insert(0.0);
        self.quantity.get_or_insert(0);
        self.cycle_calculated.get_or_insert_with(|| "0".to_string());
        self.quantity_made.get_or_insert(0);
        self.missing.get_or_insert(0);
        self.delivery_percentage.get_or_insert(0.0);
        self.sam.get_or_insert(0.0);
        self.sam_total.get_or_insert(0.0);
        self.load_days.get_or_insert(0.0);
        self.size_quantities.get_or_insert_with(BTreeMap::new);

        if self.num_persons.is_none() {
            self.num_persons = match self.assigned_team() {
                Some(TeamRef::Team(team)) => Some(team.num_persons),
                _ => Some(0),
            };
        }
        self
    }
}

/// Progress fields only sent when editing an existing product.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductProgress {
    pub stoppage_reason: Option<String>,
    pub status: Option<String>,
    pub actual_delivery_date: Option<String>,
    pub quantity_made: i64,
}

/// Body of `POST /products` and `PUT /products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub description: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub assigned_date: String,
    pub plant_entry_date: String,
    pub reference: String,
    pub brand: String,
    pub op: String,
    pub campaign: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub size_quantities: BTreeMap<String, i64>,
    /// Legacy free-text size field, always sent empty.
    pub size: String,
    pub module: Team,
    pub sam: f64,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProductProgress>,
}

/// Body of `POST /teams` and `PUT /teams/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub num_persons: i64,
}

// ============================================================================
// USERS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    FullAccess,
    Recipient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::FullAccess => "FULL_ACCESS",
            Role::Recipient => "RECIPIENT",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::FullAccess => "Full Access",
            Role::Recipient => "Recipient",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['-', ' '], "_").as_str() {
            "USER" => Ok(Role::User),
            "FULL_ACCESS" => Ok(Role::FullAccess),
            "RECIPIENT" => Ok(Role::Recipient),
            other => Err(format!("unknown role '{}' (expected USER, FULL_ACCESS or RECIPIENT)", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Option<Role>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Body of `POST /users` and `PUT /users/{id}`. `password` is omitted on
/// update when the user did not type a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

// ============================================================================
// REPORT SCHEDULES
// ============================================================================

/// A scheduled e-mail delivery of the production report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSchedule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "fechaEnvio")]
    pub send_date: String,
    #[serde(rename = "horaEnvio")]
    pub send_time: String,
    #[serde(rename = "emailDestinatario")]
    pub recipient_email: String,
    #[serde(rename = "fechaCreacion", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// ============================================================================
// LENIENT DESERIALIZERS
// ============================================================================

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
