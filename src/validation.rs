// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Form validation for products, teams, users and report filters.
//!
//! Every form collects all problems at once and returns them as
//! [`ValidationErrors`]; a form that passes is turned straight into the
//! payload sent to the backend.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::dates;
use crate::sizes::SizeSheet;
use crate::types::{
    ProductPayload, ProductProgress, ReportSchedule, Role, Team, TeamPayload, User, UserPayload,
};

/// Minimum password length for user accounts.
pub const MIN_PASSWORD_LEN: usize = 7;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
});
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("username regex is valid"));
static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("integer regex is valid"));
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("decimal regex is valid"));

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All problems found in a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", self.render())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError { field, message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }

    fn render(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn none_if_blank(s: &str) -> Option<String> {
    if blank(s) {
        None
    } else {
        Some(s.trim().to_string())
    }
}

// ============================================================================
// NUMERIC INPUT
// ============================================================================

/// Whether `input` is a plain non-negative number: digits only, or digits with
/// one decimal part when `allow_decimal` is set.
pub fn is_numeric(input: &str, allow_decimal: bool) -> bool {
    if allow_decimal {
        DECIMAL_RE.is_match(input)
    } else {
        INTEGER_RE.is_match(input)
    }
}

/// clap value parser for whole-number arguments (OP numbers, quantities, ids).
pub fn parse_whole_number(input: &str) -> Result<i64, String> {
    let input = input.trim();
    if !is_numeric(input, false) {
        return Err("please enter digits only".to_string());
    }
    input.parse::<i64>().map_err(|e| e.to_string())
}

/// clap value parser for decimal arguments (price, SAM).
pub fn parse_decimal(input: &str) -> Result<f64, String> {
    let input = input.trim();
    if !is_numeric(input, true) {
        return Err("please enter digits with at most one decimal point".to_string());
    }
    input.parse::<f64>().map_err(|e| e.to_string())
}

// ============================================================================
// PRODUCTS
// ============================================================================

/// Product form as filled in by `products add` / `products edit`.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub description: String,
    pub price: Option<f64>,
    pub assigned_date: String,
    pub plant_entry_date: String,
    pub reference: String,
    pub brand: String,
    pub op: String,
    pub campaign: String,
    pub product_type: String,
    pub team: Option<Team>,
    pub sam: Option<f64>,
    pub sizes: SizeSheet,
    pub stoppage_reason: String,
    pub status: String,
    pub actual_delivery_date: String,
    pub quantity_made: i64,
}

impl ProductForm {
    fn check_required(&self, errors: &mut ValidationErrors) {
        for (field, value) in [
            ("reference", &self.reference),
            ("assigned_date", &self.assigned_date),
            ("plant_entry_date", &self.plant_entry_date),
            ("brand", &self.brand),
            ("op", &self.op),
            ("campaign", &self.campaign),
            ("type", &self.product_type),
        ] {
            if blank(value) {
                errors.push(field, "is required");
            }
        }
        if self.team.is_none() {
            errors.push("team", "select a team");
        }
        if !self.sizes.has_selection() {
            errors.push("sizes", "enter a quantity for at least one size");
        }
        if !self.price.is_some_and(|p| p > 0.0) {
            errors.push("price", "must be greater than 0");
        }
        if !self.sam.is_some_and(|s| s > 0.0) {
            errors.push("sam", "must be greater than 0");
        }
    }

    fn check_dates(&self, errors: &mut ValidationErrors) -> Option<(NaiveDate, NaiveDate)> {
        if blank(&self.assigned_date) || blank(&self.plant_entry_date) {
            return None;
        }
        let assigned = dates::parse_date(&self.assigned_date);
        let entry = dates::parse_date(&self.plant_entry_date);
        if assigned.is_none() {
            errors.push("assigned_date", "is not a valid date");
        }
        if entry.is_none() {
            errors.push("plant_entry_date", "is not a valid date");
        }
        assigned.zip(entry)
    }

    fn payload(&self, id: Option<i64>, progress: Option<ProductProgress>) -> ProductPayload {
        ProductPayload {
            id,
            description: none_if_blank(&self.description),
            price: self.price.unwrap_or_default(),
            quantity: self.sizes.total(),
            assigned_date: dates::format_for_backend(Some(&self.assigned_date)).unwrap_or_default(),
            plant_entry_date: dates::format_for_backend(Some(&self.plant_entry_date))
                .unwrap_or_default(),
            reference: self.reference.trim().to_string(),
            brand: self.brand.trim().to_string(),
            op: self.op.trim().to_string(),
            campaign: self.campaign.trim().to_string(),
            product_type: self.product_type.trim().to_string(),
            size_quantities: self.sizes.to_quantities(),
            size: String::new(),
            module: self.team.clone().unwrap_or_default(),
            sam: self.sam.unwrap_or_default(),
            progress,
        }
    }

    /// Validate a new product. The plant entry date may not precede the
    /// assigned date.
    pub fn validate_new(&self) -> Result<ProductPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check_required(&mut errors);
        if let Some((assigned, entry)) = self.check_dates(&mut errors) {
            if entry < assigned {
                errors.push("plant_entry_date", "cannot be earlier than the assigned date");
            }
        }
        errors.into_result(|| self.payload(None, None))
    }

    /// Validate an edit of product `id`. Progress fields are sent too, with
    /// blank strings turned into nulls.
    pub fn validate_update(&self, id: i64) -> Result<ProductPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.check_required(&mut errors);
        self.check_dates(&mut errors);
        if !blank(&self.actual_delivery_date) && !dates::is_valid_date(&self.actual_delivery_date) {
            errors.push("actual_delivery_date", "is not a valid date");
        }
        if self.quantity_made < 0 {
            errors.push("quantity_made", "cannot be negative");
        }
        errors.into_result(|| {
            let progress = ProductProgress {
                stoppage_reason: none_if_blank(&self.stoppage_reason),
                status: none_if_blank(&self.status),
                actual_delivery_date: dates::format_for_backend(Some(&self.actual_delivery_date)),
                quantity_made: self.quantity_made,
            };
            self.payload(Some(id), Some(progress))
        })
    }
}

// ============================================================================
// TEAMS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct TeamForm {
    pub name: String,
    pub description: String,
    pub num_persons: i64,
}

impl TeamForm {
    pub fn validate(&self, id: Option<i64>) -> Result<TeamPayload, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if blank(&self.name) {
            errors.push("name", "is required");
        }
        if self.num_persons <= 0 {
            errors.push("num_persons", "must be greater than 0");
        }
        errors.into_result(|| TeamPayload {
            id,
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            num_persons: self.num_persons,
        })
    }
}

// ============================================================================
// USERS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct UserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Only checked when editing with a new password.
    pub confirm_password: Option<String>,
    pub role: Option<Role>,
}

impl UserForm {
    fn check_identity(&self, others: &[&User], errors: &mut ValidationErrors) {
        if blank(&self.name) {
            errors.push("name", "is required");
        } else if !USERNAME_RE.is_match(&self.name) {
            errors.push(
                "name",
                "may only contain letters, digits and underscores (no spaces or special characters)",
            );
        } else if others.iter().any(|u| u.name.eq_ignore_ascii_case(&self.name)) {
            errors.push("name", "is already taken");
        }

        if blank(&self.email) {
            errors.push("email", "is required");
        } else if !EMAIL_RE.is_match(&self.email) {
            errors.push("email", "is not valid, expected name@domain.com");
        } else if others.iter().any(|u| u.email.eq_ignore_ascii_case(&self.email)) {
            errors.push("email", "is already registered");
        }
    }

    fn check_password_length(&self, errors: &mut ValidationErrors) {
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(
                "password",
                format!("must be at least {} characters", MIN_PASSWORD_LEN),
            );
        }
    }

    /// Validate a new account against the users that already exist.
    pub fn validate_new(&self, existing: &[User]) -> Result<UserPayload, ValidationErrors> {
        let others: Vec<&User> = existing.iter().collect();
        let mut errors = ValidationErrors::new();
        self.check_identity(&others, &mut errors);
        self.check_password_length(&mut errors);
        errors.into_result(|| UserPayload {
            name: self.name.clone(),
            email: self.email.clone(),
            password: Some(self.password.clone()),
            role: self.role,
        })
    }

    /// Validate an edit of user `id`. The user being edited is excluded from
    /// the uniqueness checks; an empty password keeps the current one.
    pub fn validate_update(&self, id: i64, existing: &[User]) -> Result<UserPayload, ValidationErrors> {
        let others: Vec<&User> = existing.iter().filter(|u| u.id != id).collect();
        let mut errors = ValidationErrors::new();
        self.check_identity(&others, &mut errors);
        let changing_password = !self.password.is_empty();
        if changing_password {
            self.check_password_length(&mut errors);
            if self.confirm_password.as_deref() != Some(self.password.as_str()) {
                errors.push("confirm_password", "passwords do not match");
            }
        }
        errors.into_result(|| UserPayload {
            name: self.name.clone(),
            email: self.email.clone(),
            password: changing_password.then(|| self.password.clone()),
            role: Some(self.role.unwrap_or_default()),
        })
    }
}

/// Refuse to delete the account that is currently logged in.
pub fn check_user_deletable(target_id: i64, current_user_id: Option<i64>) -> Result<(), ValidationErrors> {
    if current_user_id == Some(target_id) {
        return Err(ValidationErrors::single(
            "user",
            "you cannot delete your own account while logged in",
        ));
    }
    Ok(())
}

// ============================================================================
// REPORT FILTERS
// ============================================================================

/// Both ends are required and the start may not be after the end.
pub fn validate_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), ValidationErrors> {
    let (Some(start), Some(end)) = (start.filter(|s| !blank(s)), end.filter(|s| !blank(s))) else {
        return Err(ValidationErrors::single("dates", "select both a start and an end date"));
    };
    let mut errors = ValidationErrors::new();
    let start_date = dates::parse_date(start);
    let end_date = dates::parse_date(end);
    if start_date.is_none() {
        errors.push("start", "is not a valid date");
    }
    if end_date.is_none() {
        errors.push("end", "is not a valid date");
    }
    if let (Some(s), Some(e)) = (start_date, end_date) {
        if s > e {
            errors.push("start", "cannot be after the end date");
        }
    }
    errors.into_result(|| (start_date.unwrap_or_default(), end_date.unwrap_or_default()))
}

/// E-mail delivery of the production report.
#[derive(Debug, Clone, Default)]
pub struct ScheduleForm {
    pub send_date: String,
    pub send_time: String,
    pub recipient_email: String,
}

impl ScheduleForm {
    pub fn validate(&self, id: Option<i64>) -> Result<ReportSchedule, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let date = dates::format_for_backend(Some(&self.send_date));
        if date.is_none() {
            errors.push("date", "is not a valid date");
        }
        let time = NaiveTime::parse_from_str(self.send_time.trim(), "%H:%M").ok();
        if time.is_none() {
            errors.push("time", "expected HH:MM (24h)");
        }
        if !EMAIL_RE.is_match(self.recipient_email.trim()) {
            errors.push("email", "is not valid, expected name@domain.com");
        }
        errors.into_result(|| ReportSchedule {
            id,
            send_date: date.unwrap_or_default(),
            send_time: time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
            recipient_email: self.recipient_email.trim().to_string(),
            created_at: None,
        })
    }
}
