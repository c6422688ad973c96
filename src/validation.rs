//! Medicine record validation.
//!
//! One rule set, used by the HTTP boundary (authoritative) and by the
//! `medbook validate` command (client-side check before submitting).
//! Every rule runs; errors accumulate so a caller can fix all fields in one
//! round trip. Missing nested objects are treated as absent and their rules
//! are skipped.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::Serialize;

use crate::models::{
    CustomTime, Dosage, Duration, FoodRelation, MedicineRecord, Recurrence, RecurrencePattern,
    FIRST_DAY_OF_MONTH, LAST_DAY_OF_MONTH,
};

pub const FIELD_MEDICINE_NAME: &str = "medicineName";
pub const FIELD_DURATION: &str = "duration";
pub const FIELD_RECURRENCE: &str = "recurrence";
pub const FIELD_SPECIFIC_DAYS: &str = "specificDays";
pub const FIELD_SPECIFIC_DATES: &str = "specificDates";
pub const FIELD_DOSAGE: &str = "dosage";

/// Field name → human-readable message. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(transparent)]
#[error("Validation failed ({} invalid field(s))", .0.len())]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    /// Record a message for `field` unless one is already present.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Validate a candidate record. Total: always returns an error set.
pub fn validate(record: &MedicineRecord) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    // 1. Name
    check_name(record, &mut errors);

    // 2. Course length
    if let Some(duration) = &record.duration {
        check_duration(duration, &mut errors);
    }

    // 3. Recurrence
    if let Some(recurrence) = &record.recurrence {
        check_recurrence(recurrence, &mut errors);
    }

    // 4. Dosing times
    if let Some(dosage) = &record.dosage {
        check_dosage(dosage, &mut errors);
    }

    errors
}

/// `validate` as a `Result`, for `?` at call sites.
pub fn validate_medicine(record: &MedicineRecord) -> Result<(), ValidationErrors> {
    validate(record).into_result()
}

fn check_name(record: &MedicineRecord, errors: &mut ValidationErrors) {
    let blank = record
        .medicine_name
        .as_deref()
        .map_or(true, |name| name.trim().is_empty());
    if blank {
        errors.add(FIELD_MEDICINE_NAME, "Medicine name is required");
    }
}

fn check_duration(duration: &Duration, errors: &mut ValidationErrors) {
    if duration.is_lifelong() {
        return;
    }
    if !duration.value.as_ref().is_some_and(|v| v.is_positive()) {
        errors.add(FIELD_DURATION, "Please enter a valid duration");
    }
    if duration.kind.as_ref().is_some_and(|k| !k.is_recognized()) {
        errors.add(FIELD_DURATION, "Please select a valid duration type");
    }
}

fn check_recurrence(recurrence: &Recurrence, errors: &mut ValidationErrors) {
    match &recurrence.pattern {
        Some(RecurrencePattern::Custom) => {
            if !recurrence.interval.as_ref().is_some_and(|v| v.is_positive()) {
                errors.add(FIELD_RECURRENCE, "Please enter a valid interval");
            }
        }
        Some(RecurrencePattern::SpecificDays) => {
            if recurrence.specific_days.as_ref().map_or(true, Vec::is_empty) {
                errors.add(FIELD_SPECIFIC_DAYS, "Please select at least one day of the week");
            }
        }
        Some(RecurrencePattern::SpecificDates) => {
            if recurrence.specific_dates.as_ref().map_or(true, Vec::is_empty) {
                errors.add(
                    FIELD_SPECIFIC_DATES,
                    "Please select at least one date of the month",
                );
            }
        }
        Some(pattern) if !pattern.is_recognized() => {
            errors.add(FIELD_RECURRENCE, "Please select a valid recurrence pattern");
        }
        _ => {}
    }

    let days = recurrence.specific_days.as_deref().unwrap_or_default();
    if days.iter().any(|d| !d.is_recognized()) {
        errors.add(FIELD_SPECIFIC_DAYS, "Please select valid days of the week");
    }

    let dates = recurrence.specific_dates.as_deref().unwrap_or_default();
    if dates
        .iter()
        .any(|d| !(FIRST_DAY_OF_MONTH..=LAST_DAY_OF_MONTH).contains(d))
    {
        errors.add(
            FIELD_SPECIFIC_DATES,
            format!("Dates of the month must be between {FIRST_DAY_OF_MONTH} and {LAST_DAY_OF_MONTH}"),
        );
    }
}

fn check_dosage(dosage: &Dosage, errors: &mut ValidationErrors) {
    if !dosage.has_any_time() {
        errors.add(FIELD_DOSAGE, "Please select at least one time to take the medicine");
        return;
    }

    let bad_slot = dosage
        .slots()
        .into_iter()
        .flatten()
        .any(|slot| slot.enabled && !food_relation_ok(slot.food_relation.as_ref()));
    let bad_custom = dosage
        .custom_times()
        .iter()
        .any(|t| !food_relation_ok(t.food_relation.as_ref()));
    if bad_slot || bad_custom {
        errors.add(FIELD_DOSAGE, "Please choose a valid food relation");
    }

    if let Some(bad) = dosage.custom_times().iter().find(|t| !is_clock_time(t)) {
        errors.add(
            FIELD_DOSAGE,
            format!("Custom time \"{}\" must be in HH:MM format", bad.time),
        );
    }
}

/// A missing relation is accepted; a present one must be in the set.
fn food_relation_ok(relation: Option<&FoodRelation>) -> bool {
    relation.map_or(true, FoodRelation::is_recognized)
}

/// Strict 24-hour `HH:MM`.
fn is_clock_time(custom: &CustomTime) -> bool {
    custom.time.len() == 5 && NaiveTime::parse_from_str(&custom.time, "%H:%M").is_ok()
}
