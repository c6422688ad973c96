//! Submit/list pipeline: validate, stamp, persist.
//!
//! Authentication happens before these functions are called; they take the
//! verified [`Identity`] and never trust owner fields from the payload.

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::db::{MedicineStore, StoreError};
use crate::identity::Identity;
use crate::models::{MedicineFilter, MedicineRecord, NewMedicine, StoredMedicine};
use crate::validation::{validate_medicine, ValidationErrors};

pub const SAVED_MESSAGE: &str = "Medicine details saved successfully!";

#[derive(Error, Debug)]
pub enum MedicineError {
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub medicine_id: String,
    pub message: &'static str,
}

/// Creation timestamp: RFC 3339, UTC, millisecond precision.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Validate `record` and store it under `owner`. Nothing is written when
/// validation fails.
pub fn submit_medicine(
    store: &dyn MedicineStore,
    owner: &Identity,
    mut record: MedicineRecord,
) -> Result<SubmitOutcome, MedicineError> {
    record.strip_server_fields();
    validate_medicine(&record)?;

    let medicine = NewMedicine {
        user_id: owner.user_id.clone(),
        created_at: timestamp_now(),
        record,
    };
    let medicine_id = store.insert_medicine(&medicine)?;
    tracing::info!(user = %owner.user_id, medicine_id = %medicine_id, "Medicine saved");

    Ok(SubmitOutcome {
        medicine_id,
        message: SAVED_MESSAGE,
    })
}

/// The caller's own medicines matching `filter`.
pub fn list_medicines(
    store: &dyn MedicineStore,
    owner: &Identity,
    filter: &MedicineFilter,
) -> Result<Vec<StoredMedicine>, MedicineError> {
    Ok(store.list_medicines(&owner.user_id, filter)?)
}
