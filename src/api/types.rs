//! Shared types for the HTTP layer.

use std::sync::Arc;

use serde::Serialize;

use crate::db::MedicineStore;
use crate::identity::IdentityProvider;
use crate::models::StoredMedicine;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn MedicineStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl ApiContext {
    pub fn new(store: Arc<dyn MedicineStore>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }
}

/// Authenticated caller, injected into request extensions by the auth
/// middleware after the bearer token verifies.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMedicineResponse {
    pub success: bool,
    pub medicine_id: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ListMedicinesResponse {
    pub success: bool,
    pub data: Vec<StoredMedicine>,
}

/// Raw `GET /getMedicines` query. Values are interpreted by
/// `MedicineFilter::from_query`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListMedicinesQuery {
    pub active: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
}

impl ListMedicinesQuery {
    /// Pick the filter keys out of decoded query pairs. A repeated key keeps
    /// its first value; unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "active" => &mut query.active,
                "name" => &mut query.name,
                "category" => &mut query.category,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}
