//! Medicine endpoints.
//!
//! - `POST /addMedicine`: validate and store one record
//! - `GET /getMedicines`: caller's records, optionally filtered

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::Method;
use axum::Extension;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{
    AddMedicineResponse, ApiContext, CallerContext, ListMedicinesQuery, ListMedicinesResponse,
};
use crate::identity::Identity;
use crate::medicines;
use crate::models::{MedicineFilter, MedicineRecord};

fn owner(caller: CallerContext) -> Identity {
    Identity {
        user_id: caller.user_id,
    }
}

/// `POST /addMedicine`
pub async fn add(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<MedicineRecord>, JsonRejection>,
) -> Result<Json<AddMedicineResponse>, ApiError> {
    let Json(record) = payload.map_err(|e| ApiError::MalformedPayload(e.body_text()))?;

    let outcome = medicines::submit_medicine(ctx.store.as_ref(), &owner(caller), record)?;

    Ok(Json(AddMedicineResponse {
        success: true,
        medicine_id: outcome.medicine_id,
        message: outcome.message,
    }))
}

/// `GET /getMedicines?active=&name=&category=`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<CallerContext>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListMedicinesResponse>, ApiError> {
    let Query(pairs) = query.map_err(|e| ApiError::MalformedQuery(e.body_text()))?;
    let query = ListMedicinesQuery::from_pairs(pairs);
    let filter = MedicineFilter::from_query(
        query.active.as_deref(),
        query.name.as_deref(),
        query.category.as_deref(),
    );

    let data = medicines::list_medicines(ctx.store.as_ref(), &owner(caller), &filter)?;

    Ok(Json(ListMedicinesResponse {
        success: true,
        data,
    }))
}

/// Fallback for any other method on `/addMedicine`.
pub async fn allow_post(method: Method) -> ApiError {
    ApiError::MethodNotAllowed {
        method,
        allow: Method::POST,
    }
}

/// Fallback for any other method on `/getMedicines`.
pub async fn allow_get(method: Method) -> ApiError {
    ApiError::MethodNotAllowed {
        method,
        allow: Method::GET,
    }
}
