use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use nomadgate_application::{AdmissionRequest, Rejection};
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::{AdmissionResponse, AdmitJobRequest};
use crate::error::{RejectionResponse, rejection_status};
use crate::middleware::bearer_token;
use crate::state::AppState;

pub async fn admit_job_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AdmitJobRequest>,
) -> Response {
    let admission_id = Uuid::new_v4().to_string();
    let role_name = payload.role_name;

    let token = payload
        .token
        .filter(|token| !token.trim().is_empty())
        .or_else(|| bearer_token(&headers).map(str::to_owned));

    let outcome = match token {
        Some(token) => {
            state
                .admission_service
                .admit(AdmissionRequest {
                    role_name: role_name.clone(),
                    token,
                    job_description: payload.job_description,
                })
                .await
        }
        None => Err(Rejection::InvalidToken {
            reason: "no token in body or Authorization header".to_owned(),
        }),
    };

    match outcome {
        Ok(dispatch) => {
            info!(%admission_id, %role_name, outcome = "admitted", "job admitted");
            Json(AdmissionResponse {
                admission_id,
                dispatch,
            })
            .into_response()
        }
        Err(rejection) => {
            warn!(
                %admission_id,
                %role_name,
                outcome = "rejected",
                stage = rejection.stage().as_str(),
                path = rejection.path().map(|path| path.as_str()),
                reason = rejection.reason(),
                "job rejected"
            );
            (
                rejection_status(&rejection),
                Json(RejectionResponse::new(&rejection, Some(admission_id))),
            )
                .into_response()
        }
    }
}
