use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::warn;

use super::domain::{ProposalAttachment, RegistrationFields, SubmissionResult};
use super::service::RegistrationService;
use super::sink::SubmissionSink;
use super::validation::field;

/// Room for the text fields and multipart framing on top of the largest accepted file.
const FORM_OVERHEAD_BYTES: usize = 2 * 1024 * 1024;

/// Router exposing the registration form endpoint.
pub fn registration_router<S>(service: Arc<RegistrationService<S>>) -> Router
where
    S: SubmissionSink + 'static,
{
    let max_attachment = service.validator().policy().max_bytes();
    let body_limit = usize::try_from(max_attachment)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/api/v1/registrations", post(submit_handler::<S>))
        .route("/api/v1/registrations/status", get(status_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<RegistrationService<S>>>,
    multipart: Multipart,
) -> Response
where
    S: SubmissionSink + 'static,
{
    let fields = match read_registration_form(multipart).await {
        Ok(fields) => fields,
        Err(err) => {
            warn!(error = %err, "unreadable registration form");
            let payload = json!({
                "outcome": "rejected",
                "message": format!("The registration form could not be read: {}", err.body_text()),
            });
            return (err.status(), Json(payload)).into_response();
        }
    };

    let result = service.submit(fields).await;
    (result_status(&result), Json(result)).into_response()
}

pub(crate) async fn status_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Registration API is running",
    }))
}

pub(crate) fn result_status(result: &SubmissionResult) -> StatusCode {
    if result.is_accepted() {
        StatusCode::OK
    } else if !result.field_errors.is_empty() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_GATEWAY
    }
}

/// Map the form's multipart fields onto [`RegistrationFields`]. Unknown fields are ignored.
pub async fn read_registration_form(
    mut multipart: Multipart,
) -> Result<RegistrationFields, MultipartError> {
    let mut fields = RegistrationFields::default();

    while let Some(part) = multipart.next_field().await? {
        let Some(name) = part.name().map(str::to_string) else {
            continue;
        };

        if name == field::PROPOSAL {
            let file_name = part.file_name().unwrap_or_default().to_string();
            let media_type = part.content_type().unwrap_or_default().to_string();
            let bytes = part.bytes().await?;
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            fields.proposal = Some(ProposalAttachment::new(file_name, media_type, bytes.to_vec()));
            continue;
        }

        let value = part.text().await?;
        match name.as_str() {
            field::TEAM_NAME => fields.team_name = value,
            field::LEAD_NAME => fields.lead_name = value,
            field::LEAD_PHONE => fields.lead_phone = value,
            field::COLLEGE_NAME => fields.college_name = value,
            field::HACKATHON_DOMAIN => fields.hackathon_domain = value,
            other => {
                for (index, (name_field, id_field)) in field::MEMBERS.iter().enumerate() {
                    if other == *name_field {
                        fields.members[index].name = value.clone();
                    } else if other == *id_field {
                        fields.members[index].identifier = value.clone();
                    }
                }
            }
        }
    }

    Ok(fields)
}
