use std::sync::Arc;

use tracing::info;

use super::domain::{RegistrationFields, RegistrationRequest, RequestId, SubmissionResult};
use super::memory::REGISTERED_MESSAGE;
use super::payload::RoutingTargets;
use super::sink::SubmissionSink;
use super::transport::{Delivery, SubmissionTransport, TransportFailure};
use super::validation::{AttachmentPolicy, SubmissionValidator, ValidationErrors};
use crate::config::RegistrationSettings;

pub const RETRY_MESSAGE: &str = "We could not confirm your registration right now. Please try again in a few moments; resubmitting the same details is safe.";
pub const ENCODING_MESSAGE: &str = "Your proposal file could not be processed. Please try again with the same or a different PDF.";

/// Copy shown to teams once a registration is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub event_name: String,
    pub follow_up_link: Option<String>,
}

impl Announcement {
    fn acknowledgement(&self, team_name: &str, remote_message: Option<&str>) -> String {
        let mut message = format!(
            "Congratulations {team_name}! Your registration for {} is successful.",
            self.event_name
        );

        if let Some(remote) = remote_message
            .map(str::trim)
            .filter(|remote| !remote.is_empty() && *remote != REGISTERED_MESSAGE)
        {
            message.push_str("\n\n");
            message.push_str(remote);
        }

        if self.follow_up_link.is_some() {
            message.push_str(
                "\n\nJoin the community group for important updates and to meet other participants.",
            );
        }
        message
    }
}

/// Entry point for the presentation layer: validate, mint a request id, deliver, and
/// translate every outcome into a [`SubmissionResult`].
#[derive(Debug)]
pub struct RegistrationService<S> {
    validator: SubmissionValidator,
    transport: SubmissionTransport<S>,
    announcement: Announcement,
}

impl<S> RegistrationService<S>
where
    S: SubmissionSink + 'static,
{
    pub fn new(sink: Arc<S>, settings: &RegistrationSettings) -> Self {
        let routing = RoutingTargets {
            sheet_id: settings.sheet_id.clone(),
            folder_id: settings.drive_folder_id.clone(),
        };
        let transport =
            SubmissionTransport::new(sink, routing).with_fallback(settings.fallback_enabled);
        let announcement = Announcement {
            event_name: settings.event_name.clone(),
            follow_up_link: settings.follow_up_link.clone(),
        };

        Self::with_parts(
            SubmissionValidator::with_policy(AttachmentPolicy::new(settings.max_attachment_bytes)),
            transport,
            announcement,
        )
    }

    pub fn with_parts(
        validator: SubmissionValidator,
        transport: SubmissionTransport<S>,
        announcement: Announcement,
    ) -> Self {
        Self {
            validator,
            transport,
            announcement,
        }
    }

    pub fn validator(&self) -> &SubmissionValidator {
        &self.validator
    }

    pub fn transport(&self) -> &SubmissionTransport<S> {
        &self.transport
    }

    /// Handle one user-initiated submit. A fresh request id is minted here and nowhere else.
    pub async fn submit(&self, fields: RegistrationFields) -> SubmissionResult {
        let validated = match self.validator.validate(fields) {
            Ok(validated) => validated,
            Err(errors) => {
                info!(fields = errors.len(), "registration failed validation");
                return invalid_result(&errors);
            }
        };

        let request = validated.with_request_id(RequestId::generate());
        self.submit_request(&request).await
    }

    /// Deliver a request that already passed validation.
    pub async fn submit_request(&self, request: &RegistrationRequest) -> SubmissionResult {
        info!(request_id = %request.request_id, team = %request.team_name, "submitting registration");

        match self.transport.send(request).await {
            Ok(Delivery::Confirmed { message, .. }) => SubmissionResult::accepted(
                self.announcement
                    .acknowledgement(&request.team_name, Some(&message)),
                self.announcement.follow_up_link.clone(),
            ),
            Ok(Delivery::Unconfirmed { .. }) => SubmissionResult::accepted(
                self.announcement.acknowledgement(&request.team_name, None),
                self.announcement.follow_up_link.clone(),
            ),
            Err(TransportFailure::Encoding(_)) => SubmissionResult::rejected(ENCODING_MESSAGE),
            Err(TransportFailure::RemoteRejected { message }) if message.trim().is_empty() => {
                SubmissionResult::rejected(RETRY_MESSAGE)
            }
            Err(TransportFailure::RemoteRejected { message }) => {
                SubmissionResult::rejected(message)
            }
            Err(TransportFailure::Undelivered { .. }) => SubmissionResult::rejected(RETRY_MESSAGE),
        }
    }
}

fn invalid_result(errors: &ValidationErrors) -> SubmissionResult {
    let listed: Vec<&str> = errors.fields().map(|(_, message)| message).collect();
    SubmissionResult::invalid(
        format!("Please correct the highlighted fields: {}.", listed.join("; ")),
        errors.to_map(),
    )
}
