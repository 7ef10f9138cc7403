use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::domain::RegistrationRequest;
use super::payload::{EncodingError, RoutingTargets, SubmissionPayload};
use super::sink::{SinkError, SubmissionSink};

/// Steps a single submission attempt moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Encoding,
    PrimaryAttempt,
    FallbackAttempt,
    Accepted,
    Failed,
}

/// Which delivery mode settled an unconfirmed acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Primary,
    Fallback,
}

/// Successful terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The collaborator answered with a success envelope.
    Confirmed {
        message: String,
        file_url: Option<String>,
    },
    /// The payload went out but no answer could be read; assumed processed.
    Unconfirmed { mode: DeliveryMode },
}

/// Why the primary attempt could not confirm the outcome. Never shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportAmbiguity {
    Network(SinkError),
    Status(u16),
    UnparseableBody,
}

impl fmt::Display for TransportAmbiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportAmbiguity::Network(err) => write!(f, "{err}"),
            TransportAmbiguity::Status(status) => write!(f, "unexpected http status {status}"),
            TransportAmbiguity::UnparseableBody => f.write_str("response body unreadable"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportFailure {
    #[error("file could not be processed: {0}")]
    Encoding(#[from] EncodingError),
    #[error("registration rejected by collaborator: {message}")]
    RemoteRejected { message: String },
    #[error("registration could not be delivered: {reason}")]
    Undelivered { reason: String },
}

pub type TransportResult = Result<Delivery, TransportFailure>;

/// Delivers encoded registrations with a single readable attempt and an optional
/// fire-and-forget fallback that reuses the same payload.
#[derive(Debug)]
pub struct SubmissionTransport<S> {
    sink: Arc<S>,
    routing: RoutingTargets,
    fallback_enabled: bool,
}

impl<S> SubmissionTransport<S>
where
    S: SubmissionSink + 'static,
{
    pub fn new(sink: Arc<S>, routing: RoutingTargets) -> Self {
        Self {
            sink,
            routing,
            fallback_enabled: true,
        }
    }

    /// Without fallback, an ambiguous primary attempt fails instead of escalating.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback_enabled
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Encode the request and deliver it.
    pub async fn send(&self, request: &RegistrationRequest) -> TransportResult {
        trace_state(request.request_id.as_str(), TransportState::Idle);
        trace_state(request.request_id.as_str(), TransportState::Encoding);

        let payload = match SubmissionPayload::encode(request, &self.routing, Utc::now()) {
            Ok(payload) => payload,
            Err(err) => {
                error!(request_id = %request.request_id, error = %err, "proposal encoding failed");
                trace_state(request.request_id.as_str(), TransportState::Failed);
                return Err(err.into());
            }
        };

        self.send_payload(&payload).await
    }

    /// Deliver an already encoded payload. The payload, including its request id, is reused
    /// untouched for the fallback attempt.
    pub async fn send_payload(&self, payload: &SubmissionPayload) -> TransportResult {
        let request_id = payload.request_id.as_str();
        trace_state(request_id, TransportState::PrimaryAttempt);

        let ambiguity = match self.sink.deliver(payload).await {
            Ok(reply) if reply.is_success() => match reply.remote() {
                Some(remote) if remote.success => {
                    info!(request_id, message = %remote.message, "registration confirmed");
                    trace_state(request_id, TransportState::Accepted);
                    let file_url = Some(remote.ppt_url).filter(|url| !url.is_empty());
                    return Ok(Delivery::Confirmed {
                        message: remote.message,
                        file_url,
                    });
                }
                Some(remote) => {
                    warn!(request_id, message = %remote.message, "registration rejected by collaborator");
                    trace_state(request_id, TransportState::Failed);
                    return Err(TransportFailure::RemoteRejected {
                        message: remote.message,
                    });
                }
                None => {
                    warn!(
                        request_id,
                        status = reply.status,
                        "success status with unreadable body, assuming registration was recorded"
                    );
                    trace_state(request_id, TransportState::Accepted);
                    return Ok(Delivery::Unconfirmed {
                        mode: DeliveryMode::Primary,
                    });
                }
            },
            Ok(reply) => TransportAmbiguity::Status(reply.status),
            Err(err) => TransportAmbiguity::Network(err),
        };

        warn!(request_id, reason = %ambiguity, "primary attempt unconfirmed");

        if !self.fallback_enabled {
            trace_state(request_id, TransportState::Failed);
            return Err(TransportFailure::Undelivered {
                reason: ambiguity.to_string(),
            });
        }

        trace_state(request_id, TransportState::FallbackAttempt);
        match self.sink.dispatch(payload).await {
            Ok(()) => {
                info!(request_id, "registration dispatched via fallback");
                trace_state(request_id, TransportState::Accepted);
                Ok(Delivery::Unconfirmed {
                    mode: DeliveryMode::Fallback,
                })
            }
            Err(err) => {
                error!(request_id, primary = %ambiguity, fallback = %err, "registration delivery failed");
                trace_state(request_id, TransportState::Failed);
                Err(TransportFailure::Undelivered {
                    reason: format!("primary: {ambiguity}; fallback: {err}"),
                })
            }
        }
    }
}

fn trace_state(request_id: &str, state: TransportState) {
    debug!(request_id, ?state, "transport state");
}
