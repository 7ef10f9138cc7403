//! Registration intake: validate the team form, encode the proposal, and deliver it to the
//! spreadsheet-backed registration script.

pub mod apps_script;
pub mod domain;
pub mod memory;
pub mod payload;
pub mod router;
pub mod service;
pub mod sink;
pub mod transport;
pub mod validation;

#[cfg(test)]
mod tests;

pub use apps_script::{AppsScriptError, AppsScriptSink};
pub use domain::{
    HackathonDomain, LeadContact, MemberFields, ProposalAttachment, RegistrationFields,
    RegistrationRequest, RequestId, SubmissionOutcome, SubmissionResult, TeamMember,
    ValidatedRegistration,
};
pub use memory::{FallbackBehavior, InMemoryCollaborator, PrimaryBehavior};
pub use payload::{EncodingError, RoutingTargets, SubmissionPayload};
pub use router::registration_router;
pub use service::{Announcement, RegistrationService};
pub use sink::{RemoteReply, SinkError, SinkReply, SubmissionSink};
pub use transport::{Delivery, DeliveryMode, SubmissionTransport, TransportFailure, TransportState};
pub use validation::{
    AttachmentError, AttachmentPolicy, SubmissionValidator, ValidationErrors,
    MAX_ATTACHMENT_BYTES,
};
