//! In-process model of the spreadsheet-backed registration script.
//!
//! It follows the same contract as the deployed script (required fields, request-id replay,
//! duplicate team/phone detection, file storage, row append) so the pipeline can be
//! exercised without network access. Fault switches simulate the failure modes seen in
//! production.

use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::RequestId;
use super::payload::{RegistrationData, SubmissionPayload};
use super::sink::{RemoteReply, SinkError, SinkReply, SubmissionSink};

pub const REGISTERED_MESSAGE: &str = "Registration successful";
pub const ALREADY_PROCESSED_MESSAGE: &str = "Registration already processed.";
pub const ALREADY_REGISTERED_MESSAGE: &str = "Team already registered successfully.";
pub const MISSING_FIELDS_MESSAGE: &str = "Required fields are missing in your registration";

/// How the readable delivery mode behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimaryBehavior {
    /// Process the registration and answer with the JSON envelope.
    #[default]
    Respond,
    /// Fail before anything reaches the script.
    NetworkFailure,
    /// Process the registration, then lose the answer on the way back.
    DropReply,
    /// Answer 500 without processing.
    ServerError,
    /// Process the registration and answer 200 with a body that is not JSON.
    UnreadableSuccess,
}

/// How the fire-and-forget delivery mode behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackBehavior {
    #[default]
    Deliver,
    NetworkFailure,
}

/// Appended spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRow {
    pub recorded_at: DateTime<Utc>,
    pub team_name: String,
    pub lead_name: String,
    pub lead_phone: String,
    pub college_name: String,
    pub hackathon_domain: String,
    pub members: [(String, String); 4],
    pub ppt_url: String,
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub url: String,
}

#[derive(Debug, Default)]
struct CollaboratorState {
    rows: Vec<RegistrationRow>,
    files: Vec<StoredFile>,
    primary_calls: Vec<RequestId>,
    fallback_calls: Vec<RequestId>,
}

#[derive(Debug, Default)]
pub struct InMemoryCollaborator {
    state: Mutex<CollaboratorState>,
    primary: Mutex<PrimaryBehavior>,
    fallback: Mutex<FallbackBehavior>,
}

impl InMemoryCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary(self, behavior: PrimaryBehavior) -> Self {
        self.set_primary(behavior);
        self
    }

    pub fn with_fallback(self, behavior: FallbackBehavior) -> Self {
        self.set_fallback(behavior);
        self
    }

    pub fn set_primary(&self, behavior: PrimaryBehavior) {
        *self.primary.lock().expect("behavior mutex poisoned") = behavior;
    }

    pub fn set_fallback(&self, behavior: FallbackBehavior) {
        *self.fallback.lock().expect("behavior mutex poisoned") = behavior;
    }

    /// Insert an existing registration, as if it had been recorded earlier.
    pub fn seed(&self, team_name: &str, lead_phone: &str) {
        let mut state = self.state.lock().expect("collaborator mutex poisoned");
        state.rows.push(RegistrationRow {
            recorded_at: Utc::now(),
            team_name: team_name.to_string(),
            lead_name: String::new(),
            lead_phone: lead_phone.to_string(),
            college_name: String::new(),
            hackathon_domain: String::new(),
            members: Default::default(),
            ppt_url: String::new(),
            request_id: String::new(),
        });
    }

    pub fn rows(&self) -> Vec<RegistrationRow> {
        self.state
            .lock()
            .expect("collaborator mutex poisoned")
            .rows
            .clone()
    }

    pub fn files(&self) -> Vec<StoredFile> {
        self.state
            .lock()
            .expect("collaborator mutex poisoned")
            .files
            .clone()
    }

    pub fn primary_calls(&self) -> Vec<RequestId> {
        self.state
            .lock()
            .expect("collaborator mutex poisoned")
            .primary_calls
            .clone()
    }

    pub fn fallback_calls(&self) -> Vec<RequestId> {
        self.state
            .lock()
            .expect("collaborator mutex poisoned")
            .fallback_calls
            .clone()
    }

    /// Apply the script's contract to one payload.
    pub fn process(&self, payload: &SubmissionPayload) -> RemoteReply {
        let data = match payload.registration() {
            Ok(data) => data,
            Err(err) => return RemoteReply::failed(format!("Failed to parse request data: {err}")),
        };

        if missing_required(&data) {
            return RemoteReply::failed(MISSING_FIELDS_MESSAGE);
        }

        let request_id = if payload.request_id.as_str().is_empty() {
            data.request_id.clone()
        } else {
            payload.request_id.to_string()
        };

        let mut state = self.state.lock().expect("collaborator mutex poisoned");

        if !request_id.is_empty() && state.rows.iter().any(|row| row.request_id == request_id) {
            info!(%request_id, "replayed registration ignored");
            return RemoteReply::succeeded(ALREADY_PROCESSED_MESSAGE, "");
        }

        let team_key = data.team_name.trim().to_lowercase();
        let phone_key = phone_digits(&data.lead_phone);
        let duplicate = state.rows.iter().any(|row| {
            row.team_name.trim().to_lowercase() == team_key
                || (!phone_key.is_empty() && phone_digits(&row.lead_phone) == phone_key)
        });
        if duplicate {
            info!(team = %data.team_name, "duplicate team registration ignored");
            return RemoteReply::succeeded(ALREADY_REGISTERED_MESSAGE, "");
        }

        let ppt_url = match payload.file() {
            Ok(file) if !file.content.is_empty() => match STANDARD.decode(file.content.as_bytes()) {
                Ok(bytes) => {
                    let name = if file.name.is_empty() {
                        "submission.pdf".to_string()
                    } else {
                        file.name
                    };
                    let url = format!("memory://drive/{}/{}", data.folder_id, name);
                    state.files.push(StoredFile {
                        name,
                        media_type: file.media_type,
                        bytes,
                        url: url.clone(),
                    });
                    url
                }
                Err(err) => return RemoteReply::failed(format!("Error uploading file: {err}")),
            },
            _ => String::new(),
        };

        state.rows.push(RegistrationRow {
            recorded_at: Utc::now(),
            team_name: data.team_name,
            lead_name: data.lead_name,
            lead_phone: data.lead_phone,
            college_name: data.college_name,
            hackathon_domain: data.hackathon_domain,
            members: [
                (data.member1_name, data.member1_usn),
                (data.member2_name, data.member2_usn),
                (data.member3_name, data.member3_usn),
                (data.member4_name, data.member4_usn),
            ],
            ppt_url: ppt_url.clone(),
            request_id,
        });

        RemoteReply::succeeded(REGISTERED_MESSAGE, ppt_url)
    }
}

impl SubmissionSink for InMemoryCollaborator {
    async fn deliver(&self, payload: &SubmissionPayload) -> Result<SinkReply, SinkError> {
        let behavior = *self.primary.lock().expect("behavior mutex poisoned");
        self.state
            .lock()
            .expect("collaborator mutex poisoned")
            .primary_calls
            .push(payload.request_id.clone());

        match behavior {
            PrimaryBehavior::NetworkFailure => {
                Err(SinkError::Network("connection refused".to_string()))
            }
            PrimaryBehavior::ServerError => Ok(SinkReply {
                status: 500,
                body: "<html><body>Internal error</body></html>".to_string(),
            }),
            PrimaryBehavior::DropReply => {
                self.process(payload);
                Err(SinkError::Network("connection reset by peer".to_string()))
            }
            PrimaryBehavior::UnreadableSuccess => {
                self.process(payload);
                Ok(SinkReply {
                    status: 200,
                    body: "<!DOCTYPE html><html><body>Moved</body></html>".to_string(),
                })
            }
            PrimaryBehavior::Respond => {
                let reply = self.process(payload);
                let body = serde_json::to_string(&reply)
                    .map_err(|err| SinkError::Network(err.to_string()))?;
                Ok(SinkReply { status: 200, body })
            }
        }
    }

    async fn dispatch(&self, payload: &SubmissionPayload) -> Result<(), SinkError> {
        let behavior = *self.fallback.lock().expect("behavior mutex poisoned");
        self.state
            .lock()
            .expect("collaborator mutex poisoned")
            .fallback_calls
            .push(payload.request_id.clone());

        match behavior {
            FallbackBehavior::NetworkFailure => {
                Err(SinkError::Network("connection refused".to_string()))
            }
            FallbackBehavior::Deliver => {
                self.process(payload);
                Ok(())
            }
        }
    }
}

fn missing_required(data: &RegistrationData) -> bool {
    [
        &data.team_name,
        &data.lead_name,
        &data.lead_phone,
        &data.college_name,
        &data.hackathon_domain,
        &data.member1_name,
        &data.member1_usn,
    ]
    .iter()
    .any(|value| value.trim().is_empty())
}

fn phone_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::payload::{FileData, RegistrationData};

    fn payload(team: &str, phone: &str, request_id: &str) -> SubmissionPayload {
        let data = RegistrationData {
            team_name: team.to_string(),
            lead_name: "Lead".to_string(),
            lead_phone: phone.to_string(),
            college_name: "College".to_string(),
            hackathon_domain: "Software Development".to_string(),
            member1_name: "Lead".to_string(),
            member1_usn: "USN1".to_string(),
            request_id: request_id.to_string(),
            folder_id: "folder".to_string(),
            ..RegistrationData::default()
        };
        let file = FileData {
            content: STANDARD.encode(b"%PDF"),
            media_type: "application/pdf".to_string(),
            name: format!("{team}_1.pdf"),
            ..FileData::default()
        };
        SubmissionPayload {
            request_id: RequestId(request_id.to_string()),
            file_name: file.name.clone(),
            registration_data: serde_json::to_string(&data).expect("json"),
            file_data: serde_json::to_string(&file).expect("json"),
        }
    }

    #[test]
    fn process_stores_file_and_appends_row() {
        let collaborator = InMemoryCollaborator::new();
        let reply = collaborator.process(&payload("Orion", "9845012345", "r1"));

        assert!(reply.success);
        assert_eq!(reply.message, REGISTERED_MESSAGE);
        assert_eq!(reply.ppt_url, "memory://drive/folder/Orion_1.pdf");
        assert_eq!(collaborator.rows().len(), 1);
        assert_eq!(collaborator.files()[0].bytes, b"%PDF".to_vec());
    }

    #[test]
    fn process_replays_known_request_ids() {
        let collaborator = InMemoryCollaborator::new();
        collaborator.process(&payload("Orion", "9845012345", "r1"));
        let reply = collaborator.process(&payload("Orion", "9845012345", "r1"));

        assert!(reply.success);
        assert_eq!(reply.message, ALREADY_PROCESSED_MESSAGE);
        assert_eq!(collaborator.rows().len(), 1);
    }

    #[test]
    fn process_treats_matching_phone_as_duplicate() {
        let collaborator = InMemoryCollaborator::new();
        collaborator.seed("Vega", "+91 98450-12345");
        let reply = collaborator.process(&payload("Lyra", "919845012345", "r2"));

        assert!(reply.success);
        assert_eq!(reply.message, ALREADY_REGISTERED_MESSAGE);
        assert_eq!(collaborator.rows().len(), 1);
    }

    #[test]
    fn process_rejects_missing_required_fields() {
        let collaborator = InMemoryCollaborator::new();
        let reply = collaborator.process(&payload("", "9845012345", "r3"));

        assert!(!reply.success);
        assert_eq!(reply.message, MISSING_FIELDS_MESSAGE);
        assert!(collaborator.rows().is_empty());
    }

    #[test]
    fn process_rejects_undecodable_files() {
        let collaborator = InMemoryCollaborator::new();
        let mut broken = payload("Orion", "9845012345", "r4");
        broken.file_data = r#"{"content":"***not base64***"}"#.to_string();

        let reply = collaborator.process(&broken);
        assert!(!reply.success);
        assert!(reply.message.starts_with("Error uploading file"));
        assert!(collaborator.rows().is_empty());
    }
}
