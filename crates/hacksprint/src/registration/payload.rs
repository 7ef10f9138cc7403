use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{RegistrationRequest, RequestId};

/// Multipart field names understood by the registration script.
pub const REGISTRATION_DATA_FIELD: &str = "registrationData";
pub const FILE_DATA_FIELD: &str = "fileData";
pub const REQUEST_ID_FIELD: &str = "requestId";

const PDF_EXTENSION: &str = "pdf";

/// Spreadsheet and Drive folder the script should write into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingTargets {
    pub sheet_id: String,
    pub folder_id: String,
}

/// Structured fields as the script reads them from `registrationData`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationData {
    pub team_name: String,
    pub lead_name: String,
    pub lead_phone: String,
    pub college_name: String,
    pub hackathon_domain: String,
    pub member1_name: String,
    #[serde(rename = "member1USN")]
    pub member1_usn: String,
    pub member2_name: String,
    #[serde(rename = "member2USN")]
    pub member2_usn: String,
    pub member3_name: String,
    #[serde(rename = "member3USN")]
    pub member3_usn: String,
    pub member4_name: String,
    #[serde(rename = "member4USN")]
    pub member4_usn: String,
    pub request_id: String,
    pub timestamp: String,
    pub sheet_id: String,
    pub folder_id: String,
}

/// Base64 file envelope carried in `fileData`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileData {
    pub content: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub name: String,
    pub original_name: String,
    pub extension: String,
    pub size: u64,
    pub last_modified: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("proposal file is empty")]
    EmptyFile,
    #[error("unable to serialize registration payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Fully encoded request body, reused verbatim for every delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub request_id: RequestId,
    pub file_name: String,
    pub registration_data: String,
    pub file_data: String,
}

impl SubmissionPayload {
    pub fn encode(
        request: &RegistrationRequest,
        routing: &RoutingTargets,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self, EncodingError> {
        let proposal = &request.proposal;
        if proposal.bytes.is_empty() {
            return Err(EncodingError::EmptyFile);
        }

        let millis = submitted_at.timestamp_millis();
        let file_name = generated_file_name(&request.team_name, millis);

        let member = |index: usize| {
            let (name, identifier) = request.member_slot(index);
            (name.to_string(), identifier.to_string())
        };
        let (member1_name, member1_usn) = member(0);
        let (member2_name, member2_usn) = member(1);
        let (member3_name, member3_usn) = member(2);
        let (member4_name, member4_usn) = member(3);

        let registration = RegistrationData {
            team_name: request.team_name.clone(),
            lead_name: request.lead.name.clone(),
            lead_phone: request.lead.phone.clone(),
            college_name: request.college_name.clone(),
            hackathon_domain: request.domain.label().to_string(),
            member1_name,
            member1_usn,
            member2_name,
            member2_usn,
            member3_name,
            member3_usn,
            member4_name,
            member4_usn,
            request_id: request.request_id.to_string(),
            timestamp: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            sheet_id: routing.sheet_id.clone(),
            folder_id: routing.folder_id.clone(),
        };

        let file = FileData {
            content: STANDARD.encode(&proposal.bytes),
            media_type: mime::APPLICATION_PDF.essence_str().to_string(),
            name: file_name.clone(),
            original_name: proposal.file_name.clone(),
            extension: PDF_EXTENSION.to_string(),
            size: proposal.size(),
            last_modified: proposal
                .last_modified
                .map(|modified| modified.timestamp_millis())
                .unwrap_or(millis),
        };

        Ok(Self {
            request_id: request.request_id.clone(),
            file_name,
            registration_data: serde_json::to_string(&registration)?,
            file_data: serde_json::to_string(&file)?,
        })
    }

    /// Text fields in the order they are appended to the multipart body.
    pub fn form_fields(&self) -> [(&'static str, &str); 3] {
        [
            (REGISTRATION_DATA_FIELD, self.registration_data.as_str()),
            (FILE_DATA_FIELD, self.file_data.as_str()),
            (REQUEST_ID_FIELD, self.request_id.as_str()),
        ]
    }

    pub fn registration(&self) -> Result<RegistrationData, serde_json::Error> {
        serde_json::from_str(&self.registration_data)
    }

    pub fn file(&self) -> Result<FileData, serde_json::Error> {
        serde_json::from_str(&self.file_data)
    }
}

/// `{team name without non-word characters, spaces as underscores}_{epoch millis}.pdf`
pub fn generated_file_name(team_name: &str, epoch_millis: i64) -> String {
    let kept: String = team_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    let slug = kept.split_whitespace().collect::<Vec<_>>().join("_");
    let slug = if slug.is_empty() {
        "team".to_string()
    } else {
        slug
    };
    format!("{slug}_{epoch_millis}.{PDF_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::domain::{
        HackathonDomain, LeadContact, ProposalAttachment, TeamMember,
    };
    use chrono::TimeZone;

    fn request(team_name: &str, bytes: Vec<u8>) -> RegistrationRequest {
        RegistrationRequest {
            request_id: RequestId("req-1".to_string()),
            team_name: team_name.to_string(),
            lead: LeadContact {
                name: "Asha Rao".to_string(),
                phone: "98450 12345".to_string(),
            },
            college_name: "RV College".to_string(),
            domain: HackathonDomain::HardwareDevelopment,
            members: [
                Some(TeamMember {
                    name: "Asha Rao".to_string(),
                    identifier: "1RV21CS001".to_string(),
                }),
                Some(TeamMember {
                    name: "Nikhil Shet".to_string(),
                    identifier: "1RV21CS002".to_string(),
                }),
                None,
                None,
            ],
            proposal: ProposalAttachment::new("Our Idea.pdf", "application/pdf", bytes),
        }
    }

    fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn file_name_strips_punctuation_and_joins_words() {
        assert_eq!(
            generated_file_name("  Team #Rocket! v2 ", 1700000000000),
            "Team_Rocket_v2_1700000000000.pdf"
        );
        assert_eq!(generated_file_name("@@@", 5), "team_5.pdf");
        assert_eq!(generated_file_name("snake_case", 9), "snake_case_9.pdf");
    }

    #[test]
    fn encode_keeps_absent_members_as_empty_strings() {
        let payload = SubmissionPayload::encode(
            &request("Orion", b"%PDF-1.7".to_vec()),
            &RoutingTargets {
                sheet_id: "sheet-1".to_string(),
                folder_id: "folder-1".to_string(),
            },
            submitted_at(),
        )
        .expect("payload encodes");

        let raw: serde_json::Value =
            serde_json::from_str(&payload.registration_data).expect("json");
        assert_eq!(raw["member3Name"], "");
        assert_eq!(raw["member4USN"], "");
        assert_eq!(raw["member2USN"], "1RV21CS002");
        assert_eq!(raw["hackathonDomain"], "Hardware Development");
        assert_eq!(raw["requestId"], "req-1");
        assert_eq!(raw["sheetId"], "sheet-1");
        assert_eq!(raw["timestamp"], "2025-03-14T09:30:00.000Z");
    }

    #[test]
    fn encode_wraps_file_in_base64_envelope() {
        let payload = SubmissionPayload::encode(
            &request("Orion", b"%PDF-1.7".to_vec()),
            &RoutingTargets::default(),
            submitted_at(),
        )
        .expect("payload encodes");

        let file = payload.file().expect("file json");
        assert_eq!(file.content, STANDARD.encode(b"%PDF-1.7"));
        assert_eq!(file.media_type, "application/pdf");
        assert_eq!(file.extension, "pdf");
        assert_eq!(file.original_name, "Our Idea.pdf");
        assert_eq!(file.size, 8);
        assert_eq!(file.name, payload.file_name);
        assert_eq!(file.last_modified, submitted_at().timestamp_millis());

        let fields = payload.form_fields();
        assert_eq!(fields[2], (REQUEST_ID_FIELD, "req-1"));
    }

    #[test]
    fn encode_refuses_empty_files() {
        let err = SubmissionPayload::encode(
            &request("Orion", Vec::new()),
            &RoutingTargets::default(),
            submitted_at(),
        )
        .expect_err("empty file cannot be encoded");
        assert!(matches!(err, EncodingError::EmptyFile));
    }
}
