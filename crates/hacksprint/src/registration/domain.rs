use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Idempotency token minted once per user-initiated submit action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Competition tracks a team can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HackathonDomain {
    SoftwareDevelopment,
    HardwareDevelopment,
}

impl HackathonDomain {
    pub fn label(&self) -> &'static str {
        match self {
            HackathonDomain::SoftwareDevelopment => "Software Development",
            HackathonDomain::HardwareDevelopment => "Hardware Development",
        }
    }

    /// Accepts the form's option values as well as the enum spelling.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "software" | "softwaredevelopment" => Some(Self::SoftwareDevelopment),
            "hardware" | "hardwaredevelopment" => Some(Self::HardwareDevelopment),
            _ => None,
        }
    }
}

/// One member slot as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFields {
    pub name: String,
    pub identifier: String,
}

impl MemberFields {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
        }
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.name.trim().is_empty() && self.identifier.trim().is_empty()
    }
}

/// Proposal file selected by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ProposalAttachment {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ProposalAttachment {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
            last_modified: None,
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl fmt::Debug for ProposalAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProposalAttachment")
            .field("file_name", &self.file_name)
            .field("media_type", &self.media_type)
            .field("size", &self.size())
            .field("last_modified", &self.last_modified)
            .finish()
    }
}

/// Raw input handed over by the registration form, before any checks.
#[derive(Debug, Clone, Default)]
pub struct RegistrationFields {
    pub team_name: String,
    pub lead_name: String,
    pub lead_phone: String,
    pub college_name: String,
    pub hackathon_domain: String,
    pub members: [MemberFields; 4],
    pub proposal: Option<ProposalAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadContact {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub identifier: String,
}

/// Output of a successful validation pass; becomes a request once an id is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub team_name: String,
    pub lead: LeadContact,
    pub college_name: String,
    pub domain: HackathonDomain,
    pub members: [Option<TeamMember>; 4],
    pub proposal: ProposalAttachment,
}

impl ValidatedRegistration {
    pub fn with_request_id(self, request_id: RequestId) -> RegistrationRequest {
        RegistrationRequest {
            request_id,
            team_name: self.team_name,
            lead: self.lead,
            college_name: self.college_name,
            domain: self.domain,
            members: self.members,
            proposal: self.proposal,
        }
    }
}

/// Validated registration bound to a single submit action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub request_id: RequestId,
    pub team_name: String,
    pub lead: LeadContact,
    pub college_name: String,
    pub domain: HackathonDomain,
    /// Indexed by form slot; optional slots left blank stay `None`.
    pub members: [Option<TeamMember>; 4],
    pub proposal: ProposalAttachment,
}

impl RegistrationRequest {
    /// Member slot `index` (0-based), empty strings when the slot is unused.
    pub fn member_slot(&self, index: usize) -> (&str, &str) {
        self.members
            .get(index)
            .and_then(Option::as_ref)
            .map(|member| (member.name.as_str(), member.identifier.as_str()))
            .unwrap_or(("", ""))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionOutcome {
    Accepted,
    Rejected,
}

/// Normalized result surfaced to whatever presented the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub outcome: SubmissionOutcome,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_link: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub field_errors: BTreeMap<String, String>,
}

impl SubmissionResult {
    pub fn accepted(message: impl Into<String>, follow_up_link: Option<String>) -> Self {
        Self {
            outcome: SubmissionOutcome::Accepted,
            message: message.into(),
            follow_up_link,
            field_errors: BTreeMap::new(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            outcome: SubmissionOutcome::Rejected,
            message: message.into(),
            follow_up_link: None,
            field_errors: BTreeMap::new(),
        }
    }

    pub fn invalid(message: impl Into<String>, field_errors: BTreeMap<String, String>) -> Self {
        Self {
            field_errors,
            ..Self::rejected(message)
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.outcome == SubmissionOutcome::Accepted
    }
}
