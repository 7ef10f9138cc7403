use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::domain::{
    HackathonDomain, LeadContact, MemberFields, ProposalAttachment, RegistrationFields,
    TeamMember, ValidatedRegistration,
};

/// Largest accepted proposal, inclusive.
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

const MIN_TEXT_CHARS: usize = 2;
const MIN_PHONE_DIGITS: usize = 10;
const MANDATORY_MEMBERS: usize = 2;

/// Form field names, shared with the HTTP form and the field error map.
pub mod field {
    pub const TEAM_NAME: &str = "teamName";
    pub const LEAD_NAME: &str = "leadName";
    pub const LEAD_PHONE: &str = "leadPhone";
    pub const COLLEGE_NAME: &str = "collegeName";
    pub const HACKATHON_DOMAIN: &str = "hackathonDomain";
    pub const PROPOSAL: &str = "pptFile";

    pub const MEMBERS: [(&str, &str); 4] = [
        ("member1Name", "member1USN"),
        ("member2Name", "member2USN"),
        ("member3Name", "member3USN"),
        ("member4Name", "member4USN"),
    ];
}

/// Reasons an attachment is refused. Each one is reported on its own.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentError {
    #[error("attachment required: upload your proposal as a PDF")]
    Missing,
    #[error("attachment must be PDF (received '{file_name}' as {media_type})")]
    WrongType {
        file_name: String,
        media_type: String,
    },
    #[error("attachment exceeds size limit ({size} bytes, maximum {limit} bytes)")]
    Oversized { size: u64, limit: u64 },
}

pub type AttachmentCheck = Result<(), AttachmentError>;

/// Field name to message map produced by a failed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields.iter().map(|(name, message)| (*name, message.as_str()))
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(name, message)| (name.to_string(), message.clone()))
            .collect()
    }

    fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_insert_with(|| message.into());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) need attention: ", self.fields.len())?;
        let mut first = true;
        for (name, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{name}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub type ValidationResult = Result<ValidatedRegistration, ValidationErrors>;

/// Limits applied to the uploaded proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachmentPolicy {
    max_bytes: u64,
}

impl AttachmentPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTACHMENT_BYTES)
    }
}

/// Pure input checks run before anything touches the network.
#[derive(Debug, Clone, Default)]
pub struct SubmissionValidator {
    policy: AttachmentPolicy,
}

impl SubmissionValidator {
    pub fn with_policy(policy: AttachmentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Check every field and either return the validated registration or every problem found.
    pub fn validate(&self, fields: RegistrationFields) -> ValidationResult {
        let RegistrationFields {
            team_name,
            lead_name,
            lead_phone,
            college_name,
            hackathon_domain,
            members,
            proposal,
        } = fields;

        let mut errors = ValidationErrors::default();

        let team_name = required_text(&mut errors, field::TEAM_NAME, "team name", &team_name);
        let lead_name = required_text(&mut errors, field::LEAD_NAME, "team lead name", &lead_name);
        let lead_phone = checked_phone(&mut errors, &lead_phone);
        let college_name = required_text(
            &mut errors,
            field::COLLEGE_NAME,
            "college name",
            &college_name,
        );

        let domain = HackathonDomain::parse(&hackathon_domain);
        if domain.is_none() {
            let message = if hackathon_domain.trim().is_empty() {
                "hackathon domain is required".to_string()
            } else {
                format!(
                    "hackathon domain must be '{}' or '{}'",
                    HackathonDomain::SoftwareDevelopment.label(),
                    HackathonDomain::HardwareDevelopment.label()
                )
            };
            errors.insert(field::HACKATHON_DOMAIN, message);
        }

        let members = checked_members(&mut errors, &members);

        if let Err(err) = self.validate_attachment(proposal.as_ref()) {
            errors.insert(field::PROPOSAL, err.to_string());
        }

        let (Some(domain), Some(proposal)) = (domain, proposal) else {
            return Err(errors);
        };
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ValidatedRegistration {
            team_name,
            lead: LeadContact {
                name: lead_name,
                phone: lead_phone,
            },
            college_name,
            domain,
            members,
            proposal,
        })
    }

    /// Media type and extension must both say PDF, and the size must fit the policy.
    pub fn validate_attachment(&self, attachment: Option<&ProposalAttachment>) -> AttachmentCheck {
        let attachment = attachment.ok_or(AttachmentError::Missing)?;

        if !is_pdf_media_type(&attachment.media_type) || !has_pdf_extension(&attachment.file_name)
        {
            return Err(AttachmentError::WrongType {
                file_name: attachment.file_name.clone(),
                media_type: attachment.media_type.clone(),
            });
        }

        let size = attachment.size();
        if size > self.policy.max_bytes {
            return Err(AttachmentError::Oversized {
                size,
                limit: self.policy.max_bytes,
            });
        }

        debug!(file = %attachment.file_name, size, "proposal file ready");
        Ok(())
    }
}

fn is_pdf_media_type(raw: &str) -> bool {
    raw.trim()
        .to_ascii_lowercase()
        .parse::<mime::Mime>()
        .map(|parsed| parsed.essence_str() == mime::APPLICATION_PDF.essence_str())
        .unwrap_or(false)
}

fn has_pdf_extension(file_name: &str) -> bool {
    file_name.trim().to_ascii_lowercase().ends_with(".pdf")
}

fn required_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.insert(field, format!("{label} is required"));
    } else if value.chars().count() < MIN_TEXT_CHARS {
        errors.insert(
            field,
            format!("{label} must be at least {MIN_TEXT_CHARS} characters"),
        );
    }
    value.to_string()
}

fn checked_phone(errors: &mut ValidationErrors, raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        errors.insert(field::LEAD_PHONE, "phone number is required");
        return String::new();
    }

    let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')');
    if !value.chars().all(allowed) {
        errors.insert(
            field::LEAD_PHONE,
            "phone number may only contain digits and + - ( ) separators",
        );
    } else if value.chars().filter(char::is_ascii_digit).count() < MIN_PHONE_DIGITS {
        errors.insert(
            field::LEAD_PHONE,
            format!("phone number must contain at least {MIN_PHONE_DIGITS} digits"),
        );
    }
    value.to_string()
}

fn checked_members(
    errors: &mut ValidationErrors,
    members: &[MemberFields; 4],
) -> [Option<TeamMember>; 4] {
    let mut accepted: [Option<TeamMember>; 4] = Default::default();

    for (index, member) in members.iter().enumerate() {
        let (name_field, id_field) = field::MEMBERS[index];
        let slot = index + 1;

        if index >= MANDATORY_MEMBERS && member.is_blank() {
            continue;
        }

        let name = required_text(errors, name_field, &format!("member {slot} name"), &member.name);
        let identifier = required_text(
            errors,
            id_field,
            &format!("member {slot} USN"),
            &member.identifier,
        );
        accepted[index] = Some(TeamMember { name, identifier });
    }

    accepted
}
