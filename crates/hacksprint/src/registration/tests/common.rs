use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::config::RegistrationSettings;
use crate::registration::domain::{
    HackathonDomain, LeadContact, MemberFields, ProposalAttachment, RegistrationFields,
    RegistrationRequest, RequestId, TeamMember,
};
use crate::registration::memory::{FallbackBehavior, InMemoryCollaborator, PrimaryBehavior};
use crate::registration::payload::RoutingTargets;
use crate::registration::service::RegistrationService;
use crate::registration::transport::SubmissionTransport;

pub(super) const MIB: usize = 1024 * 1024;
pub(super) const FOLLOW_UP_LINK: &str = "https://chat.example.com/invite/hacksprint";
pub(super) const BOUNDARY: &str = "hacksprint-form-boundary";

pub(super) fn pdf(size: usize) -> ProposalAttachment {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(size.max(bytes.len()), b'0');
    bytes.truncate(size);
    ProposalAttachment::new("proposal.pdf", "application/pdf", bytes)
}

pub(super) fn fields(team_name: &str) -> RegistrationFields {
    RegistrationFields {
        team_name: team_name.to_string(),
        lead_name: "Asha Rao".to_string(),
        lead_phone: "+91 98450 12345".to_string(),
        college_name: "RV College of Engineering".to_string(),
        hackathon_domain: "Software Development".to_string(),
        members: [
            MemberFields::new("Asha Rao", "1RV21CS001"),
            MemberFields::new("Nikhil Shet", "1RV21CS002"),
            MemberFields::default(),
            MemberFields::default(),
        ],
        proposal: Some(pdf(2 * MIB)),
    }
}

pub(super) fn request(team_name: &str) -> RegistrationRequest {
    RegistrationRequest {
        request_id: RequestId::generate(),
        team_name: team_name.to_string(),
        lead: LeadContact {
            name: "Asha Rao".to_string(),
            phone: "9845012345".to_string(),
        },
        college_name: "RV College of Engineering".to_string(),
        domain: HackathonDomain::SoftwareDevelopment,
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
        proposal: pdf(4096),
    }
}

pub(super) fn routing() -> RoutingTargets {
    RoutingTargets {
        sheet_id: "sheet-test".to_string(),
        folder_id: "folder-test".to_string(),
    }
}

pub(super) fn settings() -> RegistrationSettings {
    RegistrationSettings {
        sheet_id: "sheet-test".to_string(),
        drive_folder_id: "folder-test".to_string(),
        follow_up_link: Some(FOLLOW_UP_LINK.to_string()),
        ..RegistrationSettings::default()
    }
}

pub(super) fn collaborator(
    primary: PrimaryBehavior,
    fallback: FallbackBehavior,
) -> Arc<InMemoryCollaborator> {
    Arc::new(
        InMemoryCollaborator::new()
            .with_primary(primary)
            .with_fallback(fallback),
    )
}

pub(super) fn transport(
    sink: &Arc<InMemoryCollaborator>,
) -> SubmissionTransport<InMemoryCollaborator> {
    SubmissionTransport::new(sink.clone(), routing())
}

pub(super) fn service(
    sink: &Arc<InMemoryCollaborator>,
) -> RegistrationService<InMemoryCollaborator> {
    RegistrationService::new(sink.clone(), &settings())
}

/// Hand-rolled `multipart/form-data` body matching what a browser form sends.
pub(super) fn multipart_body(text: &[(&str, &str)], file: Option<&ProposalAttachment>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(file) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"pptFile\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.file_name, file.media_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(&file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub(super) fn form_text(team_name: &str) -> Vec<(&'static str, String)> {
    vec![
        ("teamName", team_name.to_string()),
        ("leadName", "Asha Rao".to_string()),
        ("leadPhone", "9845012345".to_string()),
        ("collegeName", "RV College of Engineering".to_string()),
        ("hackathonDomain", "hardware".to_string()),
        ("member1Name", "Asha Rao".to_string()),
        ("member1USN", "1RV21CS001".to_string()),
        ("member2Name", "Nikhil Shet".to_string()),
        ("member2USN", "1RV21CS002".to_string()),
        ("member3Name", String::new()),
        ("member3USN", String::new()),
    ]
}

pub(super) fn multipart_request(
    text: &[(&'static str, String)],
    file: Option<&ProposalAttachment>,
) -> axum::http::Request<axum::body::Body> {
    let borrowed: Vec<(&str, &str)> = text
        .iter()
        .map(|(name, value)| (*name, value.as_str()))
        .collect();
    axum::http::Request::post("/api/v1/registrations")
        .header(
            axum::http::header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(axum::body::Body::from(multipart_body(&borrowed, file)))
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
