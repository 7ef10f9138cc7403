//! Contract tests for the Apps Script adapter against a wiremock stand-in for the script.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use hacksprint::config::RegistrationSettings;
use hacksprint::registration::{
    AppsScriptError, AppsScriptSink, HackathonDomain, LeadContact, ProposalAttachment,
    RegistrationRequest, RegistrationService, RequestId, RoutingTargets, SinkError,
    SubmissionOutcome, SubmissionPayload, SubmissionSink, TeamMember,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCRIPT_PATH: &str = "/macros/s/deployment/exec";

fn request() -> RegistrationRequest {
    RegistrationRequest {
        request_id: RequestId("req-wiremock-1".to_string()),
        team_name: "Orion".to_string(),
        lead: LeadContact {
            name: "Meera Iyer".to_string(),
            phone: "9886044556".to_string(),
        },
        college_name: "BMS College of Engineering".to_string(),
        domain: HackathonDomain::SoftwareDevelopment,
        members: [
            Some(TeamMember {
                name: "Meera Iyer".to_string(),
                identifier: "1BM22IS041".to_string(),
            }),
            Some(TeamMember {
                name: "Rahul Menon".to_string(),
                identifier: "1BM22IS058".to_string(),
            }),
            None,
            None,
        ],
        proposal: ProposalAttachment::new("proposal.pdf", "application/pdf", b"%PDF-1.7".to_vec()),
    }
}

fn payload() -> SubmissionPayload {
    SubmissionPayload::encode(&request(), &RoutingTargets::default(), Utc::now())
        .expect("payload encodes")
}

fn sink(server: &MockServer) -> AppsScriptSink {
    AppsScriptSink::new(&format!("{}{SCRIPT_PATH}", server.uri()), Duration::from_secs(5))
        .expect("sink builds")
}

#[tokio::test]
async fn deliver_posts_multipart_fields_and_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SCRIPT_PATH))
        .and(body_string_contains("name=\"registrationData\""))
        .and(body_string_contains("name=\"fileData\""))
        .and(body_string_contains("req-wiremock-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "Registration successful",
            "pptUrl": "https://drive.example/file/1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = sink(&server)
        .deliver(&payload())
        .await
        .expect("script reachable");

    assert_eq!(reply.status, 200);
    let remote = reply.remote().expect("json envelope");
    assert!(remote.success);
    assert_eq!(remote.ppt_url, "https://drive.example/file/1");
}

#[tokio::test]
async fn dispatch_ignores_the_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SCRIPT_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    sink(&server)
        .dispatch(&payload())
        .await
        .expect("sent without reading");
}

#[tokio::test]
async fn unreachable_script_is_a_network_error() {
    let sink = AppsScriptSink::new("http://127.0.0.1:9/exec", Duration::from_secs(2))
        .expect("sink builds");

    let err = sink
        .deliver(&payload())
        .await
        .expect_err("nothing listens on the discard port");

    assert!(matches!(err, SinkError::Network(_) | SinkError::Timeout));
}

#[test]
fn invalid_script_url_is_rejected() {
    let err = AppsScriptSink::new("not a url", Duration::from_secs(1)).expect_err("invalid url");
    assert!(matches!(err, AppsScriptError::InvalidUrl { .. }));
}

#[tokio::test]
async fn server_error_escalates_to_fallback_and_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SCRIPT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let settings = RegistrationSettings {
        follow_up_link: Some("https://chat.example.com/invite".to_string()),
        ..RegistrationSettings::default()
    };
    let service = RegistrationService::new(Arc::new(sink(&server)), &settings);

    let result = service.submit_request(&request()).await;

    assert_eq!(result.outcome, SubmissionOutcome::Accepted);
    assert!(result.message.contains("Orion"));
}

#[tokio::test]
async fn explicit_script_failure_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SCRIPT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "Error uploading file: quota exceeded"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = RegistrationService::new(
        Arc::new(sink(&server)),
        &RegistrationSettings::default(),
    );

    let result = service.submit_request(&request()).await;

    assert_eq!(result.outcome, SubmissionOutcome::Rejected);
    assert_eq!(result.message, "Error uploading file: quota exceeded");
}
