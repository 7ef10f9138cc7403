use crate::infra::configured_sink;
use chrono::{DateTime, Utc};
use clap::Args;
use hacksprint::config::AppConfig;
use hacksprint::error::AppError;
use hacksprint::registration::{
    MemberFields, ProposalAttachment, RegistrationFields, RegistrationService, SubmissionResult,
};
use hacksprint::telemetry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MAX_MEMBERS: usize = 4;

#[derive(Args, Debug)]
pub(crate) struct RegisterArgs {
    /// Team name as it should appear on the registration sheet
    #[arg(long)]
    pub(crate) team_name: String,
    /// Name of the team lead
    #[arg(long)]
    pub(crate) lead_name: String,
    /// Team lead phone number (at least 10 digits)
    #[arg(long)]
    pub(crate) lead_phone: String,
    /// College the team studies at
    #[arg(long)]
    pub(crate) college: String,
    /// Hackathon domain: software or hardware
    #[arg(long)]
    pub(crate) domain: String,
    /// Team member as NAME:USN. Repeat for each member; the first two are required.
    #[arg(long = "member", value_parser = parse_member)]
    pub(crate) members: Vec<MemberFields>,
    /// Path to the proposal PDF
    #[arg(long)]
    pub(crate) proposal: PathBuf,
    /// Print the result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn parse_member(raw: &str) -> Result<MemberFields, String> {
    let (name, identifier) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected NAME:USN, found '{raw}'"))?;
    Ok(MemberFields::new(name.trim(), identifier.trim()))
}

pub(crate) async fn run_register(args: RegisterArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    if args.members.len() > MAX_MEMBERS {
        return Err(AppError::Registration(format!(
            "a team has at most {MAX_MEMBERS} members, found {}",
            args.members.len()
        )));
    }

    let proposal = load_proposal(&args.proposal).await?;
    let fields = registration_fields(&args, proposal);

    let sink = configured_sink(&config.registration)?;
    let service = RegistrationService::new(Arc::new(sink), &config.registration);
    let result = service.submit(fields).await;

    if args.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Result unavailable as JSON: {err}"),
        }
    } else {
        render_result(&result);
    }

    if result.is_accepted() {
        Ok(())
    } else {
        Err(AppError::Registration(result.message))
    }
}

fn registration_fields(args: &RegisterArgs, proposal: ProposalAttachment) -> RegistrationFields {
    let mut members: [MemberFields; MAX_MEMBERS] = Default::default();
    for (slot, member) in members.iter_mut().zip(args.members.iter()) {
        *slot = member.clone();
    }

    RegistrationFields {
        team_name: args.team_name.clone(),
        lead_name: args.lead_name.clone(),
        lead_phone: args.lead_phone.clone(),
        college_name: args.college.clone(),
        hackathon_domain: args.domain.clone(),
        members,
        proposal: Some(proposal),
    }
}

pub(crate) async fn load_proposal(path: &Path) -> Result<ProposalAttachment, AppError> {
    let bytes = tokio::fs::read(path).await?;
    let metadata = tokio::fs::metadata(path).await?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let attachment = ProposalAttachment::new(file_name, media_type, bytes);
    Ok(match metadata.modified() {
        Ok(modified) => attachment.with_last_modified(DateTime::<Utc>::from(modified)),
        Err(_) => attachment,
    })
}

fn render_result(result: &SubmissionResult) {
    let outcome = if result.is_accepted() {
        "accepted"
    } else {
        "rejected"
    };
    println!("Registration {outcome}");
    println!("{}", result.message);

    if let Some(link) = &result.follow_up_link {
        println!("\nCommunity group: {link}");
    }

    if !result.field_errors.is_empty() {
        println!("\nFields to fix:");
        for (field, message) in &result.field_errors {
            println!("  - {field}: {message}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_member_splits_on_last_colon() {
        let member = parse_member("Asha: Rao:1RV21CS001").expect("parses");
        assert_eq!(member, MemberFields::new("Asha: Rao", "1RV21CS001"));
        assert!(parse_member("no separator").is_err());
    }

    #[tokio::test]
    async fn load_proposal_guesses_media_type_from_extension() {
        let path = std::env::temp_dir().join(format!(
            "hacksprint-proposal-{}.pdf",
            std::process::id()
        ));
        tokio::fs::write(&path, b"%PDF-1.7").await.expect("write temp file");

        let attachment = load_proposal(&path).await.expect("proposal loads");
        tokio::fs::remove_file(&path).await.ok();

        assert_eq!(attachment.media_type, "application/pdf");
        assert!(attachment.file_name.ends_with(".pdf"));
        assert_eq!(attachment.bytes, b"%PDF-1.7".to_vec());
        assert!(attachment.last_modified.is_some());
    }

    #[test]
    fn registration_fields_fill_unused_member_slots_with_blanks() {
        let args = RegisterArgs {
            team_name: "Orion".to_string(),
            lead_name: "Asha Rao".to_string(),
            lead_phone: "9845012345".to_string(),
            college: "RVCE".to_string(),
            domain: "software".to_string(),
            members: vec![
                MemberFields::new("Asha Rao", "1RV21CS001"),
                MemberFields::new("Nikhil Shet", "1RV21CS002"),
            ],
            proposal: PathBuf::from("proposal.pdf"),
            json: false,
        };
        let proposal = ProposalAttachment::new("proposal.pdf", "application/pdf", vec![1]);

        let fields = registration_fields(&args, proposal);
        assert_eq!(fields.members[1].identifier, "1RV21CS002");
        assert_eq!(fields.members[3], MemberFields::default());
        assert_eq!(fields.college_name, "RVCE");
    }
}
