//! Travel inquiry command-line runner
//!
//! Reads JSON-encoded messages (one object or an array) from files or stdin
//! and prints one JSON outcome per message on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use travel_inquiry_config::{load_settings, Settings};
use travel_inquiry_core::{
    Error, FieldName, FusedRecord, InquiryClassification, ProcessingIssue, RawMessage,
    ValidatedRecord,
};
use travel_inquiry_engine::InquiryPipeline;

#[derive(Parser, Debug)]
#[command(name = "travel-inquiry", version, about = "Extract and classify travel inquiries")]
struct Cli {
    /// Configuration environment; loads config/<env> over config/default
    #[arg(long, env = "TRAVEL_INQUIRY_ENV")]
    env: Option<String>,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Treat each input as a plain-text message body instead of JSON
    #[arg(long)]
    plain: bool,

    /// Input files; stdin when none are given
    files: Vec<PathBuf>,
}

/// One message or a batch of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Input {
    Batch(Vec<RawMessage>),
    Single(RawMessage),
}

/// Printed result for one message
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Outcome {
    Accepted {
        record: ValidatedRecord,
    },
    Rejected {
        reason: String,
        missing_fields: Vec<FieldName>,
        classification: InquiryClassification,
        record: FusedRecord,
        issues: Vec<ProcessingIssue>,
    },
    Failed {
        error: String,
    },
}

impl From<travel_inquiry_core::Result<ValidatedRecord>> for Outcome {
    fn from(result: travel_inquiry_core::Result<ValidatedRecord>) -> Self {
        match result {
            Ok(record) => Outcome::Accepted { record },
            Err(Error::Validation(rejected)) => {
                let rejected = *rejected;
                Outcome::Rejected {
                    reason: rejected.reason,
                    missing_fields: rejected.missing_fields,
                    classification: rejected.classification,
                    record: rejected.record,
                    issues: rejected.issues,
                }
            },
            Err(e) => Outcome::Failed { error: e.to_string() },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.env.as_deref())
        .with_context(|| format!("loading settings (env: {})", cli.env.as_deref().unwrap_or("default")))?;

    if cli.dump_config {
        print!("{}", toml::to_string_pretty(&settings).context("serializing settings")?);
        return Ok(());
    }

    init_tracing(&settings);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?settings.environment,
        backend = ?settings.statistical.backend,
        "Starting travel inquiry runner"
    );

    let pipeline = InquiryPipeline::new(&settings).context("building pipeline")?;

    let mut messages = Vec::new();
    for source in read_sources(&cli.files).await? {
        messages.extend(parse_input(&source, cli.plain)?);
    }
    tracing::info!(messages = messages.len(), "Loaded input");

    let mut rejected = 0usize;
    for result in pipeline.process_batch(messages).await {
        let outcome = Outcome::from(result);
        if !matches!(outcome, Outcome::Accepted { .. }) {
            rejected += 1;
        }
        println!("{}", serde_json::to_string(&outcome)?);
    }

    if rejected > 0 {
        tracing::warn!(rejected, "Some messages need human review");
    }
    Ok(())
}

/// Raw contents of each input file, or of stdin
async fn read_sources(files: &[PathBuf]) -> Result<Vec<String>> {
    if files.is_empty() {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("reading stdin")?;
        return Ok(vec![buffer]);
    }

    let mut sources = Vec::with_capacity(files.len());
    for path in files {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        sources.push(content);
    }
    Ok(sources)
}

fn parse_input(source: &str, plain: bool) -> Result<Vec<RawMessage>> {
    if plain {
        return Ok(vec![RawMessage::new(source)]);
    }

    let input: Input = serde_json::from_str(source).context("input is not a message or a list of messages")?;
    Ok(match input {
        Input::Batch(messages) => messages,
        Input::Single(message) => vec![message],
    })
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("travel_inquiry={}", level).into()
    });

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr).boxed()
    };
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use travel_inquiry_core::{InquiryType, ValidationError};

    #[test]
    fn test_parse_single_and_batch() {
        let single = parse_input(r#"{"body": "2 people to Goa", "sender": "a@b.in"}"#, false).unwrap();
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].sender.as_deref(), Some("a@b.in"));

        let batch = parse_input(r#"[{"body": "Goa"}, {"body": "Kerala", "subject": "Trip"}]"#, false).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].subject.as_deref(), Some("Trip"));
    }

    #[test]
    fn test_parse_plain_and_invalid() {
        let plain = parse_input("Goa trip for 2", true).unwrap();
        assert_eq!(plain[0].body, "Goa trip for 2");
        assert!(parse_input("not json", false).is_err());
    }

    #[tokio::test]
    async fn test_read_sources_from_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"body": "Delhi-Agra-Jaipur"}}"#).unwrap();

        let sources = read_sources(&[file.path().to_path_buf()]).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(parse_input(&sources[0], false).unwrap()[0].body, "Delhi-Agra-Jaipur");

        assert!(read_sources(&[PathBuf::from("/nonexistent/inquiry.json")]).await.is_err());
    }

    #[test]
    fn test_rejection_outcome_shape() {
        let rejected = ValidationError {
            reason: "single_leg inquiry is missing identifying field(s): destinations".into(),
            missing_fields: vec![FieldName::Destinations],
            classification: InquiryClassification::new(InquiryType::SingleLeg, 0.0, ["no_fields_extracted"]),
            record: FusedRecord::new(),
            issues: Vec::new(),
        };
        let result: travel_inquiry_core::Result<ValidatedRecord> = Err(Error::from(rejected));
        let outcome = Outcome::from(result);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["missing_fields"][0], "destinations");
        assert_eq!(json["classification"]["type"], "single_leg");
    }

    #[test]
    fn test_cli_args() {
        let cli = Cli::parse_from(["travel-inquiry", "--env", "staging", "--plain", "a.txt", "b.txt"]);
        assert_eq!(cli.env.as_deref(), Some("staging"));
        assert!(cli.plain);
        assert_eq!(cli.files.len(), 2);
        assert!(!cli.dump_config);
    }
}
