//! Offline evaluation of logged queries and user feedback
//!
//! Run with: cargo run -p docportal --bin docportal-eval -- --json

use clap::Parser;
use std::path::PathBuf;

use docportal::{
    config::RagConfig,
    learning::{Evaluator, FeedbackStore},
    DocumentId,
};

#[derive(Parser)]
#[command(name = "docportal-eval")]
#[command(author, version, about = "Compute retrieval and answer quality metrics from the feedback store")]
struct Cli {
    /// Feedback database (defaults to the configured data directory)
    db: Option<PathBuf>,

    /// Only evaluate queries against this document
    #[arg(long)]
    document: Option<String>,

    /// Similarity at or above which a retrieved chunk counts as relevant
    #[arg(long)]
    threshold: Option<f32>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = RagConfig::load()?;

    let db_path = cli
        .db
        .unwrap_or_else(|| config.storage.feedback_db_path());
    if !db_path.exists() {
        anyhow::bail!("feedback database not found at {}", db_path.display());
    }

    let threshold = cli
        .threshold
        .unwrap_or(config.evaluation.relevance_threshold);
    if !(0.0..=1.0).contains(&threshold) {
        anyhow::bail!("--threshold must be within 0.0..=1.0, got {}", threshold);
    }

    let store = FeedbackStore::new(&db_path)?;
    let document = cli.document.map(DocumentId::from);

    let queries = store.list_queries(document.as_ref())?;
    let feedback = store.list_feedback(document.as_ref())?;
    let report = Evaluator::new(threshold).evaluate(&queries, &feedback);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Database: {}", db_path.display());
        if let Some(doc) = &document {
            println!("Document: {}", doc);
        }
        println!();
        print!("{}", report);
    }

    Ok(())
}
