//! Document portal server binary
//!
//! Run with: cargo run -p docportal --bin docportal-server

use docportal::{
    config::{EmbeddingBackend, RagConfig},
    server::RagServer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docportal=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Document Portal                       ║
║          Ask questions about your uploaded PDFs           ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!(
        "  - Embeddings: {:?} {} ({} dims)",
        config.embeddings.backend,
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - LLM: {:?} {}", config.llm.backend, config.llm.model);
    tracing::info!(
        "  - Chunk size: {} (overlap {})",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Data directory: {}", config.storage.data_dir.display());

    if config.llm.api_key.is_none() && config.llm.backend == docportal::config::LlmBackend::Groq {
        tracing::warn!("GROQ_API_KEY is not set; queries will fail until it is provided");
    }

    let server = RagServer::new(config.clone()).await?;

    if config.embeddings.backend == EmbeddingBackend::Ollama {
        match server.state().embedder().health_check().await {
            Ok(true) => tracing::info!("Embedding service is running at {}", config.embeddings.base_url),
            _ => {
                tracing::warn!("Embedding service not available at {}", config.embeddings.base_url);
                tracing::warn!("  Start it with: ollama serve && ollama pull {}", config.embeddings.model);
            }
        }
    }

    match server.state().generator().llm().health_check().await {
        Ok(true) => tracing::info!("LLM backend {} is reachable", server.state().generator().llm().name()),
        _ => tracing::warn!(
            "LLM backend {} is not reachable at {}",
            server.state().generator().llm().name(),
            config.llm.base_url
        ),
    }

    if let Some(uploads) = server.state().uploads() {
        match uploads.health_check().await {
            Ok(true) => tracing::info!("Upload store {} is ready", uploads.name()),
            _ => tracing::warn!("Upload store {} is not available", uploads.name()),
        }
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST   /upload_pdf         - Upload a PDF");
    println!("  POST   /query_pdf          - Ask a question about a PDF");
    println!("  POST   /feedback           - Rate an answer");
    println!("  GET    /documents          - List documents");
    println!("  DELETE /documents/:pdf_id  - Remove a document");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
