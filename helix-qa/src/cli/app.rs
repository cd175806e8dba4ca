use std::sync::Arc;

use helix_qa::Result;
use helix_qa::adapters::{
    CachedEmbedder, ChatCompletionsGenerator, HashingEmbedder, JsonDocumentRepository,
    MemoryVectorIndex, OllamaEmbedder,
};
use helix_qa::config::{Config, EmbeddingProvider};
use helix_qa::ports::{DocumentRepository, EmbeddingGenerator};
use helix_qa::services::{AnswerService, IngestionService, RetrievalService};

type Embedder = dyn EmbeddingGenerator;

/// Wired services for one CLI invocation.
pub struct App {
    pub config: Config,
    pub repo: Arc<JsonDocumentRepository>,
    pub index: Arc<MemoryVectorIndex>,
    pub ingestion: IngestionService<Embedder, MemoryVectorIndex>,
    pub answers: AnswerService<Embedder, MemoryVectorIndex, ChatCompletionsGenerator>,
    fingerprint: String,
}

impl App {
    pub async fn open(config: Config) -> Result<Self> {
        let embedder = build_embedder(&config)?;
        let chunker = config.chunker()?;
        let fingerprint = format!(
            "{}-{}-{}",
            embedder.model_name(),
            embedder.dimension(),
            chunker.params()
        );
        let repo = Arc::new(JsonDocumentRepository::new(config.documents_path()));

        let snapshot = MemoryVectorIndex::load_snapshot(
            &config.index_path(),
            embedder.dimension(),
            &fingerprint,
        )?;
        let restored = snapshot.is_some();
        let index = Arc::new(snapshot.unwrap_or_else(|| MemoryVectorIndex::new(embedder.dimension())));

        let ingestion =
            IngestionService::new(Arc::clone(&embedder), Arc::clone(&index), chunker)?;
        let generator = Arc::new(ChatCompletionsGenerator::new(
            config.generation.base_url.clone(),
            config.generation.model.clone(),
            config.generation.api_key.clone(),
        ));
        let answers = AnswerService::new(
            RetrievalService::new(embedder, Arc::clone(&index)),
            generator,
            config.answer_settings(),
        )?;

        let app = Self {
            config,
            repo,
            index,
            ingestion,
            answers,
            fingerprint,
        };

        // Without a usable snapshot the index is rebuilt once from the stored documents.
        if !restored && !app.repo.list_documents().await?.is_empty() {
            tracing::info!("No index snapshot for this embedder, rebuilding");
            app.ingestion.sync(app.repo.as_ref()).await?;
            app.persist()?;
        }

        Ok(app)
    }

    pub fn persist(&self) -> Result<()> {
        self.index
            .save_snapshot(&self.config.index_path(), &self.fingerprint)
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn build_embedder(config: &Config) -> Result<Arc<Embedder>> {
    let settings = &config.embedding;
    let base: Arc<Embedder> = match settings.provider {
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(settings.dimension)?),
        EmbeddingProvider::Ollama => Arc::new(OllamaEmbedder::new(
            settings.base_url.clone(),
            settings.model.clone(),
            settings.dimension,
        )),
        EmbeddingProvider::FastEmbed => fastembed_embedder()?,
    };

    if settings.cache {
        Ok(Arc::new(CachedEmbedder::new(base)))
    } else {
        Ok(base)
    }
}

#[cfg(feature = "fastembed")]
fn fastembed_embedder() -> Result<Arc<Embedder>> {
    Ok(Arc::new(helix_qa::adapters::FastEmbedder::new()?))
}

#[cfg(not(feature = "fastembed"))]
fn fastembed_embedder() -> Result<Arc<Embedder>> {
    Err(helix_qa::HelixQaError::Config(
        "embedding provider 'fastembed' requires building with --features fastembed".to_string(),
    ))
}
