use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapters::chat::DEFAULT_CHAT_URL;
use crate::adapters::ollama::DEFAULT_OLLAMA_URL;
use crate::error::{HelixQaError, Result};
use crate::services::{AnswerSettings, Chunker};

const PROJECT_CONFIG: &str = ".helix/helix-qa.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window length in words.
    pub window: usize,
    /// Words shared between consecutive windows.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window: 200,
            overlap: 40,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Hashing,
    Ollama,
    FastEmbed,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hashing" | "hash" => Ok(Self::Hashing),
            "ollama" => Ok(Self::Ollama),
            "fastembed" | "onnx" => Ok(Self::FastEmbed),
            _ => Err(format!("Unknown embedding provider: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub base_url: String,
    /// Memoise embeddings by content hash within a process.
    pub cache: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            model: "nomic-embed-text".to_string(),
            dimension: 384,
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            cache: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CHAT_URL.to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_file(Path::new(PROJECT_CONFIG))?;
        let merged = Self::merge(global, project);
        let config = merged.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn load_global() -> Result<Option<Self>> {
        let config_dir = directories::ProjectDirs::from("", "", "helix").map_or_else(
            || PathBuf::from("~/.config/helix"),
            |d| d.config_dir().to_path_buf(),
        );

        Self::load_file(&config_dir.join("helix-qa.toml"))
    }

    fn load_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| HelixQaError::Config(format!("{}: {e}", path.display())))
    }

    /// Project settings win over global ones; an absent project file keeps the global file.
    fn merge(global: Option<Self>, project: Option<Self>) -> Self {
        match (global, project) {
            (Some(global), Some(project)) => Self {
                data_dir: if project.data_dir.as_os_str().is_empty() {
                    global.data_dir
                } else {
                    project.data_dir
                },
                generation: GenerationConfig {
                    api_key: project.generation.api_key.or(global.generation.api_key),
                    ..project.generation
                },
                ..project
            },
            (None, Some(only)) | (Some(only), None) => only,
            (None, None) => Self::default(),
        }
    }

    fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = var("HELIX_QA_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = var("GROQ_API_KEY") {
            self.generation.api_key = Some(key);
        }
        if let Some(model) = var("HELIX_QA_GENERATION_MODEL") {
            self.generation.model = model;
        }
        if let Some(host) = var("OLLAMA_HOST") {
            self.embedding.base_url = host;
        }
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = PathBuf::from(".helix/qa");
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.chunker()?;
        if self.retrieval.top_k == 0 {
            return Err(HelixQaError::InvalidConfiguration(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if self.embedding.dimension == 0 {
            return Err(HelixQaError::InvalidConfiguration(
                "embedding.dimension must be greater than zero".to_string(),
            ));
        }
        if self.generation.timeout_secs == 0 {
            return Err(HelixQaError::InvalidConfiguration(
                "generation.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn chunker(&self) -> Result<Chunker> {
        Chunker::new(self.chunking.window, self.chunking.overlap)
    }

    pub const fn answer_settings(&self) -> AnswerSettings {
        AnswerSettings {
            top_k: self.retrieval.top_k,
            timeout: Duration::from_secs(self.generation.timeout_secs),
        }
    }

    pub fn documents_path(&self) -> PathBuf {
        self.data_dir.join("documents.json")
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("index.json")
    }
}
