//! Carga y gestión de configuración de la aplicación (LLM + recuperación).

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::chunker::{ChunkProfile, ChunkingConfig};
use crate::similarity::RankingConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Gemini,
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(anyhow!("Proveedor LLM no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,

    pub llm_provider: LlmProvider,
    pub llm_chat_model: String,
    pub llm_timeout: Duration,
    pub query_expansion: bool,

    pub chunking: ChunkingConfig,
    pub ranking: RankingConfig,

    /// Directorio de ficheros de texto a ingerir al arrancar.
    pub knowledge_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:3322".to_string(),
            llm_provider: LlmProvider::OpenAI,
            llm_chat_model: "gpt-4o-mini".to_string(),
            llm_timeout: Duration::from_secs(60),
            query_expansion: true,
            chunking: ChunkingConfig::default(),
            ranking: RankingConfig::default(),
            knowledge_dir: None,
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Igual que [`from_env`](Self::from_env) pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_addr = lookup("SERVER_ADDR").unwrap_or(defaults.server_addr);

        let llm_provider = match lookup("LLM_PROVIDER") {
            Some(s) => s.parse()?,
            None => defaults.llm_provider,
        };
        let llm_chat_model = lookup("LLM_CHAT_MODEL").unwrap_or(defaults.llm_chat_model);
        let llm_timeout = Duration::from_secs(parse_or(
            &lookup,
            "LLM_TIMEOUT_SECS",
            defaults.llm_timeout.as_secs(),
        )?);
        let query_expansion = parse_or(&lookup, "QUERY_EXPANSION", defaults.query_expansion)?;

        let chunking = ChunkingConfig {
            narrative: ChunkProfile {
                size: parse_or(&lookup, "CHUNK_NARRATIVE_SIZE", defaults.chunking.narrative.size)?,
                overlap: parse_or(
                    &lookup,
                    "CHUNK_NARRATIVE_OVERLAP",
                    defaults.chunking.narrative.overlap,
                )?,
            },
            atomic: ChunkProfile {
                size: parse_or(&lookup, "CHUNK_ATOMIC_SIZE", defaults.chunking.atomic.size)?,
                overlap: parse_or(
                    &lookup,
                    "CHUNK_ATOMIC_OVERLAP",
                    defaults.chunking.atomic.overlap,
                )?,
            },
            atomic_newline_density: parse_or(
                &lookup,
                "ATOMIC_NEWLINE_DENSITY",
                defaults.chunking.atomic_newline_density,
            )?,
        };

        let ranking = RankingConfig {
            relevance_floor: parse_or(
                &lookup,
                "RETRIEVAL_RELEVANCE_FLOOR",
                defaults.ranking.relevance_floor,
            )?,
            max_results: parse_or(&lookup, "RETRIEVAL_TOP_K", defaults.ranking.max_results)?,
        };

        let knowledge_dir = lookup("KNOWLEDGE_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let cfg = Self {
            server_addr,
            llm_provider,
            llm_chat_model,
            llm_timeout,
            query_expansion,
            chunking,
            ranking,
            knowledge_dir,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Valida los parámetros de recuperación; se llama al arrancar.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.ranking.validate()?;
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Valor inválido para {key}: '{raw}'")),
        None => Ok(default),
    }
}
