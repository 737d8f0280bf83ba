//! Abstracción sobre Rig para los colaboradores de lenguaje: generación de la
//! respuesta y reformulación de consultas.
//!
//! De momento se implementa OpenAI; Gemini/Ollama quedan preparados para el futuro.
//! Ningún fallo sale de aquí: la generación devuelve un mensaje de disculpa y la
//! expansión una lista vacía, de forma que una caída del proveedor degrada la
//! respuesta pero no rompe el flujo.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rig::completion::Prompt;
use tracing::{debug, warn};

use crate::config::{AppConfig, LlmProvider};
use crate::models::Chunk;

/// Mensaje que se devuelve al usuario cuando la generación falla.
pub const APOLOGY_MESSAGE: &str =
    "Lo siento, no he podido generar una respuesta en este momento. Inténtalo de nuevo más tarde.";

/// Número máximo de reformulaciones que se aceptan del modelo.
pub const MAX_EXPANSIONS: usize = 4;

const ANSWER_PROMPT: &str = r#"
Eres un asistente experto en RAG.
Respondes de forma clara y concisa, en el idioma de la pregunta.
Sólo puedes usar la información suministrada en el contexto. Cada fragmento indica su documento de origen y su tipo:
- "narrative": prosa continua; puedes resumirla y combinarla.
- "atomic": hechos sueltos, listas o código; cítalos con exactitud.
Si el contexto no contiene la respuesta, di explícitamente que no la sabes.
"#;

const EXPANSION_PROMPT: &str = r#"
Reformula la pregunta del usuario de hasta 4 maneras distintas que ayuden a encontrar documentos relevantes mediante búsqueda por palabras clave.
Usa sinónimos y términos relacionados. Devuelve una reformulación por línea, sin numeración ni explicaciones.
"#;

/// Colaborador que redacta la respuesta final a partir de los chunks recuperados.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Nunca falla: ante un error devuelve un texto de disculpa.
    async fn generate(&self, question: &str, context: &[Chunk]) -> String;
}

/// Colaborador que propone formulaciones alternativas de una consulta.
#[async_trait]
pub trait QueryExpander: Send + Sync {
    /// Nunca falla: ante un error devuelve una lista vacía.
    async fn expand(&self, query: &str) -> Vec<String>;
}

/// Gestor de LLMs.
#[derive(Debug, Clone)]
pub struct LlmManager {
    pub provider: LlmProvider,
    pub chat_model: String,
    pub timeout: Duration,
}

impl LlmManager {
    /// Construye el manager a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        Ok(Self {
            provider: cfg.llm_provider.clone(),
            chat_model: cfg.llm_chat_model.clone(),
            timeout: cfg.llm_timeout,
        })
    }

    fn model_name(&self) -> &str {
        if self.chat_model.is_empty() {
            "gpt-4o-mini"
        } else {
            self.chat_model.as_str()
        }
    }

    /// Aplica el timeout configurado a una llamada al proveedor.
    async fn with_timeout<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| anyhow!("el proveedor LLM no respondió en {:?}", self.timeout))?
    }

    // ---------------------------------------------------------------------
    // CHAT / COMPLETION
    // ---------------------------------------------------------------------

    /// Genera una respuesta a partir de una pregunta y los chunks de contexto.
    pub async fn answer_with_context(&self, question: &str, context: &[Chunk]) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAI => {
                let full_context = format!(
                    "Contexto:\n{}\n\nPregunta del usuario:\n{}",
                    build_context(context),
                    question
                );
                self.prompt_openai(ANSWER_PROMPT, Some(&full_context), question)
                    .await
            }
            ref other => Err(anyhow!(
                "Proveedor LLM {:?} aún no implementado para chat",
                other
            )),
        }
    }

    /// Pide al modelo reformulaciones de la consulta.
    pub async fn expand_query(&self, query: &str) -> Result<Vec<String>> {
        match self.provider {
            LlmProvider::OpenAI => {
                let raw = self.prompt_openai(EXPANSION_PROMPT, None, query).await?;
                Ok(parse_expansions(&raw, query))
            }
            ref other => Err(anyhow!(
                "Proveedor LLM {:?} aún no implementado para expansión de consultas",
                other
            )),
        }
    }

    async fn prompt_openai(
        &self,
        preamble: &str,
        context: Option<&str>,
        prompt: &str,
    ) -> Result<String> {
        use rig::providers::openai;
        // Trait para client.agent(...)
        use rig::client::CompletionClient as _;

        let client = openai::Client::from_env();

        let mut builder = client.agent(self.model_name()).preamble(preamble);
        if let Some(context) = context {
            builder = builder.context(context);
        }
        let agent = builder.build();

        self.with_timeout(async { agent.prompt(prompt).await.map_err(anyhow::Error::from) })
            .await
    }
}

#[async_trait]
impl AnswerGenerator for LlmManager {
    async fn generate(&self, question: &str, context: &[Chunk]) -> String {
        match self.answer_with_context(question, context).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Fallo generando la respuesta: {e:#}");
                APOLOGY_MESSAGE.to_string()
            }
        }
    }
}

#[async_trait]
impl QueryExpander for LlmManager {
    async fn expand(&self, query: &str) -> Vec<String> {
        match self.expand_query(query).await {
            Ok(alternates) => {
                debug!("Consulta expandida en {} variantes.", alternates.len());
                alternates
            }
            Err(e) => {
                warn!("Fallo expandiendo la consulta, se usa sólo la original: {e:#}");
                Vec::new()
            }
        }
    }
}

/// Expansor que no propone alternativas (expansión desactivada).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExpansion;

#[async_trait]
impl QueryExpander for NoExpansion {
    async fn expand(&self, _query: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Formatea los chunks para el prompt, etiquetando cada uno con su origen y tipo.
pub fn build_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| {
            format!(
                "[Fuente: {} #{} | Tipo: {}]\n{}",
                c.source, c.chunk_index, c.content_type, c.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Una reformulación por línea; quita viñetas y numeración, descarta vacíos,
/// repeticiones y la propia consulta original. Como mucho [`MAX_EXPANSIONS`].
pub fn parse_expansions(raw: &str, original: &str) -> Vec<String> {
    let original = original.trim().to_lowercase();
    let mut out: Vec<String> = Vec::new();

    for line in raw.lines() {
        let cleaned = line
            .trim()
            .trim_start_matches(|c: char| {
                c.is_ascii_digit() || matches!(c, '-' | '*' | '•' | '.' | ')')
            })
            .trim()
            .trim_matches('"')
            .trim();
        if cleaned.is_empty() || cleaned.to_lowercase() == original {
            continue;
        }
        if out.iter().any(|seen| seen.eq_ignore_ascii_case(cleaned)) {
            continue;
        }
        out.push(cleaned.to_string());
        if out.len() == MAX_EXPANSIONS {
            break;
        }
    }

    out
}
