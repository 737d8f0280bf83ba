//! Base de conocimiento en memoria: documentos, chunks e índice TF-IDF.
//!
//! Flujo de ingesta:
//!   1. Clasificar el texto (`narrative` / `atomic`).
//!   2. Trocearlo con el perfil correspondiente.
//!   3. Añadir documento y chunks.
//!   4. Reconstruir por completo la IDF y los vectores de todos los chunks.
//!
//! Todo se calcula antes de tocar el estado, así que una ingesta fallida deja
//! la base intacta. El índice se sustituye como un único valor: nunca conviven
//! una IDF y unos vectores calculados con corpus distintos.

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::chunker::{chunk_text, ChunkingConfig};
use crate::classifier::classify_with_threshold;
use crate::error::{RagError, Result};
use crate::models::{Chunk, Document, IngestReport, ScoredChunk};
use crate::similarity::{rank, RankingConfig};
use crate::tfidf::TfIdfIndex;

/// Estado observable de la base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeBaseState {
    Empty,
    Populated,
}

/// Resumen del contenido indexado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnowledgeBaseStats {
    pub state: KnowledgeBaseState,
    pub documents: usize,
    pub chunks: usize,
    pub vocabulary: usize,
}

/// Base de conocimiento. Cada instancia es independiente; se pasa
/// explícitamente a quien la necesite.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    chunking: ChunkingConfig,
    ranking: RankingConfig,
    documents: Vec<Document>,
    names: HashSet<String>,
    chunks: Vec<Chunk>,
    index: TfIdfIndex,
}

impl KnowledgeBase {
    /// Base vacía con la configuración por defecto.
    pub fn new() -> Self {
        Self::default()
    }

    /// Base vacía con configuración propia, validada antes de usarla.
    pub fn with_config(chunking: ChunkingConfig, ranking: RankingConfig) -> Result<Self> {
        chunking.validate()?;
        ranking.validate()?;
        Ok(Self {
            chunking,
            ranking,
            ..Self::default()
        })
    }

    pub fn state(&self) -> KnowledgeBaseState {
        if self.documents.is_empty() {
            KnowledgeBaseState::Empty
        } else {
            KnowledgeBaseState::Populated
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state() == KnowledgeBaseState::Empty
    }

    /// Documentos en orden de ingesta.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Chunks en orden de corpus.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn contains_document(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn ranking(&self) -> &RankingConfig {
        &self.ranking
    }

    pub fn stats(&self) -> KnowledgeBaseStats {
        KnowledgeBaseStats {
            state: self.state(),
            documents: self.documents.len(),
            chunks: self.chunks.len(),
            vocabulary: self.index.idf().len(),
        }
    }

    /// Ingiere un documento completo y reindexa el corpus.
    ///
    /// Falla con [`RagError::EmptyDocument`] si el texto está vacío tras
    /// recortar espacios y con [`RagError::DuplicateDocument`] si el nombre ya
    /// existe. En caso de error no se modifica nada.
    pub fn ingest_document(
        &mut self,
        name: &str,
        mime_type: &str,
        size_bytes: u64,
        text: &str,
    ) -> Result<IngestReport> {
        if text.trim().is_empty() {
            warn!("Documento vacío rechazado: {name}");
            return Err(RagError::EmptyDocument {
                name: name.to_string(),
            });
        }
        if self.contains_document(name) {
            warn!("Documento duplicado rechazado: {name}");
            return Err(RagError::DuplicateDocument {
                name: name.to_string(),
            });
        }

        // 1) Clasificar y trocear
        let content_type = classify_with_threshold(text, self.chunking.atomic_newline_density);
        let profile = self.chunking.profile_for(content_type);
        let new_chunks = chunk_text(text, name, content_type, profile)?;
        let chunk_count = new_chunks.len();

        // 2) Índice sobre el corpus resultante, antes de mutar el estado
        let mut corpus = Vec::with_capacity(self.chunks.len() + chunk_count);
        corpus.extend_from_slice(&self.chunks);
        corpus.extend(new_chunks);
        let index = TfIdfIndex::build(&corpus);

        // 3) Confirmar
        self.documents.push(Document {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes,
            content_type,
            ingested_at: Utc::now(),
        });
        self.names.insert(name.to_string());
        self.chunks = corpus;
        self.index = index;

        info!(
            "Ingerido '{}' ({}) con {} chunks. Corpus: {} chunks, {} términos.",
            name,
            content_type,
            chunk_count,
            self.chunks.len(),
            self.index.idf().len()
        );

        Ok(IngestReport {
            chunk_count,
            content_type,
        })
    }

    /// Vacía la base por completo.
    pub fn clear(&mut self) {
        let dropped = self.documents.len();
        self.documents.clear();
        self.names.clear();
        self.chunks.clear();
        self.index = TfIdfIndex::default();
        info!("Base de conocimiento vaciada ({dropped} documentos eliminados).");
    }

    /// Chunks más relevantes con su puntuación. Nunca falla: base vacía o
    /// ninguna coincidencia sobre el umbral ⇒ lista vacía.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<ScoredChunk> {
        if self.chunks.is_empty() {
            return Vec::new();
        }

        let query_vector = self.index.query_vector(query);
        let config = RankingConfig {
            max_results,
            ..self.ranking
        };
        rank(
            &query_vector,
            self.chunks.iter().zip(self.index.vectors()),
            &config,
        )
    }

    /// Como [`search`](Self::search) pero sólo los chunks.
    pub fn retrieve(&self, query: &str, max_results: usize) -> Vec<Chunk> {
        self.search(query, max_results)
            .into_iter()
            .map(|scored| scored.chunk)
            .collect()
    }

    /// Recuperación con el `max_results` configurado.
    pub fn retrieve_default(&self, query: &str) -> Vec<Chunk> {
        self.retrieve(query, self.ranking.max_results)
    }
}
