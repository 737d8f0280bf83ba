//! Modelos de dominio: documentos ingeridos, chunks y resultados de recuperación.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Etiqueta que el clasificador asigna al contenido de un documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// Prosa continua.
    Narrative,
    /// Contenido estructurado o de hechos sueltos (código, listas...).
    Atomic,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Narrative => "narrative",
            Self::Atomic => "atomic",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documento ingerido. Inmutable una vez creado.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub content_type: ContentType,
    pub ingested_at: DateTime<Utc>,
}

/// Ventana contigua de texto de un documento; unidad de recuperación.
///
/// Su identidad es el par `(source, chunk_index)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    pub source: String,
    pub chunk_index: usize,
    pub text: String,
    pub content_type: ContentType,
}

impl Chunk {
    pub fn id(&self) -> (&str, usize) {
        (self.source.as_str(), self.chunk_index)
    }
}

/// Chunk recuperado junto a su similitud con la consulta.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub score: f64,
}

/// Resultado de ingerir un documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub chunk_count: usize,
    pub content_type: ContentType,
}
