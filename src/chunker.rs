//! Chunker de ventana deslizante con solapamiento.
//!
//! El tamaño de ventana y el solapamiento dependen del [`ContentType`] que
//! decide el clasificador: la prosa usa ventanas amplias y el contenido
//! atómico ventanas más pequeñas para no mezclar hechos independientes.
//!
//! Las posiciones se miden en caracteres, nunca en bytes, de modo que los
//! cortes siempre caen en fronteras UTF-8 válidas.
//!
//! ```rust
//! use lexical_rag::chunker::{chunk_text, ChunkProfile};
//! use lexical_rag::models::ContentType;
//!
//! let profile = ChunkProfile { size: 3, overlap: 1 };
//! let chunks = chunk_text("AAAA", "doc.txt", ContentType::Narrative, profile).unwrap();
//! let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
//! assert_eq!(texts, ["AAA", "AA"]);
//! ```

use serde::Serialize;

use crate::classifier::DEFAULT_ATOMIC_NEWLINE_DENSITY;
use crate::error::{RagError, Result};
use crate::models::{Chunk, ContentType};

/// Tamaño de ventana y solapamiento, en caracteres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkProfile {
    pub size: usize,
    pub overlap: usize,
}

impl ChunkProfile {
    pub const NARRATIVE: Self = Self {
        size: 800,
        overlap: 80,
    };
    pub const ATOMIC: Self = Self {
        size: 400,
        overlap: 40,
    };

    /// Avance de la ventana. Falla si `size - overlap <= 0`, porque el bucle no progresaría.
    pub fn step(&self) -> Result<usize> {
        self.size
            .checked_sub(self.overlap)
            .filter(|step| *step > 0)
            .ok_or_else(|| {
                RagError::Configuration(format!(
                    "perfil de chunking inválido: size={} overlap={} (el solapamiento debe ser menor que la ventana)",
                    self.size, self.overlap
                ))
            })
    }
}

/// Perfiles por tipo de contenido más el umbral del clasificador.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChunkingConfig {
    pub narrative: ChunkProfile,
    pub atomic: ChunkProfile,
    pub atomic_newline_density: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            narrative: ChunkProfile::NARRATIVE,
            atomic: ChunkProfile::ATOMIC,
            atomic_newline_density: DEFAULT_ATOMIC_NEWLINE_DENSITY,
        }
    }
}

impl ChunkingConfig {
    pub fn profile_for(&self, content_type: ContentType) -> ChunkProfile {
        match content_type {
            ContentType::Narrative => self.narrative,
            ContentType::Atomic => self.atomic,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.narrative.step()?;
        self.atomic.step()?;
        if !(0.0..=1.0).contains(&self.atomic_newline_density) {
            return Err(RagError::Configuration(format!(
                "umbral de densidad de saltos de línea fuera de [0, 1]: {}",
                self.atomic_newline_density
            )));
        }
        Ok(())
    }
}

/// Divide `text` en ventanas `[offset, min(offset + size, len))` avanzando `size - overlap`.
///
/// - Texto vacío ⇒ ningún chunk.
/// - Índices contiguos desde 0.
/// - El último chunk puede ser más corto que `size`.
pub fn chunk_text(
    text: &str,
    source: &str,
    content_type: ContentType,
    profile: ChunkProfile,
) -> Result<Vec<Chunk>> {
    let step = profile.step()?;

    // Offset en bytes de cada carácter; `len` cierra la última ventana.
    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let total = offsets.len();
    let byte_at = |pos: usize| offsets.get(pos).copied().unwrap_or(text.len());

    let mut chunks = Vec::with_capacity(total.div_ceil(step));
    let mut start = 0;
    while start < total {
        let end = (start + profile.size).min(total);
        chunks.push(Chunk {
            source: source.to_string(),
            chunk_index: chunks.len(),
            text: text[byte_at(start)..byte_at(end)].to_string(),
            content_type,
        });
        start += step;
    }

    Ok(chunks)
}
