//! Similitud coseno entre vectores dispersos y ranking top-k de chunks.

use std::cmp::Ordering;

use serde::Serialize;

use crate::error::{RagError, Result};
use crate::models::{Chunk, ScoredChunk};
use crate::tfidf::TermVector;

/// Similitud mínima para considerar relevante un chunk.
pub const DEFAULT_RELEVANCE_FLOOR: f64 = 0.01;
/// Número máximo de chunks devueltos por defecto.
pub const DEFAULT_MAX_RESULTS: usize = 3;

/// Parámetros del ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankingConfig {
    pub relevance_floor: f64,
    pub max_results: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            relevance_floor: DEFAULT_RELEVANCE_FLOOR,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.relevance_floor) {
            return Err(RagError::Configuration(format!(
                "umbral de relevancia fuera de [0, 1): {}",
                self.relevance_floor
            )));
        }
        if self.max_results == 0 {
            return Err(RagError::Configuration(
                "el número máximo de resultados debe ser mayor que 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn magnitude(v: &TermVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Coseno entre dos vectores dispersos de pesos no negativos, en `[0, 1]`.
///
/// Una clave ausente equivale a peso cero. Si alguno de los vectores tiene
/// magnitud cero el resultado es `0.0`.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let (mag_a, mag_b) = (magnitude(a), magnitude(b));
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    // Sólo las claves comunes aportan al producto escalar.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|other| w * other))
        .sum();

    (dot / (mag_a * mag_b)).clamp(0.0, 1.0)
}

/// Puntúa cada chunk contra la consulta y devuelve los mejores primero.
///
/// Orden descendente por similitud con empates resueltos por el orden del
/// corpus (ordenación estable); descarta puntuaciones `<= relevance_floor` y
/// devuelve como mucho `max_results`.
pub fn rank<'a, I>(query: &TermVector, corpus: I, config: &RankingConfig) -> Vec<ScoredChunk>
where
    I: IntoIterator<Item = (&'a Chunk, &'a TermVector)>,
{
    if query.is_empty() || config.max_results == 0 {
        return Vec::new();
    }

    let mut scored: Vec<ScoredChunk> = corpus
        .into_iter()
        .filter_map(|(chunk, vector)| {
            let score = cosine_similarity(query, vector);
            (score > config.relevance_floor).then(|| ScoredChunk {
                chunk: chunk.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(config.max_results);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;

    fn vector(pairs: &[(&str, f64)]) -> TermVector {
        pairs.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    fn chunk(index: usize) -> Chunk {
        Chunk {
            source: "doc".to_string(),
            chunk_index: index,
            text: format!("chunk {index}"),
            content_type: ContentType::Narrative,
        }
    }

    #[test]
    fn test_cosine_identical() {
        let v = vector(&[("a", 0.3), ("b", 1.2), ("c", 0.01)]);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let v = vector(&[("a", 1.0)]);
        let zero = TermVector::new();
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_cosine_disjoint_and_partial() {
        let a = vector(&[("a", 1.0)]);
        let b = vector(&[("b", 1.0)]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);

        let c = vector(&[("a", 1.0), ("b", 1.0)]);
        let expected = 1.0 / 2f64.sqrt();
        assert!((cosine_similarity(&a, &c) - expected).abs() < 1e-12);
        assert!((cosine_similarity(&c, &a) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let chunks: Vec<Chunk> = (0..5).map(chunk).collect();
        let vectors = vec![
            vector(&[("x", 1.0)]),
            vector(&[("x", 1.0), ("y", 1.0)]),
            vector(&[("z", 1.0)]),
            vector(&[("x", 1.0), ("y", 3.0)]),
            vector(&[("x", 2.0)]),
        ];
        let query = vector(&[("x", 1.0)]);
        let ranked = rank(&query, chunks.iter().zip(vectors.iter()), &RankingConfig::default());

        let order: Vec<usize> = ranked.iter().map(|s| s.chunk.chunk_index).collect();
        // 0 y 4 empatan a 1.0: se mantiene el orden del corpus.
        assert_eq!(order, vec![0, 4, 1]);
        assert!(ranked.iter().all(|s| s.score > DEFAULT_RELEVANCE_FLOOR));
    }

    #[test]
    fn test_rank_filters_below_floor() {
        let chunks: Vec<Chunk> = (0..2).map(chunk).collect();
        let vectors = vec![
            vector(&[("x", 0.001), ("y", 10.0)]),
            vector(&[("z", 1.0)]),
        ];
        let query = vector(&[("x", 1.0)]);
        let ranked = rank(&query, chunks.iter().zip(vectors.iter()), &RankingConfig::default());
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_respects_max_results() {
        let chunks: Vec<Chunk> = (0..10).map(chunk).collect();
        let vectors: Vec<TermVector> = (0..10).map(|_| vector(&[("x", 1.0)])).collect();
        let query = vector(&[("x", 1.0)]);
        let config = RankingConfig {
            max_results: 2,
            ..RankingConfig::default()
        };
        let ranked = rank(&query, chunks.iter().zip(vectors.iter()), &config);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].chunk.chunk_index, 0);
        assert_eq!(ranked[1].chunk.chunk_index, 1);
    }

    #[test]
    fn test_rank_empty_query() {
        let chunks = vec![chunk(0)];
        let vectors = vec![vector(&[("x", 1.0)])];
        let ranked = rank(
            &TermVector::new(),
            chunks.iter().zip(vectors.iter()),
            &RankingConfig::default(),
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(RankingConfig::default().validate().is_ok());
        assert!(RankingConfig {
            relevance_floor: 1.0,
            max_results: 3
        }
        .validate()
        .is_err());
        assert!(RankingConfig {
            relevance_floor: 0.01,
            max_results: 0
        }
        .validate()
        .is_err());
    }
}
