//! Indexador TF-IDF sobre el corpus completo de chunks.
//!
//! IDF suavizado: `idf(t) = ln((N + 1) / (df(t) + 1)) + 1`, con `N` el número
//! de chunks y `df(t)` el número de chunks que contienen `t` al menos una vez.
//! El peso de un término en un texto es `tf(t) / total_tokens * idf(t)`.
//!
//! El índice se reconstruye entero cada vez que cambia el conjunto de chunks;
//! la tabla IDF y los vectores viajan juntos en [`TfIdfIndex`] para que nunca
//! se sirvan vectores calculados con otra tabla.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::models::Chunk;
use crate::tokenizer::tokenize;

/// Vector disperso término → peso. Sólo contiene términos con peso distinto de cero.
pub type TermVector = HashMap<String, f64>;

/// Tabla término → IDF derivada del corpus actual.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    weights: HashMap<String, f64>,
    corpus_size: usize,
}

impl IdfTable {
    /// IDF del término, `0.0` si no aparece en el corpus.
    pub fn get(&self, term: &str) -> f64 {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.weights.contains_key(term)
    }

    /// Tamaño del vocabulario.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Número de chunks sobre los que se calculó la tabla.
    pub fn corpus_size(&self) -> usize {
        self.corpus_size
    }
}

/// Calcula la tabla IDF sobre todos los chunks. Corpus vacío ⇒ tabla vacía.
pub fn compute_idf(chunks: &[Chunk]) -> IdfTable {
    let n = chunks.len();
    let mut df: HashMap<String, usize> = HashMap::new();

    for chunk in chunks {
        let distinct: HashSet<String> = tokenize(&chunk.text).into_iter().collect();
        for term in distinct {
            *df.entry(term).or_insert(0) += 1;
        }
    }

    let weights = df
        .into_iter()
        .map(|(term, count)| {
            let idf = ((n as f64 + 1.0) / (count as f64 + 1.0)).ln() + 1.0;
            (term, idf)
        })
        .collect();

    IdfTable {
        weights,
        corpus_size: n,
    }
}

/// Vector TF-IDF de `text` contra `idf`.
///
/// Los términos ausentes de la tabla pesan cero y no se incluyen: no pueden
/// coincidir con ningún chunk.
pub fn vectorize(text: &str, idf: &IdfTable) -> TermVector {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return TermVector::new();
    }

    let total = tokens.len() as f64;
    let mut tf: HashMap<String, usize> = HashMap::new();
    for token in tokens {
        *tf.entry(token).or_insert(0) += 1;
    }

    tf.into_iter()
        .filter_map(|(term, count)| {
            let weight = (count as f64 / total) * idf.get(&term);
            (weight > 0.0).then_some((term, weight))
        })
        .collect()
}

/// Tabla IDF y vectores de chunk calculados juntos a partir del mismo corpus.
///
/// `vectors[i]` corresponde al chunk `i` del corpus usado en [`TfIdfIndex::build`].
#[derive(Debug, Clone, Default)]
pub struct TfIdfIndex {
    idf: IdfTable,
    vectors: Vec<TermVector>,
}

impl TfIdfIndex {
    /// Recalcula desde cero la IDF y todos los vectores.
    pub fn build(chunks: &[Chunk]) -> Self {
        let idf = compute_idf(chunks);
        let vectors = chunks
            .iter()
            .map(|chunk| vectorize(&chunk.text, &idf))
            .collect();

        debug!(
            "Índice TF-IDF reconstruido: {} chunks, vocabulario de {} términos.",
            chunks.len(),
            idf.len()
        );

        Self { idf, vectors }
    }

    pub fn idf(&self) -> &IdfTable {
        &self.idf
    }

    pub fn vectors(&self) -> &[TermVector] {
        &self.vectors
    }

    /// Vectoriza una consulta reutilizando la IDF del índice.
    pub fn query_vector(&self, text: &str) -> TermVector {
        vectorize(text, &self.idf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;

    fn chunk(source: &str, index: usize, text: &str) -> Chunk {
        Chunk {
            source: source.to_string(),
            chunk_index: index,
            text: text.to_string(),
            content_type: ContentType::Narrative,
        }
    }

    #[test]
    fn test_idf_example_corpus() {
        let chunks = vec![chunk("a", 0, "cat dog"), chunk("b", 0, "dog bird")];
        let idf = compute_idf(&chunks);
        assert_eq!(idf.len(), 3);
        assert_eq!(idf.corpus_size(), 2);
        assert!((idf.get("dog") - 1.0).abs() < 1e-12);
        let expected = (1.5f64).ln() + 1.0;
        assert!((idf.get("cat") - expected).abs() < 1e-12);
        assert!((idf.get("bird") - expected).abs() < 1e-12);
        assert!((idf.get("cat") - 1.405).abs() < 1e-3);
    }

    #[test]
    fn test_idf_ignores_multiplicity() {
        let chunks = vec![chunk("a", 0, "dog dog dog"), chunk("b", 0, "cat")];
        let idf = compute_idf(&chunks);
        assert!((idf.get("dog") - idf.get("cat")).abs() < 1e-12);
    }

    #[test]
    fn test_idf_empty_corpus() {
        let idf = compute_idf(&[]);
        assert!(idf.is_empty());
        assert_eq!(idf.get("anything"), 0.0);
    }

    #[test]
    fn test_universal_term_keeps_positive_weight() {
        let chunks = vec![chunk("a", 0, "the cat"), chunk("b", 0, "the dog")];
        let idf = compute_idf(&chunks);
        assert!(idf.get("the") > 0.0);
    }

    #[test]
    fn test_vectorize_weights() {
        let chunks = vec![chunk("a", 0, "cat dog"), chunk("b", 0, "dog bird")];
        let idf = compute_idf(&chunks);
        let v = vectorize("cat cat dog", &idf);
        assert!((v["cat"] - (2.0 / 3.0) * idf.get("cat")).abs() < 1e-12);
        assert!((v["dog"] - (1.0 / 3.0) * 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_vectorize_unknown_terms_excluded() {
        let chunks = vec![chunk("a", 0, "cat dog")];
        let idf = compute_idf(&chunks);
        let v = vectorize("cat zebra", &idf);
        assert_eq!(v.len(), 1);
        assert!(v.contains_key("cat"));
        // tf se normaliza por el total de tokens, incluidos los desconocidos.
        assert!((v["cat"] - 0.5 * idf.get("cat")).abs() < 1e-12);
    }

    #[test]
    fn test_vectorize_empty_text() {
        let idf = compute_idf(&[chunk("a", 0, "cat")]);
        assert!(vectorize("", &idf).is_empty());
        assert!(vectorize("?!", &idf).is_empty());
    }

    #[test]
    fn test_index_build_aligns_vectors_with_chunks() {
        let chunks = vec![
            chunk("a", 0, "cat dog"),
            chunk("a", 1, "dog bird"),
            chunk("b", 0, "fish"),
        ];
        let index = TfIdfIndex::build(&chunks);
        assert_eq!(index.vectors().len(), 3);
        assert!(index.vectors()[2].contains_key("fish"));
        assert_eq!(index.idf().corpus_size(), 3);
        assert!(index.query_vector("fish").contains_key("fish"));
    }
}
