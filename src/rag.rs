//! Consulta RAG contra la base de conocimiento en memoria.
//!
//! Flujo:
//!   1. Expansión de la consulta (reformulaciones alternativas).
//!   2. Consulta original + reformulaciones concatenadas en una sola consulta léxica.
//!   3. Recuperación top-k por similitud coseno TF-IDF.
//!   4. El LLM responde usando sólo los chunks recuperados.

use serde::Serialize;
use tracing::info;

use crate::{
    app_state::{read_kb, SharedKnowledgeBase},
    llm::{AnswerGenerator, QueryExpander},
    models::ScoredChunk,
};

/// Respuesta cuando ningún chunk supera el umbral de relevancia.
pub const NO_CONTEXT_ANSWER: &str =
    "No se encontró información relevante en los documentos para responder a esta pregunta.";

/// Respuesta de una consulta RAG.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    pub sources: Vec<ScoredChunk>,
    pub expanded_queries: Vec<String>,
}

/// Une la consulta original y sus reformulaciones en una única consulta.
pub fn build_retrieval_query(question: &str, expansions: &[String]) -> String {
    std::iter::once(question)
        .chain(expansions.iter().map(String::as_str))
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lanza una consulta RAG completa.
///
/// El lock de lectura sólo se mantiene durante la recuperación, nunca
/// mientras se espera a los colaboradores externos.
pub async fn answer_question(
    kb: &SharedKnowledgeBase,
    generator: &dyn AnswerGenerator,
    expander: &dyn QueryExpander,
    question: &str,
    top_k: usize,
) -> RagAnswer {
    // 1) Expansión (si falla, el expansor devuelve una lista vacía)
    let expanded_queries = expander.expand(question).await;

    // 2-3) Recuperación léxica
    let retrieval_query = build_retrieval_query(question, &expanded_queries);
    let sources = read_kb(kb).search(&retrieval_query, top_k);

    if sources.is_empty() {
        info!("Consulta sin contexto relevante: {question}");
        return RagAnswer {
            answer: NO_CONTEXT_ANSWER.to_string(),
            sources,
            expanded_queries,
        };
    }

    // 4) Preguntar al LLM con el contexto recuperado
    let context: Vec<_> = sources.iter().map(|s| s.chunk.clone()).collect();
    let answer = generator.generate(question, &context).await;

    info!(
        "Consulta respondida con {} chunks ({} reformulaciones).",
        sources.len(),
        expanded_queries.len()
    );

    RagAnswer {
        answer,
        sources,
        expanded_queries,
    }
}
