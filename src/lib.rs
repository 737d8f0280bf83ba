//! Sistema RAG con índice léxico en memoria.
//!
//! El núcleo de recuperación (clasificación, chunking, tokenización, TF-IDF y
//! ranking por coseno) es síncrono y no depende de red ni de disco. A su
//! alrededor viven los colaboradores externos (LLM, lectura de ficheros) y el
//! API web.

pub mod api;
pub mod app_state;
pub mod chunker;
pub mod classifier;
pub mod config;
pub mod error;
pub mod ingest;
pub mod knowledge_base;
pub mod llm;
pub mod models;
pub mod rag;
pub mod similarity;
pub mod tfidf;
pub mod tokenizer;

pub use error::{RagError, Result};
pub use knowledge_base::KnowledgeBase;
