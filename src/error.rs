//! Errores tipados del núcleo de recuperación.

use std::path::PathBuf;
use thiserror::Error;

/// Error principal del sistema RAG.
#[derive(Error, Debug)]
pub enum RagError {
    /// Configuración inválida (perfil de chunking que no avanza, umbrales fuera de rango...).
    #[error("Error de configuración: {0}")]
    Configuration(String),

    /// El texto del documento queda vacío tras recortar espacios.
    #[error("El documento '{name}' no contiene texto útil para indexar")]
    EmptyDocument { name: String },

    /// Ya existe un documento con ese nombre en la base de conocimiento.
    #[error("El documento '{name}' ya fue ingerido; limpia la base de conocimiento antes de volver a cargarlo")]
    DuplicateDocument { name: String },

    /// El fichero no es texto plano.
    #[error("Tipo de fichero no soportado ({mime}): {path}")]
    UnsupportedFile { path: PathBuf, mime: String },

    /// Errores de E/S al leer ficheros.
    #[error("Error de E/S en {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RagError {
    /// Errores recuperables de ingesta que se devuelven al llamador.
    pub fn is_ingestion(&self) -> bool {
        matches!(
            self,
            Self::EmptyDocument { .. } | Self::DuplicateDocument { .. }
        )
    }
}

/// Tipo `Result` del núcleo.
pub type Result<T> = std::result::Result<T, RagError>;
