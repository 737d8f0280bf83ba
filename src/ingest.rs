//! Lectura de ficheros de texto plano e ingesta de directorios completos en
//! la base de conocimiento.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{anyhow, Result};
use mime_guess::MimeGuess;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::{
    app_state::{lock_status, write_kb, SharedKnowledgeBase, Status},
    error::RagError,
    models::IngestReport,
};

/// Extensiones aceptadas aunque su MIME no sea `text/*`.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "rs", "toml", "log", "html", "css", "js", "json", "yaml", "yml", "csv",
];

/// Fichero leído y listo para ingerir.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub text: String,
}

/// Resumen de los resultados de una operación de ingesta.
#[derive(Debug, Default)]
pub struct IngestionSummary {
    pub files_scanned: u32,
    pub files_ingested: u32,
    pub files_skipped: u32,
    pub chunks_created: usize,
}

/// Implementa cómo se mostrará el resumen como texto.
impl std::fmt::Display for IngestionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Resumen: {} ficheros escaneados, {} ingeridos, {} omitidos. {} chunks creados.",
            self.files_scanned, self.files_ingested, self.files_skipped, self.chunks_created
        )
    }
}

fn is_text_file(path: &Path, mime: &str) -> bool {
    if mime.starts_with("text/") {
        return true;
    }
    path.extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lee un fichero de texto plano. Rechaza cualquier otro formato o contenido
/// que no sea UTF-8.
pub fn load_text_file(path: &Path) -> Result<LoadedFile, RagError> {
    let mime = MimeGuess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    if !is_text_file(path, &mime) {
        return Err(RagError::UnsupportedFile {
            path: path.to_path_buf(),
            mime,
        });
    }

    let bytes = fs::read(path).map_err(|source| RagError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let size_bytes = bytes.len() as u64;
    let text = String::from_utf8(bytes).map_err(|_| RagError::UnsupportedFile {
        path: path.to_path_buf(),
        mime: mime.clone(),
    })?;

    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    Ok(LoadedFile {
        name,
        mime_type: mime,
        size_bytes,
        text,
    })
}

/// Lee e ingiere un fichero. `Ok(None)` si se omite (formato no soportado,
/// vacío o duplicado).
pub fn ingest_file(kb: &SharedKnowledgeBase, path: &Path) -> Result<Option<IngestReport>> {
    let file = match load_text_file(path) {
        Ok(file) => file,
        Err(RagError::UnsupportedFile { mime, .. }) => {
            info!("Saltando fichero no soportado ('{}'): {}", mime, path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let result = write_kb(kb).ingest_document(
        &file.name,
        &file.mime_type,
        file.size_bytes,
        &file.text,
    );

    match result {
        Ok(report) => Ok(Some(report)),
        Err(e) if e.is_ingestion() => {
            warn!("Fichero omitido {}: {}", path.display(), e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Recorre recursivamente un directorio e ingiere cada fichero de texto,
/// informando del progreso en `status_arc`.
pub fn ingest_directory(
    kb: &SharedKnowledgeBase,
    root: &Path,
    status_arc: &Mutex<Status>,
) -> Result<IngestionSummary> {
    if !root.is_dir() {
        return Err(anyhow!("La ruta no es un directorio: {}", root.display()));
    }

    let mut summary = IngestionSummary::default();
    let file_entries: Vec<PathBuf> = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    let total_files = file_entries.len() as f32;

    for (index, path) in file_entries.iter().enumerate() {
        summary.files_scanned += 1;
        let filename_str = path.file_name().unwrap_or_default().to_string_lossy();
        let progress = (index + 1) as f32 / total_files;

        {
            let mut status = lock_status(status_arc);
            status.message = format!(
                "[{}/{}] Procesando: {}...",
                index + 1,
                total_files as u32,
                filename_str
            );
            status.progress = progress;
        }

        match ingest_file(kb, path) {
            Ok(Some(report)) => {
                summary.files_ingested += 1;
                summary.chunks_created += report.chunk_count;
            }
            Ok(None) => {
                summary.files_skipped += 1;
                let mut status = lock_status(status_arc);
                status.message = format!(
                    "[{}/{}] Omitido: {}",
                    index + 1,
                    total_files as u32,
                    filename_str
                );
            }
            Err(err) => {
                summary.files_skipped += 1;
                error!("Error ingiriendo {}: {err:#}", path.display());
                let mut status = lock_status(status_arc);
                status.message = format!("ERROR en {}: {}", path.display(), err);
            }
        }
    }

    info!("Ingesta de {} terminada. {}", root.display(), summary);
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::KnowledgeBase;
    use std::sync::{Arc, RwLock};
    use tempfile::TempDir;

    fn shared_kb() -> SharedKnowledgeBase {
        Arc::new(RwLock::new(KnowledgeBase::new()))
    }

    #[test]
    fn test_load_plain_text() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notas.txt");
        fs::write(&path, "Hola mundo").unwrap();

        let file = load_text_file(&path).unwrap();
        assert_eq!(file.name, "notas.txt");
        assert_eq!(file.mime_type, "text/plain");
        assert_eq!(file.size_bytes, 10);
        assert_eq!(file.text, "Hola mundo");
    }

    #[test]
    fn test_rejects_binary_formats() {
        let tmp = TempDir::new().unwrap();
        let pdf = tmp.path().join("informe.pdf");
        fs::write(&pdf, b"%PDF-1.4").unwrap();
        assert!(matches!(
            load_text_file(&pdf),
            Err(RagError::UnsupportedFile { .. })
        ));

        let bad_utf8 = tmp.path().join("roto.txt");
        fs::write(&bad_utf8, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(
            load_text_file(&bad_utf8),
            Err(RagError::UnsupportedFile { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_text_file(&tmp.path().join("no-existe.txt")).unwrap_err();
        assert!(matches!(err, RagError::Io { .. }));
    }

    #[test]
    fn test_ingest_directory_summary() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("alpha.md"), "Rust y cargo.").unwrap();
        fs::write(root.join("beta.txt"), "Python y pip.").unwrap();
        fs::write(root.join("vacio.txt"), "   ").unwrap();
        fs::write(root.join("imagen.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("gamma.txt"), "Docker y Kubernetes.").unwrap();

        let kb = shared_kb();
        let status = Mutex::new(Status::ready());
        let summary = ingest_directory(&kb, root, &status).unwrap();

        assert_eq!(summary.files_scanned, 5);
        assert_eq!(summary.files_ingested, 3);
        assert_eq!(summary.files_skipped, 2);
        assert_eq!(summary.chunks_created, 3);
        assert_eq!(lock_status(&status).progress, 1.0);

        let kb = kb.read().unwrap();
        let names: Vec<&str> = kb.documents().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["alpha.md", "beta.txt", "gamma.txt"]);
    }

    #[test]
    fn test_ingest_directory_skips_duplicates() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("a.txt"), "uno").unwrap();
        fs::create_dir(root.join("copia")).unwrap();
        fs::write(root.join("copia").join("a.txt"), "dos").unwrap();

        let kb = shared_kb();
        let status = Mutex::new(Status::ready());
        let summary = ingest_directory(&kb, root, &status).unwrap();
        assert_eq!(summary.files_ingested, 1);
        assert_eq!(summary.files_skipped, 1);
    }

    #[test]
    fn test_ingest_directory_requires_dir() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "uno").unwrap();
        let status = Mutex::new(Status::ready());
        assert!(ingest_directory(&shared_kb(), &file, &status).is_err());
    }
}
