use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, Result};
use axum::Router;
use lexical_rag::{
    api,
    app_state::{AppState, Status},
    config::AppConfig,
    ingest,
    knowledge_base::KnowledgeBase,
    llm::{LlmManager, NoExpansion, QueryExpander},
};
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Cargar .env e inicializar logging
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 2. Cargar y validar configuración
    let cfg = AppConfig::from_env().context("Error al cargar la configuración")?;

    // 3. Base de conocimiento vacía
    let knowledge_base = Arc::new(RwLock::new(KnowledgeBase::with_config(
        cfg.chunking,
        cfg.ranking,
    )?));

    // 4. Inicializar gestor de LLMs
    let llm_manager = Arc::new(LlmManager::from_config(&cfg)?);
    let expander: Arc<dyn QueryExpander> = if cfg.query_expansion {
        llm_manager.clone()
    } else {
        Arc::new(NoExpansion)
    };

    // Crear canal para la señal de apagado.
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    // 5. Crear estado compartido de la aplicación
    let app_state = AppState {
        config: cfg.clone(),
        knowledge_base,
        generator: llm_manager,
        expander,
        status: Arc::new(Mutex::new(Status::ready())),
        shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
    };

    // 6. Ingesta inicial opcional
    if let Some(dir) = cfg.knowledge_dir.clone() {
        let kb = app_state.knowledge_base.clone();
        let status = app_state.status.clone();
        let result =
            tokio::task::spawn_blocking(move || ingest::ingest_directory(&kb, &dir, &status))
                .await?;
        match result {
            Ok(summary) => info!("Ingesta inicial completada. {summary}"),
            Err(e) => warn!("No se pudo completar la ingesta inicial: {e:#}"),
        }
    }

    // 7. Configurar el router de la API
    let app = Router::new()
        .merge(api::create_router(app_state.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // 8. Iniciar el servidor
    let server_addr = &app_state.config.server_addr;
    let listener = tokio::net::TcpListener::bind(server_addr)
        .await
        .with_context(|| format!("No se pudo escuchar en {server_addr}"))?;
    info!("🚀 Servidor escuchando en http://{}", server_addr);

    // Configurar el apagado ordenado.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Señal de apagado recibida, iniciando cierre del servidor.");
        })
        .await?;

    info!("✅ Servidor cerrado correctamente.");
    Ok(())
}
