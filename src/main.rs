//! casker-intake - Casker submission service with Hexagonal Architecture
//!
//! This is the composition root that wires together all the components.

use casker_intake::adapters::inbound::ApiServer;
use casker_intake::adapters::outbound::{
    FsProvisioner, InMemoryRecordStore, PocketBaseConfig, PocketBaseRecordStore, ProvisionConfig,
    SystemctlServiceControl,
};
use casker_intake::application::SubmissionService;
use casker_intake::config::{load_config, StoreKind};
use casker_intake::domain::ports::{Provisioner, RecordStore};
use casker_intake::infrastructure::{shutdown_signal, ShutdownController};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    let port_range = cfg.port_range()?;

    tracing::info!(
        "starting casker-intake listen={} ports={} store={:?}",
        cfg.listen_addr,
        port_range,
        cfg.store
    );

    // ===== COMPOSITION ROOT =====

    // 1. Create outbound adapters

    let store: Arc<dyn RecordStore> = match cfg.store {
        StoreKind::PocketBase => {
            let store = PocketBaseRecordStore::new(PocketBaseConfig {
                base_url: cfg.pocketbase_url.clone(),
                collection: cfg.collection.clone(),
                page_size: cfg.page_size,
                timeout: cfg.store_timeout_secs.map(Duration::from_secs),
            })?;
            tracing::info!(
                "using PocketBase at {} (collection {})",
                cfg.pocketbase_url,
                cfg.collection
            );
            Arc::new(store)
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory record store, records are lost on exit");
            Arc::new(InMemoryRecordStore::new())
        }
    };

    let provisioner: Option<Arc<dyn Provisioner>> = if cfg.provision_enabled {
        let provision_config = ProvisionConfig {
            template_dir: PathBuf::from(&cfg.template_dir),
            caskers_dir: PathBuf::from(&cfg.caskers_dir),
            deploy_root: cfg.deploy_root.clone(),
            systemd_dir: PathBuf::from(&cfg.systemd_dir),
            nginx_dir: PathBuf::from(&cfg.nginx_dir),
        };
        tracing::info!("provisioning enabled (template {})", cfg.template_dir);
        Some(Arc::new(FsProvisioner::new(
            provision_config,
            Arc::new(SystemctlServiceControl::new()),
        )) as Arc<dyn Provisioner>)
    } else {
        None
    };

    // 2. Create application service
    let service = Arc::new(SubmissionService::new(
        store,
        provisioner,
        port_range,
        cfg.icon_policy,
        cfg.public_base_url.clone(),
    ));

    // 3. Create inbound adapter and run until a shutdown signal
    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server = ApiServer::new(cfg.listen_addr, service)
        .with_max_upload_bytes(cfg.max_upload_bytes)
        .with_cors(cfg.cors_enabled);

    server.run(shutdown.wait()).await
}
