use crate::domain::value_objects::{IconPolicy, PortRange};
use serde::Deserialize;

/// Which record store backs the service.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    PocketBase,
    Memory,
}

impl StoreKind {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Self::Memory,
            _ => Self::PocketBase,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // HTTP API settings
    pub listen_addr: String,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
    pub cors_enabled: bool,
    pub debug: bool,

    // Record store settings
    pub store: StoreKind,
    pub pocketbase_url: String,
    pub collection: String,
    pub page_size: u32,
    pub store_timeout_secs: Option<u64>,

    // Allocation settings
    pub port_range_start: u16,
    pub port_range_end: u16,
    pub icon_policy: IconPolicy,

    // Provisioning settings
    pub provision_enabled: bool,
    pub template_dir: String,
    pub caskers_dir: String,
    pub deploy_root: String,
    pub systemd_dir: String,
    pub nginx_dir: String,
}

impl Config {
    /// The validated allocation range.
    pub fn port_range(&self) -> anyhow::Result<PortRange> {
        Ok(PortRange::new(self.port_range_start, self.port_range_end)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            public_base_url: "http://casker.veskoart.net/".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            cors_enabled: true,
            debug: false,
            store: StoreKind::PocketBase,
            pocketbase_url: "http://127.0.0.1:8090".to_string(),
            collection: "caskers".to_string(),
            page_size: 500,
            store_timeout_secs: None,
            port_range_start: 8092,
            port_range_end: 8190,
            icon_policy: IconPolicy::RecordPerFile,
            provision_enabled: false,
            template_dir: "./caskers/default".to_string(),
            caskers_dir: "./caskers".to_string(),
            deploy_root: "/var/www/casker/caskers".to_string(),
            systemd_dir: "/lib/systemd/system".to_string(),
            nginx_dir: "/etc/nginx/sites-partials".to_string(),
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Build the config from an arbitrary variable lookup.
pub fn load_config_from<F>(lookup: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
    let flag = |key: &str, default: bool| {
        lookup(key)
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(default)
    };

    let listen_addr = string("CASKER_LISTEN_ADDR", &defaults.listen_addr);
    let public_base_url = string("CASKER_PUBLIC_BASE_URL", &defaults.public_base_url);

    let max_upload_bytes = lookup("CASKER_MAX_UPLOAD_BYTES")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.max_upload_bytes);

    let cors_enabled = flag("CASKER_CORS_ENABLED", defaults.cors_enabled);
    let debug = lookup("DEBUG").is_some();

    // Record store settings
    let store = lookup("CASKER_STORE")
        .map(|v| StoreKind::from_str(&v))
        .unwrap_or(defaults.store);

    let pocketbase_url = string("CASKER_POCKETBASE_URL", &defaults.pocketbase_url);
    let collection = string("CASKER_COLLECTION", &defaults.collection);

    let page_size = lookup("CASKER_PAGE_SIZE")
        .and_then(|v| v.parse().ok())
        .filter(|&n: &u32| n > 0)
        .unwrap_or(defaults.page_size);

    let store_timeout_secs = lookup("CASKER_STORE_TIMEOUT_SECS").and_then(|v| v.parse().ok());

    // Allocation settings
    let port_range_start = lookup("CASKER_PORT_RANGE_START")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.port_range_start);

    let port_range_end = lookup("CASKER_PORT_RANGE_END")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.port_range_end);

    if port_range_start > port_range_end {
        anyhow::bail!(
            "CASKER_PORT_RANGE_START ({}) must not exceed CASKER_PORT_RANGE_END ({})",
            port_range_start,
            port_range_end
        );
    }

    let icon_policy = lookup("CASKER_ICON_POLICY")
        .map(|v| IconPolicy::from_str(&v))
        .unwrap_or(defaults.icon_policy);

    // Provisioning settings
    let provision_enabled = flag("CASKER_PROVISION_ENABLED", defaults.provision_enabled);
    let template_dir = string("CASKER_TEMPLATE_DIR", &defaults.template_dir);
    let caskers_dir = string("CASKER_CASKERS_DIR", &defaults.caskers_dir);
    let deploy_root = string("CASKER_DEPLOY_ROOT", &defaults.deploy_root);
    let systemd_dir = string("CASKER_SYSTEMD_DIR", &defaults.systemd_dir);
    let nginx_dir = string("CASKER_NGINX_DIR", &defaults.nginx_dir);

    Ok(Config {
        listen_addr,
        public_base_url,
        max_upload_bytes,
        cors_enabled,
        debug,
        store,
        pocketbase_url,
        collection,
        page_size,
        store_timeout_secs,
        port_range_start,
        port_range_end,
        icon_policy,
        provision_enabled,
        template_dir,
        caskers_dir,
        deploy_root,
        systemd_dir,
        nginx_dir,
    })
}
