//! Filesystem Provisioner
//!
//! Implements Provisioner by laying out the casker directory from a
//! template, writing its systemd unit and nginx partial, and driving
//! the service manager.

use crate::domain::entities::{CaskerRecord, IconFile};
use crate::domain::ports::{ProvisionError, Provisioner, ServiceControl};
use crate::domain::services::DeploymentTemplates;
use async_trait::async_trait;
use image::imageops::FilterType;
use image::{ImageError, ImageFormat};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// Host layout used when provisioning.
#[derive(Debug, Clone)]
pub struct ProvisionConfig {
    /// Directory copied for every new casker
    pub template_dir: PathBuf,
    /// Directory receiving one subdirectory per casker
    pub caskers_dir: PathBuf,
    /// Absolute path of `caskers_dir` as seen by systemd
    pub deploy_root: String,
    /// Where unit files are written
    pub systemd_dir: PathBuf,
    /// Where nginx location partials are written
    pub nginx_dir: PathBuf,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("./caskers/default"),
            caskers_dir: PathBuf::from("./caskers"),
            deploy_root: "/var/www/casker/caskers".to_string(),
            systemd_dir: PathBuf::from("/lib/systemd/system"),
            nginx_dir: PathBuf::from("/etc/nginx/sites-partials"),
        }
    }
}

/// Provisioner writing to the local filesystem.
pub struct FsProvisioner {
    config: ProvisionConfig,
    services: Arc<dyn ServiceControl>,
}

impl FsProvisioner {
    pub fn new(config: ProvisionConfig, services: Arc<dyn ServiceControl>) -> Self {
        Self { config, services }
    }

    /// Path of the provisioned casker directory.
    pub fn casker_dir(&self, name: &str) -> PathBuf {
        self.config.caskers_dir.join(name)
    }

    async fn copy_template(&self, target: PathBuf) -> Result<(), ProvisionError> {
        let source = self.config.template_dir.clone();
        tokio::task::spawn_blocking(move || copy_dir_all(&source, &target))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
            .and_then(|result| result)
            .map_err(|source| ProvisionError::Io {
                step: "copy template directory",
                source,
            })
    }

    /// Rewrite the manifest identity. Failures are logged only.
    async fn update_manifest(&self, dir: &Path, name: &str) {
        let path = dir.join("pb_public").join("manifest.json");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("cannot read manifest {}: {}", path.display(), e);
                return;
            }
        };

        match DeploymentTemplates::update_manifest(&content, name) {
            Ok(updated) => {
                if let Err(e) = tokio::fs::write(&path, updated).await {
                    tracing::warn!("cannot write manifest {}: {}", path.display(), e);
                }
            }
            Err(e) => tracing::warn!("invalid manifest {}: {}", path.display(), e),
        }
    }

    async fn write_icons(&self, dir: &Path, icon: &IconFile) -> Result<(), ProvisionError> {
        let public = dir.join("pb_public");
        let data = icon.data.clone();

        tokio::task::spawn_blocking(move || write_resized_icons(&public, &data))
            .await
            .map_err(|e| ProvisionError::Io {
                step: "resize icon",
                source: io::Error::new(io::ErrorKind::Other, e),
            })?
    }
}

#[async_trait]
impl Provisioner for FsProvisioner {
    async fn provision(
        &self,
        record: &CaskerRecord,
        icon: Option<&IconFile>,
    ) -> Result<(), ProvisionError> {
        let name = record.name.as_str();
        if !DeploymentTemplates::is_safe_name(name) {
            return Err(ProvisionError::InvalidName(name.to_string()));
        }

        let dir = self.casker_dir(name);
        self.copy_template(dir.clone()).await?;
        self.update_manifest(&dir, name).await;

        match icon {
            Some(icon) => self.write_icons(&dir, icon).await?,
            None => tracing::warn!("no icon for {}, keeping template icons", name),
        }

        let unit = DeploymentTemplates::systemd_unit(name, record.port, &self.config.deploy_root);
        let unit_name = format!("{}.service", name);
        tokio::fs::write(self.config.systemd_dir.join(&unit_name), unit)
            .await
            .map_err(|source| ProvisionError::Io {
                step: "write systemd unit",
                source,
            })?;

        self.services.run(&["enable", &unit_name]).await?;
        self.services.run(&["start", &unit_name]).await?;

        let location = DeploymentTemplates::nginx_location(name, record.port);
        tokio::fs::write(self.config.nginx_dir.join(format!("{}.conf", name)), location)
            .await
            .map_err(|source| ProvisionError::Io {
                step: "write nginx config",
                source,
            })?;

        self.services.run(&["restart", "nginx"]).await?;

        tracing::info!("provisioned {} on port {}", name, record.port);
        Ok(())
    }
}

/// Icon files written into `pb_public`, with their square size.
const ICON_SIZES: [(&str, u32); 2] = [("icon192.png", 192), ("icon512.png", 512)];

/// Decode the uploaded icon and write it as PNG at every size in `ICON_SIZES`.
fn write_resized_icons(public: &Path, data: &[u8]) -> Result<(), ProvisionError> {
    std::fs::create_dir_all(public).map_err(|source| ProvisionError::Io {
        step: "create public directory",
        source,
    })?;

    let icon = image::load_from_memory(data).map_err(|e| ProvisionError::Io {
        step: "resize icon",
        source: image_io_error(e),
    })?;

    for (file, size) in ICON_SIZES {
        icon.resize_exact(size, size, FilterType::Lanczos3)
            .save_with_format(public.join(file), ImageFormat::Png)
            .map_err(|e| ProvisionError::Io {
                step: "write icon",
                source: image_io_error(e),
            })?;
    }
    Ok(())
}

fn image_io_error(e: ImageError) -> io::Error {
    match e {
        ImageError::IoError(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}

/// Recursively copy `src` into `dst`, creating directories as needed.
fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
