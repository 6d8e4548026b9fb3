//! Deployment Templates
//!
//! Renders the host files a casker needs once it has a port:
//! the systemd unit, the nginx location partial and the PWA manifest.

use serde_json::Value;

/// Renderer for per-casker deployment files.
pub struct DeploymentTemplates;

impl DeploymentTemplates {
    /// Longest accepted casker name.
    pub const MAX_NAME_LEN: usize = 64;

    /// Render the systemd unit that runs the casker on `127.0.0.1:{port}`.
    ///
    /// `deploy_root` is the directory holding one subdirectory per casker.
    pub fn systemd_unit(name: &str, port: u16, deploy_root: &str) -> String {
        let dir = format!("{}/{}", deploy_root.trim_end_matches('/'), name);
        format!(
            "[Unit]\n\
             Description={name}\n\
             \n\
             [Service]\n\
             Type=simple\n\
             User=root\n\
             Group=root\n\
             WorkingDirectory={dir}\n\
             LimitNOFILE=4096\n\
             Restart=always\n\
             RestartSec=5s\n\
             StandardOutput=append:{dir}/errors.log\n\
             StandardError=append:{dir}/errors.log\n\
             ExecStart={dir}/myapp serve --http=\"127.0.0.1:{port}\"\n\
             \n\
             [Install]\n\
             WantedBy=multi-user.target\n"
        )
    }

    /// Render the nginx location block proxying `/{name}/` to the casker.
    pub fn nginx_location(name: &str, port: u16) -> String {
        format!(
            "location /{name}/ {{\n\
             \x20   proxy_set_header Connection '';\n\
             \x20   proxy_http_version 1.1;\n\
             \x20   proxy_read_timeout 360s;\n\
             \n\
             \x20   proxy_set_header Host $host;\n\
             \x20   proxy_set_header X-Real-IP $remote_addr;\n\
             \x20   proxy_set_header X-Forwarded-For $proxy_add_x_forwarded_for;\n\
             \x20   proxy_set_header X-Forwarded-Proto $scheme;\n\
             \n\
             \x20   rewrite ^/{name}/(.*)$ /$1 break;\n\
             \n\
             \x20   proxy_pass http://127.0.0.1:{port}/;\n\
             }}\n"
        )
    }

    /// Rewrite the identity fields of a web app manifest.
    ///
    /// Sets `name`, `short_name` and `id`; every other field is kept.
    pub fn update_manifest(manifest: &str, name: &str) -> Result<String, serde_json::Error> {
        let mut value: Value = serde_json::from_str(manifest)?;

        if let Value::Object(map) = &mut value {
            map.insert("name".to_string(), Value::String(name.to_string()));
            map.insert("short_name".to_string(), Value::String(name.to_string()));
            map.insert("id".to_string(), Value::String(format!("/{}", name)));
        }

        serde_json::to_string_pretty(&value)
    }

    /// Check that a name is usable as a path segment, unit name and
    /// nginx location.
    ///
    /// Only ASCII letters, digits, `-` and `_` are allowed, up to
    /// [`MAX_NAME_LEN`](Self::MAX_NAME_LEN) characters. A leading `-` would
    /// be read as an option by `systemctl`.
    pub fn is_safe_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= Self::MAX_NAME_LEN
            && !name.starts_with('-')
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_systemd_unit_contents() {
        let unit = DeploymentTemplates::systemd_unit("alice", 8093, "/var/www/casker/caskers/");

        assert!(unit.starts_with("[Unit]\nDescription=alice\n"));
        assert!(unit.contains("WorkingDirectory=/var/www/casker/caskers/alice\n"));
        assert!(unit.contains(
            "ExecStart=/var/www/casker/caskers/alice/myapp serve --http=\"127.0.0.1:8093\"\n"
        ));
        assert!(unit.contains("StandardError=append:/var/www/casker/caskers/alice/errors.log\n"));
        assert!(unit.contains("Restart=always\n"));
        assert!(unit.contains("RestartSec=5s\n"));
        assert!(unit.ends_with("WantedBy=multi-user.target\n"));
    }

    #[test]
    fn test_nginx_location_contents() {
        let conf = DeploymentTemplates::nginx_location("alice", 8093);

        assert!(conf.starts_with("location /alice/ {\n"));
        assert!(conf.contains("    rewrite ^/alice/(.*)$ /$1 break;\n"));
        assert!(conf.contains("    proxy_pass http://127.0.0.1:8093/;\n"));
        assert!(conf.contains("proxy_set_header X-Real-IP $remote_addr;"));
        assert!(conf.ends_with("}\n"));
    }

    #[test]
    fn test_update_manifest_sets_identity_and_keeps_rest() {
        let manifest = serde_json::json!({
            "name": "default",
            "short_name": "default",
            "id": "/default",
            "display": "standalone",
            "icons": [{"src": "icon192.png", "sizes": "192x192", "type": "image/png"}]
        })
        .to_string();

        let updated = DeploymentTemplates::update_manifest(&manifest, "alice").unwrap();
        let value: Value = serde_json::from_str(&updated).unwrap();

        assert_eq!(value["name"], "alice");
        assert_eq!(value["short_name"], "alice");
        assert_eq!(value["id"], "/alice");
        assert_eq!(value["display"], "standalone");
        assert_eq!(value["icons"][0]["sizes"], "192x192");
    }

    #[test]
    fn test_update_manifest_invalid_json() {
        assert!(DeploymentTemplates::update_manifest("{not json", "alice").is_err());
    }

    #[test]
    fn test_is_safe_name() {
        assert!(DeploymentTemplates::is_safe_name("alice"));
        assert!(DeploymentTemplates::is_safe_name("alice-2"));
        assert!(!DeploymentTemplates::is_safe_name(""));
        assert!(!DeploymentTemplates::is_safe_name(".."));
        assert!(!DeploymentTemplates::is_safe_name("a/b"));
        assert!(!DeploymentTemplates::is_safe_name("a\\b"));
        assert!(!DeploymentTemplates::is_safe_name("a b"));
    }

    #[test]
    fn test_is_safe_name_rejects_config_syntax() {
        for name in ["x;}", "a{b}", "a$host", "a@b", "a.(*)", ".", "a\0b", "-now", "caf\u{e9}"] {
            assert!(
                !DeploymentTemplates::is_safe_name(name),
                "{:?} should be rejected",
                name
            );
        }
        assert!(DeploymentTemplates::is_safe_name("my_casker-01"));
    }

    #[test]
    fn test_is_safe_name_length_cap() {
        let longest = "a".repeat(DeploymentTemplates::MAX_NAME_LEN);
        assert!(DeploymentTemplates::is_safe_name(&longest));
        assert!(!DeploymentTemplates::is_safe_name(&format!("{}a", longest)));
    }
}
