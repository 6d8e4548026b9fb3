//! PocketBase Record Store
//!
//! Implements RecordStore using the PocketBase records REST API.
//! Listing follows every page (the `getFullList` behaviour); creation
//! sends a multipart form so icon files travel with the record.

use crate::domain::entities::{CaskerRecord, IconFile, NewRecord};
use crate::domain::ports::{RecordStore, StoreError};
use crate::domain::value_objects::SortSpec;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// One page of PocketBase's list endpoint.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[allow(dead_code)]
    page: u32,
    #[serde(rename = "totalPages", default)]
    total_pages: Option<i64>,
    #[serde(default)]
    items: Vec<Value>,
}

/// Error body returned by PocketBase on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Configuration for the PocketBase connection.
#[derive(Debug, Clone)]
pub struct PocketBaseConfig {
    /// Base URL of the PocketBase instance (e.g., "http://127.0.0.1:8090")
    pub base_url: String,
    /// Collection holding the caskers
    pub collection: String,
    /// Records requested per list page
    pub page_size: u32,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Default for PocketBaseConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            collection: "caskers".to_string(),
            page_size: 500,
            timeout: None,
        }
    }
}

/// PocketBase-backed record store.
pub struct PocketBaseRecordStore {
    config: PocketBaseConfig,
    client: reqwest::Client,
}

impl PocketBaseRecordStore {
    /// Create a new store with the given configuration.
    pub fn new(config: PocketBaseConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    fn records_url(&self) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.config.base_url.trim_end_matches('/'),
            self.config.collection
        )
    }

    async fn fetch_page(&self, page: u32, sort: &SortSpec) -> Result<ListResponse, StoreError> {
        let response = self
            .client
            .get(self.records_url())
            .query(&[
                ("page", page.to_string()),
                ("perPage", self.config.page_size.to_string()),
                ("sort", sort.to_query()),
            ])
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    /// Turn a non-2xx response into a `Rejected` error.
    async fn rejected(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        StoreError::Rejected { status, message }
    }

    fn icon_part(icon: &IconFile) -> Part {
        let part = Part::bytes(icon.data.to_vec()).file_name(icon.file_name.clone());
        match &icon.content_type {
            Some(content_type) => match part.mime_str(content_type) {
                Ok(part) => part,
                Err(_) => Part::bytes(icon.data.to_vec()).file_name(icon.file_name.clone()),
            },
            None => part,
        }
    }

    /// Decode a record item.
    ///
    /// The `port` field is accepted as an integer, an integral float or a
    /// numeric string; anything else (or out of `u16` range) is an error.
    pub fn decode_record(item: &Value) -> Result<CaskerRecord, String> {
        let id = item
            .get("id")
            .and_then(Value::as_str)
            .ok_or("missing id")?
            .to_string();

        let port = item
            .get("port")
            .and_then(parse_port)
            .ok_or_else(|| format!("record {} has no usable port: {:?}", id, item.get("port")))?;

        let text = |key: &str| {
            item.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let icon = match item.get("icon") {
            Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        Ok(CaskerRecord {
            id,
            name: text("name"),
            email: text("email"),
            port,
            active: item.get("active").and_then(Value::as_bool).unwrap_or(false),
            icon,
        })
    }
}

/// Coerce a JSON port value into `u16`.
fn parse_port(value: &Value) -> Option<u16> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_u64() {
                u16::try_from(i).ok()
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f >= 0.0 && f <= f64::from(u16::MAX) {
                    Some(f as u16)
                } else {
                    None
                }
            }
        }
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    }
}

#[async_trait]
impl RecordStore for PocketBaseRecordStore {
    async fn fetch_all(&self, sort: &SortSpec) -> Result<Vec<CaskerRecord>, StoreError> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let list = self.fetch_page(page, sort).await?;
            let count = list.items.len();

            for item in &list.items {
                match Self::decode_record(item) {
                    Ok(record) => records.push(record),
                    Err(e) => tracing::warn!("skipping record: {}", e),
                }
            }

            let last_page = match list.total_pages {
                Some(total) if total >= 0 => i64::from(page) >= total,
                _ => false,
            };
            if last_page || count == 0 || count < self.config.page_size as usize {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            "fetched {} records from {} ({} pages)",
            records.len(),
            self.config.collection,
            page
        );

        Ok(records)
    }

    async fn create(&self, record: NewRecord) -> Result<CaskerRecord, StoreError> {
        let mut form = Form::new()
            .text("name", record.name.clone())
            .text("email", record.email.clone())
            .text("active", record.active.to_string())
            .text("port", record.port.to_string());

        for icon in &record.icons {
            form = form.part("icon", Self::icon_part(icon));
        }

        let response = self
            .client
            .post(self.records_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejected(response).await);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Self::decode_record(&body).map_err(StoreError::InvalidResponse)
    }
}
