//! Corpus metadata store.
//!
//! A small JSON file produced by the offline indexing step. It names the
//! persistent store the external service searches and maps the service's
//! internal document ids back to the original filenames:
//!
//! ```json
//! { "store_id": "fileSearchStores/...", "file_mapping": { "9ky8rgmy5pdk": "392_20210722_銀行局_未指定.txt" } }
//! ```
//!
//! Files written by the older indexer (`store_resource_name` plus a `files`
//! list) are accepted as well.

use chrono::{DateTime, Utc};
use fsc_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Immutable store metadata, loaded once at engine construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreInfo {
    /// Opaque, service-assigned store identifier
    pub store_id: String,

    /// Internal document id -> original filename
    #[serde(rename = "file_mapping")]
    pub file_id_to_name: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    /// Unix seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_files: Option<usize>,
}

/// Raw file layout; every field optional so validation can report precisely.
#[derive(Debug, Deserialize)]
struct StoreInfoFile {
    #[serde(alias = "store_resource_name")]
    store_id: Option<String>,
    file_mapping: Option<BTreeMap<String, String>>,
    files: Option<Vec<UploadedFile>>,
    created_time: Option<String>,
    created_at: Option<f64>,
    total_files: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    display_name: String,
    file_name: String,
}

impl StoreInfo {
    /// Load and validate the metadata file.
    ///
    /// The file is written by the indexing job that created the store; it is
    /// read once at startup and never modified by the service.
    ///
    /// # Arguments
    /// * `path` - Location of `store_info.json` (already resolved against the root)
    ///
    /// # Returns
    /// The parsed metadata. A missing `file_mapping` yields an empty mapping.
    ///
    /// # Errors
    /// `AppError::Config` when the file is missing, unreadable, not JSON, or
    /// has no `store_id`.
    ///
    /// # Example
    /// ```no_run
    /// use fsc_engine::StoreInfo;
    /// use std::path::Path;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = StoreInfo::load(Path::new("data/gemini_corpus/store_info.json"))?;
    /// println!("{} files in {}", store.file_count(), store.store_id);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "Store metadata not found at {:?}. Build the index first.",
                path
            )));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read store metadata {:?}: {}", path, e))
        })?;

        let info = Self::from_json_str(&contents)
            .map_err(|e| AppError::Config(format!("{:?}: {}", path, e)))?;

        tracing::info!(
            store_id = %info.store_id,
            mapped_files = info.file_id_to_name.len(),
            "Loaded store metadata"
        );

        Ok(info)
    }

    /// Parse and validate metadata from a JSON string.
    pub fn from_json_str(contents: &str) -> AppResult<Self> {
        let raw: StoreInfoFile = serde_json::from_str(contents)
            .map_err(|e| AppError::Config(format!("Malformed store metadata: {}", e)))?;

        let store_id = raw
            .store_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::Config("Store metadata is missing store_id".to_string())
            })?;

        let file_id_to_name = match (raw.file_mapping, raw.files) {
            (Some(mapping), _) => mapping,
            (None, Some(files)) => files
                .into_iter()
                .map(|f| (f.file_name, f.display_name))
                .collect(),
            (None, None) => {
                tracing::warn!(
                    "Store metadata has no file_mapping; sources will show raw document ids"
                );
                BTreeMap::new()
            }
        };

        Ok(Self {
            store_id,
            file_id_to_name,
            created_time: raw.created_time,
            created_at: raw.created_at,
            total_files: raw.total_files,
        })
    }

    /// Write the metadata back out as pretty JSON (non-ASCII kept verbatim).
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        tracing::debug!("Saved store metadata to {:?}", path);
        Ok(())
    }

    /// Resolve a document id to its original filename.
    ///
    /// Tries the id as-is, then its last path segment (`files/abc` finds key
    /// `abc`). A bare id is also matched against the last segment of each
    /// key (`abc` finds key `files/abc`).
    ///
    /// # Example
    /// ```
    /// use fsc_engine::StoreInfo;
    ///
    /// let store = StoreInfo::from_json_str(
    ///     r#"{"store_id": "fileSearchStores/fsc", "file_mapping": {"abc": "392.txt"}}"#,
    /// ).unwrap();
    /// assert_eq!(store.resolve_filename("files/abc"), Some("392.txt"));
    /// assert_eq!(store.resolve_filename("zz999"), None);
    /// ```
    pub fn resolve_filename(&self, document_id: &str) -> Option<&str> {
        if let Some(name) = self.file_id_to_name.get(document_id) {
            return Some(name);
        }

        let tail = document_id.rsplit('/').next()?;
        if tail == document_id {
            return self
                .file_id_to_name
                .iter()
                .find(|(key, _)| key.rsplit('/').next() == Some(document_id))
                .map(|(_, name)| name.as_str());
        }

        self.file_id_to_name.get(tail).map(String::as_str)
    }

    /// Number of indexed files; the recorded total wins over the mapping size.
    pub fn file_count(&self) -> usize {
        self.total_files.unwrap_or(self.file_id_to_name.len())
    }

    /// Human-readable creation time, if known.
    pub fn created_display(&self) -> Option<String> {
        if let Some(ref time) = self.created_time {
            return Some(time.clone());
        }

        self.created_timestamp()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    }

    /// Hours elapsed since the store was created.
    pub fn age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        self.created_timestamp()
            .map(|created| (now - created).num_seconds() as f64 / 3600.0)
    }

    fn created_timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = self.created_at?;
        DateTime::from_timestamp(secs.trunc() as i64, 0)
    }
}
