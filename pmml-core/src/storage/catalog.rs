//! View catalog — a JSON file of named views over partition directories.
//!
//! A view records the glob it spans and a snapshot of the partitions that
//! matched when it was published. Querying a view scans the glob lazily, so
//! the result always reflects the files on disk.

use super::frame::read_partition;
use super::partition::{list_partitions, PARTITION_EXT, PARTITION_PREFIX};
use super::PersistError;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const CATALOG_VERSION: u32 = 1;

/// One partition as seen at publication time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionEntry {
    pub file: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    pub name: String,
    pub source_dir: PathBuf,
    pub source_glob: String,
    pub partitions: Vec<PartitionEntry>,
    pub total_rows: usize,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogFile {
    version: u32,
    #[serde(default)]
    views: BTreeMap<String, ViewDefinition>,
}

/// Handle on the catalog file. Changes are written through on every publish.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    views: BTreeMap<String, ViewDefinition>,
}

impl Catalog {
    /// Open the catalog at `path`, creating its directory. A missing file is
    /// an empty catalog.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PersistError::io(parent, e))?;
        }

        let views = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| PersistError::io(&path, e))?;
            let file: CatalogFile = serde_json::from_str(&content).map_err(|e| {
                PersistError::Catalog(format!("parse {}: {e}", path.display()))
            })?;
            if file.version != CATALOG_VERSION {
                return Err(PersistError::Catalog(format!(
                    "unsupported catalog version {} in {}",
                    file.version,
                    path.display()
                )));
            }
            file.views
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, views })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn view(&self, name: &str) -> Option<&ViewDefinition> {
        self.views.get(name)
    }

    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    /// Create or replace `name` as a view over every partition in `out_dir`.
    ///
    /// Each partition is read back and schema-checked. A directory with no
    /// partitions still publishes (an empty view).
    pub fn publish_view(
        &mut self,
        name: &str,
        out_dir: &Path,
    ) -> Result<&ViewDefinition, PersistError> {
        let mut partitions = Vec::new();
        for (_, path) in list_partitions(out_dir)? {
            let rows = read_partition(&path)?.height();
            let file = path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_default();
            partitions.push(PartitionEntry { file, rows });
        }
        let total_rows = partitions.iter().map(|p| p.rows).sum();

        let view = ViewDefinition {
            name: name.to_string(),
            source_dir: out_dir.to_path_buf(),
            source_glob: partition_glob(out_dir),
            partitions,
            total_rows,
            published_at: Utc::now(),
        };
        info!(
            view = name,
            partitions = view.partitions.len(),
            rows = total_rows,
            glob = %view.source_glob,
            "published view"
        );

        self.views.insert(name.to_string(), view);
        self.save()?;
        self.views
            .get(name)
            .ok_or_else(|| PersistError::UnknownView(name.to_string()))
    }

    /// Lazy scan over all partitions of a view.
    pub fn scan_view(&self, name: &str) -> Result<LazyFrame, PersistError> {
        let view = self
            .views
            .get(name)
            .ok_or_else(|| PersistError::UnknownView(name.to_string()))?;
        if list_partitions(&view.source_dir)?.is_empty() {
            return Err(PersistError::EmptyView(name.to_string()));
        }
        LazyFrame::scan_parquet(view.source_glob.as_str(), Default::default())
            .map_err(|e| PersistError::Parquet(format!("scan view '{name}': {e}")))
    }

    fn save(&self) -> Result<(), PersistError> {
        let file = CatalogFile {
            version: CATALOG_VERSION,
            views: self.views.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| PersistError::Catalog(format!("serialize: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| PersistError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            PersistError::io(&self.path, e)
        })
    }
}

/// `{out_dir}/features_*.parquet`
pub fn partition_glob(out_dir: &Path) -> String {
    out_dir
        .join(format!("{PARTITION_PREFIX}*.{PARTITION_EXT}"))
        .to_string_lossy()
        .into_owned()
}
