//! Reference-data sources for the inspection catalog.
//!
//! Loading is one of the two suspension points of an inspection session. Any
//! failure, including an empty section list, surfaces as
//! `CatalogError::Unavailable`: an empty catalog would make every report look
//! fully answered.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use pdi_inspection::{Catalog, ChecklistSection, LeakageItem};

const BUILTIN_CATALOG: &str = include_str!("../catalog/builtin.json");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("reference data unavailable: {reason}")]
    Unavailable { reason: String },
}

impl CatalogError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }

    /// Catalog failures are always worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::Unavailable { .. })
    }
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load_sections(&self) -> Result<Vec<ChecklistSection>, CatalogError>;

    async fn load_leakage_items(&self) -> Result<Vec<LeakageItem>, CatalogError>;

    /// Both halves taken from one version of the reference data.
    ///
    /// Sources backed by a single document override this to read it once.
    async fn load_snapshot(&self) -> Result<(Vec<ChecklistSection>, Vec<LeakageItem>), CatalogError> {
        let sections = self.load_sections().await?;
        let leakage_items = self.load_leakage_items().await?;
        Ok((sections, leakage_items))
    }
}

/// On-disk/embedded catalog document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogDocument {
    sections: Vec<ChecklistSection>,
    #[serde(default)]
    leakage_items: Vec<LeakageItem>,
}

impl CatalogDocument {
    fn parse(raw: &str, origin: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(raw).map_err(|e| CatalogError::unavailable(format!("{origin}: malformed catalog: {e}")))
    }
}

/// Catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogSource {
    sections: Vec<ChecklistSection>,
    leakage_items: Vec<LeakageItem>,
}

impl StaticCatalogSource {
    pub fn new(sections: Vec<ChecklistSection>, leakage_items: Vec<LeakageItem>) -> Self {
        Self {
            sections,
            leakage_items,
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalogSource {
    async fn load_sections(&self) -> Result<Vec<ChecklistSection>, CatalogError> {
        Ok(self.sections.clone())
    }

    async fn load_leakage_items(&self) -> Result<Vec<LeakageItem>, CatalogError> {
        Ok(self.leakage_items.clone())
    }
}

/// The taxonomy shipped with the service.
pub fn builtin_catalog_source() -> Result<StaticCatalogSource, CatalogError> {
    let doc = CatalogDocument::parse(BUILTIN_CATALOG, "builtin")?;
    Ok(StaticCatalogSource::new(doc.sections, doc.leakage_items))
}

/// Catalog read from a JSON document (`{ "sections": [..], "leakageItems": [..] }`).
///
/// The file is re-read on every load so an edited taxonomy is picked up by the
/// next session.
#[derive(Debug, Clone)]
pub struct JsonFileCatalogSource {
    path: PathBuf,
}

impl JsonFileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> Result<CatalogDocument, CatalogError> {
        let origin = self.path.display().to_string();
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| CatalogError::unavailable(format!("{origin}: {e}")))?;
        CatalogDocument::parse(&raw, &origin)
    }
}

#[async_trait]
impl CatalogSource for JsonFileCatalogSource {
    async fn load_sections(&self) -> Result<Vec<ChecklistSection>, CatalogError> {
        Ok(self.read().await?.sections)
    }

    async fn load_leakage_items(&self) -> Result<Vec<LeakageItem>, CatalogError> {
        Ok(self.read().await?.leakage_items)
    }

    async fn load_snapshot(&self) -> Result<(Vec<ChecklistSection>, Vec<LeakageItem>), CatalogError> {
        let doc = self.read().await?;
        Ok((doc.sections, doc.leakage_items))
    }
}

/// Load both halves of the catalog and freeze them into one snapshot.
pub async fn load_catalog<S>(source: &S) -> Result<Catalog, CatalogError>
where
    S: CatalogSource + ?Sized,
{
    let (sections, leakage_items) = source.load_snapshot().await?;
    if sections.is_empty() {
        tracing::warn!("catalog source returned no sections");
        return Err(CatalogError::unavailable("catalog source returned no sections"));
    }

    let catalog = Catalog::new(sections, leakage_items)
        .map_err(|e| CatalogError::unavailable(format!("inconsistent catalog: {e}")))?;

    tracing::info!(
        sections = catalog.sections().len(),
        checklist_items = catalog.total_checklist_items(),
        leakage_items = catalog.leakage_items().len(),
        "catalog loaded"
    );
    Ok(catalog)
}
