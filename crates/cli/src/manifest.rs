use async_trait::async_trait;
use pagegen_core::{PageRegistration, Result};
use pagegen_generator::PageActions;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Page-creation action that records registrations and writes them as JSON
/// for the site builder to pick up
#[derive(Default)]
pub struct PageManifest {
    pages: Mutex<BTreeMap<String, PageRegistration>>,
}

#[derive(Serialize)]
struct ManifestFile<'a> {
    pages: Vec<&'a PageRegistration>,
}

impl PageManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.pages.lock().await.len()
    }

    /// Write all registrations, sorted by path, to `path`
    pub async fn write(&self, path: &Path) -> Result<PathBuf> {
        let pages = self.pages.lock().await;
        let file = ManifestFile {
            pages: pages.values().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json + "\n").await?;
        Ok(path.to_path_buf())
    }
}

#[async_trait]
impl PageActions for PageManifest {
    async fn create_page(&self, page: PageRegistration) -> Result<()> {
        self.pages.lock().await.insert(page.path.clone(), page);
        Ok(())
    }
}
