//! Persistence of the template catalog.

use std::collections::{BTreeSet, HashMap};

use log::{error, info, warn};
use tokio::fs;

/// Room ID → template names of that room
pub type TemplatesMap = HashMap<String, BTreeSet<String>>;

/// Loads and saves the templates map as a JSON file.
///
/// Failures never stop the bot: a missing or corrupted file loads as an empty
/// map and a failed write is only logged.
#[derive(Debug, Clone)]
pub struct TemplateLoader {
    /// Path to the JSON file
    path: String,
}

impl TemplateLoader {
    pub fn new(path: String) -> Self {
        TemplateLoader { path }
    }

    /// Reads the templates map, or an empty one if the file is unusable.
    pub async fn load(&self) -> TemplatesMap {
        let Ok(serialized) = fs::read_to_string(&self.path).await else {
            warn!("no persisted templates found at {}, starting empty", self.path);
            return TemplatesMap::new();
        };

        match serde_json::from_str::<TemplatesMap>(&serialized) {
            Ok(templates_map) => {
                info!("loaded templates for {} rooms", templates_map.len());
                templates_map
            }
            Err(e) => {
                error!("failed to deserialize persisted templates, starting empty: {}", e);
                TemplatesMap::new()
            }
        }
    }

    /// Writes the whole templates map.
    pub async fn persist(&self, templates_map: &TemplatesMap) {
        let serialized = match serde_json::to_string(templates_map) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!("failed to serialize templates: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, serialized).await {
            error!("failed to persist templates to {}: {}", self.path, e);
            return;
        }

        info!("persisted templates");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_missing_file_returns_empty_map() {
        let loader = TemplateLoader::new("missing_templates.json".to_owned());

        assert!(loader.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_persist_then_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_owned();
        let loader = TemplateLoader::new(path);

        let mut templates_map = TemplatesMap::new();
        templates_map.insert(
            "!room:example.com".to_owned(),
            BTreeSet::from(["character".to_owned(), "game".to_owned()]),
        );
        loader.persist(&templates_map).await;

        let loaded = loader.load().await;
        assert_eq!(loaded, templates_map);
    }

    #[tokio::test]
    async fn test_load_corrupted_file_returns_empty_map() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap().to_owned();
        fs::write(&path, "[not a map").await.unwrap();

        let loader = TemplateLoader::new(path);
        assert!(loader.load().await.is_empty());
    }
}
