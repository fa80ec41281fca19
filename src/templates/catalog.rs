//! In-memory catalog of profile templates.

use log::debug;

use crate::templates::loader::{TemplateLoader, TemplatesMap};

/// Profile templates of every room the bot is in.
///
/// Every mutation is written through to the [`TemplateLoader`] when one is
/// configured.
#[derive(Debug, Default)]
pub struct TemplateCatalog {
    templates_map: TemplatesMap,
    loader: Option<TemplateLoader>,
}

impl TemplateCatalog {
    /// Loads the catalog persisted at `path`.
    pub async fn load(path: String) -> Self {
        let loader = TemplateLoader::new(path);
        let templates_map = loader.load().await;

        TemplateCatalog {
            templates_map,
            loader: Some(loader),
        }
    }

    /// A catalog that is never written to disk.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Template names of `room_id`, sorted.
    pub fn templates(&self, room_id: &str) -> Vec<String> {
        self.templates_map
            .get(room_id)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Registers `name` in `room_id`. Returns `false` if it already existed.
    pub async fn add(&mut self, room_id: &str, name: &str) -> bool {
        let inserted = self
            .templates_map
            .entry(room_id.to_owned())
            .or_default()
            .insert(name.to_owned());

        if inserted {
            debug!("template {} added in {}", name, room_id);
            self.persist().await;
        }
        inserted
    }

    /// Removes `name` from `room_id`. Returns `false` if it was not registered.
    pub async fn remove(&mut self, room_id: &str, name: &str) -> bool {
        let Some(names) = self.templates_map.get_mut(room_id) else {
            return false;
        };
        if !names.remove(name) {
            return false;
        }
        if names.is_empty() {
            self.templates_map.remove(room_id);
        }

        debug!("template {} removed from {}", name, room_id);
        self.persist().await;
        true
    }

    async fn persist(&self) {
        if let Some(loader) = &self.loader {
            loader.persist(&self.templates_map).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_add_and_list() {
        let mut catalog = TemplateCatalog::in_memory();

        assert!(catalog.add("!room:example.com", "game").await);
        assert!(catalog.add("!room:example.com", "character").await);
        assert!(!catalog.add("!room:example.com", "game").await);

        assert_eq!(
            catalog.templates("!room:example.com"),
            vec!["character".to_owned(), "game".to_owned()]
        );
        assert!(catalog.templates("!other:example.com").is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let mut catalog = TemplateCatalog::in_memory();
        catalog.add("!room:example.com", "game").await;

        assert!(!catalog.remove("!room:example.com", "character").await);
        assert!(!catalog.remove("!other:example.com", "game").await);
        assert!(catalog.remove("!room:example.com", "game").await);
        assert!(catalog.templates("!room:example.com").is_empty());
    }

    #[tokio::test]
    async fn test_changes_survive_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir
            .path()
            .join("templates")
            .to_string_lossy()
            .to_string();

        let mut catalog = TemplateCatalog::load(path.clone()).await;
        catalog.add("!room:example.com", "character").await;
        catalog.add("!room:example.com", "game").await;
        catalog.remove("!room:example.com", "game").await;

        let reloaded = TemplateCatalog::load(path).await;
        assert_eq!(
            reloaded.templates("!room:example.com"),
            vec!["character".to_owned()]
        );
    }
}
