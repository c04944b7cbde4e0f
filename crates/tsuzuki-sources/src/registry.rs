use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::MediaSource;

/// All registered source adapters, keyed by their stable id.
///
/// Built once at startup and passed around explicitly; adapters are not
/// registered at runtime.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn MediaSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own id. A duplicate id replaces the
    /// earlier registration.
    pub fn register(&mut self, source: Arc<dyn MediaSource>) {
        self.sources.insert(source.id().to_string(), source);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn MediaSource>> {
        self.sources.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
