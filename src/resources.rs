use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of external asset a page has to include
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Style,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Script => write!(f, "js"),
            ResourceKind::Style => write!(f, "css"),
        }
    }
}

/// An external stylesheet or script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub url: String,
    pub kind: ResourceKind,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub name: String,
}

type ResourceKey = (ResourceKind, String, String);

/// Deduplicated, insertion-ordered registry of resources keyed by (kind, module, name)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    entries: IndexMap<ResourceKey, Resource>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a resource. The first registration of a key wins.
    pub fn add(&mut self, url: &str, kind: ResourceKind, module: &str, name: &str) {
        self.entries
            .entry((kind, module.to_string(), name.to_string()))
            .or_insert_with(|| Resource {
                url: url.to_string(),
                kind,
                module: module.to_string(),
                name: name.to_string(),
            });
    }

    /// Points an existing resource at a new URL, falling back to [`Resources::add`].
    pub fn replace(&mut self, url: &str, kind: ResourceKind, module: &str, name: &str) {
        match self.lookup_mut(kind, module, name) {
            Some(resource) => resource.url = url.to_string(),
            None => {
                tracing::warn!(
                    "Resource {}|{}|{} cannot be found to be replaced. Added instead.",
                    kind,
                    module,
                    name
                );
                self.add(url, kind, module, name);
            }
        }
    }

    pub fn add_or_replace(&mut self, url: &str, kind: ResourceKind, module: &str, name: &str) {
        match self.lookup_mut(kind, module, name) {
            Some(resource) => resource.url = url.to_string(),
            None => self.add(url, kind, module, name),
        }
    }

    /// Upserts every resource of `other`; its URLs win on shared keys.
    pub fn merge(&mut self, other: &Resources) {
        for resource in other.iter() {
            self.add_or_replace(&resource.url, resource.kind, &resource.module, &resource.name);
        }
    }

    pub fn get(&self, kind: ResourceKind, module: &str, name: &str) -> Option<&Resource> {
        self.entries
            .get(&(kind, module.to_string(), name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn styles(&self) -> Vec<Resource> {
        self.of_kind(ResourceKind::Style)
    }

    pub fn scripts(&self) -> Vec<Resource> {
        self.of_kind(ResourceKind::Script)
    }

    pub fn style_urls(&self) -> Vec<String> {
        self.styles().into_iter().map(|r| r.url).collect()
    }

    pub fn script_urls(&self) -> Vec<String> {
        self.scripts().into_iter().map(|r| r.url).collect()
    }

    fn of_kind(&self, kind: ResourceKind) -> Vec<Resource> {
        self.iter().filter(|r| r.kind == kind).cloned().collect()
    }

    fn lookup_mut(&mut self, kind: ResourceKind, module: &str, name: &str) -> Option<&mut Resource> {
        self.entries
            .get_mut(&(kind, module.to_string(), name.to_string()))
    }
}
