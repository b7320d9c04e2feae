//! The static asset catalog describing available sounds.
//!
//! Supplied once at startup from build-time configuration and treated as
//! read-only by every other component.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// Describes one playable sound: a stable id, the file it lives in, and the
/// color its button is rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    /// Unique, stable identifier (usually the file stem).
    pub id: String,
    /// Path of the audio file relative to the audio directory.
    pub resource_path: String,
    /// Display color for the UI collaborator (`#RRGGBB`).
    pub display_color: String,
}

/// Ordered, read-only collection of [`AssetDescriptor`]s with id lookup.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    entries: Vec<AssetDescriptor>,
    index: HashMap<String, usize>,
}

/// Error constructing an [`AssetCatalog`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two entries share the same id.
    #[error("Duplicate asset id: {0}")]
    DuplicateId(String),
}

impl AssetCatalog {
    /// Builds a catalog from explicit descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two entries share an id.
    pub fn new(entries: Vec<AssetDescriptor>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(entry.id.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// Builds a catalog from a list of audio filenames.
    ///
    /// The id is the file stem and the display color is derived
    /// deterministically from the id, so the same deployment always renders
    /// the same colors.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if two filenames share a stem.
    pub fn from_filenames<I, S>(filenames: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = filenames
            .into_iter()
            .filter(|f| !f.as_ref().is_empty())
            .map(|filename| {
                let filename = filename.as_ref();
                let id = filename
                    .split('.')
                    .next()
                    .unwrap_or(filename)
                    .to_string();
                let display_color = derive_color(&id);
                AssetDescriptor {
                    id,
                    resource_path: filename.to_string(),
                    display_color,
                }
            })
            .collect();
        Self::new(entries)
    }

    /// Looks up a descriptor by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AssetDescriptor> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Returns whether the catalog contains the given id.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Iterates descriptors in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetDescriptor> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derives a stable `#RRGGBB` color from an asset id.
fn derive_color(id: &str) -> String {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    id.hash(&mut hasher);
    let h = hasher.finish();
    format!("#{:06X}", (h as u32) & 0x00FF_FFFF)
}
