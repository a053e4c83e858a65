//! Platform catalog: an explicit lookup service from (board, revision) to
//! [`Platform`].

use std::collections::BTreeMap;

use crate::board::Platform;
use crate::error::{PlatformError, Result};

/// Lookup table of known board platforms.
///
/// Board variants compare case-insensitively; revisions compare exactly.
#[derive(Debug, Clone, Default)]
pub struct PlatformCatalog {
    boards: BTreeMap<(String, String), Platform>,
}

impl PlatformCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in Colorlight boards.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for platform in [
            Platform::colorlight_5a_75b_v6_0(),
            Platform::colorlight_5a_75b_v7_0(),
            Platform::colorlight_5a_75b_v8_0(),
            Platform::colorlight_5a_75e_v6_0(),
            Platform::colorlight_5a_75e_v7_1(),
        ] {
            catalog.register(platform);
        }
        catalog
    }

    /// Add a platform, replacing any entry with the same variant and revision.
    /// Returns the replaced entry.
    pub fn register(&mut self, platform: Platform) -> Option<Platform> {
        let key = (platform.variant.to_ascii_uppercase(), platform.revision.clone());
        self.boards.insert(key, platform)
    }

    /// Find the platform for a board variant and revision.
    pub fn lookup(&self, variant: &str, revision: &str) -> Result<&Platform> {
        let key = (variant.to_ascii_uppercase(), revision.to_string());
        if let Some(platform) = self.boards.get(&key) {
            return Ok(platform);
        }

        let supported = self.revisions(variant);
        if supported.is_empty() {
            return Err(PlatformError::UnknownBoard {
                board: variant.to_string(),
                known: self.variants(),
            });
        }
        Err(PlatformError::UnsupportedRevision {
            board: variant.to_string(),
            revision: revision.to_string(),
            supported,
        })
    }

    /// Find a platform by its unique name (e.g. "colorlight_5a_75e_v6_0").
    pub fn by_name(&self, name: &str) -> Option<&Platform> {
        self.boards.values().find(|p| p.name == name)
    }

    /// Revisions known for a variant, in ascending order.
    pub fn revisions(&self, variant: &str) -> Vec<String> {
        let variant = variant.to_ascii_uppercase();
        self.boards
            .keys()
            .filter(|(v, _)| *v == variant)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Distinct board variants, in ascending order.
    pub fn variants(&self) -> Vec<String> {
        let mut variants: Vec<String> = self.boards.values().map(|p| p.variant.clone()).collect();
        variants.dedup();
        variants
    }

    /// All platforms ordered by (variant, revision).
    pub fn boards(&self) -> impl Iterator<Item = &Platform> {
        self.boards.values()
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }
}
