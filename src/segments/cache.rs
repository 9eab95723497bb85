use super::model::{Segment, SectorSet};

/// Memoized sector geometry keyed on the serialized segment list.
///
/// Recomputes only when the serialized list differs from the last one, so a
/// host can hand the same list in every frame without paying for it.
#[derive(Debug, Default)]
pub struct SectorCache {
    key: Option<String>,
    sectors: SectorSet,
}

impl SectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the geometry was rebuilt.
    pub fn update(&mut self, segments: &[Segment]) -> bool {
        let key = cache_key(segments);
        if self.key.as_deref() == Some(key.as_str()) {
            return false;
        }
        self.sectors = SectorSet::build(segments);
        self.key = Some(key);
        true
    }

    pub fn sectors(&self) -> &SectorSet {
        &self.sectors
    }

    pub fn matches(&self, segments: &[Segment]) -> bool {
        self.key.as_deref() == Some(cache_key(segments).as_str())
    }
}

fn cache_key(segments: &[Segment]) -> String {
    // Segment is plain data; serialization cannot fail, but fall back to a
    // Debug rendering rather than panicking if it ever does.
    serde_json::to_string(segments).unwrap_or_else(|_| format!("{segments:?}"))
}
