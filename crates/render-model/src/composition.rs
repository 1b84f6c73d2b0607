//! Compositions and the registry they are resolved from.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use renderkit_common::error::{RenderkitError, RenderkitResult};

/// A named, timed scene with a fixed frame count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionRef {
    /// Unique composition id.
    pub id: String,

    /// Length in frames. Always at least 1.
    pub duration_in_frames: u64,

    /// Frame rate, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,

    /// Canvas size in pixels, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl CompositionRef {
    pub fn new(id: impl Into<String>, duration_in_frames: u64) -> Self {
        Self {
            id: id.into(),
            duration_in_frames,
            fps: None,
            width: None,
            height: None,
        }
    }

    /// Index of the last frame.
    pub fn last_frame(&self) -> u64 {
        self.duration_in_frames.saturating_sub(1)
    }

    /// Compositions shorter than two frames can only be rendered as stills.
    pub fn is_still_only(&self) -> bool {
        self.duration_in_frames < 2
    }

    fn validate(&self) -> RenderkitResult<()> {
        if self.id.trim().is_empty() {
            return Err(RenderkitError::invalid_composition(
                "composition id must not be empty",
            ));
        }
        if self.duration_in_frames == 0 {
            return Err(RenderkitError::invalid_composition(format!(
                "{} has a duration of 0 frames",
                self.id
            )));
        }
        Ok(())
    }
}

/// Read-only lookup of compositions by id.
pub trait CompositionRegistry: Send + Sync {
    /// Find a composition. Not-found is an error.
    fn lookup(&self, id: &str) -> RenderkitResult<CompositionRef>;

    /// All registered compositions.
    fn list(&self) -> Vec<CompositionRef>;
}

/// Registry backed by a list held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistry {
    compositions: Vec<CompositionRef>,
}

impl InMemoryRegistry {
    /// Build a registry, rejecting empty ids, zero-length compositions and duplicates.
    pub fn new(compositions: Vec<CompositionRef>) -> RenderkitResult<Self> {
        let mut seen = HashSet::new();
        for composition in &compositions {
            composition.validate()?;
            if !seen.insert(composition.id.as_str()) {
                return Err(RenderkitError::invalid_composition(format!(
                    "duplicate composition id: {}",
                    composition.id
                )));
            }
        }
        Ok(Self { compositions })
    }

    /// Parse a JSON array of compositions.
    pub fn from_json(json: &str) -> RenderkitResult<Self> {
        let compositions: Vec<CompositionRef> = serde_json::from_str(json)?;
        Self::new(compositions)
    }

    /// Load a JSON composition list from disk.
    pub fn load(path: impl AsRef<Path>) -> RenderkitResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RenderkitError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.display(),
            count = registry.compositions.len(),
            "Loaded compositions"
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.compositions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compositions.is_empty()
    }
}

impl CompositionRegistry for InMemoryRegistry {
    fn lookup(&self, id: &str) -> RenderkitResult<CompositionRef> {
        self.compositions
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| RenderkitError::composition_not_found(id))
    }

    fn list(&self) -> Vec<CompositionRef> {
        self.compositions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_found_and_missing() {
        let registry = InMemoryRegistry::new(vec![
            CompositionRef::new("intro", 90),
            CompositionRef::new("thumbnail", 1),
        ])
        .unwrap();

        assert_eq!(registry.lookup("intro").unwrap().duration_in_frames, 90);
        assert!(registry.lookup("thumbnail").unwrap().is_still_only());
        assert!(matches!(
            registry.lookup("outro"),
            Err(RenderkitError::CompositionNotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_duration_and_duplicates() {
        assert!(InMemoryRegistry::new(vec![CompositionRef::new("empty", 0)]).is_err());
        assert!(InMemoryRegistry::new(vec![
            CompositionRef::new("a", 10),
            CompositionRef::new("a", 20),
        ])
        .is_err());
    }

    #[test]
    fn test_from_json_camel_case() {
        let registry = InMemoryRegistry::from_json(
            r#"[{"id":"intro","durationInFrames":150,"fps":30,"width":1920,"height":1080}]"#,
        )
        .unwrap();
        let intro = registry.lookup("intro").unwrap();
        assert_eq!(intro.last_frame(), 149);
        assert_eq!(intro.width, Some(1920));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("renderkit_missing_compositions.json");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            InMemoryRegistry::load(&path),
            Err(RenderkitError::FileNotFound { .. })
        ));
    }
}
