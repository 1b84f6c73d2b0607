//! List compositions from a composition file.

use std::path::Path;

use renderkit_model::{CompositionRegistry, InMemoryRegistry};

pub fn run(path: &Path) -> anyhow::Result<()> {
    let registry = InMemoryRegistry::load(path)
        .map_err(|e| anyhow::anyhow!("Failed to load compositions: {e}"))?;

    if registry.is_empty() {
        println!("No compositions in {}", path.display());
        return Ok(());
    }

    println!("Compositions in {}:", path.display());
    for composition in registry.list() {
        let modes = if composition.is_still_only() {
            "still"
        } else {
            "still, video, audio"
        };
        let size = match (composition.width, composition.height) {
            (Some(w), Some(h)) => format!(" {w}x{h}"),
            _ => String::new(),
        };
        let fps = composition
            .fps
            .map(|fps| format!(" @ {fps}fps"))
            .unwrap_or_default();
        println!(
            "  {} ({} frames{size}{fps}) [{modes}]",
            composition.id, composition.duration_in_frames
        );
    }

    Ok(())
}
