//! Write a synthetic template pack to disk and read it back. Handy for
//! exercising the daemon's pack loading without the extractor tool:
//!
//! ```text
//! cargo run --example synthetic_pack -- symbols.drsh
//! ```

use drishti_core::sim::{SceneConfig, SyntheticScene};
use drishti_core::template::TemplateSet;

fn main() -> drishti_core::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "symbols.drsh".to_string());

    let config = SceneConfig {
        template_count: 4,
        ..SceneConfig::default()
    };
    let scene = SyntheticScene::generate(&config, 2024);
    scene.templates.save(&path)?;

    let loaded = TemplateSet::load(&path)?;
    println!("Wrote {} with {} templates:", path, loaded.len());
    for t in loaded.templates() {
        println!(
            "  {:<12} {}x{} px, {} keypoints",
            t.name,
            t.width,
            t.height,
            t.keypoints.len()
        );
    }
    Ok(())
}
