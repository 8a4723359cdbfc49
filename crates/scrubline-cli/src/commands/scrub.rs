use std::path::Path;

use anyhow::{bail, Result};

use scrubline_core::Scene;

pub fn run(path: &Path, timeline: &str, progress: f64, json: bool) -> Result<()> {
    if !(0.0..=1.0).contains(&progress) {
        bail!("progress must be within [0, 1], got {}", progress);
    }

    let scene = Scene::load(path)?;
    let values = scene.timeline(timeline)?.evaluate(progress);

    if json {
        let values: Vec<_> = values
            .iter()
            .map(|v| {
                serde_json::json!({
                    "element": v.element.as_str(),
                    "property": v.property,
                    "value": v.value,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(());
    }

    if values.is_empty() {
        println!("Timeline '{}' animates nothing.", timeline);
        return Ok(());
    }

    for value in &values {
        println!("{}.{} = {:.4}", value.element, value.property, value.value);
    }
    Ok(())
}
