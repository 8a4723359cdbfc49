use std::path::Path;

use anyhow::{bail, Result};

use scrubline_core::Scene;

pub fn run(path: &Path) -> Result<()> {
    let scene = Scene::load(path)?;
    let mut problems = 0;

    println!("Checking {}\n", path.display());

    for (name, result) in scene.compose_all() {
        match result {
            Ok(timeline) => {
                println!(
                    "  ok    {} ({} segments, duration {})",
                    name,
                    timeline.segments().len(),
                    timeline.total_duration()
                );
            }
            Err(e) => {
                problems += 1;
                println!("  error {}: {}", name, e);
            }
        }
    }

    for problem in scene.dangling_references() {
        problems += 1;
        println!("  error {}", problem);
    }

    println!(
        "\n{} timelines, {} triggers, {} elements",
        scene.timelines.len(),
        scene.triggers.len(),
        scene.elements.len()
    );

    if problems > 0 {
        bail!("{} problem(s) found in {}", problems, path.display());
    }
    Ok(())
}
