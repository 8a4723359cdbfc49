use std::path::Path;

use anyhow::Result;

use scrubline_core::EngineConfig;

pub fn run(config: &EngineConfig, path: Option<&Path>, init: bool) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(EngineConfig::config_path);

    if init {
        if path.exists() {
            println!("Config already exists at {}", path.display());
        } else {
            config.save_to(&path)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    println!("# {}", path.display());
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
