//! Show or initialize the configuration file.

use renderkit_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, init: bool) -> anyhow::Result<()> {
    let path = config_file_path();

    if init {
        if path.exists() {
            println!("Config already exists: {}", path.display());
        } else {
            config
                .save()
                .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
            println!("Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
