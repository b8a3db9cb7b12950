//! Config command - write or print configuration

use anyhow::Result;
use console::style;
use difficulty_detector::config::AppConfig;
use std::path::Path;

pub fn init(path: Option<&Path>) -> Result<()> {
    let existed = path
        .map(Path::to_path_buf)
        .or_else(AppConfig::user_config_path)
        .is_some_and(|p| p.exists());
    let config_path = AppConfig::init(path)?;

    if existed {
        println!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    } else {
        println!(
            "{} Created {}",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
    }
    Ok(())
}

pub fn show(config: &AppConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
