use std::path::Path;

use anyhow::Result;

use newsrelay_core::AppConfig;

pub fn run(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    AppConfig::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    println!("Set telegram.bot_token, telegram.channel_id and ai.openai_api_key before running.");
    Ok(())
}
