//! `vaxwatch onboard` — First-time setup.

use std::path::Path;

use vaxwatch_config::AppConfig;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    println!("💉 vaxwatch — First-Time Setup");
    println!("==============================\n");

    if let Some(config_dir) = config_path.parent() {
        if !config_dir.as_os_str().is_empty() && !config_dir.exists() {
            std::fs::create_dir_all(config_dir)?;
            println!("✅ Created config directory: {}", config_dir.display());
        }
    }

    if config_path.exists() {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. List the centers to watch under [[centers]] or [[profiles]]");
    println!("   2. Set your Pushbullet token (or VAXWATCH_PUSHBULLET_TOKEN)");
    println!("   3. Run: vaxwatch scan");
    println!("   4. Schedule: vaxwatch check (cron, systemd timer, ...)\n");

    Ok(())
}
