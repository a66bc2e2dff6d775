//! `vaxwatch scan` — Scan centers and print the results.

use std::path::Path;

use chrono::NaiveDate;
use vaxwatch_config::AppConfig;

pub async fn run(
    config_path: Option<&Path>,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    let records = vaxwatch_runner::scan(&config, date).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No center configured — add [[centers]] or [[profiles]] to your config.");
        return Ok(());
    }

    println!("{:>5}  {:<10}  {}", "SLOTS", "DATE", "CENTER");
    for record in &records {
        let when = if record.when.is_empty() { "-" } else { record.when.as_str() };
        println!("{:>5}  {:<10}  {}", record.available, when, record.name);
        println!("{:>5}  {:<10}  {}", "", "", record.url);
    }

    Ok(())
}
