//! `vaxwatch check` — One scan-and-notify pass.

use std::path::Path;

use chrono::NaiveDate;
use vaxwatch_config::AppConfig;
use vaxwatch_runner::{RunOptions, run_once};

pub async fn run(
    config_path: Option<&Path>,
    date: Option<NaiveDate>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    let report = run_once(
        &config,
        RunOptions {
            start_date: date,
            dry_run,
        },
    )
    .await?;

    let available = report.available().count();
    println!(
        "💉 {} center(s) scanned, {} with availability",
        report.records.len(),
        available
    );
    for record in report.available() {
        println!(
            "   {} — {} slot(s) on {} — {}",
            record.name, record.available, record.when, record.url
        );
    }

    if dry_run {
        println!("   (dry run, nobody notified)");
    } else {
        for (profile, count) in &report.notified {
            println!("   📨 {profile}: {count} center(s)");
        }
    }

    Ok(())
}
