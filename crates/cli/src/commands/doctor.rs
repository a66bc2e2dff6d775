//! `vaxwatch doctor` — Diagnose the configuration.

use std::path::Path;

use vaxwatch_config::{AppConfig, NotifyConfig};

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 vaxwatch Doctor — Configuration Diagnostics");
    println!("==============================================\n");

    let mut issues = 0;

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if !path.exists() {
        println!("  ❌ No config file at {} — run `vaxwatch onboard`", path.display());
        println!("\n  ⚠️  1 issue(s) found. See above for details.");
        return Ok(());
    }

    let config = match AppConfig::load(Some(&path)) {
        Ok(config) => {
            println!("  ✅ Config file valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  ⚠️  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    match config.centers() {
        Ok(centers) if centers.is_empty() => {
            println!("  ⚠️  No center to watch — add [[centers]] or profile places");
            issues += 1;
        }
        Ok(centers) => println!("  ✅ {} center(s) to watch", centers.len()),
        Err(e) => {
            println!("  ❌ Invalid center: {e}");
            issues += 1;
        }
    }

    if config.filter.is_empty() {
        println!("  ⚠️  No [filter] — every visit motive is watched");
        issues += 1;
    } else {
        println!("  ✅ Visit motive filter configured");
    }

    let mut targets = 0;
    if let Some(notify) = &config.broadcast {
        issues += report_notify("broadcast", notify, &mut targets);
    }
    for profile in &config.profiles {
        match &profile.notify {
            Some(notify) => issues += report_notify(&profile.name, notify, &mut targets),
            None => {
                println!("  ⚠️  Profile '{}' has no notify section, it will be skipped", profile.name);
                issues += 1;
            }
        }
        if profile.places.is_empty() {
            println!("  ⚠️  Profile '{}' watches no place", profile.name);
            issues += 1;
        }
    }
    if targets == 0 {
        println!("  ⚠️  Nobody will be notified — add [broadcast] or [[profiles]]");
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

fn report_notify(name: &str, notify: &NotifyConfig, targets: &mut usize) -> usize {
    match notify {
        NotifyConfig::Pushbullet { token, .. } if token.is_empty() => {
            println!("  ⚠️  '{name}': Pushbullet token missing (set VAXWATCH_PUSHBULLET_TOKEN)");
            1
        }
        NotifyConfig::Unknown => {
            println!("  ⚠️  '{name}': unknown notification type, it will be skipped");
            1
        }
        NotifyConfig::Invalid { reason } => {
            println!("  ⚠️  '{name}': invalid notify section ({reason}), it will be skipped");
            1
        }
        other => {
            println!("  ✅ '{name}': {} notifications", other.kind());
            *targets += 1;
            0
        }
    }
}
