use color_eyre::eyre::Result;

use cellgauge_monitor::MonitorConfig;

use crate::config::{config_path, runtime_dir, UserConfig};

pub fn run(path: bool, reset: bool, edit: bool) -> Result<()> {
    let config_file = config_path();

    if path {
        println!("{}", config_file.display());
        return Ok(());
    }

    if reset {
        UserConfig::default().save()?;
        println!("Config reset to defaults at: {}", config_file.display());
        return Ok(());
    }

    if edit {
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
        if !config_file.exists() {
            UserConfig::default().save()?;
        }
        std::process::Command::new(editor)
            .arg(&config_file)
            .status()?;

        if let Err(e) = UserConfig::try_load() {
            println!("Warning: {:#}", e);
            println!("Defaults will be used until the file is fixed.");
        }
        return Ok(());
    }

    println!("Config file: {}", config_file.display());
    println!("Log files:   {}", runtime_dir().display());
    println!();

    let config = match UserConfig::try_load() {
        Ok(config) => config,
        Err(e) => {
            println!("Invalid config, using defaults: {:#}", e);
            println!();
            UserConfig::default()
        }
    };
    for line in summary(&config.monitor) {
        println!("{}", line);
    }
    println!();
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

/// The settings that shape readings, in the units the monitor reports.
fn summary(monitor: &MonitorConfig) -> Vec<String> {
    let curve = &monitor.curve;
    vec![
        format!(
            "Pin {}, {:.1} V full scale, {} decimal place(s)",
            monitor.pin,
            monitor.adc.span(),
            monitor.precision
        ),
        format!(
            "Curve: empty at {:.2} V, full at {:.2} V, charging from {:.2} V, {} sections",
            curve.fully_uncharged, curve.fully_charged, curve.charging_threshold, curve.sections
        ),
        format!(
            "Mode: {}, change on {}, low at {}% or less",
            monitor.data_mode.label(),
            monitor.check_kind.label(),
            monitor.low_percent
        ),
        format!(
            "Coefficient: {:.4} until calibrated",
            monitor.coefficient.default
        ),
    ]
}
