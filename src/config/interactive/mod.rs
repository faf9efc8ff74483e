
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};

use super::{Config, ConfigError, FredConfig};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🔧 FRED MCP Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("FRED API Configuration").bold().yellow());
    eprintln!("The API key is read from the environment on every call and is never saved.");
    eprintln!();

    configure_fred(&mut config.fred)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_fred_connection(&config.fred)? {
        eprintln!("{}", style("✓ FRED API is reachable!").green());
    } else {
        eprintln!("{}", style("⚠ Warning: Could not reach the FRED API").yellow());
        eprintln!("You can continue, but tool calls will fail until the API is reachable.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());

        let config_path = Config::config_file_path().context("Failed to get config file path")?;
        eprintln!(
            "Configuration saved to: {}",
            style(config_path.display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    for (label, value) in describe_config(&config) {
        eprintln!("  {}: {}", label, style(value).cyan());
    }

    let key = std::env::var(&config.fred.api_key_env).ok();
    eprintln!();
    eprintln!(
        "  {} is {}",
        config.fred.api_key_env,
        style(credential_status(key.as_deref())).bold()
    );

    let config_path = Config::config_file_path().context("Failed to get config file path")?;
    eprintln!();
    eprintln!("Config file: {}", style(config_path.display()).dim());

    Ok(())
}

fn describe_config(config: &Config) -> Vec<(&'static str, String)> {
    vec![
        ("Base URL", config.fred.base_url.clone()),
        ("Timeout", format!("{}s", config.fred.timeout_seconds)),
        ("API key variable", config.fred.api_key_env.clone()),
        ("Max rows per fetch", config.fred.max_rows.to_string()),
        ("Server name", config.server.name.clone()),
    ]
}

fn credential_status(value: Option<&str>) -> &'static str {
    match value {
        Some(v) if v.trim().is_empty() => "empty",
        Some(_) => "set",
        None => "not set",
    }
}

fn load_existing_config() -> Result<Config> {
    Config::load().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::default())
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_fred(fred: &mut FredConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("FRED API base URL")
        .default(fred.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let candidate = FredConfig {
                base_url: input.clone(),
                ..FredConfig::default()
            };
            candidate.validate()
        })
        .interact_text()?;

    let timeout_seconds: u64 = Input::new()
        .with_prompt("Request timeout (seconds)")
        .default(fred.timeout_seconds)
        .validate_with(|input: &u64| -> Result<(), &str> {
            if (1..=300).contains(input) {
                Ok(())
            } else {
                Err("Timeout must be between 1 and 300 seconds")
            }
        })
        .interact_text()?;

    let api_key_env: String = Input::new()
        .with_prompt("Environment variable holding the API key")
        .default(fred.api_key_env.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() || input.contains('=') {
                Err("Variable name cannot be empty or contain '='")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let max_rows: u32 = Input::new()
        .with_prompt("Rows requested per upstream fetch")
        .default(fred.max_rows)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Max rows must be greater than 0")
            } else if *input > 1000 {
                Err("FRED returns at most 1000 rows per request")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    fred.set_base_url(base_url)?;
    fred.set_timeout_seconds(timeout_seconds)?;
    fred.set_api_key_env(api_key_env)?;
    fred.set_max_rows(max_rows)?;

    Ok(())
}

/// Any HTTP answer, including a 4xx for the missing key, means the API is reachable
fn test_fred_connection(fred: &FredConfig) -> Result<bool> {
    let url = fred
        .base_url()?
        .join("releases?file_type=json")
        .context("Failed to build connection test URL")?;

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(url.as_str()).call() {
        Ok(_) => Ok(true),
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => Ok(true),
        Err(_) => Ok(false),
    }
}
