//! Config command - create and inspect the user config

use anyhow::Result;
use console::style;
use repochat::config::{mask_secret, UserConfig};

pub fn init() -> Result<()> {
    let Some(path) = UserConfig::user_config_path() else {
        anyhow::bail!("Could not determine config directory");
    };
    if UserConfig::init_at(&path)? {
        println!("{} Created {}", style("[OK]").green(), path.display());
    } else {
        println!("Config already exists: {}", path.display());
    }
    Ok(())
}

fn show_value(key: &str, value: Option<&str>) {
    match value {
        Some(v) => println!("  {:<22} {}", key, v),
        None => println!("  {:<22} {}", key, style("(unset)").dim()),
    }
}

pub fn show() -> Result<()> {
    let config = UserConfig::load()?;
    let path = UserConfig::user_config_path();

    match path.as_deref().filter(|p| p.exists()) {
        Some(p) => println!("Config file: {}\n", style(p.display()).cyan()),
        None => println!("Config file: {}\n", style("(none, using defaults)").dim()),
    }

    let masked = |s: &Option<String>| s.as_deref().map(mask_secret);

    println!("{}", style("[ai]").bold());
    show_value(
        "backend",
        Some(config.ai.backend.as_deref().unwrap_or("anthropic")),
    );
    show_value("model", config.ai.model.as_deref());
    show_value("anthropic_api_key", masked(&config.ai.anthropic_api_key).as_deref());
    show_value("openai_api_key", masked(&config.ai.openai_api_key).as_deref());
    show_value("enabled", Some(config.ai_enabled().to_string().as_str()));

    println!("\n{}", style("[neo4j]").bold());
    show_value("uri", config.neo4j.uri.as_deref());
    show_value("user", config.neo4j.user.as_deref());
    show_value("password", masked(&config.neo4j.password).as_deref());
    show_value("database", config.neo4j.database.as_deref());

    let limits = config.build_limits();
    println!("\n{}", style("[ingest]").bold());
    show_value("max_commits", Some(limits.max_commits.to_string().as_str()));
    show_value("max_files", Some(limits.max_files.to_string().as_str()));
    show_value(
        "max_files_per_commit",
        Some(limits.max_files_per_commit.to_string().as_str()),
    );

    println!("\n{}", style("[storage]").bold());
    show_value("cache_dir", Some(config.cache_root().display().to_string().as_str()));
    Ok(())
}
