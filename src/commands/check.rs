use anyhow::Result;
use colored::Colorize;
use logroute::config;
use tracing::info;

/// Validates the configuration file without starting the server.
pub fn execute(config_path: &str) -> Result<()> {
    println!("{}", "Checking configuration...".yellow());
    info!(path = %config_path, "Loading and validating configuration");

    let cfg = config::load_config(config_path)?;

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  {}: {}:{}", "Server".cyan(), cfg.server.host, cfg.server.port);
    println!("  {}: {}", "Database".cyan(), cfg.database.url);
    println!("  {}: {}", "Log Handlers".cyan(), cfg.logging.handlers.len());
    for (idx, handler) in cfg.logging.handlers.iter().enumerate() {
        let levels: Vec<&str> = handler.levels.iter().map(|l| l.as_str()).collect();
        println!(
            "    {}. {} ({}) → {}",
            idx + 1,
            handler.name.as_deref().unwrap_or("-"),
            handler.kind.as_str(),
            levels.join(", ")
        );
    }
    match &cfg.kv.clean_query {
        Some(_) => println!("  {}: every {}s", "KV Cleanup".cyan(), cfg.kv.clean_interval_seconds),
        None => println!("  {}: {}", "KV Cleanup".cyan(), "disabled".dimmed()),
    }

    info!("Configuration validation completed successfully");
    Ok(())
}
