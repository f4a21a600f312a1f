use accountdesk::config::Config;
use accountdesk::logger::Logger;
use accountdesk::ui;
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--init-config") {
        let path = Config::get_default_config_path()?;
        Config::generate_default_config(&path)?;
        return Ok(());
    }

    let config = match args.iter().position(|a| a == "--config") {
        Some(i) => match args.get(i + 1) {
            Some(path) => Config::load_from_file(path)?,
            None => anyhow::bail!("--config needs a path"),
        },
        None => Config::load()?,
    };

    let logger = Logger::from_config(config.logging.enabled)?;
    if config.api.access_token().is_none() {
        eprintln!(
            "⚠️  {} is not set; token management will be unavailable",
            config.api.access_token_env
        );
    }

    ui::run_app(config, logger).await
}
