use mangaverse::{logger, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env before anything reads the environment
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let config = Config::from_env();
    logger::init_with_config(logger::LoggerConfig::for_server(&config).with_prefix("mangaverse"))?;

    if dotenv_loaded {
        log::info!("✅ .env file loaded successfully");
    } else {
        log::warn!("⚠️  No .env file found, using system environment variables");
    }

    logger::log_startup_info(
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        config.host(),
        config.port(),
    );
    logger::log_config_info(&config);

    if config.gemini.api_key.is_none() {
        log::warn!("GEMINI_API_KEY is not set; /api/generate will fail until it is");
    }

    mangaverse::server::run(config).await?;
    Ok(())
}
