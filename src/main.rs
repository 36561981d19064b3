use anyhow::Context;
use consejero::{config::Config, logging, ui, Conversation};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    // Diagnostics are best effort; the chat works without them.
    let _logger = match logging::init_logging(&config) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            None
        }
    };

    log::info!(
        "Starting with model {} and context {}",
        config.model,
        config.context_source
    );

    let conversation = Conversation::from_config(&config);
    ui::run_ui(conversation)
        .await
        .context("terminal UI failed")?;

    Ok(())
}
