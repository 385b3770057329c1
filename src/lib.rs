pub mod agent;
pub mod cli;
pub mod config;
pub mod console;
pub mod gateway;
pub mod history;
pub mod llm;
pub mod models;

use agent::ChatAgent;
use cli::Args;
use log::info;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chat Base URL: {}", args.chat_base_url);
    info!("Temperature: {}", args.temperature);
    info!("Retry Delay (ms): {}", args.retry_delay_ms);
    info!("Max Attempts: {:?}", args.max_attempts);
    info!("History Store Type: {}", args.store_type);
    info!("History Store Path: {:?}", args.store_path);
    info!("History Expiry (hours): {}", args.history_expiry_hours);
    info!("-------------------------");

    let mut agent = ChatAgent::new(&args).await?;
    console::run_console(&mut agent).await?;

    Ok(())
}
