//! One-shot send: POST a single message and print the reply.

use anyhow::Result;

use crate::client::AssistantClient;
use crate::config::Settings;

pub async fn run(server_url: &str, message: &str) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        anyhow::bail!("Message is empty");
    }

    let settings = Settings::load();
    let client = AssistantClient::new(server_url);
    let outcome = client.send_chat(message, &settings.api_url).await?;

    println!("{}", outcome.text);
    if outcome.memory_saved {
        println!("(memory saved)");
    }

    Ok(())
}
