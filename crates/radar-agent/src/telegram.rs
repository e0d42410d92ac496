use anyhow::Result;
use reqwest::Client;
use serde_json::json;

pub struct TelegramNotifier {
    client: Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramNotifier {
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            chat_id,
        }
    }

    /// Send a text message to the configured chat. Skips silently when the
    /// channel is not configured.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let (Some(token), Some(chat_id)) = (&self.bot_token, &self.chat_id) else {
            tracing::debug!("Telegram not configured, skipping notification");
            return Ok(());
        };

        let url = format!("https://api.telegram.org/bot{}/sendMessage", token);
        let payload = json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Telegram API returned HTTP {}", response.status());
        }

        tracing::debug!("Telegram notification sent");
        Ok(())
    }
}
