use super::traits::{Channel, ChannelMessage, InboundEvent, Keyboard};
use async_trait::async_trait;
use uuid::Uuid;

/// Telegram channel, long-polls the Bot API for updates
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Send a photo already stored on Telegram's servers, referenced by
    /// `file_id`, with a caption. Used for admin ticket notifications.
    pub async fn send_photo_by_file_id(
        &self,
        chat_id: &str,
        file_id: &str,
        caption: &str,
    ) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "photo": file_id,
            "caption": caption
        });

        let resp = self
            .client
            .post(self.api_url("sendPhoto"))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = resp.text().await?;
            anyhow::bail!("Telegram sendPhoto failed: {err}");
        }

        tracing::info!("Telegram photo forwarded to {chat_id}");
        Ok(())
    }
}

/// Render a [`Keyboard`] as a Bot API `reply_markup` object.
fn keyboard_markup(keyboard: &Keyboard) -> serde_json::Value {
    match keyboard {
        Keyboard::Remove => serde_json::json!({ "remove_keyboard": true }),
        Keyboard::Buttons(rows) => {
            let rows: Vec<Vec<serde_json::Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|btn| {
                            if btn.request_contact {
                                serde_json::json!({
                                    "text": btn.text,
                                    "request_contact": true
                                })
                            } else {
                                serde_json::json!({ "text": btn.text })
                            }
                        })
                        .collect()
                })
                .collect();
            serde_json::json!({
                "keyboard": rows,
                "resize_keyboard": true
            })
        }
    }
}

/// Reduce a Bot API `message` object to `(chat_id, event)`.
///
/// Photos arrive as an array of sizes in ascending resolution; the last
/// entry's `file_id` is the highest-resolution variant. Messages that are
/// neither text, photo nor contact (stickers, voice, ...) are skipped.
fn parse_message(message: &serde_json::Value) -> Option<(String, InboundEvent)> {
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)?
        .to_string();

    if let Some(text) = message.get("text").and_then(|v| v.as_str()) {
        return Some((chat_id, InboundEvent::Text(text.to_string())));
    }

    if let Some(sizes) = message.get("photo").and_then(serde_json::Value::as_array) {
        let file_id = sizes
            .last()
            .and_then(|p| p.get("file_id"))
            .and_then(|f| f.as_str())?;
        return Some((
            chat_id,
            InboundEvent::Photo {
                file_id: file_id.to_string(),
            },
        ));
    }

    if let Some(contact) = message.get("contact") {
        let phone = contact.get("phone_number").and_then(|p| p.as_str())?;
        return Some((
            chat_id,
            InboundEvent::Contact {
                phone: phone.to_string(),
            },
        ));
    }

    None
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn reply(
        &self,
        chat_id: &str,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> anyhow::Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text
        });
        if let Some(kb) = keyboard {
            body["reply_markup"] = keyboard_markup(kb);
        }

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let err = resp.text().await?;
            anyhow::bail!("Telegram sendMessage failed: {err}");
        }

        Ok(())
    }

    async fn listen(&self, tx: tokio::sync::mpsc::Sender<ChannelMessage>) -> anyhow::Result<()> {
        let mut offset: i64 = 0;

        tracing::info!("Telegram channel listening for updates...");

        loop {
            let url = self.api_url("getUpdates");
            let body = serde_json::json!({
                "offset": offset,
                "timeout": 30,
                "allowed_updates": ["message"]
            });

            let resp = match self.client.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            let data: serde_json::Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                for update in results {
                    // Advance offset past this update
                    if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(message) = update.get("message") else {
                        continue;
                    };

                    let Some((chat_id, event)) = parse_message(message) else {
                        continue;
                    };

                    let msg = ChannelMessage {
                        id: Uuid::new_v4().to_string(),
                        chat_id,
                        event,
                        channel: "telegram".to_string(),
                        timestamp: std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .unwrap_or_default()
                            .as_secs(),
                    };

                    if tx.send(msg).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}
