pub mod telegram;
pub mod traits;

pub use telegram::TelegramChannel;
pub use traits::Channel;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::dialog::ticket::{TicketSink, TicketSummary};
use crate::dialog::Engine;
use crate::rates::{CbrRateSource, RateSource};

const DEFAULT_INITIAL_BACKOFF_SECS: u64 = 2;
const DEFAULT_MAX_BACKOFF_SECS: u64 = 60;

/// Delivers completed tickets as a photo-with-caption to the fixed
/// administrator chat.
struct TelegramTicketSink {
    channel: Arc<TelegramChannel>,
    admin_chat_id: String,
}

#[async_trait]
impl TicketSink for TelegramTicketSink {
    async fn deliver(&self, ticket: &TicketSummary) -> Result<()> {
        self.channel
            .send_photo_by_file_id(&self.admin_chat_id, &ticket.photo_file_id, &ticket.caption())
            .await
    }
}

fn spawn_supervised_listener(
    ch: Arc<dyn Channel>,
    tx: tokio::sync::mpsc::Sender<traits::ChannelMessage>,
    initial_backoff_secs: u64,
    max_backoff_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut backoff = initial_backoff_secs.max(1);
        let max_backoff = max_backoff_secs.max(backoff);

        loop {
            let result = ch.listen(tx.clone()).await;

            if tx.is_closed() {
                break;
            }

            match result {
                Ok(()) => {
                    tracing::warn!("Channel {} exited unexpectedly; restarting", ch.name());
                }
                Err(e) => {
                    tracing::error!("Channel {} error: {e}; restarting", ch.name());
                }
            }

            tokio::time::sleep(Duration::from_secs(backoff)).await;
            backoff = backoff.saturating_mul(2).min(max_backoff);
        }
    })
}

/// Start the Telegram listener and route every inbound event through the
/// dialog engine.
pub async fn start(config: Config) -> Result<()> {
    let channel = Arc::new(TelegramChannel::new(config.bot_token.clone()));
    let rates: Arc<dyn RateSource> = Arc::new(CbrRateSource::new(config.rates_url.clone()));
    let tickets: Arc<dyn TicketSink> = Arc::new(TelegramTicketSink {
        channel: channel.clone(),
        admin_chat_id: config.admin_chat_id.clone(),
    });
    let engine = Arc::new(Engine::new(rates, tickets));

    tracing::info!(
        "parcel-bot starting; admin chat {}",
        config.admin_chat_id
    );

    let (tx, mut rx) = tokio::sync::mpsc::channel::<traits::ChannelMessage>(100);
    let listener = spawn_supervised_listener(
        channel.clone(),
        tx,
        DEFAULT_INITIAL_BACKOFF_SECS,
        DEFAULT_MAX_BACKOFF_SECS,
    );

    // Events for distinct chats are handled concurrently; the engine's
    // per-chat mutex serializes events for the same chat.
    loop {
        tokio::select! {
            maybe = rx.recv() => {
                let Some(msg) = maybe else { break };
                tracing::debug!("inbound {} from chat {}", msg.id, msg.chat_id);

                let engine = engine.clone();
                let channel = channel.clone();
                tokio::spawn(async move {
                    let effects = engine.handle(&msg.chat_id, &msg.event).await;
                    for effect in effects {
                        if let Err(e) = channel
                            .reply(&msg.chat_id, &effect.text, effect.keyboard.as_ref())
                            .await
                        {
                            tracing::error!("failed to reply to chat {}: {e}", msg.chat_id);
                        }
                    }
                });
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    listener.abort();
    let _ = listener.await;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChannelHealthState {
    Healthy,
    Unhealthy,
    Timeout,
}

fn classify_health_result(
    result: &std::result::Result<bool, tokio::time::error::Elapsed>,
) -> ChannelHealthState {
    match result {
        Ok(true) => ChannelHealthState::Healthy,
        Ok(false) => ChannelHealthState::Unhealthy,
        Err(_) => ChannelHealthState::Timeout,
    }
}

/// Check Bot API connectivity with the configured token.
pub async fn doctor(config: &Config) -> Result<()> {
    let channel = TelegramChannel::new(config.bot_token.clone());

    let result = tokio::time::timeout(Duration::from_secs(10), channel.health_check()).await;
    match classify_health_result(&result) {
        ChannelHealthState::Healthy => {
            println!("Telegram: healthy");
            Ok(())
        }
        ChannelHealthState::Unhealthy => {
            anyhow::bail!("Telegram: unhealthy (check the bot token and network)")
        }
        ChannelHealthState::Timeout => anyhow::bail!("Telegram: health check timed out (>10s)"),
    }
}
