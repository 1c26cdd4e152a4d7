//! Per-chat conversation state and the keyed session store.
//!
//! A session holds at most one active flow. Sessions are created lazily on
//! the first event from a chat and live for the process lifetime; completing
//! or cancelling a flow resets the session to [`Flow::Idle`] but keeps the
//! entry around.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::pricing::Carrier;

/// Calculator flow steps, in conversation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcStep {
    Price,
    Weight,
    Method,
    Insurance,
}

/// Ticket flow steps, in conversation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketStep {
    Photo,
    Name,
    Phone,
    Method,
    Address,
}

/// Amounts accumulated by the calculator flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalcData {
    pub price_rub: Option<f64>,
    pub shipping_cost: Option<f64>,
    pub total: Option<f64>,
}

/// Fields accumulated by the ticket flow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketData {
    pub photo_file_id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub carrier: Option<Carrier>,
    pub address: Option<String>,
}

/// The active flow of a session, carrying its step and accumulated data.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Flow {
    #[default]
    Idle,
    Calculator {
        step: CalcStep,
        data: CalcData,
    },
    Ticket {
        step: TicketStep,
        data: TicketData,
    },
}

impl Flow {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Conversation state for one chat.
#[derive(Debug, Default)]
pub struct Session {
    pub flow: Flow,
}

impl Session {
    /// Drop the active flow and all accumulated data.
    pub fn clear(&mut self) {
        self.flow = Flow::Idle;
    }
}

/// Keyed store of per-chat sessions.
///
/// Each session sits behind its own `Mutex`, so events for the same chat are
/// serialized while distinct chats proceed concurrently. The outer `RwLock`
/// only guards map membership.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the session for a chat, creating it on first sight.
    pub async fn entry(&self, chat_id: &str) -> Arc<Mutex<Session>> {
        if let Some(session) = self.inner.read().await.get(chat_id) {
            return session.clone();
        }
        self.inner
            .write()
            .await
            .entry(chat_id.to_string())
            .or_default()
            .clone()
    }

    /// Number of chats seen so far.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
