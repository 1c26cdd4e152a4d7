//! Conversation engine: one active flow per chat, driven by inbound events.
//!
//! The engine owns the session store and the two flow definitions. Every
//! `(state, event)` pair either starts a flow, cancels it, re-prompts on a
//! guard failure, advances one step, or completes the flow and resets the
//! session to idle.

pub mod calculator;
pub mod session;
pub mod ticket;
pub mod validate;

use std::sync::Arc;

use crate::channels::traits::{Button, Effect, InboundEvent, Keyboard};
use crate::faq;
use crate::pricing::Carrier;
use crate::rates::RateSource;

use session::{CalcData, CalcStep, Flow, Session, SessionStore, TicketData, TicketStep};
use ticket::TicketSink;

/// Cancellation token, matched exactly (case-sensitive) before any step
/// validation in every non-idle state.
pub const CANCEL: &str = "Cancel";

pub const MENU_FAQ: &str = "FAQ";
pub const MENU_CALCULATOR: &str = "Shipping calculator";
pub const MENU_TICKET: &str = "New ticket";
pub const MENU_CONTACT: &str = "Admin contact";

/// Shown when a terminal step finds accumulated data missing.
pub const DATA_LOST: &str = "Some of your data went missing. Please start over.";

/// Re-prompt for the carrier guard, shared by both flows.
pub const METHOD_GUARD: &str = "Choose CDEK or Russian Post";

pub fn main_menu() -> Keyboard {
    Keyboard::Buttons(vec![
        vec![Button::new(MENU_FAQ), Button::new(MENU_CALCULATOR)],
        vec![Button::new(MENU_TICKET), Button::new(MENU_CONTACT)],
    ])
}

pub fn cancel_keyboard() -> Keyboard {
    Keyboard::row([CANCEL])
}

pub fn method_keyboard() -> Keyboard {
    Keyboard::row([Carrier::Cdek.label(), Carrier::RussianPost.label()])
}

pub fn yes_no_keyboard() -> Keyboard {
    Keyboard::row(["Yes", "No"])
}

/// Text payload of an event, if any. Photo and contact events have none,
/// which makes them guard failures at every text step.
pub(crate) fn event_text(event: &InboundEvent) -> Option<&str> {
    match event {
        InboundEvent::Text(text) => Some(text),
        _ => None,
    }
}

/// Result of feeding one event into a flow step.
pub enum StepOutcome<S> {
    /// Guard failure: re-prompt, state and data unchanged
    Stay(Vec<Effect>),
    /// Advance to the next step
    Advance { next: S, effects: Vec<Effect> },
    /// Terminal step completed (or aborted); the session goes back to idle
    Finished(Vec<Effect>),
}

/// The conversation engine. One instance serves every chat.
pub struct Engine {
    sessions: SessionStore,
    rates: Arc<dyn RateSource>,
    tickets: Arc<dyn TicketSink>,
}

impl Engine {
    pub fn new(rates: Arc<dyn RateSource>, tickets: Arc<dyn TicketSink>) -> Self {
        Self {
            sessions: SessionStore::new(),
            rates,
            tickets,
        }
    }

    /// Process one inbound event for a chat and return the outgoing effects.
    ///
    /// The chat's session mutex is held for the whole transition, including
    /// rate fetches and ticket delivery, so events for the same chat never
    /// interleave. Distinct chats proceed concurrently.
    pub async fn handle(&self, chat_id: &str, event: &InboundEvent) -> Vec<Effect> {
        let session = self.sessions.entry(chat_id).await;
        let mut session = session.lock().await;

        if !session.flow.is_idle() {
            if let InboundEvent::Text(text) = event {
                if text.as_str() == CANCEL {
                    session.clear();
                    return vec![Effect::with_keyboard("Action cancelled.", main_menu())];
                }
            }
        }

        if session.flow.is_idle() {
            return handle_idle(&mut session, event);
        }

        let mut finished = false;
        let effects = match &mut session.flow {
            Flow::Idle => unreachable!("idle handled above"),
            Flow::Calculator { step, data } => {
                match calculator::handle_step(*step, data, event, self.rates.as_ref()).await {
                    StepOutcome::Stay(effects) => effects,
                    StepOutcome::Advance { next, effects } => {
                        *step = next;
                        effects
                    }
                    StepOutcome::Finished(effects) => {
                        finished = true;
                        effects
                    }
                }
            }
            Flow::Ticket { step, data } => {
                match ticket::handle_step(*step, data, event, self.tickets.as_ref()).await {
                    StepOutcome::Stay(effects) => effects,
                    StepOutcome::Advance { next, effects } => {
                        *step = next;
                        effects
                    }
                    StepOutcome::Finished(effects) => {
                        finished = true;
                        effects
                    }
                }
            }
        };

        if finished {
            session.clear();
        }
        effects
    }

    /// Snapshot of the active flow for a chat. Test and introspection helper.
    pub async fn flow_of(&self, chat_id: &str) -> Flow {
        self.sessions.entry(chat_id).await.lock().await.flow.clone()
    }
}

fn handle_idle(session: &mut Session, event: &InboundEvent) -> Vec<Effect> {
    let InboundEvent::Text(text) = event else {
        return vec![menu_offer()];
    };
    match text.as_str() {
        "/start" => vec![Effect::with_keyboard(
            "Welcome to the store! Pick a section:",
            main_menu(),
        )],
        MENU_FAQ => vec![Effect::text(faq::faq_text())],
        MENU_CONTACT => vec![Effect::text(faq::ADMIN_CONTACT)],
        MENU_CALCULATOR => {
            session.flow = Flow::Calculator {
                step: CalcStep::Price,
                data: CalcData::default(),
            };
            vec![calculator::opening_prompt()]
        }
        MENU_TICKET => {
            session.flow = Flow::Ticket {
                step: TicketStep::Photo,
                data: TicketData::default(),
            };
            vec![ticket::opening_prompt()]
        }
        _ => vec![menu_offer()],
    }
}

fn menu_offer() -> Effect {
    Effect::with_keyboard("Pick a section from the menu:", main_menu())
}
