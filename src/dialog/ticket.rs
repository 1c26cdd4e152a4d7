//! Support-ticket intake flow: photo → name → phone → carrier → address.

use async_trait::async_trait;

use crate::channels::traits::{Button, Effect, InboundEvent, Keyboard};
use crate::pricing::Carrier;

use super::session::{TicketData, TicketStep};
use super::{
    cancel_keyboard, event_text, main_menu, method_keyboard, validate, StepOutcome, DATA_LOST,
    METHOD_GUARD,
};

/// A completed ticket, ready for delivery to the administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSummary {
    pub name: String,
    pub phone: String,
    pub carrier: Carrier,
    pub address: String,
    pub photo_file_id: String,
}

impl TicketSummary {
    /// Caption attached to the photo sent to the administrator.
    pub fn caption(&self) -> String {
        format!(
            "New ticket:\nName: {}\nPhone: {}\nDelivery: {}\nAddress: {}",
            self.name,
            self.phone,
            self.carrier.label(),
            self.address
        )
    }
}

/// Delivery seam for completed tickets. The production implementation sends
/// the photo with caption to the administrator chat.
#[async_trait]
pub trait TicketSink: Send + Sync {
    async fn deliver(&self, ticket: &TicketSummary) -> anyhow::Result<()>;
}

pub fn opening_prompt() -> Effect {
    Effect::with_keyboard("Send a photo of the item:", cancel_keyboard())
}

/// Feed one event into the ticket flow at the given step.
///
/// The address step is terminal: it verifies every accumulated field is
/// present, then attempts delivery exactly once; the session is cleared
/// whether or not delivery succeeds.
pub async fn handle_step(
    step: TicketStep,
    data: &mut TicketData,
    event: &InboundEvent,
    sink: &dyn TicketSink,
) -> StepOutcome<TicketStep> {
    match step {
        TicketStep::Photo => {
            let InboundEvent::Photo { file_id } = event else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    "Please send a photo.",
                    cancel_keyboard(),
                )]);
            };
            data.photo_file_id = Some(file_id.clone());
            StepOutcome::Advance {
                next: TicketStep::Name,
                effects: vec![Effect::with_keyboard(
                    "Enter your full name and Telegram handle:",
                    cancel_keyboard(),
                )],
            }
        }
        TicketStep::Name => {
            let Some(name) = event_text(event).and_then(validate::parse_full_name) else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    "Enter both your first and last name.",
                    cancel_keyboard(),
                )]);
            };
            data.name = Some(name);
            StepOutcome::Advance {
                next: TicketStep::Phone,
                effects: vec![Effect::with_keyboard(
                    "Send your phone number:",
                    contact_keyboard(),
                )],
            }
        }
        TicketStep::Phone => {
            // A structured contact share is always valid; free text needs the
            // length check.
            let phone = match event {
                InboundEvent::Contact { phone } => Some(phone.clone()),
                _ => event_text(event).and_then(validate::parse_phone),
            };
            let Some(phone) = phone else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    "Enter a valid phone number.",
                    cancel_keyboard(),
                )]);
            };
            data.phone = Some(phone);
            StepOutcome::Advance {
                next: TicketStep::Method,
                effects: vec![Effect::with_keyboard(
                    "Choose a delivery service:",
                    method_keyboard(),
                )],
            }
        }
        TicketStep::Method => {
            let Some(carrier) = event_text(event).and_then(Carrier::parse) else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    METHOD_GUARD,
                    cancel_keyboard(),
                )]);
            };
            data.carrier = Some(carrier);
            StepOutcome::Advance {
                next: TicketStep::Address,
                effects: vec![Effect::with_keyboard(
                    format!("Enter the {} pickup point address:", carrier.label()),
                    Keyboard::Remove,
                )],
            }
        }
        TicketStep::Address => {
            let Some(address) = event_text(event).and_then(validate::parse_address) else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    "Enter the address.",
                    cancel_keyboard(),
                )]);
            };
            data.address = Some(address);

            // Unreachable given the transition table, but a missing field here
            // must not produce a half-empty ticket.
            let (Some(photo_file_id), Some(name), Some(phone), Some(carrier), Some(address)) = (
                data.photo_file_id.clone(),
                data.name.clone(),
                data.phone.clone(),
                data.carrier,
                data.address.clone(),
            ) else {
                tracing::error!("ticket data incomplete at terminal step");
                return StepOutcome::Finished(vec![Effect::with_keyboard(DATA_LOST, main_menu())]);
            };

            let summary = TicketSummary {
                name,
                phone,
                carrier,
                address,
                photo_file_id,
            };
            match sink.deliver(&summary).await {
                Ok(()) => StepOutcome::Finished(vec![Effect::with_keyboard(
                    "Thanks! Your ticket has been created.",
                    main_menu(),
                )]),
                Err(e) => {
                    tracing::error!("ticket delivery failed: {e}");
                    StepOutcome::Finished(vec![Effect::with_keyboard(
                        "Could not deliver your ticket to the administrator. Please try again later.",
                        main_menu(),
                    )])
                }
            }
        }
    }
}

fn contact_keyboard() -> Keyboard {
    Keyboard::Buttons(vec![vec![Button::contact("Share contact")]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn text(s: &str) -> InboundEvent {
        InboundEvent::Text(s.to_string())
    }

    /// Records deliveries; optionally fails every attempt.
    struct RecordingSink {
        delivered: Mutex<Vec<TicketSummary>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Self {
            Self {
                delivered: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl TicketSink for RecordingSink {
        async fn deliver(&self, ticket: &TicketSummary) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("admin unreachable");
            }
            self.delivered.lock().unwrap().push(ticket.clone());
            Ok(())
        }
    }

    fn filled_data() -> TicketData {
        TicketData {
            photo_file_id: Some("file-9".into()),
            name: Some("Ivan Petrov".into()),
            phone: Some("+79991234567".into()),
            carrier: Some(Carrier::Cdek),
            address: None,
        }
    }

    #[tokio::test]
    async fn photo_step_requires_an_image() {
        let sink = RecordingSink::new(false);
        let mut data = TicketData::default();

        let outcome = handle_step(TicketStep::Photo, &mut data, &text("here you go"), &sink).await;
        let StepOutcome::Stay(effects) = outcome else {
            panic!("expected stay");
        };
        assert_eq!(effects[0].text, "Please send a photo.");
        assert_eq!(data.photo_file_id, None);

        let photo = InboundEvent::Photo {
            file_id: "best-res".into(),
        };
        let outcome = handle_step(TicketStep::Photo, &mut data, &photo, &sink).await;
        assert!(matches!(
            outcome,
            StepOutcome::Advance {
                next: TicketStep::Name,
                ..
            }
        ));
        assert_eq!(data.photo_file_id.as_deref(), Some("best-res"));
    }

    #[tokio::test]
    async fn name_step_rejects_single_token() {
        let sink = RecordingSink::new(false);
        let mut data = TicketData::default();
        let outcome = handle_step(TicketStep::Name, &mut data, &text("Ivan"), &sink).await;
        assert!(matches!(outcome, StepOutcome::Stay(_)));
        assert_eq!(data.name, None);
    }

    #[tokio::test]
    async fn phone_step_accepts_contact_share_regardless_of_length() {
        let sink = RecordingSink::new(false);
        let mut data = TicketData::default();
        let contact = InboundEvent::Contact { phone: "12".into() };
        let outcome = handle_step(TicketStep::Phone, &mut data, &contact, &sink).await;
        assert!(matches!(
            outcome,
            StepOutcome::Advance {
                next: TicketStep::Method,
                ..
            }
        ));
        assert_eq!(data.phone.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn phone_step_checks_free_text_length() {
        let sink = RecordingSink::new(false);
        let mut data = TicketData::default();
        let outcome = handle_step(TicketStep::Phone, &mut data, &text("123"), &sink).await;
        assert!(matches!(outcome, StepOutcome::Stay(_)));

        let outcome = handle_step(TicketStep::Phone, &mut data, &text("+7999123"), &sink).await;
        assert!(matches!(outcome, StepOutcome::Advance { .. }));
    }

    #[tokio::test]
    async fn method_step_stores_carrier_and_names_it_in_prompt() {
        let sink = RecordingSink::new(false);
        let mut data = TicketData::default();
        let outcome = handle_step(TicketStep::Method, &mut data, &text("Russian Post"), &sink).await;
        let StepOutcome::Advance { next, effects } = outcome else {
            panic!("expected advance");
        };
        assert_eq!(next, TicketStep::Address);
        assert_eq!(data.carrier, Some(Carrier::RussianPost));
        assert!(effects[0].text.contains("Russian Post"));
        assert_eq!(effects[0].keyboard, Some(Keyboard::Remove));
    }

    #[tokio::test]
    async fn address_step_delivers_and_acknowledges() {
        let sink = RecordingSink::new(false);
        let mut data = filled_data();
        let outcome =
            handle_step(TicketStep::Address, &mut data, &text(" Lenina 1 "), &sink).await;
        let StepOutcome::Finished(effects) = outcome else {
            panic!("expected finished");
        };
        assert_eq!(effects[0].text, "Thanks! Your ticket has been created.");

        let delivered = sink.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].address, "Lenina 1");
        assert_eq!(delivered[0].photo_file_id, "file-9");
    }

    #[tokio::test]
    async fn address_step_apologizes_on_delivery_failure() {
        let sink = RecordingSink::new(true);
        let mut data = filled_data();
        let outcome = handle_step(TicketStep::Address, &mut data, &text("Lenina 1"), &sink).await;
        let StepOutcome::Finished(effects) = outcome else {
            panic!("expected finished (session still cleared)");
        };
        assert!(effects[0].text.contains("Could not deliver"));
    }

    #[tokio::test]
    async fn address_step_aborts_on_missing_fields() {
        let sink = RecordingSink::new(false);
        let mut data = filled_data();
        data.name = None;
        let outcome = handle_step(TicketStep::Address, &mut data, &text("Lenina 1"), &sink).await;
        let StepOutcome::Finished(effects) = outcome else {
            panic!("expected finished");
        };
        assert_eq!(effects[0].text, DATA_LOST);
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_address_is_a_guard_failure() {
        let sink = RecordingSink::new(false);
        let mut data = filled_data();
        let outcome = handle_step(TicketStep::Address, &mut data, &text("   "), &sink).await;
        assert!(matches!(outcome, StepOutcome::Stay(_)));
        assert!(sink.delivered.lock().unwrap().is_empty());
    }

    #[test]
    fn caption_lists_every_field() {
        let summary = TicketSummary {
            name: "Ivan Petrov".into(),
            phone: "+7999".into(),
            carrier: Carrier::Cdek,
            address: "Lenina 1".into(),
            photo_file_id: "f".into(),
        };
        let caption = summary.caption();
        assert!(caption.starts_with("New ticket:"));
        assert!(caption.contains("Name: Ivan Petrov"));
        assert!(caption.contains("Phone: +7999"));
        assert!(caption.contains("Delivery: CDEK"));
        assert!(caption.contains("Address: Lenina 1"));
    }
}
