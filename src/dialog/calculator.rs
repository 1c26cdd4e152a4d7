//! Shipping-cost calculator flow: price → weight → carrier → insurance.

use crate::channels::traits::{Effect, InboundEvent};
use crate::pricing::{self, Carrier};
use crate::rates::RateSource;

use super::session::{CalcData, CalcStep};
use super::{
    cancel_keyboard, event_text, main_menu, method_keyboard, validate, StepOutcome, DATA_LOST,
    METHOD_GUARD,
};

pub fn opening_prompt() -> Effect {
    Effect::with_keyboard("Enter the item price in yuan:", cancel_keyboard())
}

/// Feed one event into the calculator at the given step.
///
/// Guard failures re-prompt and leave `data` untouched. The insurance step is
/// terminal: it resolves the insurance fee, then the customs-duty threshold,
/// and reports the final total.
pub async fn handle_step(
    step: CalcStep,
    data: &mut CalcData,
    event: &InboundEvent,
    rates: &dyn RateSource,
) -> StepOutcome<CalcStep> {
    match step {
        CalcStep::Price => {
            let Some(price) = event_text(event).and_then(validate::parse_amount) else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    "Enter a numeric value.",
                    cancel_keyboard(),
                )]);
            };
            // Rate is fetched now, not at completion, so the echoed rate is
            // the one actually used for the conversion.
            let rate = rates.yuan_rate().await;
            data.price_rub = Some(pricing::price_in_rub(price, rate));
            StepOutcome::Advance {
                next: CalcStep::Weight,
                effects: vec![Effect::with_keyboard(
                    format!(
                        "Yuan rate: {:.2} RUB. Enter the parcel weight in kg:",
                        pricing::round2(rate)
                    ),
                    cancel_keyboard(),
                )],
            }
        }
        CalcStep::Weight => {
            let Some(weight) = event_text(event).and_then(validate::parse_amount) else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    "Enter the weight as a number.",
                    cancel_keyboard(),
                )]);
            };
            data.shipping_cost = Some(pricing::shipping_cost(weight));
            StepOutcome::Advance {
                next: CalcStep::Method,
                effects: vec![Effect::with_keyboard(
                    "Choose a delivery method:",
                    method_keyboard(),
                )],
            }
        }
        CalcStep::Method => {
            let Some(carrier) = event_text(event).and_then(Carrier::parse) else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    METHOD_GUARD,
                    cancel_keyboard(),
                )]);
            };
            let (Some(price_rub), Some(shipping)) = (data.price_rub, data.shipping_cost) else {
                tracing::error!("calculator data missing at method step");
                return StepOutcome::Finished(vec![Effect::with_keyboard(DATA_LOST, main_menu())]);
            };
            data.total = Some(pricing::carrier_total(price_rub, shipping, carrier));
            StepOutcome::Advance {
                next: CalcStep::Insurance,
                effects: vec![Effect::with_keyboard(
                    format!("Add damage protection for {:.0} RUB?", pricing::INSURANCE_FEE),
                    super::yes_no_keyboard(),
                )],
            }
        }
        CalcStep::Insurance => {
            let Some(insured) = event_text(event).and_then(validate::parse_yes_no) else {
                return StepOutcome::Stay(vec![Effect::with_keyboard(
                    "Choose Yes or No",
                    cancel_keyboard(),
                )]);
            };
            let Some(mut total) = data.total else {
                tracing::error!("calculator total missing at insurance step");
                return StepOutcome::Finished(vec![Effect::with_keyboard(DATA_LOST, main_menu())]);
            };
            if insured {
                total += pricing::INSURANCE_FEE;
            }

            // Insurance resolves before the duty threshold is evaluated, so
            // the fee can push a total over the duty-free allowance.
            let euro = rates.euro_rate().await;
            let mut effects = Vec::new();
            if let Some(duty) = pricing::customs_duty(total, euro) {
                total += duty;
                effects.push(Effect::text(format!(
                    "Customs duty: {:.2} RUB",
                    pricing::round2(duty)
                )));
            }
            effects.push(Effect::with_keyboard(
                format!("Total cost: {:.2} RUB", pricing::round2(total)),
                main_menu(),
            ));
            StepOutcome::Finished(effects)
        }
    }
}
