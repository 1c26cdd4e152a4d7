//! Pure pricing math for the shipping calculator.
//!
//! All amounts are in RUB unless a name says otherwise. Functions here are
//! deliberately side-effect free; exchange rates are passed in by the caller.

/// Shipping cost per kilogram, RUB.
pub const SHIPPING_RATE_PER_KG: f64 = 640.0;

/// Flat damage-protection fee, RUB.
pub const INSURANCE_FEE: f64 = 100.0;

/// Duty-free allowance, EUR. Orders above `euro_rate * DUTY_FREE_EUR` owe duty.
pub const DUTY_FREE_EUR: f64 = 200.0;

/// Customs duty rate applied to the full total once over the allowance.
pub const DUTY_RATE: f64 = 0.05;

/// Delivery carriers offered by both flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    Cdek,
    RussianPost,
}

impl Carrier {
    /// Parse from the exact reply-keyboard button text. Case-sensitive, as the
    /// buttons are the canonical input.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "CDEK" => Some(Self::Cdek),
            "Russian Post" => Some(Self::RussianPost),
            _ => None,
        }
    }

    /// Button label, also used in prompts and ticket captions.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cdek => "CDEK",
            Self::RussianPost => "Russian Post",
        }
    }

    /// Handling surcharge multiplied into the calculator total.
    pub fn surcharge(self) -> f64 {
        match self {
            Self::Cdek => 1.15,
            Self::RussianPost => 1.10,
        }
    }
}

/// Convert an item price in yuan to RUB at the given rate.
pub fn price_in_rub(price_yuan: f64, yuan_rate: f64) -> f64 {
    price_yuan * yuan_rate
}

/// Shipping cost for a parcel of the given weight.
pub fn shipping_cost(weight_kg: f64) -> f64 {
    weight_kg * SHIPPING_RATE_PER_KG
}

/// Item price plus shipping, with the carrier surcharge applied.
pub fn carrier_total(price_rub: f64, shipping: f64, carrier: Carrier) -> f64 {
    (price_rub + shipping) * carrier.surcharge()
}

/// Customs duty owed on `total`, or `None` when within the duty-free
/// allowance. The threshold uses the euro rate current at completion time.
pub fn customs_duty(total: f64, euro_rate: f64) -> Option<f64> {
    let threshold = euro_rate * DUTY_FREE_EUR;
    if total > threshold {
        Some(total * DUTY_RATE)
    } else {
        None
    }
}

/// Round to 2 decimal places for user-facing amounts.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_parse_exact_button_text() {
        assert_eq!(Carrier::parse("CDEK"), Some(Carrier::Cdek));
        assert_eq!(Carrier::parse("Russian Post"), Some(Carrier::RussianPost));
        assert_eq!(Carrier::parse("cdek"), None);
        assert_eq!(Carrier::parse("russian post"), None);
        assert_eq!(Carrier::parse("DHL"), None);
        assert_eq!(Carrier::parse(""), None);
    }

    #[test]
    fn carrier_surcharges() {
        assert!((Carrier::Cdek.surcharge() - 1.15).abs() < f64::EPSILON);
        assert!((Carrier::RussianPost.surcharge() - 1.10).abs() < f64::EPSILON);
    }

    #[test]
    fn price_conversion() {
        assert!((price_in_rub(100.0, 14.0) - 1400.0).abs() < 1e-9);
        assert!((price_in_rub(0.0, 14.0)).abs() < 1e-9);
    }

    #[test]
    fn shipping_per_kg() {
        assert!((shipping_cost(2.0) - 1280.0).abs() < 1e-9);
        assert!((shipping_cost(0.5) - 320.0).abs() < 1e-9);
    }

    // The deterministic trace: price=100 at rate 14.0, weight=2, CDEK.
    #[test]
    fn carrier_total_reference_trace() {
        let price_rub = price_in_rub(100.0, 14.0);
        let shipping = shipping_cost(2.0);
        let total = carrier_total(price_rub, shipping, Carrier::Cdek);
        assert!((total - 3081.0).abs() < 1e-9);
    }

    #[test]
    fn duty_not_owed_at_or_under_threshold() {
        // threshold = 100 * 200 = 20000
        assert_eq!(customs_duty(3081.0, 100.0), None);
        assert_eq!(customs_duty(20_000.0, 100.0), None);
    }

    #[test]
    fn duty_owed_over_threshold_by_any_margin() {
        let duty = customs_duty(20_000.01, 100.0).expect("over threshold");
        assert!((duty - 20_000.01 * 0.05).abs() < 1e-9);
    }

    #[test]
    fn duty_scales_with_euro_rate() {
        // threshold = 90 * 200 = 18000
        assert!(customs_duty(18_500.0, 90.0).is_some());
        assert!(customs_duty(18_500.0, 100.0).is_none());
    }

    #[test]
    fn rounding_two_decimals() {
        assert!((round2(3081.004) - 3081.0).abs() < 1e-9);
        assert!((round2(1.239) - 1.24).abs() < 1e-9);
        assert!((round2(1400.0) - 1400.0).abs() < 1e-9);
    }
}
