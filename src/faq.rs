//! Static FAQ content and the administrator contact card.

const FAQ_ENTRIES: &[(&str, &str)] = &[
    ("Delivery", "We ship nationwide within 10-21 days."),
    (
        "Payment",
        "Available options: card, bank transfer, cash on delivery.",
    ),
];

pub const ADMIN_CONTACT: &str = "Reach the administrator: @parcelbot_admin";

/// Render the FAQ as a bullet list.
pub fn faq_text() -> String {
    let mut text = String::from("Frequently asked questions:\n\n");
    for (topic, answer) in FAQ_ENTRIES {
        text.push_str(&format!("\u{2022} {topic}: {answer}\n"));
    }
    text
}
