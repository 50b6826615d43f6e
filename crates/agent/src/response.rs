use std::fmt::Write as _;

use navigator_core::domain::recommendation::{
    Intent, IntentCategory, Recommendation, Subcategory,
};

use crate::conversation::PreviousRecommendations;

pub const CLARIFICATION_MESSAGE: &str = "I'm not familiar with that specific equipment. Could you clarify what you're looking for? For example, we have audio equipment, video projection, lighting, power strips, and other AV equipment.";

pub const PROCESSING_FAILURE_MESSAGE: &str = "I'm having trouble processing your request. Could you try again with a clearer description of what you need?";

const FOLLOW_UP_OPENING: &str =
    "Based on your follow-up request, I recommend adding these additional items:\n\n";
const REPLACEMENT_OPENING: &str = "Here's what I recommend instead:\n\n";
const STANDARD_OPENING: &str =
    "Based on your requirements, here are my equipment recommendations:\n\n";
const COMPLEMENT: &str = "These items will complement your existing equipment selections and enhance your overall setup. ";

/// Renders the chat reply for a non-empty recommendation list.
pub fn format_response(
    intent: &Intent,
    items: &[Recommendation],
    previous: &PreviousRecommendations,
) -> String {
    if items.is_empty() {
        return CLARIFICATION_MESSAGE.to_string();
    }

    if intent.is_follow_up {
        let mut message = String::from(FOLLOW_UP_OPENING);
        push_groups(&mut message, items);
        if !previous.is_empty() {
            message.push_str(COMPLEMENT);
            message.push_str(follow_up_closing(intent.category));
        }
        return message.trim_end().to_string();
    }

    if intent.category == IntentCategory::Electrical && intent.subcategory == Subcategory::PowerStrips
    {
        return power_strip_message(items);
    }

    let mut message = String::from(if intent.is_replacement {
        REPLACEMENT_OPENING
    } else {
        STANDARD_OPENING
    });
    push_groups(&mut message, items);
    message.push_str(closing(intent));
    message.trim_end().to_string()
}

fn item_line(message: &mut String, item: &Recommendation) {
    let notes = if item.notes.is_empty() { String::new() } else { format!(" ({})", item.notes) };
    let _ = writeln!(
        message,
        "- {} × {} - ${} each{}",
        item.quantity,
        item.item.name,
        item.item.rate.normalize(),
        notes
    );
}

/// `## Category` sections in first-seen order, one line per item.
fn push_groups(message: &mut String, items: &[Recommendation]) {
    let mut categories: Vec<&str> = Vec::new();
    for item in items {
        if !categories.contains(&item.item.category.as_str()) {
            categories.push(item.item.category.as_str());
        }
    }

    for category in categories {
        let _ = writeln!(message, "## {category}");
        for item in items.iter().filter(|item| item.item.category == category) {
            item_line(message, item);
        }
        message.push('\n');
    }
}

fn power_strip_message(items: &[Recommendation]) -> String {
    let mut message = String::from("For your event, I recommend:\n\n## Electrical Equipment\n");
    for item in items {
        item_line(&mut message, item);
    }
    message.push_str(
        "\nThese power strips have surge protection and are suitable for connecting AV equipment safely.",
    );
    message
}

fn follow_up_closing(category: IntentCategory) -> &'static str {
    match category {
        IntentCategory::Lighting => {
            "The additional lighting will create a more immersive atmosphere for your event."
        }
        IntentCategory::Audio => {
            "The additional audio equipment will ensure better sound coverage and clarity."
        }
        IntentCategory::Video => {
            "This video equipment will enhance your visual presentation capabilities."
        }
        IntentCategory::Electrical => {
            "These power distribution items will ensure you have enough outlets for all your equipment."
        }
        IntentCategory::Event | IntentCategory::Unknown => "",
    }
}

fn closing(intent: &Intent) -> &'static str {
    match (intent.category, intent.subcategory) {
        (IntentCategory::Lighting, Subcategory::Uplights) => {
            "The uplights will create beautiful ambient lighting around your venue. They can be set to match your event colors and will dramatically enhance the atmosphere."
        }
        (IntentCategory::Audio, Subcategory::WirelessMicrophone) => {
            "The wireless microphones will allow free movement during speeches or presentations, while the speaker system ensures everyone can hear clearly."
        }
        (IntentCategory::Video, _) => {
            "This video setup will provide high-quality visual presentation capabilities, ideal for displaying presentations, videos, or images to your audience."
        }
        (IntentCategory::Event, _) => {
            "This complete package provides all the essential equipment for your event, ensuring professional audio-visual capabilities throughout."
        }
        _ => "",
    }
}
