use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::equipment::{EquipmentId, EquipmentItem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    Lighting,
    Audio,
    Video,
    Electrical,
    Event,
    Unknown,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lighting => "lighting",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Electrical => "electrical",
            Self::Event => "event",
            Self::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lighting" => Some(Self::Lighting),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            "electrical" => Some(Self::Electrical),
            "event" => Some(Self::Event),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subcategory {
    Uplights,
    StageLighting,
    Spotlight,
    GeneralLighting,
    WirelessMicrophone,
    Microphone,
    Speakers,
    AudioGeneral,
    Projector,
    Screen,
    PowerStrips,
    Wedding,
    Conference,
    Presentation,
    Party,
    General,
}

impl Subcategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uplights => "uplights",
            Self::StageLighting => "stage_lighting",
            Self::Spotlight => "spotlight",
            Self::GeneralLighting => "general_lighting",
            Self::WirelessMicrophone => "wireless_microphone",
            Self::Microphone => "microphone",
            Self::Speakers => "speakers",
            Self::AudioGeneral => "audio_general",
            Self::Projector => "projector",
            Self::Screen => "screen",
            Self::PowerStrips => "power_strips",
            Self::Wedding => "wedding",
            Self::Conference => "conference",
            Self::Presentation => "presentation",
            Self::Party => "party",
            Self::General => "general",
        }
    }

    /// Accepts both the snake_case wire names and the run-together labels the
    /// classifier prompt lists (`stagelighting`).
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "uplights" | "uplight" | "up_lights" => Some(Self::Uplights),
            "stage_lighting" | "stagelighting" => Some(Self::StageLighting),
            "spotlight" | "spotlights" => Some(Self::Spotlight),
            "general_lighting" | "lighting" => Some(Self::GeneralLighting),
            "wireless_microphone" | "wirelessmicrophone" => Some(Self::WirelessMicrophone),
            "microphone" | "microphones" | "mic" => Some(Self::Microphone),
            "speakers" | "speaker" => Some(Self::Speakers),
            "audio_general" | "audio" => Some(Self::AudioGeneral),
            "projector" | "projectors" => Some(Self::Projector),
            "screen" | "screens" => Some(Self::Screen),
            "power_strips" | "powerstrips" | "power_strip" => Some(Self::PowerStrips),
            "wedding" => Some(Self::Wedding),
            "conference" | "meeting" => Some(Self::Conference),
            "presentation" => Some(Self::Presentation),
            "party" => Some(Self::Party),
            "general" => Some(Self::General),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventContext {
    Wedding,
    Conference,
    Party,
    Performance,
    Event,
}

impl EventContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wedding => "wedding",
            Self::Conference => "conference",
            Self::Party => "party",
            Self::Performance => "performance",
            Self::Event => "event",
        }
    }
}

/// Structured reading of one user request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub category: IntentCategory,
    pub subcategory: Subcategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<EventContext>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_follow_up: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_replacement: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub needs_screen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Intent {
    pub fn new(category: IntentCategory, subcategory: Subcategory) -> Self {
        Self {
            category,
            subcategory,
            quantity: None,
            context: None,
            is_follow_up: false,
            is_replacement: false,
            needs_screen: false,
            detail: None,
        }
    }

    pub fn unknown(context: Option<EventContext>) -> Self {
        Self { context, ..Self::new(IntentCategory::Unknown, Subcategory::General) }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity.max(1));
        self
    }

    pub fn with_context(mut self, context: EventContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn is_unknown(&self) -> bool {
        self.category == IntentCategory::Unknown
    }
}

/// A catalog item picked for the user, with how many and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub item: EquipmentItem,
    pub quantity: u32,
    pub notes: String,
}

impl Recommendation {
    pub fn new(item: &EquipmentItem, quantity: u32, notes: impl Into<String>) -> Self {
        Self { item: item.clone(), quantity: quantity.max(1), notes: notes.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// An item echoed back by the client inside conversation history. Only the
/// identity fields are needed; everything else the client adds is ignored.
/// Ids the client minted itself (strings, fractional numbers) read as `None`
/// so matching falls back to the name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(default, deserialize_with = "loose_equipment_id")]
    pub id: Option<EquipmentId>,
    pub name: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<HistoryItem>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose_intent"
    )]
    pub intent: Option<Intent>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseId {
    Integer(i64),
    Float(f64),
    Text(String),
    #[allow(dead_code)]
    Other(IgnoredAny),
}

fn loose_equipment_id<'de, D>(deserializer: D) -> Result<Option<EquipmentId>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match LooseId::deserialize(deserializer)? {
        LooseId::Integer(id) => Some(id),
        LooseId::Float(id) if id.fract() == 0.0 && id.abs() < i64::MAX as f64 => Some(id as i64),
        LooseId::Text(raw) => raw.trim().parse().ok(),
        LooseId::Float(_) | LooseId::Other(_) => None,
    };
    Ok(id.map(EquipmentId))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseIntent {
    Known(Intent),
    #[allow(dead_code)]
    Other(IgnoredAny),
}

/// An echoed intent from an older client or with labels outside the closed
/// set is dropped rather than failing the whole message.
fn loose_intent<'de, D>(deserializer: D) -> Result<Option<Intent>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match LooseIntent::deserialize(deserializer)? {
        LooseIntent::Known(intent) => Some(intent),
        LooseIntent::Other(_) => None,
    })
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into(), items: None, intent: None }
    }

    pub fn assistant(content: impl Into<String>, items: Vec<HistoryItem>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            items: Some(items),
            intent: None,
        }
    }
}
