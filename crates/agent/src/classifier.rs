use std::sync::Arc;

use anyhow::Result;
use regex::Regex;

use navigator_core::domain::recommendation::{
    EventContext, Intent, IntentCategory, Subcategory,
};

use crate::llm::LlmClient;

pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You are an equipment intent classifier. Analyze the user's message and classify what type of audio-visual equipment they're looking for.

Output ONLY ONE of these categories:
- CATEGORY: audio, SUBCATEGORY: microphone, DETAIL: [wireless/tabletop/lavalier/etc]
- CATEGORY: audio, SUBCATEGORY: speakers, DETAIL: [basic/advanced]
- CATEGORY: video, SUBCATEGORY: projector, DETAIL: [standard/HD]
- CATEGORY: video, SUBCATEGORY: screen, DETAIL: [size-small/size-medium/size-large]
- CATEGORY: lighting, SUBCATEGORY: uplights, DETAIL: [quantity]
- CATEGORY: lighting, SUBCATEGORY: stagelighting, DETAIL: [basic/advanced]
- CATEGORY: event, SUBCATEGORY: [wedding/conference/presentation/party], DETAIL: [size-small/size-medium/size-large]
- CATEGORY: unknown, SUBCATEGORY: general, DETAIL: needshelp";

/// Last-resort intent classification through an LLM.
pub struct IntentClassifier {
    client: Arc<dyn LlmClient>,
    category: Regex,
    subcategory: Regex,
    detail: Regex,
}

impl IntentClassifier {
    pub fn new(client: Arc<dyn LlmClient>) -> Result<Self, regex::Error> {
        Ok(Self {
            client,
            category: Regex::new(r"(?i)\bCATEGORY:\s*(\w+)")?,
            subcategory: Regex::new(r"(?i)SUBCATEGORY:\s*(\w+)")?,
            detail: Regex::new(r"(?i)DETAIL:\s*([^\n,]+)")?,
        })
    }

    /// Asks the model and parses its answer. `Ok(None)` means the reply did
    /// not name a category this service knows.
    pub async fn classify(&self, prompt: &str, context: EventContext) -> Result<Option<Intent>> {
        let reply = self.client.complete(CLASSIFIER_SYSTEM_PROMPT, prompt).await?;
        Ok(self.parse(&reply, context))
    }

    pub fn parse(&self, reply: &str, context: EventContext) -> Option<Intent> {
        let capture = |pattern: &Regex| {
            pattern
                .captures(reply)
                .and_then(|captures| captures.get(1))
                .map(|value| value.as_str().trim().to_lowercase())
        };

        let category = IntentCategory::parse(&capture(&self.category)?)?;
        if category == IntentCategory::Unknown {
            return None;
        }
        let subcategory = capture(&self.subcategory)
            .and_then(|raw| Subcategory::parse(&raw))
            .unwrap_or_else(|| default_subcategory(category));
        let detail = capture(&self.detail).filter(|detail| !detail.is_empty());

        let mut intent = Intent::new(category, subcategory).with_context(context);
        if let Some(quantity) = detail.as_deref().and_then(|raw| raw.parse::<u32>().ok()) {
            intent = intent.with_quantity(quantity);
        }
        if subcategory == Subcategory::Projector {
            intent.needs_screen = true;
        }
        intent.detail = detail;
        Some(intent)
    }
}

fn default_subcategory(category: IntentCategory) -> Subcategory {
    match category {
        IntentCategory::Lighting => Subcategory::GeneralLighting,
        IntentCategory::Audio => Subcategory::AudioGeneral,
        IntentCategory::Video => Subcategory::Screen,
        IntentCategory::Electrical => Subcategory::PowerStrips,
        IntentCategory::Event | IntentCategory::Unknown => Subcategory::General,
    }
}
