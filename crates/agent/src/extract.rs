//! Lexical signals pulled out of a user prompt: quantities, event context,
//! lighting flavour, and whether the message reads like a follow-up.

use regex::Regex;

use navigator_core::domain::recommendation::{
    ConversationMessage, EventContext, MessageRole, Subcategory,
};

/// Prompts shorter than this (trimmed) are treated as follow-ups when history exists.
const SHORT_PROMPT_CHARS: usize = 15;

const CONTEXT_KEYWORDS: &[(EventContext, &[&str])] = &[
    (EventContext::Wedding, &["wedding", "ceremony", "reception"]),
    (EventContext::Conference, &["conference", "meeting", "presentation"]),
    (EventContext::Party, &["party", "celebration"]),
    (EventContext::Performance, &["concert", "performance"]),
];

pub fn normalize_prompt(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}

/// Event context named in free text, if any keyword matches.
pub fn context_keyword(text: &str) -> Option<EventContext> {
    let lower = text.to_lowercase();
    CONTEXT_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|word| lower.contains(word)))
        .map(|(context, _)| *context)
}

/// Event context for a fresh prompt; `event` when nothing more specific is named.
pub fn prompt_context(prompt: &str) -> EventContext {
    context_keyword(prompt).unwrap_or(EventContext::Event)
}

/// Context carried by the conversation so far. Message text is scanned first,
/// in order, then any intent an assistant message echoed back. A non-empty
/// history always yields at least `event`.
pub fn history_context(history: &[ConversationMessage]) -> Option<EventContext> {
    if history.is_empty() {
        return None;
    }

    history
        .iter()
        .find_map(|message| context_keyword(&message.content))
        .or_else(|| {
            history
                .iter()
                .filter(|message| message.role == MessageRole::Assistant)
                .find_map(|message| message.intent.as_ref().and_then(|intent| intent.context))
        })
        .or(Some(EventContext::Event))
}

#[derive(Debug)]
pub struct SignalExtractor {
    explicit_quantity: Regex,
    pair: Regex,
    several: Regex,
    many: Regex,
    follow_up_cue: Regex,
    stage: Regex,
    spot: Regex,
    uplight: Regex,
}

impl SignalExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            explicit_quantity: Regex::new(
                r"(?i)\b(\d+)\s+(?:[a-z-]+\s+)?(?:microphone|mic|light|uplight|up light|speaker|projector|screen|strip|cord)",
            )?,
            pair: Regex::new(r"(?i)\b(couple|few|pair)\b")?,
            several: Regex::new(r"(?i)\bseveral\b")?,
            many: Regex::new(r"(?i)\b(many|lots)\b")?,
            follow_up_cue: Regex::new(
                r"(?i)\b(add|more|also|and|instead|replace|change)\b|\bwhat about\b|\bcan you\b|\bhow about\b",
            )?,
            stage: Regex::new(r"(?i)\bstage\b|\bwash\b")?,
            spot: Regex::new(r"(?i)\bspot\s*lights?\b|\bspotlight")?,
            uplight: Regex::new(r"(?i)uplight|\bup lights?\b|\bup-lights?\b")?,
        })
    }

    /// An explicit number in front of an equipment noun wins, then vague
    /// quantifiers, then `default`.
    pub fn quantity(&self, prompt: &str, default: u32) -> u32 {
        let explicit = self
            .explicit_quantity
            .captures(prompt)
            .and_then(|captures| captures.get(1))
            .and_then(|number| number.as_str().parse::<u32>().ok())
            .filter(|quantity| *quantity > 0);
        if let Some(quantity) = explicit {
            return quantity;
        }

        if self.pair.is_match(prompt) {
            2
        } else if self.several.is_match(prompt) {
            3
        } else if self.many.is_match(prompt) {
            5
        } else {
            default.max(1)
        }
    }

    pub fn lighting_type(&self, prompt: &str) -> Subcategory {
        if self.uplight.is_match(prompt) {
            Subcategory::Uplights
        } else if self.stage.is_match(prompt) {
            Subcategory::StageLighting
        } else if self.spot.is_match(prompt) {
            Subcategory::Spotlight
        } else {
            Subcategory::GeneralLighting
        }
    }

    pub fn mentions_uplights(&self, prompt: &str) -> bool {
        self.uplight.is_match(prompt)
    }

    /// Wording heuristic only; the detector also needs history to agree.
    pub fn looks_like_follow_up(&self, prompt: &str) -> bool {
        prompt.trim().chars().count() < SHORT_PROMPT_CHARS || self.follow_up_cue.is_match(prompt)
    }
}
