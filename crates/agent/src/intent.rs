//! Intent detection as an ordered cascade: follow-up rules, direct keyword
//! rules, the optional LLM classifier, then `unknown/general`.

use regex::Regex;

use navigator_core::domain::recommendation::{
    ConversationMessage, Intent, IntentCategory, Subcategory,
};

use crate::classifier::IntentClassifier;
use crate::extract::{history_context, normalize_prompt, prompt_context, SignalExtractor};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FollowUpMode {
    Additive,
    Replacement,
}

type BuildIntent = fn(&SignalExtractor, &str) -> Intent;

struct Rule {
    name: &'static str,
    pattern: Regex,
    build: BuildIntent,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, build: BuildIntent) -> Result<Self, regex::Error> {
        Ok(Self { name, pattern: Regex::new(pattern)?, build })
    }
}

struct FollowUpRule {
    mode: FollowUpMode,
    rule: Rule,
}

pub struct IntentDetector {
    signals: SignalExtractor,
    additive_cue: Regex,
    replacement_cue: Regex,
    follow_up_rules: Vec<FollowUpRule>,
    direct_rules: Vec<Rule>,
    classifier: Option<IntentClassifier>,
}

const UPLIGHTS: &str = r"(?i)uplights?|\bup[ -]lights?\b";
/// Whole-word only, so "uplights" never reads as a lighting follow-up and
/// reaches the direct uplights rule instead.
const LIGHTING: &str = r"(?i)\blight(s|ing)?\b";

impl IntentDetector {
    pub fn new(classifier: Option<IntentClassifier>) -> Result<Self, regex::Error> {
        use FollowUpMode::{Additive, Replacement};

        let follow_up = |mode: FollowUpMode,
                         name: &'static str,
                         pattern: &str,
                         build: BuildIntent|
         -> Result<FollowUpRule, regex::Error> {
            Ok(FollowUpRule { mode, rule: Rule::new(name, pattern, build)? })
        };

        Ok(Self {
            signals: SignalExtractor::new()?,
            additive_cue: Regex::new(r"(?i)\b(add|more|also|and)\b")?,
            replacement_cue: Regex::new(r"(?i)\b(instead|replace|change)\b")?,
            follow_up_rules: vec![
                follow_up(Additive, "add_lighting", LIGHTING, |signals, prompt| {
                    Intent::new(IntentCategory::Lighting, signals.lighting_type(prompt))
                        .with_quantity(signals.quantity(prompt, 2))
                })?,
                follow_up(
                    Additive,
                    "add_audio",
                    r"(?i)\bmicrophones?\b|\bmics?\b|\baudio\b",
                    |signals, prompt| {
                        let subcategory = if prompt.contains("wireless") {
                            Subcategory::WirelessMicrophone
                        } else {
                            Subcategory::AudioGeneral
                        };
                        Intent::new(IntentCategory::Audio, subcategory)
                            .with_quantity(signals.quantity(prompt, 1))
                    },
                )?,
                follow_up(
                    Additive,
                    "add_video",
                    r"(?i)\b(projectors?|screens?|displays?|monitors?)\b",
                    |signals, prompt| {
                        let subcategory = if prompt.contains("projector") {
                            Subcategory::Projector
                        } else {
                            Subcategory::Screen
                        };
                        Intent::new(IntentCategory::Video, subcategory)
                            .with_quantity(signals.quantity(prompt, 1))
                    },
                )?,
                follow_up(
                    Additive,
                    "add_power",
                    r"(?i)\b(power|extension|cords?|strips?)\b",
                    |signals, prompt| {
                        Intent::new(IntentCategory::Electrical, Subcategory::PowerStrips)
                            .with_quantity(signals.quantity(prompt, 1))
                    },
                )?,
                follow_up(Replacement, "replace_lighting", LIGHTING, |signals, prompt| {
                    Intent::new(IntentCategory::Lighting, signals.lighting_type(prompt))
                        .with_quantity(signals.quantity(prompt, 4))
                })?,
            ],
            direct_rules: vec![
                Rule::new("uplights", UPLIGHTS, |signals, prompt| {
                    Intent::new(IntentCategory::Lighting, Subcategory::Uplights)
                        .with_quantity(signals.quantity(prompt, 6))
                })?,
                Rule::new(
                    "power_strips",
                    r"(?i)\bpower\s*(strips?|bars?)\b|\bextension\s+cords?\b",
                    |signals, prompt| {
                        Intent::new(IntentCategory::Electrical, Subcategory::PowerStrips)
                            .with_quantity(signals.quantity(prompt, 1))
                    },
                )?,
                Rule::new(
                    "wireless_microphones",
                    r"(?i)\bwireless\s+mic(rophone)?s?\b",
                    |signals, prompt| {
                        Intent::new(IntentCategory::Audio, Subcategory::WirelessMicrophone)
                            .with_quantity(signals.quantity(prompt, 1))
                    },
                )?,
                Rule::new(
                    "speakers",
                    r"(?i)\bspeakers?\b|\baudio\s+system\b",
                    |signals, prompt| {
                        Intent::new(IntentCategory::Audio, Subcategory::Speakers)
                            .with_quantity(signals.quantity(prompt, 1))
                    },
                )?,
                Rule::new("projectors", r"(?i)\bprojectors?\b", |signals, prompt| {
                    let mut intent = Intent::new(IntentCategory::Video, Subcategory::Projector)
                        .with_quantity(signals.quantity(prompt, 1));
                    intent.needs_screen = true;
                    intent
                })?,
                Rule::new("screens", r"(?i)\bscreens?\b", |signals, prompt| {
                    Intent::new(IntentCategory::Video, Subcategory::Screen)
                        .with_quantity(signals.quantity(prompt, 1))
                })?,
                Rule::new("wedding", r"(?i)\bwedding\b", |_, _| {
                    Intent::new(IntentCategory::Event, Subcategory::Wedding)
                })?,
                Rule::new("conference", r"(?i)\b(conference|meeting)\b", |_, _| {
                    Intent::new(IntentCategory::Event, Subcategory::Conference)
                })?,
            ],
            classifier,
        })
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Deterministic part of the cascade; `None` when no rule fires.
    pub fn detect_by_rules(&self, prompt: &str, history: &[ConversationMessage]) -> Option<Intent> {
        let prompt = normalize_prompt(prompt);
        self.follow_up_intent(&prompt, history).or_else(|| self.direct_intent(&prompt))
    }

    pub async fn detect(&self, prompt: &str, history: &[ConversationMessage]) -> Intent {
        if let Some(intent) = self.detect_by_rules(prompt, history) {
            return intent;
        }

        let context = prompt_context(prompt);
        let Some(classifier) = &self.classifier else {
            return Intent::unknown(Some(context));
        };

        match classifier.classify(prompt, context).await {
            Ok(Some(intent)) => {
                tracing::debug!(
                    event_name = "agent.intent.classified",
                    category = intent.category.as_str(),
                    subcategory = intent.subcategory.as_str(),
                    "LLM classified prompt"
                );
                intent
            }
            Ok(None) => Intent::unknown(Some(context)),
            Err(error) => {
                tracing::warn!(
                    event_name = "agent.intent.classifier_failed",
                    error = %error,
                    "LLM classification failed, treating intent as unknown"
                );
                Intent::unknown(Some(context))
            }
        }
    }

    fn follow_up_intent(&self, prompt: &str, history: &[ConversationMessage]) -> Option<Intent> {
        if !self.signals.looks_like_follow_up(prompt) {
            return None;
        }
        let context = history_context(history)?;

        let mode = if self.additive_cue.is_match(prompt) {
            FollowUpMode::Additive
        } else if self.replacement_cue.is_match(prompt) {
            FollowUpMode::Replacement
        } else {
            return None;
        };

        let matched = self
            .follow_up_rules
            .iter()
            .filter(|candidate| candidate.mode == mode)
            .find(|candidate| candidate.rule.pattern.is_match(prompt))?;

        let mut intent = (matched.rule.build)(&self.signals, prompt).with_context(context);
        match mode {
            FollowUpMode::Additive => intent.is_follow_up = true,
            FollowUpMode::Replacement => intent.is_replacement = true,
        }
        tracing::debug!(
            event_name = "agent.intent.follow_up",
            rule = matched.rule.name,
            context = context.as_str(),
            "follow-up rule matched"
        );
        Some(intent)
    }

    fn direct_intent(&self, prompt: &str) -> Option<Intent> {
        let rule = self.direct_rules.iter().find(|rule| rule.pattern.is_match(prompt))?;
        let context = prompt_context(prompt);
        tracing::debug!(event_name = "agent.intent.rule", rule = rule.name, "keyword rule matched");
        Some((rule.build)(&self.signals, prompt).with_context(context))
    }
}
