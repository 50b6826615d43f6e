use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use navigator_core::catalog::Catalog;
use navigator_core::config::LlmConfig;
use navigator_core::domain::recommendation::{ConversationMessage, Intent, Recommendation};

use crate::classifier::IntentClassifier;
use crate::conversation::PreviousRecommendations;
use crate::intent::IntentDetector;
use crate::llm::{LlmClient, OpenAiCompatClient};
use crate::recommend::RecommendationGenerator;
use crate::response::{format_response, CLARIFICATION_MESSAGE};

/// Body of a recommendation request as sent by the chat client.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default, deserialize_with = "text_or_none")]
    pub prompt: Option<String>,
    #[serde(default)]
    pub job_id: Option<Value>,
    #[serde(default)]
    pub order_id: Option<Value>,
    #[serde(default, deserialize_with = "lenient_history")]
    pub conversation_history: Vec<ConversationMessage>,
}

fn text_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        _ => None,
    })
}

fn lenient_history<'de, D>(deserializer: D) -> Result<Vec<ConversationMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_history(Value::deserialize(deserializer)?))
}

/// Reads conversation history the way the chat client sends it. `null` or a
/// non-array is an empty history, and messages that do not parse (unknown
/// roles, missing fields) are skipped.
pub fn parse_history(raw: Value) -> Vec<ConversationMessage> {
    let Value::Array(messages) = raw else {
        return Vec::new();
    };
    messages.into_iter().filter_map(|message| serde_json::from_value(message).ok()).collect()
}

impl RecommendationRequest {
    /// The trimmed prompt, or `None` when it is missing or blank.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().map(str::trim).filter(|prompt| !prompt.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecommendationResponse {
    pub message: String,
    pub items: Vec<Recommendation>,
    pub intent: Intent,
}

pub struct RecommendationEngine {
    detector: IntentDetector,
    generator: RecommendationGenerator,
}

impl RecommendationEngine {
    pub fn new(llm: Option<Arc<dyn LlmClient>>) -> anyhow::Result<Self> {
        let classifier = llm.map(IntentClassifier::new).transpose()?;
        Ok(Self { detector: IntentDetector::new(classifier)?, generator: RecommendationGenerator::new() })
    }

    /// Engine wired to the configured LLM provider, or rules-only when disabled.
    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let llm = OpenAiCompatClient::from_config(config)?
            .map(|client| Arc::new(client) as Arc<dyn LlmClient>);
        Self::new(llm)
    }

    pub fn uses_llm(&self) -> bool {
        self.detector.has_classifier()
    }

    pub async fn recommend(
        &self,
        prompt: &str,
        history: &[ConversationMessage],
        catalog: &Catalog,
        correlation_id: &str,
    ) -> RecommendationResponse {
        let previous = PreviousRecommendations::from_history(history);
        let intent = self.detector.detect(prompt, history).await;
        tracing::info!(
            event_name = "agent.intent.detected",
            correlation_id,
            category = intent.category.as_str(),
            subcategory = intent.subcategory.as_str(),
            follow_up = intent.is_follow_up,
            replacement = intent.is_replacement,
            previous_items = previous.len(),
            "intent detected"
        );

        let items = self.generator.generate(&intent, catalog, &previous);
        if items.is_empty() {
            tracing::info!(
                event_name = "agent.recommendation.clarify",
                correlation_id,
                "no equipment matched, asking for clarification"
            );
            return RecommendationResponse {
                message: CLARIFICATION_MESSAGE.to_string(),
                items,
                intent,
            };
        }

        let message = format_response(&intent, &items, &previous);
        tracing::info!(
            event_name = "agent.recommendation.generated",
            correlation_id,
            items = items.len(),
            "recommendations generated"
        );
        RecommendationResponse { message, items, intent }
    }
}
