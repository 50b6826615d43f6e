use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use navigator_agent::{parse_history, RecommendationEngine};
use navigator_core::catalog::Catalog;
use navigator_core::domain::recommendation::ConversationMessage;

use crate::commands::{prepare, CommandResult};

/// Runs one prompt through intent detection and recommendation against the
/// built-in catalog and prints the response the server would return.
pub fn run(prompt: &str, history_path: Option<&Path>) -> CommandResult {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return CommandResult::failure("recommend", "invalid_input", "No prompt provided", 2);
    }

    let history = match history_path.map(read_history).transpose() {
        Ok(history) => history.unwrap_or_default(),
        Err(error) => {
            return CommandResult::failure("recommend", "invalid_input", format!("{error:#}"), 2);
        }
    };

    let (config, runtime) = match prepare("recommend") {
        Ok(prepared) => prepared,
        Err(failure) => return failure,
    };

    let engine = match RecommendationEngine::from_config(&config.llm) {
        Ok(engine) => engine,
        Err(error) => {
            return CommandResult::failure("recommend", "llm_client", format!("{error:#}"), 4);
        }
    };

    let catalog = Catalog::builtin();
    let response = runtime.block_on(engine.recommend(prompt, &history, &catalog, "cli"));
    match serde_json::to_string_pretty(&response) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::failure("recommend", "serialization", error.to_string(), 5),
    }
}

fn read_history(path: &Path) -> Result<Vec<ConversationMessage>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read history file `{}`", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("history file `{}` is not valid JSON", path.display()))?;
    if !value.is_array() {
        bail!("history file `{}` is not a JSON message list", path.display());
    }
    Ok(parse_history(value))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::read_history;

    #[test]
    fn history_file_parses_assistant_items() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"role":"system","content":"You are an AV assistant"},
                {"role":"user","content":"mics for a wedding"},
                {"role":"assistant","content":"Here you go","items":[{"id":3,"name":"Audio - Wireless Microphone"}]}]"#,
        )
        .expect("write history");

        let history = read_history(&path).expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].items.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn unreadable_history_names_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.json");
        let error = read_history(&path).expect_err("missing file");
        assert!(format!("{error:#}").contains("missing.json"));
    }

    #[test]
    fn history_must_be_a_message_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        fs::write(&path, r#"{"role":"user","content":"hi"}"#).expect("write history");

        let error = read_history(&path).expect_err("object is not a list");
        assert!(format!("{error:#}").contains("not a JSON message list"));
    }
}
