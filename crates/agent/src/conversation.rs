use std::collections::HashSet;

use navigator_core::catalog::{Catalog, EquipmentKind};
use navigator_core::domain::equipment::{EquipmentId, EquipmentItem};
use navigator_core::domain::recommendation::{ConversationMessage, HistoryItem, MessageRole};

/// Everything the assistant has already recommended in this conversation.
///
/// Items are keyed by catalog id; the name is only consulted for history items
/// that arrive without one.
#[derive(Clone, Debug, Default)]
pub struct PreviousRecommendations {
    ids: HashSet<EquipmentId>,
    unidentified_names: Vec<String>,
    items: Vec<HistoryItem>,
}

impl PreviousRecommendations {
    pub fn from_history(history: &[ConversationMessage]) -> Self {
        let mut previous = Self::default();
        for message in history.iter().filter(|message| message.role == MessageRole::Assistant) {
            for item in message.items.iter().flatten() {
                previous.record(item.clone());
            }
        }
        previous
    }

    fn record(&mut self, item: HistoryItem) {
        match item.id {
            Some(id) => {
                if !self.ids.insert(id) {
                    return;
                }
            }
            None => {
                let name = item.name.trim().to_lowercase();
                if self.unidentified_names.contains(&name) {
                    return;
                }
                self.unidentified_names.push(name);
            }
        }
        self.items.push(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Whether this exact catalog item was recommended before.
    pub fn contains(&self, item: &EquipmentItem) -> bool {
        self.ids.contains(&item.id) || self.unidentified_names.contains(&item.name_lower())
    }

    /// Whether anything of this kind was recommended before. Identified items
    /// are resolved through the catalog so a renamed client echo still counts.
    pub fn covers(&self, kind: EquipmentKind, catalog: &Catalog) -> bool {
        self.items.iter().any(|item| {
            let resolved = item.id.and_then(|id| catalog.find(id)).map(EquipmentItem::name_lower);
            resolved.is_some_and(|name| kind.matches_name(&name))
                || kind.matches_name(&item.name.to_lowercase())
        })
    }

    pub fn covers_any(&self, kinds: &[EquipmentKind], catalog: &Catalog) -> bool {
        kinds.iter().any(|kind| self.covers(*kind, catalog))
    }
}

#[cfg(test)]
mod tests {
    use navigator_core::catalog::{Catalog, EquipmentKind};
    use navigator_core::domain::equipment::EquipmentId;
    use navigator_core::domain::recommendation::{ConversationMessage, HistoryItem};

    use super::PreviousRecommendations;

    fn item(id: Option<i64>, name: &str) -> HistoryItem {
        HistoryItem { id: id.map(EquipmentId), name: name.to_string(), quantity: Some(1) }
    }

    #[test]
    fn collects_assistant_items_once() {
        let history = vec![
            ConversationMessage::user("wireless mics please"),
            ConversationMessage::assistant("Here", vec![item(Some(3), "Audio - Wireless Microphone")]),
            ConversationMessage::assistant(
                "And",
                vec![item(Some(3), "Audio - Wireless Microphone"), item(None, "Speaker")],
            ),
        ];

        let previous = PreviousRecommendations::from_history(&history);
        assert_eq!(previous.len(), 2);

        let catalog = Catalog::builtin();
        let mic = catalog.find(EquipmentId(3)).expect("mic");
        assert!(previous.contains(mic));
        assert!(previous.covers(EquipmentKind::WirelessMicrophone, &catalog));
        assert!(previous.covers(EquipmentKind::Speaker, &catalog));
        assert!(!previous.covers(EquipmentKind::Uplight, &catalog));
    }

    #[test]
    fn identified_items_resolve_through_catalog() {
        let history =
            vec![ConversationMessage::assistant("Here", vec![item(Some(18), "Mood lights")])];
        let previous = PreviousRecommendations::from_history(&history);

        let catalog = Catalog::builtin();
        assert!(previous.covers(EquipmentKind::Uplight, &catalog));
        assert!(previous.covers_any(&[EquipmentKind::StageWash, EquipmentKind::Uplight], &catalog));
        assert!(!previous.contains(catalog.find(EquipmentId(17)).expect("wash")));
    }

    #[test]
    fn user_messages_never_count() {
        let mut message = ConversationMessage::user("I already have a projector");
        message.items = Some(vec![item(Some(1), "Projector - Standard")]);

        assert!(PreviousRecommendations::from_history(&[message]).is_empty());
    }
}
