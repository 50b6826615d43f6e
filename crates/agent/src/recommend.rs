use navigator_core::catalog::{Catalog, EquipmentKind};
use navigator_core::domain::equipment::EquipmentItem;
use navigator_core::domain::recommendation::{
    EventContext, Intent, IntentCategory, Recommendation, Subcategory,
};

use crate::conversation::PreviousRecommendations;

/// Equipment bundles offered for whole events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPackage {
    Wedding,
    Conference,
    Party,
}

struct PackageLine {
    kind: EquipmentKind,
    quantity: u32,
    notes: &'static str,
}

const fn line(kind: EquipmentKind, quantity: u32, notes: &'static str) -> PackageLine {
    PackageLine { kind, quantity, notes }
}

const WEDDING_PACKAGE: &[PackageLine] = &[
    line(EquipmentKind::WirelessMicrophone, 2, "For officiant and vows during ceremony"),
    line(EquipmentKind::Speaker, 1, "For ceremony audio and reception music"),
    line(EquipmentKind::Uplight, 8, "Create beautiful ambient lighting in your wedding colors"),
    line(EquipmentKind::DjBooth, 1, "Complete DJ setup for reception music and announcements"),
];

const CONFERENCE_PACKAGE: &[PackageLine] = &[
    line(EquipmentKind::Projector, 1, "For presentations and slides"),
    line(EquipmentKind::Screen, 1, "Large format display for presentations"),
    line(EquipmentKind::WirelessMicrophone, 2, "For presenters and Q&A sessions"),
    line(EquipmentKind::TabletopMicrophone, 1, "For panel discussions or conference tables"),
    line(EquipmentKind::Speaker, 1, "For clear audio throughout the venue"),
];

const PARTY_PACKAGE: &[PackageLine] = &[
    line(EquipmentKind::Speaker, 1, "For music and announcements throughout the party"),
    line(EquipmentKind::Uplight, 6, "Colorful ambient lighting to set the party mood"),
    line(EquipmentKind::DjBooth, 1, "Complete DJ setup for party music"),
];

impl EventPackage {
    pub fn for_intent(intent: &Intent) -> Self {
        match intent.subcategory {
            Subcategory::Wedding => Self::Wedding,
            Subcategory::Party => Self::Party,
            Subcategory::Conference | Subcategory::Presentation => Self::Conference,
            _ => match intent.context {
                Some(EventContext::Wedding) => Self::Wedding,
                Some(EventContext::Party) | Some(EventContext::Performance) => Self::Party,
                _ => Self::Conference,
            },
        }
    }

    fn lines(&self) -> &'static [PackageLine] {
        match self {
            Self::Wedding => WEDDING_PACKAGE,
            Self::Conference => CONFERENCE_PACKAGE,
            Self::Party => PARTY_PACKAGE,
        }
    }
}

/// Accumulates recommendations, never listing one catalog item twice and,
/// for follow-ups, skipping anything recommended earlier in the conversation.
struct Picks<'a> {
    catalog: &'a Catalog,
    previous: Option<&'a PreviousRecommendations>,
    items: Vec<Recommendation>,
}

impl<'a> Picks<'a> {
    fn new(catalog: &'a Catalog, previous: Option<&'a PreviousRecommendations>) -> Self {
        Self { catalog, previous, items: Vec::new() }
    }

    fn add(&mut self, kind: EquipmentKind, quantity: u32, notes: &str) -> bool {
        let catalog = self.catalog;
        match catalog.find_by_kind(kind) {
            Some(item) => self.add_item(item, quantity, notes),
            None => false,
        }
    }

    fn add_item(&mut self, item: &EquipmentItem, quantity: u32, notes: &str) -> bool {
        let listed = self.items.iter().any(|existing| existing.item.id == item.id);
        let seen_before = self.previous.is_some_and(|previous| previous.contains(item));
        if listed || seen_before {
            return false;
        }
        self.items.push(Recommendation::new(item, quantity, notes));
        true
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Picks catalog items for `intent`. An empty result means the request
    /// was not understood and the user should be asked to clarify.
    pub fn generate(
        &self,
        intent: &Intent,
        catalog: &Catalog,
        previous: &PreviousRecommendations,
    ) -> Vec<Recommendation> {
        if intent.is_follow_up {
            let mut picks = Picks::new(catalog, Some(previous));
            follow_up(&mut picks, intent, previous);
            if picks.is_empty() {
                context_bundle(&mut picks, intent, previous);
            }
            if picks.is_empty() {
                standard(&mut picks, intent);
            }
            return picks.items;
        }

        let mut picks = Picks::new(catalog, None);
        standard(&mut picks, intent);
        picks.items
    }
}

fn follow_up(picks: &mut Picks<'_>, intent: &Intent, previous: &PreviousRecommendations) {
    let catalog = picks.catalog;
    let covered = |kind| previous.covers(kind, catalog);

    match intent.category {
        IntentCategory::Audio => {
            if intent.subcategory == Subcategory::WirelessMicrophone
                && !covered(EquipmentKind::WirelessMicrophone)
            {
                picks.add(
                    EquipmentKind::WirelessMicrophone,
                    intent.quantity.unwrap_or(1),
                    "Additional wireless microphone for your event",
                );
            }
            if !covered(EquipmentKind::Speaker) {
                picks.add(
                    EquipmentKind::Speaker,
                    1,
                    "Speaker system to ensure clear audio for your event",
                );
            }
        }
        IntentCategory::Lighting => {
            let candidates: &[EquipmentKind] = match intent.subcategory {
                Subcategory::Uplights => &[EquipmentKind::Uplight],
                Subcategory::StageLighting | Subcategory::Spotlight => &[EquipmentKind::StageWash],
                _ => &[EquipmentKind::Uplight, EquipmentKind::StageWash],
            };
            if let Some(kind) = candidates.iter().copied().find(|kind| !covered(*kind)) {
                let notes = if kind == EquipmentKind::Uplight {
                    "Decorative lighting to enhance the atmosphere of your event"
                } else {
                    "Additional stage wash to brighten presenters and performers"
                };
                picks.add(kind, intent.quantity.unwrap_or(4), notes);
            }
        }
        IntentCategory::Video => match intent.subcategory {
            Subcategory::Projector => {
                if !covered(EquipmentKind::Projector) {
                    picks.add(
                        EquipmentKind::Projector,
                        intent.quantity.unwrap_or(1),
                        "Additional projector for displaying presentations or videos",
                    );
                }
                if !covered(EquipmentKind::Screen) {
                    picks.add(
                        EquipmentKind::Screen,
                        1,
                        "Required projection surface for the projector",
                    );
                }
            }
            _ => {
                if !covered(EquipmentKind::Screen) {
                    picks.add(
                        EquipmentKind::Screen,
                        intent.quantity.unwrap_or(1),
                        "Additional screen for displaying presentations or videos",
                    );
                }
            }
        },
        IntentCategory::Electrical => {
            if !previous.covers_any(&[EquipmentKind::PowerStrip, EquipmentKind::ExtensionCord], catalog)
            {
                picks.add(
                    EquipmentKind::PowerStrip,
                    intent.quantity.unwrap_or(2),
                    "Power strips for connecting multiple devices",
                );
            }
        }
        IntentCategory::Event | IntentCategory::Unknown => {}
    }
}

fn context_bundle(picks: &mut Picks<'_>, intent: &Intent, previous: &PreviousRecommendations) {
    let catalog = picks.catalog;
    match intent.context {
        Some(EventContext::Wedding) | Some(EventContext::Party) => {
            if !previous.covers_any(&[EquipmentKind::Uplight, EquipmentKind::StageWash], catalog) {
                picks.add(EquipmentKind::Uplight, 4, "Atmospheric lighting to enhance your event");
            }
        }
        Some(EventContext::Conference) => {
            if !previous.covers_any(&[EquipmentKind::Projector, EquipmentKind::Screen], catalog) {
                picks.add(EquipmentKind::Projector, 1, "Projector for displaying presentations");
                picks.add(EquipmentKind::Screen, 1, "Projection screen for displaying presentations");
            }
        }
        _ => {}
    }
}

fn standard(picks: &mut Picks<'_>, intent: &Intent) {
    let catalog = picks.catalog;
    let quantity = |default: u32| intent.quantity.unwrap_or(default);
    let detail = intent.detail.as_deref().unwrap_or_default();

    match intent.category {
        IntentCategory::Lighting => match intent.subcategory {
            Subcategory::Uplights => {
                picks.add(EquipmentKind::Uplight, quantity(6), UPLIGHT_NOTES);
            }
            Subcategory::StageLighting | Subcategory::Spotlight => {
                picks.add(EquipmentKind::StageWash, quantity(1), STAGE_WASH_NOTES);
            }
            _ => {
                picks.add(EquipmentKind::Uplight, quantity(6), UPLIGHT_NOTES);
                picks.add(EquipmentKind::StageWash, 1, STAGE_WASH_NOTES);
            }
        },
        IntentCategory::Audio => match intent.subcategory {
            Subcategory::Speakers => {
                picks.add(
                    EquipmentKind::Speaker,
                    quantity(1),
                    "Powered speakers for clear sound throughout the room",
                );
            }
            Subcategory::Microphone if detail.contains("tabletop") => {
                picks.add(
                    EquipmentKind::TabletopMicrophone,
                    quantity(1),
                    "For panel discussions or conference tables",
                );
                picks.add(EquipmentKind::Speaker, 1, SPEAKER_NOTES);
            }
            _ => {
                picks.add(
                    EquipmentKind::WirelessMicrophone,
                    quantity(1),
                    "Wireless microphones for speeches and presentations",
                );
                picks.add(EquipmentKind::Speaker, 1, SPEAKER_NOTES);
            }
        },
        IntentCategory::Video => match intent.subcategory {
            Subcategory::Screen => {
                picks.add(
                    EquipmentKind::Screen,
                    quantity(1),
                    "Display screen for presentations and video",
                );
            }
            _ => {
                let hd = detail.contains("hd").then(|| catalog.search("projector - hd")).flatten();
                match hd {
                    Some(item) => picks.add_item(item, quantity(1), PROJECTOR_NOTES),
                    None => picks.add(EquipmentKind::Projector, quantity(1), PROJECTOR_NOTES),
                };
                if intent.needs_screen || intent.subcategory != Subcategory::Projector {
                    picks.add(
                        EquipmentKind::Screen,
                        1,
                        "Required projection surface for the projector",
                    );
                }
            }
        },
        IntentCategory::Electrical => {
            picks.add(
                EquipmentKind::PowerStrip,
                quantity(1),
                "These will allow you to connect multiple devices to a single power source",
            );
        }
        IntentCategory::Event => add_event_package(picks, EventPackage::for_intent(intent)),
        IntentCategory::Unknown => {}
    }
}

const UPLIGHT_NOTES: &str = "Ambient uplighting that can be set to match your event colors";
const STAGE_WASH_NOTES: &str = "Even wash lighting for the stage or presentation area";
const SPEAKER_NOTES: &str = "Speaker system to ensure clear audio for your event";
const PROJECTOR_NOTES: &str = "Projector for displaying presentations or videos";

fn add_event_package(picks: &mut Picks<'_>, package: EventPackage) {
    for line in package.lines() {
        picks.add(line.kind, line.quantity, line.notes);
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use navigator_core::catalog::Catalog;
    use navigator_core::domain::equipment::{EquipmentId, EquipmentItem};
    use navigator_core::domain::recommendation::{
        ConversationMessage, EventContext, HistoryItem, Intent, IntentCategory, Subcategory,
    };

    use super::RecommendationGenerator;
    use crate::conversation::PreviousRecommendations;

    fn previous(items: &[(i64, &str)]) -> PreviousRecommendations {
        let items = items
            .iter()
            .map(|(id, name)| HistoryItem {
                id: Some(EquipmentId(*id)),
                name: name.to_string(),
                quantity: Some(1),
            })
            .collect();
        PreviousRecommendations::from_history(&[ConversationMessage::assistant("", items)])
    }

    fn ids(items: &[navigator_core::Recommendation]) -> Vec<i64> {
        items.iter().map(|rec| rec.item.id.0).collect()
    }

    fn follow_up(category: IntentCategory, subcategory: Subcategory, quantity: u32) -> Intent {
        let mut intent = Intent::new(category, subcategory)
            .with_quantity(quantity)
            .with_context(EventContext::Event);
        intent.is_follow_up = true;
        intent
    }

    #[test]
    fn wedding_bundle_has_mic_speaker_and_uplights() {
        let intent = Intent::new(IntentCategory::Event, Subcategory::Wedding)
            .with_context(EventContext::Wedding);
        let items = RecommendationGenerator::new().generate(
            &intent,
            &Catalog::builtin(),
            &PreviousRecommendations::default(),
        );

        assert_eq!(ids(&items), vec![3, 5, 18, 20]);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[2].quantity, 8);
        assert_eq!(items[0].notes, "For officiant and vows during ceremony");
    }

    #[test]
    fn conference_bundle_and_presentation_share_lines() {
        let generator = RecommendationGenerator::new();
        let catalog = Catalog::builtin();
        let none = PreviousRecommendations::default();

        let conference = Intent::new(IntentCategory::Event, Subcategory::Conference);
        let presentation = Intent::new(IntentCategory::Event, Subcategory::Presentation);
        let expected = vec![1, 7, 3, 4, 5];
        assert_eq!(ids(&generator.generate(&conference, &catalog, &none)), expected);
        assert_eq!(ids(&generator.generate(&presentation, &catalog, &none)), expected);
    }

    #[test]
    fn follow_up_lighting_skips_covered_kinds() {
        let generator = RecommendationGenerator::new();
        let catalog = Catalog::builtin();
        let intent = follow_up(IntentCategory::Lighting, Subcategory::GeneralLighting, 2);

        let after_mics = generator.generate(&intent, &catalog, &previous(&[(3, "Wireless Microphone")]));
        assert_eq!(ids(&after_mics), vec![18]);
        assert_eq!(after_mics[0].quantity, 2);
        assert!(after_mics.iter().all(|rec| !rec.item.name.to_lowercase().contains("microphone")));

        let after_uplights = generator.generate(&intent, &catalog, &previous(&[(18, "UP Lights")]));
        assert_eq!(ids(&after_uplights), vec![17]);
    }

    #[test]
    fn follow_up_audio_only_adds_missing_kinds() {
        let generator = RecommendationGenerator::new();
        let catalog = Catalog::builtin();
        let intent = follow_up(IntentCategory::Audio, Subcategory::WirelessMicrophone, 2);

        let fresh = generator.generate(&intent, &catalog, &previous(&[(1, "Projector - Standard")]));
        assert_eq!(ids(&fresh), vec![3, 5]);
        assert_eq!(fresh[0].quantity, 2);

        let covered = generator.generate(&intent, &catalog, &previous(&[(5, "Speaker")]));
        assert_eq!(ids(&covered), vec![3]);
    }

    #[test]
    fn exhausted_follow_up_falls_back_to_context_then_standard() {
        let generator = RecommendationGenerator::new();
        let catalog = Catalog::builtin();
        let previous = previous(&[(3, "Wireless Microphone"), (5, "Speaker")]);

        let mut wedding = follow_up(IntentCategory::Audio, Subcategory::AudioGeneral, 1);
        wedding.context = Some(EventContext::Wedding);
        let items = generator.generate(&wedding, &catalog, &previous);
        assert_eq!(ids(&items), vec![18]);
        assert_eq!(items[0].quantity, 4);

        let plain = follow_up(IntentCategory::Audio, Subcategory::AudioGeneral, 1);
        assert!(generator.generate(&plain, &catalog, &previous).is_empty());
    }

    #[test]
    fn follow_up_projector_brings_a_screen_unless_one_was_offered() {
        let generator = RecommendationGenerator::new();
        let catalog = Catalog::builtin();
        let intent = follow_up(IntentCategory::Video, Subcategory::Projector, 2);

        let items = generator.generate(&intent, &catalog, &previous(&[(3, "Wireless Microphone")]));
        assert_eq!(ids(&items), vec![1, 7]);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[1].quantity, 1);
        assert_eq!(items[1].notes, "Required projection surface for the projector");

        let with_screen = generator.generate(&intent, &catalog, &previous(&[(8, "LED Screen 75\"")]));
        assert_eq!(ids(&with_screen), vec![1]);
    }

    #[test]
    fn follow_up_screen_adds_only_a_screen() {
        let generator = RecommendationGenerator::new();
        let catalog = Catalog::builtin();
        let intent = follow_up(IntentCategory::Video, Subcategory::Screen, 2);

        let items = generator.generate(&intent, &catalog, &previous(&[(1, "Projector - Standard")]));
        assert_eq!(ids(&items), vec![7]);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].notes, "Additional screen for displaying presentations or videos");

        let covered = generator.generate(&intent, &catalog, &previous(&[(7, "LED Screen 55\"")]));
        assert!(covered.is_empty());
    }

    #[test]
    fn follow_up_power_defaults_to_two_strips() {
        let generator = RecommendationGenerator::new();
        let catalog = Catalog::builtin();
        let mut intent = Intent::new(IntentCategory::Electrical, Subcategory::PowerStrips)
            .with_context(EventContext::Event);
        intent.is_follow_up = true;

        let items = generator.generate(&intent, &catalog, &previous(&[(5, "Speaker")]));
        assert_eq!(ids(&items), vec![21]);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].notes, "Power strips for connecting multiple devices");

        // An extension cord already covers power, so the follow-up step adds
        // nothing and the plain power strip line is used.
        let after_cord =
            generator.generate(&intent, &catalog, &previous(&[(23, "Extension Cord - 25ft")]));
        assert_eq!(ids(&after_cord), vec![21]);
        assert_eq!(after_cord[0].quantity, 1);
        assert_ne!(after_cord[0].notes, items[0].notes);
    }

    #[test]
    fn conference_follow_up_falls_back_to_projection_bundle() {
        let generator = RecommendationGenerator::new();
        let catalog = Catalog::builtin();
        let mut intent = follow_up(IntentCategory::Audio, Subcategory::AudioGeneral, 1);
        intent.context = Some(EventContext::Conference);

        let audio_covered = previous(&[(3, "Wireless Microphone"), (5, "Speaker")]);
        let items = generator.generate(&intent, &catalog, &audio_covered);
        assert_eq!(ids(&items), vec![1, 7]);
        assert!(items.iter().all(|rec| rec.quantity == 1));

        let everything_covered =
            previous(&[(3, "Wireless Microphone"), (5, "Speaker"), (1, "Projector - Standard")]);
        assert!(generator.generate(&intent, &catalog, &everything_covered).is_empty());
    }

    #[test]
    fn projector_requests_include_a_screen() {
        let mut intent = Intent::new(IntentCategory::Video, Subcategory::Projector);
        intent.needs_screen = true;
        let items = RecommendationGenerator::new().generate(
            &intent,
            &Catalog::builtin(),
            &PreviousRecommendations::default(),
        );
        assert_eq!(ids(&items), vec![1, 7]);

        let mut hd = Intent::new(IntentCategory::Video, Subcategory::Projector);
        hd.detail = Some("hd".into());
        let items = RecommendationGenerator::new().generate(
            &hd,
            &Catalog::builtin(),
            &PreviousRecommendations::default(),
        );
        assert_eq!(ids(&items), vec![2]);
    }

    #[test]
    fn missing_catalog_kinds_are_skipped_and_unknown_is_empty() {
        let catalog = Catalog::new(vec![EquipmentItem::new(
            9,
            "Wireless Mic Kit",
            Decimal::new(80, 0),
            "Audio",
        )]);
        let generator = RecommendationGenerator::new();
        let none = PreviousRecommendations::default();

        let wedding = Intent::new(IntentCategory::Event, Subcategory::Wedding);
        assert_eq!(ids(&generator.generate(&wedding, &catalog, &none)), vec![9]);

        let unknown = Intent::unknown(Some(EventContext::Event));
        assert!(generator.generate(&unknown, &Catalog::builtin(), &none).is_empty());
    }
}
