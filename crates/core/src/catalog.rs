//! Equipment catalog and keyword lookup.
//!
//! Lookups are by [`EquipmentKind`]: each kind has a name predicate that is
//! tried against every entry in catalog order, then a plain substring search
//! on the kind's keyword as a fallback.

use rust_decimal::Decimal;

use crate::domain::equipment::{EquipmentId, EquipmentItem};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EquipmentKind {
    WirelessMicrophone,
    TabletopMicrophone,
    Speaker,
    Projector,
    Screen,
    Uplight,
    StageWash,
    Laptop,
    AudioPackage,
    DjBooth,
    PowerStrip,
    ExtensionCord,
}

impl EquipmentKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::WirelessMicrophone => "wireless microphone",
            Self::TabletopMicrophone => "tabletop",
            Self::Speaker => "speaker",
            Self::Projector => "projector",
            Self::Screen => "screen",
            Self::Uplight => "uplights",
            Self::StageWash => "stage wash",
            Self::Laptop => "laptop",
            Self::AudioPackage => "audio package",
            Self::DjBooth => "dj",
            Self::PowerStrip => "power strip",
            Self::ExtensionCord => "extension cord",
        }
    }

    /// Whether a lower-cased item name denotes this kind.
    pub fn matches_name(&self, name_lower: &str) -> bool {
        match self {
            Self::WirelessMicrophone => name_lower.contains("wireless") && name_lower.contains("mic"),
            Self::TabletopMicrophone => name_lower.contains("tabletop"),
            Self::Speaker => name_lower.contains("speaker"),
            Self::Projector => name_lower.contains("projector"),
            Self::Screen => name_lower.contains("screen"),
            Self::Uplight => name_lower.contains("up light") || name_lower.contains("uplight"),
            Self::StageWash => name_lower.contains("stage wash"),
            Self::Laptop => name_lower.contains("laptop"),
            Self::AudioPackage => name_lower.contains("audio package"),
            Self::DjBooth => name_lower.contains("dj"),
            Self::PowerStrip => name_lower.contains("power strip"),
            Self::ExtensionCord => name_lower.contains("extension cord"),
        }
    }

    pub fn is_lighting(&self) -> bool {
        matches!(self, Self::Uplight | Self::StageWash)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<EquipmentItem>,
}

impl Catalog {
    pub fn new(items: Vec<EquipmentItem>) -> Self {
        Self { items }
    }

    /// The catalog used when no store-backed catalog is available.
    pub fn builtin() -> Self {
        Self::new(builtin_items())
    }

    pub fn items(&self) -> &[EquipmentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: EquipmentId) -> Option<&EquipmentItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&EquipmentItem> {
        let wanted = name.trim().to_lowercase();
        self.items.iter().find(|item| item.name_lower() == wanted)
    }

    pub fn find_by_kind(&self, kind: EquipmentKind) -> Option<&EquipmentItem> {
        self.items
            .iter()
            .find(|item| kind.matches_name(&item.name_lower()))
            .or_else(|| self.search(kind.keyword()))
    }

    /// First item whose name contains `term`, case-insensitively.
    pub fn search(&self, term: &str) -> Option<&EquipmentItem> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return None;
        }
        self.items.iter().find(|item| item.name_lower().contains(&term))
    }
}

fn builtin_items() -> Vec<EquipmentItem> {
    let rate = |dollars: i64| Decimal::new(dollars, 0);
    vec![
        EquipmentItem::new(1, "Projector - Standard", rate(200), "Video"),
        EquipmentItem::new(2, "Projector - HD", rate(350), "Video"),
        EquipmentItem::new(3, "Audio - Wireless Microphone", rate(75), "Audio"),
        EquipmentItem::new(4, "Audio - Tabletop Microphone", rate(65), "Audio"),
        EquipmentItem::new(5, "Audio - Powered Speaker Package", rate(180), "Audio"),
        EquipmentItem::new(6, "Audio - Line Array Speaker System", rate(450), "Audio"),
        EquipmentItem::new(7, "LED Screen 55\"", rate(250), "Video"),
        EquipmentItem::new(8, "LED Screen 75\"", rate(450), "Video"),
        EquipmentItem::new(9, "Video - Laptop", rate(125), "Computer"),
        EquipmentItem::new(10, "Video - HDMI Cable (6ft)", rate(15), "Accessories"),
        EquipmentItem::new(11, "Video - Switcher", rate(175), "Video"),
        EquipmentItem::new(12, "Flipchart with Markers", rate(45), "Presentation"),
        EquipmentItem::new(13, "Wi-Fi Dedicated Connection", rate(150), "Network"),
        EquipmentItem::new(14, "Podium with Microphone", rate(125), "Furniture"),
        EquipmentItem::new(15, "Basic Presentation Package", rate(350), "Bundle"),
        EquipmentItem::new(16, "Conference Audio Package", rate(275), "Bundle"),
        EquipmentItem::new(17, "Lighting - Basic Stage Wash", rate(180), "Lighting"),
        EquipmentItem::new(18, "Lighting - UP Lights", rate(35), "Lighting"),
        EquipmentItem::new(19, "10'6\"x18'8\" Screen Kit - Front Projection", rate(350), "Video"),
        EquipmentItem::new(20, "DJ Booth Setup", rate(275), "Entertainment"),
        EquipmentItem::new(21, "Power Strip - 6 Outlet", rate(15), "Electrical"),
        EquipmentItem::new(22, "Power Strip - 12 Outlet", rate(25), "Electrical"),
        EquipmentItem::new(23, "Extension Cord - 25ft", rate(12), "Electrical"),
        EquipmentItem::new(24, "Extension Cord - 50ft", rate(18), "Electrical"),
    ]
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Catalog, EquipmentKind};
    use crate::domain::equipment::{EquipmentId, EquipmentItem};

    #[test]
    fn builtin_catalog_resolves_every_kind() {
        let catalog = Catalog::builtin();
        let kinds = [
            (EquipmentKind::WirelessMicrophone, 3),
            (EquipmentKind::TabletopMicrophone, 4),
            (EquipmentKind::Speaker, 5),
            (EquipmentKind::Projector, 1),
            (EquipmentKind::Screen, 7),
            (EquipmentKind::Uplight, 18),
            (EquipmentKind::StageWash, 17),
            (EquipmentKind::Laptop, 9),
            (EquipmentKind::AudioPackage, 16),
            (EquipmentKind::DjBooth, 20),
            (EquipmentKind::PowerStrip, 21),
            (EquipmentKind::ExtensionCord, 23),
        ];

        for (kind, expected) in kinds {
            let found = catalog.find_by_kind(kind).map(|item| item.id);
            assert_eq!(found, Some(EquipmentId(expected)), "kind {kind:?}");
        }
    }

    #[test]
    fn podium_microphone_is_not_a_wireless_mic() {
        let catalog = Catalog::new(vec![
            EquipmentItem::new(1, "Podium with Microphone", Decimal::new(125, 0), "Furniture"),
            EquipmentItem::new(2, "Wireless Mic Kit", Decimal::new(80, 0), "Audio"),
        ]);

        let found = catalog.find_by_kind(EquipmentKind::WirelessMicrophone).map(|item| item.id);
        assert_eq!(found, Some(EquipmentId(2)));
    }

    #[test]
    fn falls_back_to_keyword_search_and_misses_cleanly() {
        let catalog = Catalog::new(vec![EquipmentItem::new(
            1,
            "Uplights (set of 4)",
            Decimal::new(120, 0),
            "Lighting",
        )]);

        assert!(catalog.find_by_kind(EquipmentKind::Uplight).is_some());
        assert!(catalog.find_by_kind(EquipmentKind::Projector).is_none());
        assert!(catalog.search("  ").is_none());
    }

    #[test]
    fn finds_by_exact_name_ignoring_case() {
        let catalog = Catalog::builtin();
        let found = catalog.find_by_name("dj booth setup").map(|item| item.id);
        assert_eq!(found, Some(EquipmentId(20)));
    }
}
