use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EquipmentId(pub i64);

impl std::fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rentable catalog entry. `rate` is the per-unit, per-day charge and the
/// only monetary field carried past ingest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEquipmentItem")]
pub struct EquipmentItem {
    pub id: EquipmentId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    pub category: String,
}

impl EquipmentItem {
    pub fn new(id: i64, name: &str, rate: Decimal, category: &str) -> Self {
        Self {
            id: EquipmentId(id),
            name: name.to_string(),
            rate,
            category: category.to_string(),
        }
    }

    pub fn name_lower(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Wire shape accepted from catalog sources. Older feeds use `equipment_id`
/// and `std_rate`, the client mock catalogs carry `price` next to `rate`.
#[derive(Debug, Deserialize)]
struct RawEquipmentItem {
    #[serde(alias = "equipment_id")]
    id: i64,
    name: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    rate: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    std_rate: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    price: Option<Decimal>,
    #[serde(default)]
    category: Option<String>,
}

impl From<RawEquipmentItem> for EquipmentItem {
    fn from(raw: RawEquipmentItem) -> Self {
        let rate = raw.rate.or(raw.std_rate).or(raw.price).unwrap_or_default();
        Self {
            id: EquipmentId(raw.id),
            name: raw.name,
            rate,
            category: raw
                .category
                .filter(|category| !category.trim().is_empty())
                .unwrap_or_else(|| "Other".to_string()),
        }
    }
}
