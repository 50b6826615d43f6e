pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;

pub use catalog::{Catalog, EquipmentKind};
pub use domain::equipment::{EquipmentId, EquipmentItem};
pub use domain::job::{Job, JobDraft, JobEquipmentLine, JobId};
pub use domain::order::{Order, OrderDraft, OrderFilter, OrderId, OrderStatus};
pub use domain::recommendation::{
    ConversationMessage, EventContext, HistoryItem, Intent, IntentCategory, MessageRole,
    Recommendation, Subcategory,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
