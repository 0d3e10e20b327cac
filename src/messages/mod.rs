pub mod history;
pub mod types;

pub use history::{ConversationHistory, HistorySnapshot};
pub use types::{Message, MessageMetadata, Role};
