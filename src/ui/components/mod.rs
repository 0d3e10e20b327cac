//! Reusable UI components

mod error_banner;
mod input_bar;
mod message_list;
mod sidebar;

pub use error_banner::ErrorBanner;
pub use input_bar::{InputAction, InputBar};
pub use message_list::MessageList;
pub use sidebar::Sidebar;
