pub mod conversation;
pub mod news;

pub use conversation::{ConversationController, UiEffect};
pub use news::NewsFeedController;
