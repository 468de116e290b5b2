pub mod article;
pub mod message;

pub use article::{Article, SentimentAnnotation, SentimentLabel};
pub use message::{Message, MessageIdGen, Sender};
