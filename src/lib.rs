pub mod config;
pub mod data;
pub mod dispatch;
pub mod error;
pub mod letter;
pub mod render;
pub mod smtp;
pub mod storage;
pub mod template;

pub use error::LetterMergeError;
pub type Result<T> = std::result::Result<T, LetterMergeError>;
