pub mod errors;

pub use errors::{ChatError, SocialError};

pub type ChatResult<T> = Result<T, ChatError>;
pub type SocialResult<T> = Result<T, SocialError>;
