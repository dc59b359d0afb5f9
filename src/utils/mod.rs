pub mod error;
pub mod logger;
pub mod media;
pub mod validation;
