pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::CardError;
pub use models::{Card, NewCard, ReviewSession, Schedule};
