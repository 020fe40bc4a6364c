//! Flashcard is a question/answer pair owned by a single user, together with
//! its Leitner scheduling state. Only text is used in questions and answers.
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

#[derive(Clone, Debug)]
pub struct Card {
    pub id: i64,
    pub owner: String,
    pub question: String,
    pub answer: String,
    pub box_number: u8,
    pub next_review: SystemTime,
    pub created_at: SystemTime,
    pub last_reviewed: Option<SystemTime>,
}

/// Question/answer content before it has an id or any scheduling state.
/// Used by the add-card form and by deck files.
#[derive(Clone, Serialize, Deserialize)]
pub struct NewCard {
    pub question: String,
    pub answer: String,
}
