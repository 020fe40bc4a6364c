//! Review session over the cards currently due.
//! A single pass: each due card is shown once, judged correct or wrong, and
//! its new Leitner state is written back before moving on. A failed card is
//! not re-asked in the same sitting since box 1 makes it due tomorrow.

use super::{Card, leitner};
use crate::database::db;
use crate::error::CardError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Walks the due cards of one owner in store order (ascending box).
pub struct ReviewSession {
    pub owner: String,
    pub cards: Vec<Card>,
    pub current_index: usize,
    pub show_answer: bool,
    pub conn: Arc<Mutex<Connection>>,
    pub reviewed_count: usize,
}

impl ReviewSession {
    /// Creates a session from the cards that are due for review.
    pub fn new_from_due_cards(
        owner: String,
        cards: Vec<Card>,
        conn: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            owner,
            cards,
            current_index: 0,
            show_answer: false,
            conn,
            reviewed_count: 0,
        }
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.current_index)
    }

    pub fn reveal_answer(&mut self) {
        self.show_answer = true;
    }

    /// Judges the current card and advances to the next one.
    ///
    /// Asks the scheduler for the card's next box and review date, persists
    /// the result together with `last_reviewed = now`, then updates the
    /// in-memory copy. Nothing is written if the scheduler rejects the
    /// card's stored box.
    pub fn answer_current(&mut self, correct: bool) -> Result<(), CardError> {
        let Some(card) = self.cards.get_mut(self.current_index) else {
            return Ok(());
        };

        let conn = self.conn.lock().unwrap();
        let now = db::get_current_date(&conn)?;

        let schedule = leitner::next_schedule(card.box_number, correct, now)?;
        db::record_review(&conn, card.id, &self.owner, &schedule, now)?;

        card.box_number = schedule.box_number;
        card.next_review = schedule.next_review;
        card.last_reviewed = Some(now);

        self.current_index += 1;
        self.show_answer = false;
        self.reviewed_count += 1;
        Ok(())
    }

    /// Deletes the current card outright; the next due card slides into its
    /// place.
    pub fn delete_current(&mut self) -> Result<(), CardError> {
        let Some(card) = self.cards.get(self.current_index) else {
            return Ok(());
        };

        let conn = self.conn.lock().unwrap();
        db::delete_card(&conn, card.id, &self.owner)?;
        drop(conn);

        self.cards.remove(self.current_index);
        self.show_answer = false;
        Ok(())
    }

    pub fn total_count(&self) -> usize {
        self.cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.cards.len().saturating_sub(self.current_index)
    }

    pub fn is_completed(&self) -> bool {
        self.current_index >= self.cards.len()
    }

    pub fn progress_message(&self) -> String {
        format!(
            "Card {} of {}",
            (self.current_index + 1).min(self.total_count()),
            self.total_count()
        )
    }
}
