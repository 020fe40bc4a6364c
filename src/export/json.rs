//! JSON import/export module for card collections.
//! A deck file carries question/answer content only; scheduling state is not
//! portable, so imported cards start fresh in box 1, due immediately.

use crate::error::CardError;
use crate::models::{Card, NewCard};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};

/// On-disk shape of an exported card collection.
#[derive(Serialize, Deserialize)]
pub struct DeckFile {
    pub cards: Vec<NewCard>,
}

/// Exports the content of the given cards to a JSON file at the specified
/// path. Returns an error if file creation or writing fails.
pub fn export_json_to_path(cards: &[Card], path: &str) -> Result<(), CardError> {
    let deck = DeckFile {
        cards: cards
            .iter()
            .map(|card| NewCard {
                question: card.question.clone(),
                answer: card.answer.clone(),
            })
            .collect(),
    };

    let json_string = serde_json::to_string_pretty(&deck)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

/// Imports a card collection from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_json(filename: &str) -> Result<DeckFile, CardError> {
    let mut file = File::open(filename)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let deck: DeckFile = serde_json::from_str(&contents)?;

    println!("Imported {} cards from '{}'", deck.cards.len(), filename);
    Ok(deck)
}
