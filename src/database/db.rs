//! Database operations for the flashcard application
//!
//! Handles SQLite database initialization, per-owner card CRUD, the due-card
//! query, and the simulated current date that drives Leitner scheduling.

use crate::error::CardError;
use crate::models::leitner::{self, Schedule};
use crate::models::{Card, NewCard};
use rusqlite::{Connection, params};
use std::time::{Duration, SystemTime};

/// Initializes the SQLite database with required tables
///
/// Creates tables for cards and app state, and sets the current date to now
/// if not already initialized.
pub fn init_database() -> Result<Connection, CardError> {
    let conn = Connection::open("cards.sqlite3")?;
    create_tables(&conn)?;
    Ok(conn)
}

/// Creates tables and seeds the simulated clock.
///
/// Split out of [`init_database`] so tests can run against an in-memory
/// connection.
pub fn create_tables(conn: &Connection) -> Result<(), CardError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner TEXT NOT NULL,
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            box INTEGER NOT NULL,
            next_review INTEGER NOT NULL,
            created_at INTEGER NOT NULL,
            last_reviewed INTEGER
        )",
        (),
    )?;

    // Create app_state table for storing current date
    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        (),
    )?;

    // Initialize current_date if not exists
    let current_timestamp = to_unix(SystemTime::now())?;
    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![current_timestamp.to_string()],
    )?;

    Ok(())
}

/// Converts a timestamp to unix seconds for storage.
fn to_unix(time: SystemTime) -> Result<i64, CardError> {
    let secs = time
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_err(|_| CardError::InvalidTimestamp)?
        .as_secs();
    i64::try_from(secs).map_err(|_| CardError::InvalidTimestamp)
}

/// Converts stored unix seconds back to a timestamp, rejecting values the
/// store should never contain.
fn from_unix(secs: i64) -> Result<SystemTime, CardError> {
    let secs = u64::try_from(secs).map_err(|_| CardError::InvalidTimestamp)?;
    Ok(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
}

/// Retrieves the current simulated date from the database
pub fn get_current_date(conn: &Connection) -> Result<SystemTime, CardError> {
    let timestamp: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = 'current_date'",
        [],
        |row| row.get(0),
    )?;

    let secs = timestamp
        .parse::<i64>()
        .map_err(|_| CardError::InvalidTimestamp)?;
    from_unix(secs)
}

/// Overwrites the simulated current date
pub fn set_current_date(conn: &Connection, date: SystemTime) -> Result<(), CardError> {
    let timestamp = to_unix(date)?;
    conn.execute(
        "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
        params![timestamp.to_string()],
    )?;
    Ok(())
}

/// Advances the current date by 24 hours (for exercising spaced repetition)
pub fn advance_day(conn: &Connection) -> Result<(), CardError> {
    let current = get_current_date(conn)?;
    set_current_date(conn, current + Duration::from_secs(24 * 60 * 60))
}

/// Creates a card for an owner and initializes its Leitner state
///
/// New cards start in box 1 and are due immediately. Returns the card id.
pub fn add_card(conn: &Connection, owner: &str, new_card: &NewCard) -> Result<i64, CardError> {
    if new_card.question.trim().is_empty() {
        return Err(CardError::EmptyField("question"));
    }
    if new_card.answer.trim().is_empty() {
        return Err(CardError::EmptyField("answer"));
    }

    let now = get_current_date(conn)?;
    let schedule = leitner::initial_schedule(now);

    conn.execute(
        "INSERT INTO cards (owner, question, answer, box, next_review, created_at, last_reviewed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)",
        params![
            owner,
            new_card.question,
            new_card.answer,
            i64::from(schedule.box_number),
            to_unix(schedule.next_review)?,
            to_unix(now)?,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

type RawCard = (i64, String, String, String, i64, i64, i64, Option<i64>);

/// Validates a raw row at the store boundary and builds the typed record.
fn card_from_raw(raw: RawCard) -> Result<Card, CardError> {
    let (id, owner, question, answer, box_number, next_review, created_at, last_reviewed) = raw;

    let box_number = u8::try_from(box_number)
        .ok()
        .filter(|b| (leitner::FIRST_BOX..=leitner::LAST_BOX).contains(b))
        .ok_or(CardError::BoxOutOfRange(box_number))?;

    Ok(Card {
        id,
        owner,
        question,
        answer,
        box_number,
        next_review: from_unix(next_review)?,
        created_at: from_unix(created_at)?,
        last_reviewed: last_reviewed.map(from_unix).transpose()?,
    })
}

fn query_cards(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Card>, CardError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<RawCard>>>()?;

    rows.into_iter().map(card_from_raw).collect()
}

const CARD_COLUMNS: &str = "id, owner, question, answer, box, next_review, created_at, last_reviewed";

/// Retrieves all cards belonging to an owner, oldest first
pub fn all_cards(conn: &Connection, owner: &str) -> Result<Vec<Card>, CardError> {
    query_cards(
        conn,
        &format!("SELECT {CARD_COLUMNS} FROM cards WHERE owner = ?1 ORDER BY created_at ASC, id ASC"),
        params![owner],
    )
}

/// Retrieves the cards due for review for an owner
///
/// Returns cards where next_review <= current date, ordered ascending by box
/// (least-mastered first); ties broken by oldest next_review, then id.
pub fn due_cards(conn: &Connection, owner: &str) -> Result<Vec<Card>, CardError> {
    let now = to_unix(get_current_date(conn)?)?;
    query_cards(
        conn,
        &format!(
            "SELECT {CARD_COLUMNS} FROM cards
             WHERE owner = ?1 AND next_review <= ?2
             ORDER BY box ASC, next_review ASC, id ASC"
        ),
        params![owner, now],
    )
}

/// Counts the cards currently due for an owner
pub fn due_count(conn: &Connection, owner: &str) -> Result<usize, CardError> {
    let now = to_unix(get_current_date(conn)?)?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM cards WHERE owner = ?1 AND next_review <= ?2",
        params![owner, now],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

/// Writes a card's new scheduling state after a review
///
/// The update is scoped to the owner; touching another owner's card (or a
/// deleted one) fails with [`CardError::CardNotFound`].
pub fn record_review(
    conn: &Connection,
    card_id: i64,
    owner: &str,
    schedule: &Schedule,
    reviewed_at: SystemTime,
) -> Result<(), CardError> {
    let updated = conn.execute(
        "UPDATE cards SET box = ?1, next_review = ?2, last_reviewed = ?3
         WHERE id = ?4 AND owner = ?5",
        params![
            i64::from(schedule.box_number),
            to_unix(schedule.next_review)?,
            to_unix(reviewed_at)?,
            card_id,
            owner,
        ],
    )?;

    if updated == 0 {
        return Err(CardError::CardNotFound(card_id));
    }
    Ok(())
}

/// Deletes a card outright, scoped to the owner
pub fn delete_card(conn: &Connection, card_id: i64, owner: &str) -> Result<(), CardError> {
    let deleted = conn.execute(
        "DELETE FROM cards WHERE id = ?1 AND owner = ?2",
        params![card_id, owner],
    )?;

    if deleted == 0 {
        return Err(CardError::CardNotFound(card_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn new_card(question: &str, answer: &str) -> NewCard {
        NewCard {
            question: question.to_string(),
            answer: answer.to_string(),
        }
    }

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn test_new_card_is_due_immediately() {
        let conn = test_conn();
        let now = get_current_date(&conn).unwrap();

        let id = add_card(&conn, "alice", &new_card("q", "a")).unwrap();

        let due = due_cards(&conn, "alice").unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, id);
        assert_eq!(due[0].box_number, 1);
        assert_eq!(due[0].next_review, now);
        assert_eq!(due[0].created_at, now);
        assert!(due[0].last_reviewed.is_none());
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let conn = test_conn();
        assert!(matches!(
            add_card(&conn, "alice", &new_card("  ", "a")),
            Err(CardError::EmptyField("question"))
        ));
        assert!(matches!(
            add_card(&conn, "alice", &new_card("q", "")),
            Err(CardError::EmptyField("answer"))
        ));
    }

    #[test]
    fn test_due_filter_includes_past_and_present_only() {
        let conn = test_conn();
        let now = get_current_date(&conn).unwrap();

        let yesterday = add_card(&conn, "alice", &new_card("q1", "a1")).unwrap();
        let today = add_card(&conn, "alice", &new_card("q2", "a2")).unwrap();
        let tomorrow = add_card(&conn, "alice", &new_card("q3", "a3")).unwrap();

        // Spread next_review around the current date
        conn.execute(
            "UPDATE cards SET next_review = ?1 WHERE id = ?2",
            params![to_unix(now - DAY).unwrap(), yesterday],
        )
        .unwrap();
        conn.execute(
            "UPDATE cards SET next_review = ?1 WHERE id = ?2",
            params![to_unix(now + DAY).unwrap(), tomorrow],
        )
        .unwrap();

        let due = due_cards(&conn, "alice").unwrap();
        let ids: Vec<i64> = due.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![yesterday, today]);
        assert_eq!(due_count(&conn, "alice").unwrap(), 2);
    }

    #[test]
    fn test_due_cards_ordered_by_box_then_next_review() {
        let conn = test_conn();
        let now = get_current_date(&conn).unwrap();

        let a = add_card(&conn, "alice", &new_card("q1", "a1")).unwrap();
        let b = add_card(&conn, "alice", &new_card("q2", "a2")).unwrap();
        let c = add_card(&conn, "alice", &new_card("q3", "a3")).unwrap();

        // c sits in a higher box, a and b share box 1 with different ages
        conn.execute(
            "UPDATE cards SET box = 3, next_review = ?1 WHERE id = ?2",
            params![to_unix(now - DAY).unwrap(), c],
        )
        .unwrap();
        conn.execute(
            "UPDATE cards SET next_review = ?1 WHERE id = ?2",
            params![to_unix(now - DAY * 2).unwrap(), b],
        )
        .unwrap();

        let due = due_cards(&conn, "alice").unwrap();
        let ids: Vec<i64> = due.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b, a, c]);
    }

    #[test]
    fn test_record_review_updates_scheduling_state() {
        let conn = test_conn();
        let now = get_current_date(&conn).unwrap();
        let id = add_card(&conn, "alice", &new_card("q", "a")).unwrap();

        // Box 3 answered correctly: promoted to box 4, due in 8 days
        conn.execute("UPDATE cards SET box = 3 WHERE id = ?1", params![id])
            .unwrap();
        let schedule = leitner::next_schedule(3, true, now).unwrap();
        record_review(&conn, id, "alice", &schedule, now).unwrap();

        let cards = all_cards(&conn, "alice").unwrap();
        assert_eq!(cards[0].box_number, 4);
        assert_eq!(cards[0].next_review, now + DAY * 8);
        assert_eq!(cards[0].last_reviewed, Some(now));
    }

    #[test]
    fn test_wrong_answer_resets_card() {
        let conn = test_conn();
        let now = get_current_date(&conn).unwrap();
        let id = add_card(&conn, "alice", &new_card("q", "a")).unwrap();

        conn.execute("UPDATE cards SET box = 4 WHERE id = ?1", params![id])
            .unwrap();
        let schedule = leitner::next_schedule(4, false, now).unwrap();
        record_review(&conn, id, "alice", &schedule, now).unwrap();

        let cards = all_cards(&conn, "alice").unwrap();
        assert_eq!(cards[0].box_number, 1);
        assert_eq!(cards[0].next_review, now + DAY);
    }

    #[test]
    fn test_cross_owner_access_fails() {
        let conn = test_conn();
        let now = get_current_date(&conn).unwrap();
        let id = add_card(&conn, "alice", &new_card("q", "a")).unwrap();

        let schedule = leitner::next_schedule(1, true, now).unwrap();
        assert!(matches!(
            record_review(&conn, id, "mallory", &schedule, now),
            Err(CardError::CardNotFound(_))
        ));
        assert!(matches!(
            delete_card(&conn, id, "mallory"),
            Err(CardError::CardNotFound(_))
        ));

        // Alice's card is untouched
        let cards = all_cards(&conn, "alice").unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].box_number, 1);

        // Mallory sees nothing of it either
        assert!(all_cards(&conn, "mallory").unwrap().is_empty());
        assert_eq!(due_count(&conn, "mallory").unwrap(), 0);
    }

    #[test]
    fn test_delete_card_removes_it() {
        let conn = test_conn();
        let id = add_card(&conn, "alice", &new_card("q", "a")).unwrap();

        delete_card(&conn, id, "alice").unwrap();
        assert!(all_cards(&conn, "alice").unwrap().is_empty());
        assert!(matches!(
            delete_card(&conn, id, "alice"),
            Err(CardError::CardNotFound(_))
        ));
    }

    #[test]
    fn test_advance_day_moves_clock_forward() {
        let conn = test_conn();
        let before = get_current_date(&conn).unwrap();
        advance_day(&conn).unwrap();
        assert_eq!(get_current_date(&conn).unwrap(), before + DAY);
    }

    #[test]
    fn test_corrupt_box_is_rejected_on_read() {
        let conn = test_conn();
        let id = add_card(&conn, "alice", &new_card("q", "a")).unwrap();
        conn.execute("UPDATE cards SET box = 9 WHERE id = ?1", params![id])
            .unwrap();

        assert!(matches!(
            all_cards(&conn, "alice"),
            Err(CardError::BoxOutOfRange(9))
        ));
    }
}
