//! SQLite storage for the vocabulary deck.
//!
//! Handles schema initialization, item CRUD, schedule state persistence,
//! the review log used for daily limits, and the simulated current date.

use super::StateStore;
use crate::error::{Result, ReviewError, StoreError};
use crate::models::{Grade, LearningItem, ReviewOutcome, ScheduleState};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use tracing::{debug, info};

const STATE_COLUMNS: &str = "item_id, ease_factor, interval_days, repetitions, learning_step,
     is_graduated, last_reviewed_at, next_review_at, mastery_level";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened review database");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Creates tables for items, schedule state, review log and app state.
    /// Sets the current date to now if not already initialized.
    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                word TEXT NOT NULL UNIQUE,
                definition TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS schedule_state (
                item_id INTEGER PRIMARY KEY,
                ease_factor REAL NOT NULL,
                interval_days INTEGER NOT NULL DEFAULT 0,
                repetitions INTEGER NOT NULL DEFAULT 0,
                learning_step INTEGER NOT NULL DEFAULT 0,
                is_graduated INTEGER NOT NULL DEFAULT 0,
                last_reviewed_at TEXT,
                next_review_at TEXT NOT NULL,
                mastery_level INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS review_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL,
                grade TEXT NOT NULL,
                reviewed_at TEXT NOT NULL,
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_review_log_reviewed_at ON review_log(reviewed_at);

            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        conn.execute(
            "INSERT OR IGNORE INTO app_state (key, value) VALUES ('day_offset', '0')",
            [],
        )?;

        Ok(Self { conn })
    }

    /// Days the simulated calendar runs ahead of the wall clock.
    pub fn day_offset(&self) -> Result<i64> {
        let value: String = self.conn.query_row(
            "SELECT value FROM app_state WHERE key = 'day_offset'",
            [],
            |row| row.get(0),
        )?;
        value.parse::<i64>().map_err(|_| {
            ReviewError::PersistenceFailure(StoreError::InvalidValue {
                key: "day_offset".to_string(),
                value,
            })
        })
    }

    /// Simulated "now": the wall clock shifted by the day offset.
    pub fn current_date(&self) -> Result<DateTime<Utc>> {
        Ok(Utc::now() + Duration::days(self.day_offset()?))
    }

    /// Moves the simulated calendar forward by 24 hours. Returns the new offset.
    pub fn advance_day(&self) -> Result<i64> {
        let offset = self.day_offset()? + 1;
        self.conn.execute(
            "UPDATE app_state SET value = ?1 WHERE key = 'day_offset'",
            params![offset.to_string()],
        )?;
        info!(day_offset = offset, "Advanced simulated date");
        Ok(offset)
    }

    /// Adds an item and its fresh schedule state. Returns the item id.
    ///
    /// If an item with the same word exists it's left untouched and its id is
    /// returned.
    pub fn add_item(
        &self,
        word: &str,
        definition: &str,
        initial_ease_factor: f64,
        added_at: DateTime<Utc>,
    ) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT OR IGNORE INTO items (word, definition) VALUES (?1, ?2)",
            params![word, definition],
        )?;
        let item_id: i64 = tx.query_row(
            "SELECT id FROM items WHERE word = ?1",
            params![word],
            |row| row.get(0),
        )?;

        let state = ScheduleState::new(item_id, initial_ease_factor, added_at);
        tx.execute(
            &format!(
                "INSERT OR IGNORE INTO schedule_state ({STATE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
            ),
            state_params(&state),
        )?;

        tx.commit()?;
        debug!(item_id, word, "Item added");
        Ok(item_id)
    }

    pub fn get_item(&self, item_id: i64) -> Result<LearningItem> {
        self.conn
            .query_row(
                "SELECT id, word, definition FROM items WHERE id = ?1",
                params![item_id],
                item_from_row,
            )
            .optional()?
            .ok_or(ReviewError::UnknownItem(item_id))
    }

    pub fn all_items(&self) -> Result<Vec<LearningItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, word, definition FROM items ORDER BY id")?;
        let items = stmt
            .query_map([], item_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Inserts or overwrites an item together with its schedule state.
    pub fn upsert(&self, item: &LearningItem, state: &ScheduleState) -> Result<()> {
        self.upsert_all([(item, state)])?;
        Ok(())
    }

    /// Upserts many items in one transaction. Nothing is written unless every
    /// entry succeeds. Returns the number of entries written.
    pub fn upsert_all<'a, I>(&self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a LearningItem, &'a ScheduleState)>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        for (item, state) in entries {
            Self::write_entry(&tx, item, state)?;
            written += 1;
        }
        tx.commit()?;
        Ok(written)
    }

    fn write_entry(conn: &Connection, item: &LearningItem, state: &ScheduleState) -> Result<()> {
        if item.id != state.item_id {
            return Err(ReviewError::ItemMismatch {
                expected: item.id,
                found: state.item_id,
            });
        }

        conn.execute(
            "INSERT INTO items (id, word, definition) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET word = excluded.word, definition = excluded.definition",
            params![item.id, item.word, item.definition],
        )?;
        conn.execute(
            &format!(
                "INSERT INTO schedule_state ({STATE_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(item_id) DO UPDATE SET
                    ease_factor = excluded.ease_factor,
                    interval_days = excluded.interval_days,
                    repetitions = excluded.repetitions,
                    learning_step = excluded.learning_step,
                    is_graduated = excluded.is_graduated,
                    last_reviewed_at = excluded.last_reviewed_at,
                    next_review_at = excluded.next_review_at,
                    mastery_level = excluded.mastery_level"
            ),
            state_params(state),
        )?;
        Ok(())
    }

    /// Removes an item, its schedule state and its review log.
    pub fn remove_item(&self, item_id: i64) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM items WHERE id = ?1", params![item_id])?;
        if removed == 0 {
            return Err(ReviewError::UnknownItem(item_id));
        }
        Ok(())
    }

    fn update_state(conn: &Connection, state: &ScheduleState) -> Result<()> {
        let updated = conn.execute(
            "UPDATE schedule_state
             SET ease_factor = ?2, interval_days = ?3, repetitions = ?4, learning_step = ?5,
                 is_graduated = ?6, last_reviewed_at = ?7, next_review_at = ?8, mastery_level = ?9
             WHERE item_id = ?1",
            state_params(state),
        )?;
        if updated == 0 {
            return Err(ReviewError::UnknownItem(state.item_id));
        }
        Ok(())
    }

    fn insert_review(
        conn: &Connection,
        item_id: i64,
        grade: Grade,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        conn.execute(
            "INSERT INTO review_log (item_id, grade, reviewed_at) VALUES (?1, ?2, ?3)",
            params![item_id, grade.as_str(), reviewed_at],
        )?;
        Ok(())
    }
}

impl StateStore for SqliteStore {
    fn load_state(&self, item_id: i64) -> Result<ScheduleState> {
        self.conn
            .query_row(
                &format!("SELECT {STATE_COLUMNS} FROM schedule_state WHERE item_id = ?1"),
                params![item_id],
                state_from_row,
            )
            .optional()?
            .ok_or(ReviewError::UnknownItem(item_id))
    }

    fn save_state(&self, state: &ScheduleState) -> Result<()> {
        Self::update_state(&self.conn, state)
    }

    fn load_all_states(&self) -> Result<Vec<ScheduleState>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STATE_COLUMNS} FROM schedule_state ORDER BY item_id"
        ))?;
        let states = stmt
            .query_map([], state_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(states)
    }

    fn record_review(&self, item_id: i64, grade: Grade, reviewed_at: DateTime<Utc>) -> Result<()> {
        Self::insert_review(&self.conn, item_id, grade, reviewed_at)
    }

    fn reviews_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM review_log WHERE reviewed_at >= ?1 AND reviewed_at < ?2",
            params![start, end],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn commit_review(&self, outcome: &ReviewOutcome) -> Result<()> {
        let state = &outcome.state;
        let reviewed_at = state.last_reviewed_at.unwrap_or(state.next_review_at);

        let tx = self.conn.unchecked_transaction()?;
        Self::update_state(&tx, state)?;
        Self::insert_review(&tx, state.item_id, outcome.grade, reviewed_at)?;
        tx.commit()?;
        Ok(())
    }
}

type StateParams = (
    i64,
    f64,
    u32,
    u32,
    u32,
    bool,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
    u8,
);

fn state_params(state: &ScheduleState) -> StateParams {
    (
        state.item_id,
        state.ease_factor,
        state.interval_days,
        state.repetitions,
        state.learning_step,
        state.is_graduated,
        state.last_reviewed_at,
        state.next_review_at,
        state.mastery_level,
    )
}

fn state_from_row(row: &Row<'_>) -> rusqlite::Result<ScheduleState> {
    Ok(ScheduleState {
        item_id: row.get(0)?,
        ease_factor: row.get(1)?,
        interval_days: row.get(2)?,
        repetitions: row.get(3)?,
        learning_step: row.get(4)?,
        is_graduated: row.get(5)?,
        last_reviewed_at: row.get(6)?,
        next_review_at: row.get(7)?,
        mastery_level: row.get(8)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<LearningItem> {
    Ok(LearningItem {
        id: row.get(0)?,
        word: row.get(1)?,
        definition: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transition;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_add_item_creates_fresh_state() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.add_item("lucid", "clear", 2.5, t0()).unwrap();

        let state = store.load_state(id).unwrap();
        assert_eq!(state, ScheduleState::new(id, 2.5, t0()));

        let item = store.get_item(id).unwrap();
        assert_eq!(item.word, "lucid");
        assert_eq!(item.definition, "clear");
    }

    #[test]
    fn test_duplicate_word_returns_existing_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.add_item("lucid", "clear", 2.5, t0()).unwrap();
        let second = store.add_item("lucid", "other", 2.5, t0()).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.all_items().unwrap().len(), 1);
        assert_eq!(store.get_item(first).unwrap().definition, "clear");
    }

    #[test]
    fn test_unknown_item() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.load_state(99),
            Err(ReviewError::UnknownItem(99))
        ));
        assert!(matches!(
            store.save_state(&ScheduleState::new(99, 2.5, t0())),
            Err(ReviewError::UnknownItem(99))
        ));
        assert!(matches!(store.get_item(99), Err(ReviewError::UnknownItem(99))));
    }

    #[test]
    fn test_save_and_load_state() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.add_item("terse", "brief", 2.5, t0()).unwrap();

        let state = ScheduleState {
            ease_factor: 2.35,
            interval_days: 12,
            repetitions: 3,
            learning_step: 2,
            is_graduated: true,
            last_reviewed_at: Some(t0() + Duration::milliseconds(1500)),
            next_review_at: t0() + Duration::days(12),
            mastery_level: 57,
            ..ScheduleState::new(id, 2.5, t0())
        };
        store.save_state(&state).unwrap();

        assert_eq!(store.load_state(id).unwrap(), state);
        assert_eq!(store.load_all_states().unwrap(), vec![state]);
    }

    #[test]
    fn test_review_log_counts_by_range() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.add_item("terse", "brief", 2.5, t0()).unwrap();

        store.record_review(id, Grade::Good, t0()).unwrap();
        store
            .record_review(id, Grade::Again, t0() + Duration::hours(3))
            .unwrap();
        store
            .record_review(id, Grade::Easy, t0() + Duration::days(1))
            .unwrap();

        let count = store
            .reviews_between(t0(), t0() + Duration::days(1))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_advance_day() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.day_offset().unwrap(), 0);

        assert_eq!(store.advance_day().unwrap(), 1);
        assert_eq!(store.advance_day().unwrap(), 2);
        assert!(store.current_date().unwrap() > Utc::now() + Duration::days(1));
    }

    #[test]
    fn test_corrupt_day_offset_is_an_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .conn
            .execute(
                "UPDATE app_state SET value = 'tomorrow' WHERE key = 'day_offset'",
                [],
            )
            .unwrap();

        let err = store.day_offset().unwrap_err();
        assert!(matches!(
            err,
            ReviewError::PersistenceFailure(StoreError::InvalidValue { .. })
        ));
        assert!(store.advance_day().is_err());
    }

    #[test]
    fn test_upsert_all_is_atomic() {
        let store = SqliteStore::open_in_memory().unwrap();
        let good = LearningItem {
            id: 10,
            word: "terse".to_string(),
            definition: "brief".to_string(),
        };
        let good_state = ScheduleState::new(10, 2.5, t0());
        let bad = LearningItem {
            id: 11,
            word: "verbose".to_string(),
            definition: "wordy".to_string(),
        };
        let bad_state = ScheduleState::new(12, 2.5, t0());

        let err = store
            .upsert_all([(&good, &good_state), (&bad, &bad_state)])
            .unwrap_err();
        assert!(matches!(err, ReviewError::ItemMismatch { .. }));
        assert!(store.all_items().unwrap().is_empty());

        assert_eq!(store.upsert_all([(&good, &good_state)]).unwrap(), 1);
        assert_eq!(store.load_state(10).unwrap(), good_state);
    }

    #[test]
    fn test_commit_for_unknown_item_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let previous = ScheduleState::new(999, 2.5, t0());
        let outcome = ReviewOutcome {
            grade: Grade::Good,
            state: ScheduleState {
                last_reviewed_at: Some(t0()),
                learning_step: 1,
                ..previous.clone()
            },
            previous,
            transition: Transition::Advanced,
            graduated_this_review: false,
            lapsed_this_review: false,
        };

        let err = store.commit_review(&outcome).unwrap_err();
        assert!(matches!(err, ReviewError::UnknownItem(999)));
        assert_eq!(
            store
                .reviews_between(t0() - Duration::days(1), t0() + Duration::days(1))
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_remove_item_cascades() {
        let store = SqliteStore::open_in_memory().unwrap();
        let id = store.add_item("terse", "brief", 2.5, t0()).unwrap();
        store.record_review(id, Grade::Good, t0()).unwrap();

        store.remove_item(id).unwrap();
        assert!(store.load_all_states().unwrap().is_empty());
        assert_eq!(
            store
                .reviews_between(t0(), t0() + Duration::days(1))
                .unwrap(),
            0
        );
        assert!(matches!(
            store.remove_item(id),
            Err(ReviewError::UnknownItem(_))
        ));
    }

    #[test]
    fn test_open_on_disk_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.sqlite3");

        let id = {
            let store = SqliteStore::open(&path).unwrap();
            store.add_item("lucid", "clear", 2.5, t0()).unwrap()
        };

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_state(id).unwrap().item_id, id);
    }
}
