//! Search term CRUD operations and save observers.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

use super::migrations::run_migrations;

/// Database file name inside the data directory.
const DB_FILE: &str = "moviesearch.db";

/// Runs of whitespace collapsed by `normalize_term`.
#[allow(clippy::expect_used)]
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("failed to compile whitespace regex"));

/// A stored search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    /// Row ID.
    pub id: i64,
    /// Normalized term text.
    pub term: String,
    /// Time of the most recent save (RFC 3339, UTC).
    pub last_search: String,
}

/// Hook invoked after a search term has been committed.
///
/// `created` is `true` only when the save inserted a new row.
pub trait SearchTermObserver: Send + Sync {
    /// Called once per successful save.
    fn search_term_saved(&self, term: &SearchTerm, created: bool);
}

/// Lowercases a term, collapses whitespace runs to one space and trims it.
#[must_use]
pub fn normalize_term(term: &str) -> String {
    WHITESPACE_RE.replace_all(term.trim(), " ").to_lowercase()
}

/// Picks the data directory from `XDG_DATA_HOME` and `HOME`.
///
/// A relative `XDG_DATA_HOME` is ignored, as the XDG base directory rules require.
fn default_data_dir(xdg_data_home: Option<OsString>, home: Option<OsString>) -> Result<PathBuf> {
    if let Some(xdg) = xdg_data_home.map(PathBuf::from).filter(|p| p.is_absolute()) {
        return Ok(xdg.join("moviesearch"));
    }
    let Some(home) = home.filter(|h| !h.is_empty()) else {
        bail!("cannot locate data directory: neither XDG_DATA_HOME nor HOME is set");
    };
    Ok(Path::new(&home).join(".local").join("share").join("moviesearch"))
}

/// Search term table plus the observers notified on save.
pub struct SearchTermStore {
    conn: Connection,
    observers: Vec<Box<dyn SearchTermObserver>>,
}

impl fmt::Debug for SearchTermStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchTermStore")
            .field("conn", &self.conn)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl SearchTermStore {
    /// Opens the store in `dir`, or in the default data directory.
    ///
    /// The default is `$XDG_DATA_HOME/moviesearch`, falling back to
    /// `~/.local/share/moviesearch`. Missing directories are created and
    /// migrations run before the store is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be determined, or the
    /// database cannot be created, opened or migrated.
    pub fn open(dir: Option<&PathBuf>) -> Result<Self> {
        let db_path = match dir {
            Some(d) => d.join(DB_FILE),
            None => default_data_dir(
                std::env::var_os("XDG_DATA_HOME"),
                std::env::var_os("HOME"),
            )?
            .join(DB_FILE),
        };

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        tracing::debug!(path = %db_path.display(), "Search term database opened");

        Self::from_connection(conn)
    }

    /// Wraps an existing connection, running migrations on it.
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        run_migrations(&conn).context("database migration failed")?;
        Ok(Self {
            conn,
            observers: Vec::new(),
        })
    }

    /// Registers an observer for subsequent saves.
    pub fn register(&mut self, observer: impl SearchTermObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Saves a search term, inserting it or refreshing its `last_search`.
    ///
    /// The row is upserted, so a term saved concurrently by another process
    /// is reported as `created` to exactly one of the savers. Observers run
    /// after the transaction commits.
    ///
    /// # Errors
    ///
    /// Returns an error if the term is empty after normalization or the
    /// database operation fails.
    pub fn save(&self, term: &str) -> Result<SearchTerm> {
        let term = normalize_term(term);
        if term.is_empty() {
            bail!("search term is empty");
        }
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        // IMMEDIATE takes the write lock up front, so concurrent savers wait
        // on the busy timeout instead of failing the lock upgrade.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .context("failed to begin transaction")?;

        let inserted = tx
            .execute(
                "INSERT INTO search_terms (term, last_search) VALUES (?1, ?2)
                 ON CONFLICT(term) DO NOTHING",
                rusqlite::params![term, now],
            )
            .with_context(|| format!("failed to insert search term '{term}'"))?;

        let (id, created) = if inserted > 0 {
            (tx.last_insert_rowid(), true)
        } else {
            let id: i64 = tx
                .query_row(
                    "UPDATE search_terms SET last_search = ?1 WHERE term = ?2 RETURNING id",
                    rusqlite::params![now, term],
                    |row| row.get(0),
                )
                .with_context(|| format!("failed to update search term '{term}'"))?;
            (id, false)
        };

        tx.commit().context("failed to commit search term")?;

        let record = SearchTerm {
            id,
            term,
            last_search: now,
        };
        tracing::info!(term = %record.term, created, "Search term saved");

        for observer in &self.observers {
            observer.search_term_saved(&record, created);
        }

        Ok(record)
    }

    /// Looks up a term (normalized before matching).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get(&self, term: &str) -> Result<Option<SearchTerm>> {
        let term = normalize_term(term);
        self.conn
            .query_row(
                "SELECT id, term, last_search FROM search_terms WHERE term = ?1",
                [&term],
                |row| {
                    Ok(SearchTerm {
                        id: row.get(0)?,
                        term: row.get(1)?,
                        last_search: row.get(2)?,
                    })
                },
            )
            .optional()
            .with_context(|| format!("failed to query search term '{term}'"))
    }

    /// Loads all terms, most recently searched first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list(&self) -> Result<Vec<SearchTerm>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, term, last_search FROM search_terms ORDER BY last_search DESC, id DESC",
            )
            .context("failed to prepare search_terms query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(SearchTerm {
                    id: row.get(0)?,
                    term: row.get(1)?,
                    last_search: row.get(2)?,
                })
            })
            .context("failed to query search_terms")?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to read search_terms rows")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::sync::{Arc, Barrier, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<(String, bool)>>>);

    impl SearchTermObserver for Recorder {
        fn search_term_saved(&self, term: &SearchTerm, created: bool) {
            self.0.lock().unwrap().push((term.term.clone(), created));
        }
    }

    fn setup_store() -> (SearchTermStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SearchTermStore::open(Some(&dir.path().to_path_buf())).unwrap();
        (store, dir)
    }

    #[test]
    fn test_normalize_term() {
        // Arrange & Act & Assert
        assert_eq!(normalize_term("  The   Matrix\t"), "the matrix");
        assert_eq!(normalize_term("Star\nWars"), "star wars");
        assert_eq!(normalize_term("   "), "");
    }

    #[test]
    fn test_save_inserts_then_updates() {
        // Arrange
        let (store, _dir) = setup_store();

        // Act
        let first = store.save("Matrix").unwrap();
        let second = store.save("  matrix ").unwrap();

        // Assert
        assert_eq!(first.id, second.id);
        assert_eq!(second.term, "matrix");
        assert!(second.last_search >= first.last_search);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_observer_sees_created_only_once() {
        // Arrange
        let (mut store, _dir) = setup_store();
        let recorder = Recorder::default();
        store.register(recorder.clone());

        // Act
        store.save("Alien").unwrap();
        store.save("alien").unwrap();
        store.save("Aliens").unwrap();

        // Assert
        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                (String::from("alien"), true),
                (String::from("alien"), false),
                (String::from("aliens"), true),
            ]
        );
    }

    #[test]
    fn test_empty_term_is_rejected_without_notifying() {
        // Arrange
        let (mut store, _dir) = setup_store();
        let recorder = Recorder::default();
        store.register(recorder.clone());

        // Act
        let result = store.save(" \t ");

        // Assert
        assert!(result.unwrap_err().to_string().contains("empty"));
        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_get_normalizes_lookup() {
        // Arrange
        let (store, _dir) = setup_store();
        store.save("Blade Runner").unwrap();

        // Act
        let found = store.get("BLADE   runner").unwrap();
        let missing = store.get("blade").unwrap();

        // Assert
        assert_eq!(found.unwrap().term, "blade runner");
        assert!(missing.is_none());
    }

    #[test]
    fn test_list_most_recent_first() {
        // Arrange
        let store = SearchTermStore::from_connection(Connection::open_in_memory().unwrap()).unwrap();
        store.save("first").unwrap();
        store.save("second").unwrap();
        store
            .conn
            .execute(
                "UPDATE search_terms SET last_search = '2020-01-01T00:00:00.000Z' WHERE term = 'second'",
                [],
            )
            .unwrap();

        // Act
        let terms = store.list().unwrap();

        // Assert
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].term, "first");
        assert_eq!(terms[1].term, "second");
    }

    #[test]
    fn test_open_creates_nested_dir_and_migrates() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        // Act
        let store = SearchTermStore::open(Some(&nested)).unwrap();

        // Assert
        let version: u32 = store
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert!(version > 0);
        assert!(nested.join(DB_FILE).exists());
    }

    #[test]
    fn test_default_data_dir_prefers_xdg() {
        // Arrange & Act
        let dir = default_data_dir(
            Some(OsString::from("/xdg/data")),
            Some(OsString::from("/home/user")),
        )
        .unwrap();

        // Assert
        assert_eq!(dir, PathBuf::from("/xdg/data/moviesearch"));
    }

    #[test]
    fn test_default_data_dir_falls_back_to_home() {
        // Arrange & Act
        let unset = default_data_dir(None, Some(OsString::from("/home/user"))).unwrap();
        let relative = default_data_dir(
            Some(OsString::from("relative/data")),
            Some(OsString::from("/home/user")),
        )
        .unwrap();

        // Assert
        assert_eq!(unset, PathBuf::from("/home/user/.local/share/moviesearch"));
        assert_eq!(relative, unset);
    }

    #[test]
    fn test_default_data_dir_without_home_fails() {
        // Arrange & Act
        let err = default_data_dir(None, None).unwrap_err();

        // Assert
        assert!(err.to_string().contains("HOME"));
    }

    #[test]
    fn test_concurrent_saves_create_once() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let dir_path = dir.path().to_path_buf();
        let recorder = Recorder::default();
        let stores: Vec<SearchTermStore> = (0..4)
            .map(|_| {
                let mut store = SearchTermStore::open(Some(&dir_path)).unwrap();
                store.register(recorder.clone());
                store
            })
            .collect();
        let barrier = Barrier::new(stores.len());

        // Act
        let results: Vec<Result<SearchTerm>> = std::thread::scope(|scope| {
            let handles: Vec<_> = stores
                .into_iter()
                .map(|store| {
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        store.save("Heat")
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        // Assert
        let ids: Vec<i64> = results.into_iter().map(|r| r.unwrap().id).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        let events = recorder.0.lock().unwrap().clone();
        assert_eq!(events.len(), 4);
        assert_eq!(events.iter().filter(|(_, created)| *created).count(), 1);
        let store = SearchTermStore::open(Some(&dir_path)).unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }
}
