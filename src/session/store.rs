// In-memory session map with append-only file persistence
//
// The store is constructed explicitly and passed to whoever needs it; there
// is no global instance. Each session sits behind its own mutex, which
// serializes append + persist for concurrent requests on the same id.

use super::history_file::{count_saved_turns, format_turn, parse_history};
use super::{Session, Turn};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Owns every session's in-memory state and is the sole writer of the
/// per-session history files.
pub struct SessionStore {
    history_dir: PathBuf,
    dedupe_queries: bool,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    /// Create a store over the given history directory. The directory is
    /// created lazily on first persist.
    pub fn new(history_dir: impl Into<PathBuf>) -> Self {
        SessionStore {
            history_dir: history_dir.into(),
            dedupe_queries: false,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Store configured from the engine settings
    pub fn from_config(config: &crate::config::EngineConfig) -> Self {
        SessionStore::new(config.history_dir.clone())
            .with_dedupe_queries(config.dedupe_queries_on_load)
    }

    /// Skip turns whose exact query text is already in memory when merging
    /// loaded files. Off by default: repeated questions are kept.
    pub fn with_dedupe_queries(mut self, enabled: bool) -> Self {
        self.dedupe_queries = enabled;
        self
    }

    pub fn history_dir(&self) -> &Path {
        &self.history_dir
    }

    fn history_file_path(&self, session_id: &str) -> PathBuf {
        self.history_dir.join(format!("{}.txt", session_id))
    }

    fn lock_map(&self) -> MutexGuard<'_, HashMap<String, Arc<Mutex<Session>>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_session(handle: &Arc<Mutex<Session>>) -> MutexGuard<'_, Session> {
        handle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Session handle, created empty if the id is unknown
    fn entry(&self, session_id: &str) -> Arc<Mutex<Session>> {
        let mut map = self.lock_map();
        map.entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new(session_id))))
            .clone()
    }

    /// Create a session or confirm an existing one.
    ///
    /// An absent id yields a fresh random identifier; a known id is
    /// returned unchanged (idempotent); an unknown id is registered as a
    /// new empty session under that same id.
    pub fn create_or_get(&self, session_id: Option<&str>) -> String {
        let id = match session_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        self.entry(&id);
        id
    }

    /// Whether the session id is currently known in memory
    pub fn contains(&self, session_id: &str) -> bool {
        self.lock_map().contains_key(session_id)
    }

    /// Ids of all sessions currently in memory
    pub fn session_ids(&self) -> Vec<String> {
        self.lock_map().keys().cloned().collect()
    }

    /// Append a turn to a session's in-memory history. Auto-creates the
    /// session; does not persist.
    pub fn append_turn(&self, session_id: &str, turn: Turn) {
        let handle = self.entry(session_id);
        let mut session = Self::lock_session(&handle);
        session.turns.push(turn);
    }

    /// Copy of a session's turn history, empty for unknown ids
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        let map = self.lock_map();
        match map.get(session_id) {
            Some(handle) => Self::lock_session(handle).turns.clone(),
            None => Vec::new(),
        }
    }

    /// Record the context retrieved for the session's latest query
    pub fn set_last_context(&self, session_id: &str, context: impl Into<String>) {
        let handle = self.entry(session_id);
        let mut session = Self::lock_session(&handle);
        session.last_context = Some(context.into());
    }

    /// Context recorded for the session's latest query, if any
    pub fn last_context(&self, session_id: &str) -> Option<String> {
        let map = self.lock_map();
        map.get(session_id)
            .and_then(|handle| Self::lock_session(handle).last_context.clone())
    }

    /// Append unwritten turns to the session's history file.
    ///
    /// The number of turns already on disk is recovered by counting the
    /// end-marker occurrences in the existing file, so repeated calls
    /// append nothing new. I/O problems are logged and reported as
    /// `false`; they never abort the caller's workflow.
    pub fn persist(&self, session_id: &str) -> bool {
        let handle = {
            let map = self.lock_map();
            match map.get(session_id) {
                Some(handle) => handle.clone(),
                None => {
                    log::warn!("No history in memory for session {}", session_id);
                    return false;
                }
            }
        };
        let session = Self::lock_session(&handle);

        match self.persist_turns(session_id, &session.turns) {
            Ok(appended) => {
                if appended > 0 {
                    log::debug!("Appended {} turns to session {}", appended, session_id);
                }
                true
            }
            Err(e) => {
                log::error!("Failed to persist session {}: {}", session_id, e);
                false
            }
        }
    }

    fn persist_turns(&self, session_id: &str, turns: &[Turn]) -> std::io::Result<usize> {
        fs::create_dir_all(&self.history_dir)?;
        let path = self.history_file_path(session_id);

        let saved_count = match fs::read_to_string(&path) {
            Ok(content) => count_saved_turns(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e),
        };

        if saved_count >= turns.len() {
            return Ok(0);
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.lock_exclusive()?;
        let result = (|| {
            for turn in &turns[saved_count..] {
                file.write_all(format_turn(turn).as_bytes())?;
            }
            file.flush()
        })();
        let _ = fs2::FileExt::unlock(&file);
        result?;

        Ok(turns.len() - saved_count)
    }

    /// Load every `.txt` history file in the directory into memory.
    ///
    /// A file that cannot be read is logged and skipped; the scan
    /// continues. Returns the number of files loaded.
    pub fn load_all(&self) -> usize {
        let entries = match fs::read_dir(&self.history_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::info!(
                    "No history directory at {:?} yet: {}",
                    self.history_dir,
                    e
                );
                return 0;
            }
        };

        let mut loaded = 0;
        for entry in entries.filter_map(|entry| entry.ok()) {
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if path.extension().map_or(true, |ext| ext != "txt") {
                continue;
            }

            match self.load_session_file(stem, &path) {
                Ok(turn_count) => {
                    log::info!("Loaded session {} with {} turns", stem, turn_count);
                    loaded += 1;
                }
                Err(e) => {
                    log::warn!("Failed to load history file {:?}: {}", path, e);
                }
            }
        }
        loaded
    }

    /// Parse one history file and merge it into memory. Never clobbers
    /// turns already present for the session id.
    fn load_session_file(&self, session_id: &str, path: &Path) -> std::io::Result<usize> {
        let content = fs::read_to_string(path)?;
        let parsed = parse_history(&content);

        let handle = self.entry(session_id);
        let mut session = Self::lock_session(&handle);
        for turn in parsed {
            if self.dedupe_queries
                && session.turns.iter().any(|existing| existing.query == turn.query)
            {
                continue;
            }
            session.turns.push(turn);
        }
        Ok(session.turns.len())
    }

    /// Remove a session from memory and delete its history file.
    ///
    /// Succeeds when the file never existed; fails only on an I/O error
    /// during removal (logged).
    pub fn delete(&self, session_id: &str) -> bool {
        self.lock_map().remove(session_id);

        let path = self.history_file_path(session_id);
        if !path.exists() {
            return true;
        }
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to delete history file {:?}: {}", path, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::history_file::TURN_END_MARKER;
    use super::*;
    use tempfile::TempDir;

    fn turn(query: &str, response: &str) -> Turn {
        Turn {
            query: query.to_string(),
            response: response.to_string(),
            timestamp: "2025-04-01 10:00:00".to_string(),
            raw_response: "raw".to_string(),
        }
    }

    #[test]
    fn test_create_or_get_generates_unique_ids() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());

        let first = store.create_or_get(None);
        let second = store.create_or_get(None);
        assert_ne!(first, second);
        assert!(store.contains(&first));

        // Known ids are idempotent
        let same = store.create_or_get(Some(&first));
        assert_eq!(same, first);

        // Unknown ids are registered as-is
        let named = store.create_or_get(Some("my-session"));
        assert_eq!(named, "my-session");
        assert!(store.contains("my-session"));
    }

    #[test]
    fn test_append_turn_auto_creates() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());

        store.append_turn("fresh", turn("hola", "respuesta"));
        let history = store.history("fresh");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "hola");

        assert!(store.history("unknown").is_empty());
    }

    #[test]
    fn test_persist_and_reload_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());

        for i in 0..3 {
            store.append_turn("s1", turn(&format!("pregunta {}", i), &format!("respuesta {}", i)));
        }
        assert!(store.persist("s1"));

        let reloaded = SessionStore::new(temp_dir.path());
        assert_eq!(reloaded.load_all(), 1);
        let history = reloaded.history("s1");
        assert_eq!(history.len(), 3);
        for (i, entry) in history.iter().enumerate() {
            assert_eq!(entry.query, format!("pregunta {}", i));
            assert_eq!(entry.response, format!("respuesta {}", i));
        }
    }

    #[test]
    fn test_persist_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());

        store.append_turn("s1", turn("q1", "r1"));
        store.append_turn("s1", turn("q2", "r2"));
        assert!(store.persist("s1"));

        let path = temp_dir.path().join("s1.txt");
        let first_pass = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first_pass.matches(TURN_END_MARKER).count(), 2);

        // No new turns: the delimiter count must not change
        assert!(store.persist("s1"));
        let second_pass = std::fs::read_to_string(&path).unwrap();
        assert_eq!(second_pass, first_pass);

        // A new turn appends exactly one block
        store.append_turn("s1", turn("q3", "r3"));
        assert!(store.persist("s1"));
        let third_pass = std::fs::read_to_string(&path).unwrap();
        assert_eq!(third_pass.matches(TURN_END_MARKER).count(), 3);
        assert!(third_pass.starts_with(&first_pass));
    }

    #[test]
    fn test_persist_unknown_session_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());
        assert!(!store.persist("never-created"));
    }

    #[test]
    fn test_delete_missing_session_succeeds() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());
        assert!(store.delete("never-existed"));
    }

    #[test]
    fn test_delete_removes_memory_and_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());

        store.append_turn("s1", turn("q", "r"));
        assert!(store.persist("s1"));
        let path = temp_dir.path().join("s1.txt");
        assert!(path.exists());

        assert!(store.delete("s1"));
        assert!(!path.exists());
        assert!(!store.contains("s1"));
    }

    #[test]
    fn test_load_all_skips_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();

        let store = SessionStore::new(temp_dir.path());
        store.append_turn("good", turn("q", "r"));
        assert!(store.persist("good"));

        // Invalid UTF-8 makes the read itself fail; the scan must continue
        std::fs::write(temp_dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();
        std::fs::write(temp_dir.path().join("ignored.json"), "{}").unwrap();

        let reloaded = SessionStore::new(temp_dir.path());
        assert_eq!(reloaded.load_all(), 1);
        assert!(reloaded.contains("good"));
        assert!(!reloaded.contains("bad"));
        assert!(!reloaded.contains("ignored"));
    }

    #[test]
    fn test_load_preserves_repeated_queries_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());
        store.append_turn("s1", turn("misma pregunta", "primera"));
        store.append_turn("s1", turn("misma pregunta", "segunda"));
        assert!(store.persist("s1"));

        let reloaded = SessionStore::new(temp_dir.path());
        reloaded.load_all();
        assert_eq!(reloaded.history("s1").len(), 2);
    }

    #[test]
    fn test_load_dedupe_opt_in() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());
        store.append_turn("s1", turn("misma pregunta", "primera"));
        store.append_turn("s1", turn("misma pregunta", "segunda"));
        store.append_turn("s1", turn("otra pregunta", "tercera"));
        assert!(store.persist("s1"));

        let reloaded = SessionStore::new(temp_dir.path()).with_dedupe_queries(true);
        reloaded.load_all();
        let history = reloaded.history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].response, "primera");
        assert_eq!(history[1].response, "tercera");
    }

    #[test]
    fn test_load_merges_without_clobbering_memory() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());
        store.append_turn("s1", turn("persistida", "r1"));
        assert!(store.persist("s1"));

        let second = SessionStore::new(temp_dir.path());
        second.append_turn("s1", turn("solo en memoria", "r2"));
        second.load_all();

        let history = second.history("s1");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].query, "solo en memoria");
        assert_eq!(history[1].query, "persistida");
    }

    #[test]
    fn test_last_context_accessors() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::new(temp_dir.path());

        assert!(store.last_context("s1").is_none());
        store.set_last_context("s1", "chunk uno\nchunk dos");
        assert_eq!(
            store.last_context("s1").as_deref(),
            Some("chunk uno\nchunk dos")
        );
    }
}
