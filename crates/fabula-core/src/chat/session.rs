//! Bounded conversation session.

use std::sync::{Mutex, MutexGuard};

use fabula_types::chat::Turn;

/// Maximum number of turns a session retains.
pub const HISTORY_CAP: usize = 60;

/// Mutex-guarded conversation history with a sliding-window cap.
///
/// One instance per conversation, injected into the engine. The lock guards
/// only the vector operations below; `std::sync::MutexGuard` is not `Send`,
/// so holding it across an await point does not compile -- network calls
/// can never serialize behind the history lock.
pub struct Session {
    turns: Mutex<Vec<Turn>>,
    cap: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::with_cap(HISTORY_CAP)
    }

    pub fn with_cap(cap: usize) -> Self {
        Self {
            turns: Mutex::new(Vec::new()),
            cap,
        }
    }

    /// Append one turn, discarding the oldest entries beyond the cap.
    pub fn push(&self, turn: Turn) {
        let mut turns = self.lock();
        turns.push(turn);
        if turns.len() > self.cap {
            let excess = turns.len() - self.cap;
            turns.drain(..excess);
        }
    }

    /// Read-only copy of the history, safe to hold while others mutate.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.lock().clone()
    }

    /// Empty the history. Idempotent.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock leaves the vector itself intact, so a
    // poisoned mutex is still safe to read.
    fn lock(&self) -> MutexGuard<'_, Vec<Turn>> {
        self.turns
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_push_and_snapshot() {
        let session = Session::new();
        session.push(Turn::user("你好"));
        session.push(Turn::assistant("你好，想写什么故事？"));

        let turns = session.snapshot();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "你好");
        assert_eq!(turns[1].content, "你好，想写什么故事？");
    }

    #[test]
    fn test_cap_keeps_newest() {
        let session = Session::with_cap(4);
        for i in 0..10 {
            session.push(Turn::user(format!("m{i}")));
        }
        let turns = session.snapshot();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].content, "m6");
        assert_eq!(turns[3].content, "m9");
    }

    #[test]
    fn test_default_cap_is_sixty() {
        let session = Session::new();
        for i in 0..75 {
            session.push(Turn::user(format!("m{i}")));
        }
        assert_eq!(session.len(), HISTORY_CAP);
        assert_eq!(session.snapshot()[0].content, "m15");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let session = Session::new();
        session.push(Turn::user("你好"));
        session.clear();
        assert!(session.is_empty());
        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let session = Session::new();
        session.push(Turn::user("第一"));
        let snapshot = session.snapshot();
        session.push(Turn::user("第二"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_concurrent_pushes_stay_capped() {
        let session = Arc::new(Session::with_cap(16));
        let mut handles = Vec::new();
        for t in 0..8 {
            let session = Arc::clone(&session);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    session.push(Turn::user(format!("t{t}-{i}")));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(session.len(), 16);
    }
}
