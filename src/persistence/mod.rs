//! Saved programs
//!
//! Features:
//! - Versioned JSON envelope, one per level
//! - Plain actions only (blocks, repeats and recursion are not persisted)
//! - LocalStorage on web, no-op natively

use serde::{Deserialize, Serialize};

use crate::sim::{ActionQueue, ActionRecord, QueueError};

/// Current envelope version
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("unsupported save version {0}")]
    Version(u32),
    #[error("invalid save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// A player's program for one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedProgram {
    pub version: u32,
    pub level: u32,
    /// Unix timestamp (ms) when saved
    pub saved_at: f64,
    pub actions: Vec<ActionRecord>,
}

impl SavedProgram {
    pub fn from_queue(level: u32, queue: &ActionQueue, saved_at: f64) -> Self {
        Self {
            version: SAVE_VERSION,
            level,
            saved_at,
            actions: queue.records(),
        }
    }

    /// Replace the queue's items with this program. Returns the number loaded.
    pub fn apply_to(&self, queue: &mut ActionQueue) -> Result<usize, PersistError> {
        Ok(queue.load_records(&self.actions)?)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let program: SavedProgram = serde_json::from_str(json)?;
        if program.version != SAVE_VERSION {
            return Err(PersistError::Version(program.version));
        }
        Ok(program)
    }

    /// LocalStorage key for a level (used only in wasm32)
    #[allow(dead_code)]
    fn storage_key(level: u32) -> String {
        format!("codeball_program_{}", level)
    }

    /// Load a saved program from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load(level: u32) -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        let json = storage.get_item(&Self::storage_key(level)).ok()??;
        match Self::from_json(&json) {
            Ok(program) => {
                log::info!("Loaded program for level {} ({} actions)", level, program.actions.len());
                Some(program)
            }
            Err(e) => {
                log::warn!("Discarding saved program for level {}: {}", level, e);
                None
            }
        }
    }

    /// Save to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = self.to_json() {
                let _ = storage.set_item(&Self::storage_key(self.level), &json);
                log::info!("Program saved (level {})", self.level);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(_level: u32) -> Option<Self> {
        None
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

/// Current time in ms since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as f64)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ActionKind, QueueItem};

    #[test]
    fn test_program_round_trip_into_queue() {
        let mut queue = ActionQueue::default();
        queue.add_by_type(ActionKind::MoveDown).unwrap();
        queue.add_by_type(ActionKind::Wait).unwrap();
        let program = SavedProgram::from_queue(3, &queue, 1000.0);
        let json = program.to_json().unwrap();

        let restored = SavedProgram::from_json(&json).unwrap();
        assert_eq!(restored, program);

        let mut target = ActionQueue::default();
        assert_eq!(restored.apply_to(&mut target).unwrap(), 2);
        assert!(matches!(target.items()[0], QueueItem::Action(ref a) if a.kind() == ActionKind::MoveDown));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = r#"{"version":99,"level":1,"saved_at":0.0,"actions":[]}"#;
        assert!(matches!(SavedProgram::from_json(json), Err(PersistError::Version(99))));
    }

    #[test]
    fn test_apply_while_running_fails() {
        let mut queue = ActionQueue::default();
        queue.add_by_type(ActionKind::MoveUp).unwrap();
        queue.start().unwrap();
        let program = SavedProgram::from_queue(1, &queue, 0.0);
        assert!(matches!(
            program.apply_to(&mut queue),
            Err(PersistError::Queue(QueueError::Running))
        ));
    }
}
