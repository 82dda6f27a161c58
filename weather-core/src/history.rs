use serde::Serialize;

/// Maximum number of remembered locations.
pub const HISTORY_CAPACITY: usize = 5;

/// Recently looked-up locations, most recent first, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `location` at the front, dropping the oldest entry past the cap.
    ///
    /// A location already present (exact, case-sensitive match) is left where it
    /// is. Returns whether the history changed.
    pub fn record(&mut self, location: &str) -> bool {
        if location.is_empty() || self.entries.iter().any(|e| e == location) {
            return false;
        }

        self.entries.insert(0, location.to_owned());
        self.entries.truncate(HISTORY_CAPACITY);
        true
    }

    /// Location stored at `index`, for re-submitting it. Does not touch the order.
    pub fn replay(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
