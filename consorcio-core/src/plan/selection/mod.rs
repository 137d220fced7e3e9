use serde::{Deserialize, Serialize};

/// Maximum number of plans compared side by side.
pub const SELECTION_CAPACITY: usize = 4;

/// What a [`SelectionSet::toggle`] call did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionChange {
    Added,
    Removed,
    /// The set was full and the id was not a member.
    Ignored,
}

/// Ordered set of plan ids picked for comparison, capped at
/// [`SELECTION_CAPACITY`]. Insertion order is the comparison column order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionSet {
    ids: Vec<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: &str) -> SelectionChange {
        if self.remove(id) {
            return SelectionChange::Removed;
        }
        if self.ids.len() >= SELECTION_CAPACITY {
            return SelectionChange::Ignored;
        }
        self.ids.push(id.to_string());
        SelectionChange::Added
    }

    /// Removes `id` if present; returns whether it was a member.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.ids.len();
        self.ids.retain(|member| member != id);
        self.ids.len() != before
    }

    /// Keeps only the ids accepted by `keep`, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.ids.retain(|member| keep(member));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|member| member == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.ids.len() >= SELECTION_CAPACITY
    }
}
