//! Explicit selection bookkeeping and implicit (ancestor) resolution
//!
//! Only explicit selections are stored. A node counts as selected when it is
//! stored explicitly at its level, or when the parent of any level above it
//! (as recorded in the parent trail) is stored explicitly. When every node of
//! a level ends up selected, the selections collapse into their parent one
//! level up; the reverse happens as soon as one of them is deselected.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::navigation::{ChildNode, ParentRef, RankSequence};

/// Selected values of one level, value -> label, in selection order
pub type LevelEntries = IndexMap<String, String>;

/// Explicit selections keyed by level index (0 = children of the start node)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionMap {
    levels: BTreeMap<usize, LevelEntries>,
}

/// The closest ancestor that is explicitly selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedAncestor {
    pub level: usize,
    pub value: String,
    pub label: String,
}

/// Selected values of one rank, as emitted to listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSelection {
    pub level: String,
    pub values: Vec<String>,
}

/// The externally observable selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub levels: Vec<LevelSelection>,
}

impl SelectionResult {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Values selected on `rank`, if any
    pub fn values_for(&self, rank: &str) -> Option<&[String]> {
        self.levels
            .iter()
            .find(|l| l.level == rank)
            .map(|l| l.values.as_slice())
    }
}

/// One labelled selection in a summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedItem {
    pub value: String,
    pub label: String,
}

/// Explicit selections of one level, with labels, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    pub level_index: usize,
    pub rank: String,
    pub items: Vec<SelectedItem>,
}

impl SelectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, level: usize) -> Option<&LevelEntries> {
        self.levels.get(&level)
    }

    /// Level indices holding at least one explicit selection
    pub fn levels(&self) -> impl Iterator<Item = usize> + '_ {
        self.levels.keys().copied()
    }

    pub fn contains(&self, level: usize, value: &str) -> bool {
        self.levels
            .get(&level)
            .map_or(false, |entries| entries.contains_key(value))
    }

    fn insert(&mut self, level: usize, value: &str, label: &str) {
        self.levels
            .entry(level)
            .or_default()
            .insert(value.to_string(), label.to_string());
    }

    /// Drop one explicit entry, removing the level when it empties
    fn remove_entry(&mut self, level: usize, value: &str) -> bool {
        let Some(entries) = self.levels.get_mut(&level) else {
            return false;
        };
        let removed = entries.shift_remove(value).is_some();
        if entries.is_empty() {
            self.levels.remove(&level);
        }
        removed
    }

    fn replace_level(&mut self, level: usize, entries: LevelEntries) {
        if entries.is_empty() {
            self.levels.remove(&level);
        } else {
            self.levels.insert(level, entries);
        }
    }

    /// Walk the trail upwards from `level` and return the first parent that is
    /// explicitly selected one level above it.
    pub fn nearest_selected_ancestor(&self, level: usize, trail: &[ParentRef]) -> Option<SelectedAncestor> {
        (1..=level).rev().find_map(|j| {
            let parent = trail.get(j)?;
            self.contains(j - 1, &parent.value).then(|| SelectedAncestor {
                level: j - 1,
                value: parent.value.clone(),
                label: parent.label.clone(),
            })
        })
    }

    /// Explicitly selected, or implicitly through a selected ancestor
    pub fn is_selected(&self, level: usize, value: &str, trail: &[ParentRef]) -> bool {
        self.nearest_selected_ancestor(level, trail).is_some() || self.contains(level, value)
    }

    /// Toggle `node` on `level`, where `nodes` is everything loaded there.
    ///
    /// Returns false when nothing is loaded on the level.
    pub fn toggle(&mut self, level: usize, node: &ChildNode, nodes: &[ChildNode], trail: &[ParentRef]) -> bool {
        if nodes.is_empty() {
            return false;
        }

        if let Some(ancestor) = self.nearest_selected_ancestor(level, trail) {
            // Deselecting inside a selected subtree: the ancestor goes, its
            // remaining children on this level become explicit.
            self.remove_entry(ancestor.level, &ancestor.value);
            let siblings: LevelEntries = nodes
                .iter()
                .filter(|n| n.value != node.value)
                .map(|n| (n.value.clone(), n.label.clone()))
                .collect();
            self.replace_level(level, siblings);
        } else if !self.remove_entry(level, &node.value) {
            self.insert(level, &node.value, &node.label);
        }

        self.sync_parent(level, nodes, trail);
        true
    }

    /// Promote a fully selected level into its parent, or demote the parent
    /// when the level is no longer fully selected.
    ///
    /// Level 0 is never promoted: its parent is the start node, which has no
    /// level of its own.
    pub fn sync_parent(&mut self, level: usize, nodes: &[ChildNode], trail: &[ParentRef]) {
        if level == 0 {
            return;
        }
        let Some(parent) = trail.get(level) else {
            return;
        };
        let parent_level = level - 1;

        let all_selected = !nodes.is_empty() && nodes.iter().all(|n| self.contains(level, &n.value));

        if all_selected {
            // A selected ancestor above the parent already covers this subtree
            if self.nearest_selected_ancestor(parent_level, trail).is_none() {
                self.insert(parent_level, &parent.value, &parent.label);
            }
            self.levels.remove(&level);
        } else {
            self.remove_entry(parent_level, &parent.value);
        }
    }

    /// Remove one explicit selection and re-check its parent.
    ///
    /// `nodes` are the nodes loaded on `level`, empty when the level is no
    /// longer on the stack.
    pub fn remove(&mut self, level: usize, value: &str, nodes: &[ChildNode], trail: &[ParentRef]) -> bool {
        let removed = self.remove_entry(level, value);
        if removed {
            self.sync_parent(level, nodes, trail);
        }
        removed
    }

    /// Flatten to rank names. Level `i` maps to rank `start_index + 1 + i`;
    /// levels past the end of the sequence are dropped.
    pub fn project(&self, ranks: &RankSequence, start_index: usize) -> SelectionResult {
        let levels = self
            .levels
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .filter_map(|(&level, entries)| {
                let rank = ranks.get(start_index + 1 + level)?;
                Some(LevelSelection {
                    level: rank.to_string(),
                    values: entries.keys().cloned().collect(),
                })
            })
            .collect();

        SelectionResult { levels }
    }

    pub fn summary(&self, ranks: &RankSequence, start_index: usize) -> Vec<LevelSummary> {
        self.levels
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(&level, entries)| LevelSummary {
                level_index: level,
                rank: ranks
                    .get(start_index + 1 + level)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("level_{}", level)),
                items: entries
                    .iter()
                    .map(|(value, label)| SelectedItem {
                        value: value.clone(),
                        label: label.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}
