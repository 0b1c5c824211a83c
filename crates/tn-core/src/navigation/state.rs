//! Navigator state machine
//!
//! Pure and synchronous: transitions that need children return a
//! [`LoadRequest`], and the caller hands the loader's answer back through
//! [`NavigatorState::apply_children`]. Every request carries the generation
//! it was issued in, so an answer that arrives after a newer request or a
//! reset is rejected instead of being pushed onto the wrong stack.

use serde::Serialize;

use super::{ChildNode, ChildRequest, NavigationStart, NavigatorSnapshot, ParentRef, RankSequence};
use crate::error::NavError;
use crate::selection::{LevelSummary, SelectionMap, SelectionResult};

/// Where the navigator currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "level", rename_all = "camelCase")]
pub enum NavigatorPhase {
    /// No session started
    Idle,
    /// Session started, first level of children still loading
    Loading,
    /// Showing level `i` of the stack
    AtLevel(usize),
    /// The start node sits on the last rank, there is nothing below it
    Leaf,
}

/// Identifies one issued child load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub generation: u64,
}

/// A child load the caller must perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub request: ChildRequest,
}

/// Load that has been issued but not answered
#[derive(Debug, Clone)]
struct PendingLoad {
    ticket: LoadTicket,
    /// Parent trail entry committed together with the children
    parent: Option<ParentRef>,
}

/// State of one navigator
#[derive(Debug, Clone)]
pub struct NavigatorState {
    ranks: RankSequence,
    start_index: Option<usize>,
    /// Loaded children, one list per navigated level
    levels: Vec<Vec<ChildNode>>,
    /// `trail[i]` is the parent of `levels[i]`; `trail[0]` is the start node
    trail: Vec<ParentRef>,
    selection: SelectionMap,
    generation: u64,
    pending: Option<PendingLoad>,
}

impl NavigatorState {
    pub fn new(ranks: RankSequence) -> Self {
        Self {
            ranks,
            start_index: None,
            levels: Vec::new(),
            trail: Vec::new(),
            selection: SelectionMap::new(),
            generation: 0,
            pending: None,
        }
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.start_index = None;
        self.levels.clear();
        self.trail.clear();
        self.selection.clear();
        self.pending = None;
    }

    fn issue(&mut self, request: ChildRequest, parent: Option<ParentRef>) -> LoadRequest {
        self.generation += 1;
        let ticket = LoadTicket { generation: self.generation };
        self.pending = Some(PendingLoad { ticket, parent });
        LoadRequest { ticket, request }
    }

    /// Start a new session from `start`, discarding everything before it.
    ///
    /// Returns the first-level load, or `None` when the start rank is the
    /// last one in the sequence.
    pub fn begin(&mut self, start: &NavigationStart) -> Result<Option<LoadRequest>, NavError> {
        self.reset();

        let Some(index) = self.ranks.index_of(&start.level) else {
            return Err(NavError::UnknownRank(start.level.clone()));
        };

        self.start_index = Some(index);
        self.trail.push(ParentRef::from(start));

        let Some(child_level) = self.ranks.next_after(index) else {
            return Ok(None);
        };

        let request = ChildRequest::new(&start.level, &start.value, child_level);
        Ok(Some(self.issue(request, None)))
    }

    /// Descend into `value`, one of the nodes on the current level.
    ///
    /// Returns `None` when the current level is already the last rank.
    pub fn begin_forward(&mut self, value: &str) -> Result<Option<LoadRequest>, NavError> {
        let Some(start_index) = self.start_index else {
            return Err(NavError::NotStarted);
        };
        let Some(level) = self.current_level() else {
            return Err(if self.is_loading() {
                NavError::FirstLevelLoading
            } else {
                NavError::NotStarted
            });
        };

        let node = self
            .current_nodes()
            .iter()
            .find(|n| n.value == value)
            .cloned()
            .ok_or_else(|| NavError::NodeNotLoaded {
                level,
                value: value.to_string(),
            })?;

        let parent_rank_index = start_index + 1 + level;
        let (Some(parent_level), Some(child_level)) = (
            self.ranks.get(parent_rank_index),
            self.ranks.next_after(parent_rank_index),
        ) else {
            return Ok(None);
        };

        let request = ChildRequest::new(parent_level, &node.value, child_level);
        let parent = ParentRef {
            level: parent_level.to_string(),
            value: node.value,
            label: node.label,
        };
        Ok(Some(self.issue(request, Some(parent))))
    }

    /// Apply the answer to `ticket`. Returns the new stack depth.
    pub fn apply_children(&mut self, ticket: LoadTicket, nodes: Vec<ChildNode>) -> Result<usize, NavError> {
        let pending = match self.pending.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.pending = other;
                return Err(NavError::StaleLoad { generation: ticket.generation });
            }
        };

        if let Some(parent) = pending.parent {
            // Keep trail and stack aligned: trail[i] is the parent of levels[i]
            self.trail.truncate(self.levels.len());
            self.trail.push(parent);
        }
        self.levels.push(nodes);
        Ok(self.levels.len())
    }

    /// Forget the pending load after the loader failed; the state stays on
    /// the last level that loaded.
    pub fn fail_load(&mut self, ticket: LoadTicket) -> bool {
        if self.pending.as_ref().map(|p| p.ticket) == Some(ticket) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Pop one level. No-op at the first level.
    pub fn back(&mut self) -> bool {
        if self.levels.len() <= 1 {
            return false;
        }
        self.levels.pop();
        if self.trail.len() > 1 {
            self.trail.pop();
        }
        // Whatever was loading below the old tail no longer applies
        self.pending = None;
        true
    }

    /// Toggle `value` on the current level. Returns false when the level has
    /// no nodes.
    pub fn toggle(&mut self, value: &str) -> Result<bool, NavError> {
        let Some(level) = self.current_level() else {
            return Ok(false);
        };
        let nodes = &self.levels[level];
        if nodes.is_empty() {
            return Ok(false);
        }
        let node = nodes
            .iter()
            .find(|n| n.value == value)
            .ok_or_else(|| NavError::NodeNotLoaded {
                level,
                value: value.to_string(),
            })?;

        Ok(self.selection.toggle(level, node, nodes, &self.trail))
    }

    /// Remove an explicit selection on any level
    pub fn remove_selected(&mut self, level: usize, value: &str) -> bool {
        let nodes = self.levels.get(level).map(Vec::as_slice).unwrap_or(&[]);
        self.selection.remove(level, value, nodes, &self.trail)
    }

    pub fn is_selected(&self, level: usize, value: &str) -> bool {
        self.selection.is_selected(level, value, &self.trail)
    }

    pub fn selection_result(&self) -> SelectionResult {
        match self.start_index {
            Some(start) => self.selection.project(&self.ranks, start),
            None => SelectionResult::default(),
        }
    }

    pub fn summary(&self) -> Vec<LevelSummary> {
        match self.start_index {
            Some(start) => self.selection.summary(&self.ranks, start),
            None => Vec::new(),
        }
    }

    pub fn phase(&self) -> NavigatorPhase {
        match (self.start_index, self.current_level()) {
            (None, _) => NavigatorPhase::Idle,
            (Some(_), Some(level)) => NavigatorPhase::AtLevel(level),
            (Some(_), None) if self.pending.is_some() => NavigatorPhase::Loading,
            (Some(index), None) if self.ranks.next_after(index).is_none() => NavigatorPhase::Leaf,
            // First load failed; a new start is needed
            (Some(_), None) => NavigatorPhase::Idle,
        }
    }

    pub fn ranks(&self) -> &RankSequence {
        &self.ranks
    }

    pub fn start_rank(&self) -> Option<&str> {
        self.start_index.and_then(|i| self.ranks.get(i))
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Index of the level being shown
    pub fn current_level(&self) -> Option<usize> {
        self.levels.len().checked_sub(1)
    }

    pub fn current_nodes(&self) -> &[ChildNode] {
        self.levels.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes_at(&self, level: usize) -> Option<&[ChildNode]> {
        self.levels.get(level).map(Vec::as_slice)
    }

    pub fn parent_trail(&self) -> &[ParentRef] {
        &self.trail
    }

    pub fn selection(&self) -> &SelectionMap {
        &self.selection
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Rank of the nodes currently shown
    pub fn current_child_rank(&self) -> Option<&str> {
        let start = self.start_index?;
        self.ranks.get(start + 1 + self.current_level().unwrap_or(0))
    }

    /// Whether the current nodes can be descended into
    pub fn has_next_level(&self) -> bool {
        match (self.start_index, self.current_level()) {
            (Some(start), Some(level)) => self.ranks.next_after(start + 1 + level).is_some(),
            _ => false,
        }
    }

    pub fn snapshot(&self) -> NavigatorSnapshot {
        NavigatorSnapshot {
            phase: self.phase(),
            start: self.trail.first().cloned(),
            current_rank: self.current_child_rank().map(str::to_string),
            depth: self.depth(),
            current_nodes: self.current_nodes().to_vec(),
            has_next_level: self.has_next_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(values: &[&str]) -> Vec<ChildNode> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ChildNode::new(i as u32, *v, *v))
            .collect()
    }

    fn plantae() -> NavigationStart {
        NavigationStart::unlabelled("kingdom", "Plantae")
    }

    fn started() -> NavigatorState {
        let mut state = NavigatorState::new(RankSequence::default());
        let load = state.begin(&plantae()).unwrap().unwrap();
        state
            .apply_children(load.ticket, nodes(&["Tracheophyta", "Bryophyta"]))
            .unwrap();
        state
    }

    #[test]
    fn test_begin_requests_first_level() {
        let mut state = NavigatorState::new(RankSequence::default());
        assert_eq!(state.phase(), NavigatorPhase::Idle);

        let load = state.begin(&plantae()).unwrap().unwrap();
        assert_eq!(load.request, ChildRequest::new("kingdom", "Plantae", "phylum"));
        assert_eq!(state.phase(), NavigatorPhase::Loading);
        assert_eq!(state.parent_trail().len(), 1);

        assert_eq!(state.apply_children(load.ticket, nodes(&["Tracheophyta"])).unwrap(), 1);
        assert_eq!(state.phase(), NavigatorPhase::AtLevel(0));
        assert_eq!(state.current_child_rank(), Some("phylum"));
        assert!(state.has_next_level());
    }

    #[test]
    fn test_unknown_rank_leaves_idle() {
        let mut state = started();
        state.toggle("Bryophyta").unwrap();

        let err = state.begin(&NavigationStart::unlabelled("domain", "Eukarya")).unwrap_err();
        assert!(matches!(err, NavError::UnknownRank(ref r) if r == "domain"));
        assert_eq!(state.phase(), NavigatorPhase::Idle);
        assert!(state.selection().is_empty());
        assert!(state.selection_result().is_empty());
    }

    #[test]
    fn test_leaf_start_issues_no_load() {
        let mut state = NavigatorState::new(RankSequence::default());
        let load = state.begin(&NavigationStart::unlabelled("species", "Quercus robur")).unwrap();
        assert!(load.is_none());
        assert_eq!(state.phase(), NavigatorPhase::Leaf);
        assert!(state.selection_result().is_empty());
    }

    #[test]
    fn test_forward_commits_trail_with_children() {
        let mut state = started();

        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();
        assert_eq!(load.request, ChildRequest::new("phylum", "Tracheophyta", "class"));
        // Nothing committed until the answer arrives
        assert_eq!(state.parent_trail().len(), 1);
        assert_eq!(state.depth(), 1);

        state.apply_children(load.ticket, nodes(&["Magnoliopsida"])).unwrap();
        assert_eq!(state.depth(), 2);
        assert_eq!(state.parent_trail()[1].value, "Tracheophyta");
        assert_eq!(state.parent_trail()[1].level, "phylum");
        assert_eq!(state.current_child_rank(), Some("class"));
    }

    #[test]
    fn test_forward_rejects_unloaded_node() {
        let mut state = started();
        let err = state.begin_forward("Chordata").unwrap_err();
        assert!(matches!(err, NavError::NodeNotLoaded { level: 0, .. }));

        let mut idle = NavigatorState::new(RankSequence::default());
        assert!(matches!(idle.begin_forward("x"), Err(NavError::NotStarted)));
    }

    #[test]
    fn test_forward_while_first_level_loads() {
        let mut state = NavigatorState::new(RankSequence::default());
        let load = state.begin(&plantae()).unwrap().unwrap();

        assert!(matches!(
            state.begin_forward("Tracheophyta"),
            Err(NavError::FirstLevelLoading)
        ));
        assert!(state.is_loading());

        state.apply_children(load.ticket, nodes(&["Tracheophyta"])).unwrap();
        assert!(state.begin_forward("Tracheophyta").unwrap().is_some());
    }

    #[test]
    fn test_forward_past_last_rank_is_terminal() {
        let ranks = RankSequence::new(["genus", "species"]).unwrap();
        let mut state = NavigatorState::new(ranks);
        let load = state.begin(&NavigationStart::unlabelled("genus", "Quercus")).unwrap().unwrap();
        state.apply_children(load.ticket, nodes(&["Quercus robur"])).unwrap();

        assert!(!state.has_next_level());
        assert!(state.begin_forward("Quercus robur").unwrap().is_none());
        assert_eq!(state.depth(), 1);
    }

    #[test]
    fn test_stale_answers_are_discarded() {
        let mut state = NavigatorState::new(RankSequence::default());
        let first = state.begin(&plantae()).unwrap().unwrap();
        let second = state.begin(&NavigationStart::unlabelled("kingdom", "Animalia")).unwrap().unwrap();

        let err = state.apply_children(first.ticket, nodes(&["Tracheophyta"])).unwrap_err();
        assert!(matches!(err, NavError::StaleLoad { .. }));
        assert_eq!(state.depth(), 0);
        assert!(state.is_loading());

        state.apply_children(second.ticket, nodes(&["Chordata"])).unwrap();
        assert_eq!(state.current_nodes()[0].value, "Chordata");
    }

    #[test]
    fn test_newer_forward_supersedes_pending_one() {
        let mut state = started();
        let first = state.begin_forward("Tracheophyta").unwrap().unwrap();
        let second = state.begin_forward("Bryophyta").unwrap().unwrap();

        assert!(state.apply_children(first.ticket, nodes(&["Magnoliopsida"])).is_err());
        state.apply_children(second.ticket, nodes(&["Bryopsida"])).unwrap();
        assert_eq!(state.parent_trail()[1].value, "Bryophyta");
        assert_eq!(state.depth(), 2);
    }

    #[test]
    fn test_failed_load_keeps_last_level() {
        let mut state = started();
        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();

        assert!(state.fail_load(load.ticket));
        assert!(!state.fail_load(load.ticket));
        assert_eq!(state.phase(), NavigatorPhase::AtLevel(0));
        assert_eq!(state.parent_trail().len(), 1);
        assert!(state.apply_children(load.ticket, Vec::new()).is_err());
    }

    #[test]
    fn test_back_pops_until_root() {
        let mut state = started();
        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();
        state.apply_children(load.ticket, nodes(&["Magnoliopsida"])).unwrap();

        assert!(state.back());
        assert_eq!(state.depth(), 1);
        assert_eq!(state.parent_trail().len(), 1);
        assert!(!state.back());
        assert_eq!(state.phase(), NavigatorPhase::AtLevel(0));
    }

    #[test]
    fn test_back_cancels_pending_forward() {
        let mut state = started();
        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();
        state
            .apply_children(load.ticket, nodes(&["Magnoliopsida", "Liliopsida"]))
            .unwrap();

        let pending = state.begin_forward("Magnoliopsida").unwrap().unwrap();
        assert!(state.is_loading());
        assert!(state.back());
        assert!(!state.is_loading());

        let err = state.apply_children(pending.ticket, nodes(&["Rosales"])).unwrap_err();
        assert!(matches!(err, NavError::StaleLoad { .. }));
        assert_eq!(state.depth(), 1);
        assert_eq!(state.parent_trail().len(), 1);
        assert_eq!(state.phase(), NavigatorPhase::AtLevel(0));
    }

    #[test]
    fn test_back_then_forward_reexpands_same_branch() {
        let mut state = started();
        let children = nodes(&["Magnoliopsida", "Liliopsida"]);

        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();
        state.apply_children(load.ticket, children.clone()).unwrap();
        let before = (state.current_nodes().to_vec(), state.parent_trail().to_vec());

        state.back();
        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();
        state.apply_children(load.ticket, children).unwrap();

        assert_eq!(state.current_nodes(), before.0.as_slice());
        assert_eq!(state.parent_trail(), before.1.as_slice());
    }

    #[test]
    fn test_toggle_requires_loaded_node() {
        let mut state = started();
        assert!(state.toggle("Tracheophyta").unwrap());
        assert!(state.is_selected(0, "Tracheophyta"));
        assert!(matches!(state.toggle("Chordata"), Err(NavError::NodeNotLoaded { .. })));

        let mut idle = NavigatorState::new(RankSequence::default());
        assert!(!idle.toggle("Tracheophyta").unwrap());
    }

    #[test]
    fn test_toggle_on_empty_level_is_noop() {
        let mut state = NavigatorState::new(RankSequence::default());
        let load = state.begin(&plantae()).unwrap().unwrap();
        state.apply_children(load.ticket, Vec::new()).unwrap();

        assert!(!state.toggle("Tracheophyta").unwrap());
        assert!(state.selection().is_empty());
    }

    #[test]
    fn test_selection_survives_navigation() {
        let mut state = started();
        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();
        state
            .apply_children(load.ticket, nodes(&["Magnoliopsida", "Liliopsida"]))
            .unwrap();
        state.toggle("Magnoliopsida").unwrap();
        state.toggle("Liliopsida").unwrap();

        // Both classes selected: collapsed onto the phylum
        let result = state.selection_result();
        assert_eq!(result.values_for("phylum").unwrap(), ["Tracheophyta"]);
        assert!(result.values_for("class").is_none());

        state.back();
        assert!(state.is_selected(0, "Tracheophyta"));
        assert_eq!(state.selection_result(), result);
    }

    #[test]
    fn test_remove_selected_on_popped_level() {
        let mut state = started();
        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();
        state
            .apply_children(load.ticket, nodes(&["Magnoliopsida", "Liliopsida"]))
            .unwrap();
        state.toggle("Magnoliopsida").unwrap();
        state.back();

        assert!(state.remove_selected(1, "Magnoliopsida"));
        assert!(state.selection().is_empty());
        assert!(!state.remove_selected(1, "Magnoliopsida"));
    }

    #[test]
    fn test_remove_of_unselected_value_keeps_selection() {
        let mut state = started();
        let load = state.begin_forward("Tracheophyta").unwrap().unwrap();
        state
            .apply_children(load.ticket, nodes(&["Magnoliopsida", "Liliopsida"]))
            .unwrap();
        state.toggle("Magnoliopsida").unwrap();
        state.toggle("Liliopsida").unwrap();
        let promoted = state.selection_result();
        assert_eq!(promoted.values_for("phylum").unwrap(), ["Tracheophyta"]);

        assert!(!state.remove_selected(1, "Pinopsida"));
        assert_eq!(state.selection_result(), promoted);
    }

    #[test]
    fn test_snapshot() {
        let state = started();
        let snap = state.snapshot();
        assert_eq!(snap.phase, NavigatorPhase::AtLevel(0));
        assert_eq!(snap.start.unwrap().value, "Plantae");
        assert_eq!(snap.current_rank.as_deref(), Some("phylum"));
        assert_eq!(snap.current_nodes.len(), 2);
        assert!(snap.has_next_level);
    }
}
