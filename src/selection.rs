// src/selection.rs
use crate::types::ViewMode;

/// How many channels a view mode may select at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionLimit {
    Unbounded,
    /// Exclusive choice: selecting a channel replaces the current one.
    Single,
    /// Ordered pair: first selected is the X axis, second the Y axis.
    Pair,
}

impl SelectionLimit {
    pub fn max(self) -> Option<usize> {
        match self {
            SelectionLimit::Unbounded => None,
            SelectionLimit::Single => Some(1),
            SelectionLimit::Pair => Some(2),
        }
    }
}

/// Selection set plus insertion order for one view mode.
///
/// Only `order` is stored: the selected set is exactly its contents, so the
/// "order is the selected set in insertion order" invariant holds by construction.
#[derive(Clone, Debug)]
pub struct ChannelSelection {
    channel_ids: Vec<String>,
    order: Vec<String>,
    limit: SelectionLimit,
}

impl ChannelSelection {
    pub fn new(channel_ids: Vec<String>, limit: SelectionLimit) -> Self {
        Self {
            channel_ids,
            order: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> SelectionLimit {
        self.limit
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.order.iter().any(|c| c == id)
    }

    pub fn selected_count(&self) -> usize {
        self.order.len()
    }

    /// Selected ids in the order they were selected.
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Selected ids in recording order, for stacked rendering.
    pub fn selected_in_channel_order(&self) -> Vec<String> {
        self.channel_ids
            .iter()
            .filter(|id| self.is_selected(id))
            .cloned()
            .collect()
    }

    /// X and Y channel ids once two channels are picked.
    pub fn axes(&self) -> Option<(&str, &str)> {
        match self.order.as_slice() {
            [x, y, ..] => Some((x.as_str(), y.as_str())),
            _ => None,
        }
    }

    /// Returns `true` when the selection changed.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.is_selected(id) {
            self.deselect(id)
        } else {
            self.select(id)
        }
    }

    pub fn select(&mut self, id: &str) -> bool {
        if !self.channel_ids.iter().any(|c| c == id) || self.is_selected(id) {
            return false;
        }
        match self.limit {
            SelectionLimit::Single => {
                self.order.clear();
            }
            SelectionLimit::Pair if self.order.len() >= 2 => return false,
            _ => {}
        }
        self.order.push(id.to_owned());
        true
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        let before = self.order.len();
        self.order.retain(|c| c != id);
        self.order.len() != before
    }

    /// Bulk select; only meaningful for unbounded modes.
    pub fn select_all(&mut self) -> bool {
        if self.limit != SelectionLimit::Unbounded {
            return false;
        }
        let mut changed = false;
        for id in self.channel_ids.clone() {
            changed |= self.select(&id);
        }
        changed
    }

    pub fn deselect_all(&mut self) -> bool {
        let changed = !self.order.is_empty();
        self.order.clear();
        changed
    }
}

/// Per-mode selections. Continuous and Polar share one set.
#[derive(Clone, Debug)]
pub struct SelectionBook {
    stacked: ChannelSelection,
    xor: ChannelSelection,
    recurrence: ChannelSelection,
}

impl SelectionBook {
    /// Starts with the first channel in the stacked and XOR sets and the first
    /// two channels (X then Y) in the recurrence set.
    pub fn new(channel_ids: Vec<String>) -> Self {
        let mut stacked = ChannelSelection::new(channel_ids.clone(), SelectionLimit::Unbounded);
        let mut xor = ChannelSelection::new(channel_ids.clone(), SelectionLimit::Single);
        let mut recurrence = ChannelSelection::new(channel_ids.clone(), SelectionLimit::Pair);
        for (idx, id) in channel_ids.iter().enumerate().take(2) {
            if idx == 0 {
                stacked.select(id);
                xor.select(id);
            }
            recurrence.select(id);
        }
        Self {
            stacked,
            xor,
            recurrence,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn for_mode(&self, mode: ViewMode) -> &ChannelSelection {
        match mode {
            ViewMode::Continuous | ViewMode::Polar => &self.stacked,
            ViewMode::Xor => &self.xor,
            ViewMode::Recurrence => &self.recurrence,
        }
    }

    pub fn for_mode_mut(&mut self, mode: ViewMode) -> &mut ChannelSelection {
        match mode {
            ViewMode::Continuous | ViewMode::Polar => &mut self.stacked,
            ViewMode::Xor => &mut self.xor,
            ViewMode::Recurrence => &mut self.recurrence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn ids(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("ch{i}")).collect()
    }

    #[test]
    fn single_mode_is_exclusive() {
        let mut sel = ChannelSelection::new(ids(3), SelectionLimit::Single);
        sel.toggle("ch1");
        sel.toggle("ch2");
        sel.toggle("ch3");
        assert_eq!(sel.order(), &["ch3".to_owned()]);
        assert!(!sel.is_selected("ch1"));
    }

    #[test]
    fn pair_mode_rejects_third_and_keeps_order() {
        let mut sel = ChannelSelection::new(ids(4), SelectionLimit::Pair);
        assert!(sel.toggle("ch3"));
        assert!(sel.toggle("ch1"));
        assert!(!sel.toggle("ch2"));
        assert_eq!(sel.axes(), Some(("ch3", "ch1")));
        assert!(sel.toggle("ch3"));
        assert_eq!(sel.order(), &["ch1".to_owned()]);
        assert!(sel.toggle("ch4"));
        assert_eq!(sel.axes(), Some(("ch1", "ch4")));
    }

    #[test]
    fn unknown_channels_are_ignored() {
        let mut sel = ChannelSelection::new(ids(2), SelectionLimit::Unbounded);
        assert!(!sel.toggle("ch9"));
        assert_eq!(sel.selected_count(), 0);
    }

    #[test]
    fn bulk_operations_only_for_unbounded() {
        let mut sel = ChannelSelection::new(ids(5), SelectionLimit::Unbounded);
        sel.toggle("ch4");
        assert!(sel.select_all());
        assert_eq!(sel.selected_count(), 5);
        assert_eq!(sel.selected_in_channel_order(), ids(5));
        assert!(sel.deselect_all());
        assert_eq!(sel.selected_count(), 0);

        let mut pair = ChannelSelection::new(ids(5), SelectionLimit::Pair);
        assert!(!pair.select_all());
        assert_eq!(pair.selected_count(), 0);
    }

    #[test]
    fn random_toggles_respect_limits_and_order() {
        let mut rng = StdRng::seed_from_u64(42);
        let universe = ids(6);
        for limit in [
            SelectionLimit::Unbounded,
            SelectionLimit::Single,
            SelectionLimit::Pair,
        ] {
            let mut sel = ChannelSelection::new(universe.clone(), limit);
            let mut expected: Vec<String> = Vec::new();
            for _ in 0..500 {
                let id = &universe[rng.gen_range(0..universe.len())];
                let was_selected = sel.is_selected(id);
                sel.toggle(id);
                if was_selected {
                    expected.retain(|c| c != id);
                } else {
                    match limit {
                        SelectionLimit::Single => {
                            expected.clear();
                            expected.push(id.clone());
                        }
                        SelectionLimit::Pair if expected.len() >= 2 => {}
                        _ => expected.push(id.clone()),
                    }
                }
                if let Some(max) = limit.max() {
                    assert!(sel.selected_count() <= max);
                }
                assert_eq!(sel.order(), expected.as_slice());
            }
        }
    }

    #[test]
    fn book_defaults_and_shared_sets() {
        let mut book = SelectionBook::new(ids(3));
        assert_eq!(book.for_mode(ViewMode::Continuous).order(), &["ch1".to_owned()]);
        assert_eq!(book.for_mode(ViewMode::Xor).order(), &["ch1".to_owned()]);
        assert_eq!(
            book.for_mode(ViewMode::Recurrence).axes(),
            Some(("ch1", "ch2"))
        );
        book.for_mode_mut(ViewMode::Polar).toggle("ch3");
        assert!(book.for_mode(ViewMode::Continuous).is_selected("ch3"));
        assert!(!book.for_mode(ViewMode::Xor).is_selected("ch3"));
    }
}
