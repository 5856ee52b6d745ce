use std::collections::BTreeSet;

use crate::id::TicketId;
use crate::ticket::Ticket;

/// Set of selected ticket ids.
///
/// The selection is held independently of any fetched list; operations that
/// depend on what is on screen take the visible tickets or ids as input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<TicketId>,
}

impl Selection {
    /// Empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of selected ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn contains(&self, id: TicketId) -> bool {
        self.ids.contains(&id)
    }

    /// Selected ids in ascending order.
    #[must_use]
    pub const fn ids(&self) -> &BTreeSet<TicketId> {
        &self.ids
    }

    /// Selected ids as a vector, ready for a batch request.
    #[must_use]
    pub fn to_vec(&self) -> Vec<TicketId> {
        self.ids.iter().copied().collect()
    }

    /// Add `id`. Returns `false` if it was already selected.
    pub fn select(&mut self, id: TicketId) -> bool {
        self.ids.insert(id)
    }

    /// Remove `id`. Returns `false` if it was not selected.
    pub fn deselect(&mut self, id: TicketId) -> bool {
        self.ids.remove(&id)
    }

    /// Flip membership of `id`; returns the new membership.
    pub fn toggle(&mut self, id: TicketId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Select exactly the visible ids.
    pub fn select_all<I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = TicketId>,
    {
        self.ids = visible.into_iter().collect();
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) {
        self.ids.clear();
    }

    /// Select exactly the visible tickets matching `predicate`.
    pub fn select_where<'a, I, P>(&mut self, visible: I, mut predicate: P)
    where
        I: IntoIterator<Item = &'a Ticket>,
        P: FnMut(&Ticket) -> bool,
    {
        self.ids = visible
            .into_iter()
            .filter(|ticket| predicate(ticket))
            .map(|ticket| ticket.id)
            .collect();
    }

    /// Replace the selection with the visible ids that are not selected.
    pub fn invert<I>(&mut self, visible: I)
    where
        I: IntoIterator<Item = TicketId>,
    {
        let inverted: BTreeSet<TicketId> = visible
            .into_iter()
            .filter(|id| !self.ids.contains(id))
            .collect();
        self.ids = inverted;
    }

    /// Drop ids that are no longer visible and return them.
    pub fn reconcile<I>(&mut self, visible: I) -> Vec<TicketId>
    where
        I: IntoIterator<Item = TicketId>,
    {
        let visible: BTreeSet<TicketId> = visible.into_iter().collect();
        let orphaned: Vec<TicketId> = self.ids.difference(&visible).copied().collect();
        for id in &orphaned {
            self.ids.remove(id);
        }
        orphaned
    }

    /// Whether there is at least one visible id and all of them are selected.
    #[must_use]
    pub fn is_all_selected<I>(&self, visible: I) -> bool
    where
        I: IntoIterator<Item = TicketId>,
    {
        let mut any = false;
        for id in visible {
            if !self.ids.contains(&id) {
                return false;
            }
            any = true;
        }
        any
    }
}

impl FromIterator<TicketId> for Selection {
    fn from_iter<T: IntoIterator<Item = TicketId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<TicketId> {
        raw.iter().copied().map(TicketId).collect()
    }

    #[test]
    fn select_and_toggle() {
        let mut selection = Selection::new();
        assert!(selection.select(TicketId(1)));
        assert!(!selection.select(TicketId(1)));
        assert!(!selection.toggle(TicketId(1)));
        assert!(selection.toggle(TicketId(2)));
        assert_eq!(selection.to_vec(), ids(&[2]));
        assert!(!selection.deselect(TicketId(9)));
    }

    #[test]
    fn select_all_replaces_previous_state() {
        let mut selection: Selection = ids(&[7]).into_iter().collect();
        selection.select_all(ids(&[1, 2, 3]));
        assert_eq!(selection.to_vec(), ids(&[1, 2, 3]));
        assert!(selection.is_all_selected(ids(&[3, 1, 2])));
        selection.deselect_all();
        assert!(selection.is_empty());
    }

    #[test]
    fn invert_within_visible() {
        let mut selection: Selection = ids(&[1, 3]).into_iter().collect();
        selection.invert(ids(&[1, 2, 3, 4]));
        assert_eq!(selection.to_vec(), ids(&[2, 4]));
    }

    #[test]
    fn reconcile_reports_orphans() {
        let mut selection: Selection = ids(&[1, 2, 5]).into_iter().collect();
        let orphaned = selection.reconcile(ids(&[2, 3]));
        assert_eq!(orphaned, ids(&[1, 5]));
        assert_eq!(selection.to_vec(), ids(&[2]));
    }

    #[test]
    fn all_selected_requires_visible_tickets() {
        let selection = Selection::new();
        assert!(!selection.is_all_selected(Vec::new()));
        let selection: Selection = ids(&[1]).into_iter().collect();
        assert!(!selection.is_all_selected(ids(&[1, 2])));
    }
}
