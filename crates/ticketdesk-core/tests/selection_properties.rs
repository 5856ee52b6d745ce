//! Property tests for selection set operations.

use std::collections::BTreeSet;

use proptest::prelude::*;
use ticketdesk_core::{Selection, Ticket, TicketId};
use time::OffsetDateTime;

fn visible_tickets(flags: &[bool]) -> Vec<Ticket> {
    flags
        .iter()
        .zip(1_i64..)
        .map(|(completed, id)| Ticket {
            id: TicketId(id),
            title: format!("ticket {id}"),
            description: None,
            is_completed: *completed,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
            tags: Vec::new(),
        })
        .collect()
}

fn visible_ids(tickets: &[Ticket]) -> Vec<TicketId> {
    tickets.iter().map(|t| t.id).collect()
}

fn subset(tickets: &[Ticket], mask: &[bool]) -> Selection {
    tickets
        .iter()
        .zip(mask.iter().chain(std::iter::repeat(&false)))
        .filter(|(_, picked)| **picked)
        .map(|(ticket, _)| ticket.id)
        .collect()
}

proptest! {
    #[test]
    fn invert_twice_is_identity(
        flags in prop::collection::vec(any::<bool>(), 0..48),
        mask in prop::collection::vec(any::<bool>(), 0..48),
    ) {
        let tickets = visible_tickets(&flags);
        let original = subset(&tickets, &mask);
        let mut selection = original.clone();
        selection.invert(visible_ids(&tickets));
        selection.invert(visible_ids(&tickets));
        prop_assert_eq!(selection, original);
    }

    #[test]
    fn select_all_then_deselect_all_is_empty(
        flags in prop::collection::vec(any::<bool>(), 0..48),
        extra in prop::collection::btree_set(1_i64..500, 0..16),
    ) {
        let tickets = visible_tickets(&flags);
        let mut selection: Selection = extra.into_iter().map(TicketId).collect();
        selection.select_all(visible_ids(&tickets));
        prop_assert_eq!(selection.len(), tickets.len());
        selection.deselect_all();
        prop_assert!(selection.is_empty());
    }

    #[test]
    fn completed_and_open_partition_visible(flags in prop::collection::vec(any::<bool>(), 0..48)) {
        let tickets = visible_tickets(&flags);

        let mut completed = Selection::new();
        completed.select_where(&tickets, |t| t.is_completed);
        let mut open = Selection::new();
        open.select_where(&tickets, |t| !t.is_completed);

        prop_assert!(completed.ids().is_disjoint(open.ids()));
        let union: BTreeSet<TicketId> = completed.ids().union(open.ids()).copied().collect();
        let all: BTreeSet<TicketId> = visible_ids(&tickets).into_iter().collect();
        prop_assert_eq!(union, all);
    }

    #[test]
    fn reconcile_keeps_only_visible(
        flags in prop::collection::vec(any::<bool>(), 0..48),
        selected in prop::collection::btree_set(1_i64..80, 0..32),
    ) {
        let tickets = visible_tickets(&flags);
        let visible: BTreeSet<TicketId> = visible_ids(&tickets).into_iter().collect();
        let mut selection: Selection = selected.iter().copied().map(TicketId).collect();
        let orphaned = selection.reconcile(visible.iter().copied());

        prop_assert!(selection.ids().is_subset(&visible));
        for id in orphaned {
            prop_assert!(!visible.contains(&id));
            prop_assert!(selected.contains(&id.0));
        }
    }
}
