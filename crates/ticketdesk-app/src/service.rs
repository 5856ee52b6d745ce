use ticketdesk_core::{
    BatchOutcome, NewTag, NewTicket, Tag, TagId, TagUpdate, TagWithCount, Ticket, TicketFilter, TicketId,
    TicketQuery, TicketUpdate, compare_recent_first,
};
use tracing::{debug, info};

use crate::error::{ServiceError, ServiceResult};
use crate::store::TicketStore;

/// Service façade that owns validation and business rules for tickets and tags.
pub struct TicketService<S> {
    store: S,
}

impl<S> TicketService<S> {
    /// Wrap a store.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}

fn store_err<E: Into<anyhow::Error>>(err: E) -> ServiceError {
    ServiceError::Store(err.into())
}

// The name check and the write take the store lock separately, so a
// concurrent writer can still hit the unique index.
fn tag_write_err<S: TicketStore>(err: S::Error, name: &str) -> ServiceError {
    if S::is_tag_name_conflict(&err) {
        ServiceError::DuplicateTag(name.to_owned())
    } else {
        store_err(err)
    }
}

impl<S: TicketStore> TicketService<S> {
    /// Tickets matching `query`, most recently updated first.
    ///
    /// Tag tokens are matched with OR; tokens naming no existing tag are dropped,
    /// so a tag filter that resolves to nothing matches nothing.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn list_tickets(&self, query: &TicketQuery) -> ServiceResult<Vec<Ticket>> {
        let tags = if query.tags.is_empty() {
            None
        } else {
            Some(self.store.resolve_tag_tokens(&query.tags).map_err(store_err)?)
        };
        let filter = TicketFilter::from_query(query, tags);
        let mut tickets: Vec<Ticket> = self
            .store
            .list_tickets()
            .map_err(store_err)?
            .into_iter()
            .filter(|ticket| filter.matches(ticket))
            .collect();
        tickets.sort_by(compare_recent_first);
        debug!(count = tickets.len(), "listed tickets");
        Ok(tickets)
    }

    /// A single ticket.
    ///
    /// # Errors
    /// Returns [`ServiceError::TicketNotFound`] if it does not exist.
    pub fn get_ticket(&self, id: TicketId) -> ServiceResult<Ticket> {
        self.store
            .get_ticket(id)
            .map_err(store_err)?
            .ok_or(ServiceError::TicketNotFound(id))
    }

    /// Create a ticket. Unknown tag ids are ignored.
    ///
    /// # Errors
    /// Returns an error if validation or the store fails.
    pub fn create_ticket(&self, new: NewTicket) -> ServiceResult<Ticket> {
        let new = new.validate()?;
        let ticket = self.store.insert_ticket(&new).map_err(store_err)?;
        info!(ticket = %ticket.id, "created ticket");
        Ok(ticket)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    /// Returns an error if validation fails, the ticket does not exist, or the store fails.
    pub fn update_ticket(&self, id: TicketId, update: TicketUpdate) -> ServiceResult<Ticket> {
        let update = update.validate()?;
        self.store
            .update_ticket(id, &update)
            .map_err(store_err)?
            .ok_or(ServiceError::TicketNotFound(id))
    }

    /// Delete a ticket.
    ///
    /// # Errors
    /// Returns [`ServiceError::TicketNotFound`] if it does not exist.
    pub fn delete_ticket(&self, id: TicketId) -> ServiceResult<()> {
        if self.store.delete_ticket(id).map_err(store_err)? {
            info!(ticket = %id, "deleted ticket");
            Ok(())
        } else {
            Err(ServiceError::TicketNotFound(id))
        }
    }

    /// Flip the completion flag.
    ///
    /// # Errors
    /// Returns [`ServiceError::TicketNotFound`] if it does not exist.
    pub fn toggle_ticket(&self, id: TicketId) -> ServiceResult<Ticket> {
        self.store
            .toggle_ticket(id)
            .map_err(store_err)?
            .ok_or(ServiceError::TicketNotFound(id))
    }

    /// Attach tags; duplicates and unknown tags are ignored.
    ///
    /// # Errors
    /// Returns [`ServiceError::TicketNotFound`] if the ticket does not exist.
    pub fn add_tags(&self, id: TicketId, tags: &[TagId]) -> ServiceResult<Ticket> {
        self.store
            .add_tags(id, tags)
            .map_err(store_err)?
            .ok_or(ServiceError::TicketNotFound(id))
    }

    /// Detach a tag; a tag the ticket does not carry is ignored.
    ///
    /// # Errors
    /// Returns [`ServiceError::TicketNotFound`] if the ticket does not exist.
    pub fn remove_tag(&self, id: TicketId, tag: TagId) -> ServiceResult<Ticket> {
        self.store
            .remove_tag(id, tag)
            .map_err(store_err)?
            .ok_or(ServiceError::TicketNotFound(id))
    }

    /// Set the completion flag on every listed ticket in one store transaction.
    ///
    /// Nonexistent ids are skipped and not counted.
    ///
    /// # Errors
    /// Returns [`ServiceError::EmptyBatch`] for an empty id list, or a store error.
    pub fn batch_update_status(&self, ids: &[TicketId], is_completed: bool) -> ServiceResult<BatchOutcome> {
        if ids.is_empty() {
            return Err(ServiceError::EmptyBatch);
        }
        let affected = self.store.set_completed(ids, is_completed).map_err(store_err)?;
        info!(requested = ids.len(), affected, is_completed, "batch status update");
        Ok(BatchOutcome::status_updated(affected, is_completed))
    }

    /// Delete every listed ticket in one store transaction.
    ///
    /// # Errors
    /// Returns [`ServiceError::EmptyBatch`] for an empty id list, or a store error.
    pub fn batch_delete(&self, ids: &[TicketId]) -> ServiceResult<BatchOutcome> {
        if ids.is_empty() {
            return Err(ServiceError::EmptyBatch);
        }
        let affected = self.store.delete_tickets(ids).map_err(store_err)?;
        info!(requested = ids.len(), affected, "batch delete");
        Ok(BatchOutcome::deleted(affected))
    }

    /// Tags with ticket counts, ordered by name.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub fn list_tags(&self, search: Option<&str>) -> ServiceResult<Vec<TagWithCount>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.store.list_tags(search).map_err(store_err)
    }

    /// A single tag.
    ///
    /// # Errors
    /// Returns [`ServiceError::TagNotFound`] if it does not exist.
    pub fn get_tag(&self, id: TagId) -> ServiceResult<Tag> {
        self.store
            .get_tag(id)
            .map_err(store_err)?
            .ok_or(ServiceError::TagNotFound(id))
    }

    /// Create a tag with a name not yet used (ignoring case).
    ///
    /// # Errors
    /// Returns an error if validation fails or the name is taken.
    pub fn create_tag(&self, new: NewTag) -> ServiceResult<Tag> {
        let new = new.validate()?;
        if self.store.find_tag_by_name(&new.name).map_err(store_err)?.is_some() {
            return Err(ServiceError::DuplicateTag(new.name));
        }
        let tag = self
            .store
            .insert_tag(&new)
            .map_err(|err| tag_write_err::<S>(err, &new.name))?;
        info!(tag = %tag.id, name = %tag.name, "created tag");
        Ok(tag)
    }

    /// Apply a partial tag update. Renaming a tag to its own name in another case is allowed.
    ///
    /// # Errors
    /// Returns an error if validation fails, the tag does not exist, or the name is taken.
    pub fn update_tag(&self, id: TagId, update: TagUpdate) -> ServiceResult<Tag> {
        let update = update.validate()?;
        self.get_tag(id)?;
        if let Some(name) = update.name.as_deref()
            && let Some(existing) = self.store.find_tag_by_name(name).map_err(store_err)?
            && existing.id != id
        {
            return Err(ServiceError::DuplicateTag(name.to_owned()));
        }
        self.store
            .update_tag(id, &update)
            .map_err(|err| tag_write_err::<S>(err, update.name.as_deref().unwrap_or_default()))?
            .ok_or(ServiceError::TagNotFound(id))
    }

    /// Delete a tag and detach it from every ticket.
    ///
    /// # Errors
    /// Returns [`ServiceError::TagNotFound`] if it does not exist.
    pub fn delete_tag(&self, id: TagId) -> ServiceResult<()> {
        if self.store.delete_tag(id).map_err(store_err)? {
            info!(tag = %id, "deleted tag");
            Ok(())
        } else {
            Err(ServiceError::TagNotFound(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketdesk_core::{StatusFilter, TagToken, ValidationError, parse_tag_tokens};
    use ticketdesk_store_sqlite::{SqliteStore, StoreError};

    fn service() -> TicketService<SqliteStore> {
        let store = SqliteStore::open_in_memory().unwrap_or_else(|err| panic!("open store: {err}"));
        TicketService::new(store)
    }

    fn ok<T>(result: ServiceResult<T>) -> T {
        result.unwrap_or_else(|err| panic!("unexpected service error: {err}"))
    }

    fn ticket_with_tags(svc: &TicketService<SqliteStore>, title: &str, tags: Vec<TagId>) -> Ticket {
        ok(svc.create_ticket(NewTicket {
            title: title.into(),
            description: None,
            tag_ids: tags,
        }))
    }

    #[test]
    fn list_filters_by_status_search_and_tags() {
        let svc = service();
        let bug = ok(svc.create_tag(NewTag::named("bug")));
        let ios = ok(svc.create_tag(NewTag::named("ios")));

        let crash = ticket_with_tags(&svc, "App crash", vec![bug.id]);
        let layout = ticket_with_tags(&svc, "Layout glitch", vec![ios.id]);
        let docs = ticket_with_tags(&svc, "Write docs", vec![]);
        ok(svc.toggle_ticket(docs.id));

        let open = ok(svc.list_tickets(&TicketQuery::new().with_status(StatusFilter::Open)));
        assert_eq!(open.iter().map(|t| t.id).collect::<Vec<_>>(), vec![layout.id, crash.id]);

        let searched = ok(svc.list_tickets(&TicketQuery::new().with_search(Some("CRASH".into()))));
        assert_eq!(searched.len(), 1);

        let tagged = ok(svc.list_tickets(&TicketQuery::new().with_tags(parse_tag_tokens(&format!(
            "{},IOS",
            bug.id
        )))));
        assert_eq!(tagged.iter().map(|t| t.id).collect::<Vec<_>>(), vec![layout.id, crash.id]);
    }

    #[test]
    fn unknown_tag_tokens_match_nothing() {
        let svc = service();
        ticket_with_tags(&svc, "untagged", vec![]);
        let query = TicketQuery::new().with_tags(vec![TagToken::Name("missing".into())]);
        assert!(ok(svc.list_tickets(&query)).is_empty());
    }

    #[test]
    fn create_validates_title() {
        let svc = service();
        let err = svc
            .create_ticket(NewTicket::titled("  "))
            .err()
            .unwrap_or_else(|| panic!("blank title must fail"));
        assert!(matches!(err, ServiceError::Validation(ValidationError::EmptyTitle)));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn missing_ticket_is_not_found() {
        let svc = service();
        for result in [
            svc.get_ticket(TicketId(9)).map(|_| ()),
            svc.toggle_ticket(TicketId(9)).map(|_| ()),
            svc.delete_ticket(TicketId(9)),
            svc.add_tags(TicketId(9), &[]).map(|_| ()),
            svc.remove_tag(TicketId(9), TagId(1)).map(|_| ()),
            svc.update_ticket(TicketId(9), TicketUpdate::completion(true)).map(|_| ()),
        ] {
            assert!(matches!(result, Err(ServiceError::TicketNotFound(TicketId(9)))));
        }
    }

    #[test]
    fn batch_rejects_empty_and_counts_existing() {
        let svc = service();
        assert!(matches!(svc.batch_delete(&[]), Err(ServiceError::EmptyBatch)));
        assert!(matches!(
            svc.batch_update_status(&[], true),
            Err(ServiceError::EmptyBatch)
        ));

        let a = ticket_with_tags(&svc, "a", vec![]);
        let b = ticket_with_tags(&svc, "b", vec![]);
        let outcome = ok(svc.batch_update_status(&[a.id, b.id, TicketId(999)], true));
        assert_eq!(outcome.affected_count, 2);
        assert_eq!(outcome.message, "Successfully updated 2 ticket(s) to completed");

        let outcome = ok(svc.batch_delete(&[a.id, TicketId(999)]));
        assert_eq!(outcome.affected_count, 1);
        let remaining: Vec<TicketId> = ok(svc.list_tickets(&TicketQuery::new())).iter().map(|t| t.id).collect();
        assert_eq!(remaining, vec![b.id]);
    }

    #[test]
    fn duplicate_tag_names_ignore_case() {
        let svc = service();
        let bug = ok(svc.create_tag(NewTag::named("Bug")));
        let err = svc
            .create_tag(NewTag::named("bug"))
            .err()
            .unwrap_or_else(|| panic!("duplicate must fail"));
        assert_eq!(err.to_string(), "Tag 'bug' already exists");
        assert_eq!(err.status_code(), 400);

        let renamed = ok(svc.update_tag(
            bug.id,
            TagUpdate {
                name: Some("BUG".into()),
                color: None,
            },
        ));
        assert_eq!(renamed.name, "BUG");

        let other = ok(svc.create_tag(NewTag::named("ios")));
        assert!(matches!(
            svc.update_tag(
                other.id,
                TagUpdate {
                    name: Some("bug".into()),
                    color: None
                }
            ),
            Err(ServiceError::DuplicateTag(_))
        ));
    }

    #[test]
    fn missing_tag_is_not_found_before_duplicate_check() {
        let svc = service();
        ok(svc.create_tag(NewTag::named("bug")));
        let result = svc.update_tag(
            TagId(404),
            TagUpdate {
                name: Some("bug".into()),
                color: None,
            },
        );
        assert!(matches!(result, Err(ServiceError::TagNotFound(TagId(404)))));
        assert!(matches!(svc.delete_tag(TagId(404)), Err(ServiceError::TagNotFound(_))));
    }

    #[test]
    fn tag_search_ignores_blank_input() {
        let svc = service();
        ok(svc.create_tag(NewTag::named("bug")));
        ok(svc.create_tag(NewTag::named("ios")));
        assert_eq!(ok(svc.list_tags(Some("  "))).len(), 2);
        assert_eq!(ok(svc.list_tags(Some("bu"))).len(), 1);
    }

    #[test]
    fn unique_index_conflict_reports_duplicate_tag() {
        let err = tag_write_err::<SqliteStore>(StoreError::DuplicateTagName("Bug".into()), "Bug");
        assert!(matches!(&err, ServiceError::DuplicateTag(name) if name == "Bug"));
        assert_eq!(err.status_code(), 400);

        let err = tag_write_err::<SqliteStore>(StoreError::ClockOutOfRange, "Bug");
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn concurrent_creates_of_one_name_never_fail_internally() {
        let svc = service();
        for round in 0..20 {
            let name = format!("tag-{round}");
            let results: Vec<ServiceResult<Tag>> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..8)
                    .map(|_| scope.spawn(|| svc.create_tag(NewTag::named(&name))))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap_or_else(|_| panic!("create_tag panicked")))
                    .collect()
            });
            let created = results.iter().filter(|result| result.is_ok()).count();
            assert_eq!(created, 1, "exactly one create wins in round {round}");
            for result in &results {
                if let Err(err) = result {
                    assert!(matches!(err, ServiceError::DuplicateTag(_)), "unexpected error: {err}");
                }
            }
        }
    }
}
