use std::collections::{BTreeSet, HashMap};

use rusqlite::{Connection, OptionalExtension, params};
use ticketdesk_core::{NewTicket, TagId, TagRef, Ticket, TicketId, TicketUpdate};
use tracing::debug;

use crate::{SqliteStore, StoreError, from_micros};

const TICKET_COLUMNS: &str = "id, title, description, is_completed, created_at, updated_at";

struct TicketRow {
    id: i64,
    title: String,
    description: Option<String>,
    is_completed: bool,
    created_at: i64,
    updated_at: i64,
}

impl TicketRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            is_completed: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_ticket(self, tags: Vec<TagRef>) -> Result<Ticket, StoreError> {
        Ok(Ticket {
            id: TicketId(self.id),
            title: self.title,
            description: self.description,
            is_completed: self.is_completed,
            created_at: from_micros(self.created_at)?,
            updated_at: from_micros(self.updated_at)?,
            tags,
        })
    }
}

impl SqliteStore {
    /// Every ticket with its tags, most recently updated first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_tickets(&self) -> Result<Vec<Ticket>, StoreError> {
        let inner = self.lock();
        let conn = &inner.conn;
        let mut tags = tags_by_ticket(conn, None)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY updated_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([], TicketRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|row| {
                let ticket_tags = tags.remove(&row.id).unwrap_or_default();
                row.into_ticket(ticket_tags)
            })
            .collect()
    }

    /// A single ticket, or `None` if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        let inner = self.lock();
        load_ticket(&inner.conn, id)
    }

    /// Insert a validated ticket and attach its known tags.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn insert_ticket(&self, new: &NewTicket) -> Result<Ticket, StoreError> {
        let mut inner = self.lock();
        let now = inner.next_timestamp()?;
        let tx = inner.conn.transaction()?;
        tx.execute(
            "INSERT INTO tickets (title, description, is_completed, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?3)",
            params![new.title, new.description, now],
        )?;
        let id = TicketId(tx.last_insert_rowid());
        attach_tags(&tx, id, &new.tag_ids, now)?;
        let ticket = require_ticket(&tx, id)?;
        tx.commit()?;
        debug!(ticket = %id, "inserted ticket");
        Ok(ticket)
    }

    /// Apply a validated partial update. An empty update leaves `updated_at` untouched.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn update_ticket(&self, id: TicketId, update: &TicketUpdate) -> Result<Option<Ticket>, StoreError> {
        let mut inner = self.lock();
        if update.is_empty() {
            return load_ticket(&inner.conn, id);
        }
        let now = inner.next_timestamp()?;
        let changed = inner.conn.execute(
            "UPDATE tickets SET
               title = COALESCE(?2, title),
               description = COALESCE(?3, description),
               is_completed = COALESCE(?4, is_completed),
               updated_at = ?5
             WHERE id = ?1",
            params![id.0, update.title, update.description, update.is_completed, now],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        debug!(ticket = %id, "updated ticket");
        load_ticket(&inner.conn, id)
    }

    /// Flip the completion flag.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn toggle_ticket(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        let mut inner = self.lock();
        let now = inner.next_timestamp()?;
        let changed = inner.conn.execute(
            "UPDATE tickets SET is_completed = NOT is_completed, updated_at = ?2 WHERE id = ?1",
            params![id.0, now],
        )?;
        if changed == 0 {
            return Ok(None);
        }
        load_ticket(&inner.conn, id)
    }

    /// Delete a ticket. Returns `false` if it did not exist.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_ticket(&self, id: TicketId) -> Result<bool, StoreError> {
        let inner = self.lock();
        let removed = inner.conn.execute("DELETE FROM tickets WHERE id = ?1", params![id.0])?;
        debug!(ticket = %id, removed, "deleted ticket");
        Ok(removed > 0)
    }

    /// Attach tags; already attached and unknown tags are ignored.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn add_tags(&self, id: TicketId, tags: &[TagId]) -> Result<Option<Ticket>, StoreError> {
        let mut inner = self.lock();
        if !ticket_exists(&inner.conn, id)? {
            return Ok(None);
        }
        let now = inner.next_timestamp()?;
        let tx = inner.conn.transaction()?;
        if attach_tags(&tx, id, tags, now)? > 0 {
            touch(&tx, id, now)?;
        }
        let ticket = require_ticket(&tx, id)?;
        tx.commit()?;
        Ok(Some(ticket))
    }

    /// Detach a tag; detaching a tag the ticket does not carry is a no-op.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn remove_tag(&self, id: TicketId, tag: TagId) -> Result<Option<Ticket>, StoreError> {
        let mut inner = self.lock();
        if !ticket_exists(&inner.conn, id)? {
            return Ok(None);
        }
        let now = inner.next_timestamp()?;
        let tx = inner.conn.transaction()?;
        let removed = tx.execute(
            "DELETE FROM ticket_tags WHERE ticket_id = ?1 AND tag_id = ?2",
            params![id.0, tag.0],
        )?;
        if removed > 0 {
            touch(&tx, id, now)?;
        }
        let ticket = require_ticket(&tx, id)?;
        tx.commit()?;
        Ok(Some(ticket))
    }

    /// Set the completion flag on every existing ticket in `ids` in one transaction.
    ///
    /// Returns the number of existing tickets; unknown and duplicate ids are not counted.
    ///
    /// # Errors
    /// Returns an error if any update fails; nothing is applied in that case.
    pub fn set_completed(&self, ids: &[TicketId], is_completed: bool) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let now = inner.next_timestamp()?;
        let tx = inner.conn.transaction()?;
        let mut affected = 0_u64;
        {
            let mut stmt =
                tx.prepare("UPDATE tickets SET is_completed = ?2, updated_at = ?3 WHERE id = ?1")?;
            for id in distinct(ids) {
                affected += stmt.execute(params![id.0, is_completed, now])? as u64;
            }
        }
        tx.commit()?;
        debug!(requested = ids.len(), affected, is_completed, "batch status update");
        Ok(affected)
    }

    /// Delete every existing ticket in `ids` in one transaction.
    ///
    /// # Errors
    /// Returns an error if any delete fails; nothing is deleted in that case.
    pub fn delete_tickets(&self, ids: &[TicketId]) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let tx = inner.conn.transaction()?;
        let mut affected = 0_u64;
        {
            let mut stmt = tx.prepare("DELETE FROM tickets WHERE id = ?1")?;
            for id in distinct(ids) {
                affected += stmt.execute(params![id.0])? as u64;
            }
        }
        tx.commit()?;
        debug!(requested = ids.len(), affected, "batch delete");
        Ok(affected)
    }
}

fn distinct(ids: &[TicketId]) -> BTreeSet<TicketId> {
    ids.iter().copied().collect()
}

fn ticket_exists(conn: &Connection, id: TicketId) -> Result<bool, StoreError> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM tickets WHERE id = ?1", params![id.0], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

fn touch(conn: &Connection, id: TicketId, now: i64) -> Result<(), StoreError> {
    conn.execute("UPDATE tickets SET updated_at = ?2 WHERE id = ?1", params![id.0, now])?;
    Ok(())
}

fn attach_tags(conn: &Connection, id: TicketId, tags: &[TagId], now: i64) -> Result<usize, StoreError> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO ticket_tags (ticket_id, tag_id, created_at)
         SELECT ?1, id, ?3 FROM tags WHERE id = ?2",
    )?;
    let mut attached = 0;
    for tag in tags {
        attached += stmt.execute(params![id.0, tag.0, now])?;
    }
    Ok(attached)
}

fn load_ticket(conn: &Connection, id: TicketId) -> Result<Option<Ticket>, StoreError> {
    let row = conn
        .query_row(
            &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
            params![id.0],
            TicketRow::from_row,
        )
        .optional()?;
    let Some(row) = row else {
        return Ok(None);
    };
    let tags = tags_by_ticket(conn, Some(id))?.remove(&row.id).unwrap_or_default();
    row.into_ticket(tags).map(Some)
}

fn require_ticket(conn: &Connection, id: TicketId) -> Result<Ticket, StoreError> {
    load_ticket(conn, id)?.ok_or_else(|| StoreError::Sql(rusqlite::Error::QueryReturnedNoRows))
}

fn tags_by_ticket(conn: &Connection, only: Option<TicketId>) -> Result<HashMap<i64, Vec<TagRef>>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT tt.ticket_id, t.id, t.name, t.color
         FROM ticket_tags tt JOIN tags t ON t.id = tt.tag_id
         WHERE ?1 IS NULL OR tt.ticket_id = ?1
         ORDER BY t.name COLLATE NOCASE, t.id",
    )?;
    let rows = stmt.query_map(params![only.map(|id| id.0)], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            TagRef {
                id: TagId(row.get(1)?),
                name: row.get(2)?,
                color: row.get(3)?,
            },
        ))
    })?;
    let mut grouped: HashMap<i64, Vec<TagRef>> = HashMap::new();
    for row in rows {
        let (ticket, tag) = row?;
        grouped.entry(ticket).or_default().push(tag);
    }
    Ok(grouped)
}
