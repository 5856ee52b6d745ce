use std::collections::BTreeSet;

use rusqlite::{Connection, OptionalExtension, params};
use ticketdesk_core::{NewTag, Tag, TagId, TagToken, TagUpdate, TagWithCount};
use tracing::debug;

use crate::{SqliteStore, StoreError, from_micros};

fn tag_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, Option<String>, i64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_tag((id, name, color, created_at): (i64, String, Option<String>, i64)) -> Result<Tag, StoreError> {
    Ok(Tag {
        id: TagId(id),
        name,
        color,
        created_at: from_micros(created_at)?,
    })
}

impl SqliteStore {
    /// Tags with ticket counts ordered by name, optionally filtered by a
    /// case-insensitive substring of the name.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list_tags(&self, search: Option<&str>) -> Result<Vec<TagWithCount>, StoreError> {
        let inner = self.lock();
        let mut stmt = inner.conn.prepare(
            "SELECT t.id, t.name, t.color, COUNT(tt.ticket_id)
             FROM tags t LEFT JOIN ticket_tags tt ON tt.tag_id = t.id
             WHERE ?1 IS NULL OR instr(lower(t.name), lower(?1)) > 0
             GROUP BY t.id
             ORDER BY t.name COLLATE NOCASE, t.id",
        )?;
        let rows = stmt.query_map(params![search], |row| {
            Ok(TagWithCount {
                id: TagId(row.get(0)?),
                name: row.get(1)?,
                color: row.get(2)?,
                ticket_count: u64::try_from(row.get::<_, i64>(3)?).unwrap_or_default(),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// A single tag, or `None` if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get_tag(&self, id: TagId) -> Result<Option<Tag>, StoreError> {
        let inner = self.lock();
        load_tag(&inner.conn, id)
    }

    /// Tag whose name equals `name` ignoring ASCII case.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, StoreError> {
        let inner = self.lock();
        inner
            .conn
            .query_row(
                "SELECT id, name, color, created_at FROM tags WHERE name = ?1 COLLATE NOCASE",
                params![name],
                tag_from_row,
            )
            .optional()?
            .map(into_tag)
            .transpose()
    }

    /// Insert a validated tag.
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateTagName`] on a name collision, or an error if the insert fails.
    pub fn insert_tag(&self, new: &NewTag) -> Result<Tag, StoreError> {
        let mut inner = self.lock();
        let now = inner.next_timestamp()?;
        inner
            .conn
            .execute(
                "INSERT INTO tags (name, color, created_at) VALUES (?1, ?2, ?3)",
                params![new.name, new.color, now],
            )
            .map_err(|err| StoreError::from_tag_write(err, &new.name))?;
        let id = TagId(inner.conn.last_insert_rowid());
        debug!(tag = %id, name = %new.name, "inserted tag");
        load_tag(&inner.conn, id)?.ok_or_else(|| StoreError::Sql(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Apply a validated partial update.
    ///
    /// # Errors
    /// Returns [`StoreError::DuplicateTagName`] on a name collision, or an error if the update fails.
    pub fn update_tag(&self, id: TagId, update: &TagUpdate) -> Result<Option<Tag>, StoreError> {
        let inner = self.lock();
        let changed = inner
            .conn
            .execute(
                "UPDATE tags SET name = COALESCE(?2, name), color = COALESCE(?3, color) WHERE id = ?1",
                params![id.0, update.name, update.color],
            )
            .map_err(|err| StoreError::from_tag_write(err, update.name.as_deref().unwrap_or_default()))?;
        if changed == 0 {
            return Ok(None);
        }
        load_tag(&inner.conn, id)
    }

    /// Delete a tag and detach it from every ticket. Returns `false` if it did not exist.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_tag(&self, id: TagId) -> Result<bool, StoreError> {
        let inner = self.lock();
        let removed = inner.conn.execute("DELETE FROM tags WHERE id = ?1", params![id.0])?;
        debug!(tag = %id, removed, "deleted tag");
        Ok(removed > 0)
    }

    /// Resolve filter tokens to the ids of existing tags. Unknown tokens are dropped.
    ///
    /// # Errors
    /// Returns an error if a lookup fails.
    pub fn resolve_tag_tokens(&self, tokens: &[TagToken]) -> Result<BTreeSet<TagId>, StoreError> {
        let inner = self.lock();
        let mut by_id = inner.conn.prepare("SELECT id FROM tags WHERE id = ?1")?;
        let mut by_name = inner
            .conn
            .prepare("SELECT id FROM tags WHERE name = ?1 COLLATE NOCASE")?;
        let mut resolved = BTreeSet::new();
        for token in tokens {
            let found: Option<i64> = match token {
                TagToken::Id(id) => by_id.query_row(params![id.0], |row| row.get(0)).optional()?,
                TagToken::Name(name) => by_name.query_row(params![name], |row| row.get(0)).optional()?,
            };
            if let Some(id) = found {
                resolved.insert(TagId(id));
            }
        }
        Ok(resolved)
    }
}

fn load_tag(conn: &Connection, id: TagId) -> Result<Option<Tag>, StoreError> {
    conn.query_row(
        "SELECT id, name, color, created_at FROM tags WHERE id = ?1",
        params![id.0],
        tag_from_row,
    )
    .optional()?
    .map(into_tag)
    .transpose()
}
