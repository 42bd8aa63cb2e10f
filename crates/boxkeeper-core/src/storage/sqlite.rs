//! SQLite-backed document store.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::documents::DocumentStore;
use super::{data_dir, migrations};
use crate::error::{CoreError, StoreError};
use crate::model::{BoxDocument, ItemDocument};

pub struct SqliteDocumentStore {
    conn: Connection,
}

/// Raw row before timestamp decoding.
struct ItemRow {
    id: String,
    name: String,
    takeout: bool,
    box_id: String,
    created_at: String,
    modified_at: String,
}

impl SqliteDocumentStore {
    /// Open `~/.config/boxkeeper/boxkeeper.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be resolved or the
    /// store cannot be opened or migrated.
    pub fn open_default() -> Result<Self, CoreError> {
        let path = data_dir()?.join("boxkeeper.db");
        Ok(Self::open(&path)?)
    }

    /// Open (creating if needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        migrations::migrate(&conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn select_items(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<ItemDocument>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, read_item_row)?;
        let mut docs = Vec::new();
        for row in rows {
            docs.push(decode_item(row?)?);
        }
        Ok(docs)
    }
}

const ITEM_COLUMNS: &str = "id, name, takeout, box_id, created_at, modified_at";

fn read_item_row(row: &Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        name: row.get(1)?,
        takeout: row.get(2)?,
        box_id: row.get(3)?,
        created_at: row.get(4)?,
        modified_at: row.get(5)?,
    })
}

fn decode_item(row: ItemRow) -> Result<ItemDocument, StoreError> {
    Ok(ItemDocument {
        created_at: parse_timestamp(&row.id, &row.created_at)?,
        modified_at: parse_timestamp(&row.id, &row.modified_at)?,
        id: row.id,
        name: row.name,
        takeout: row.takeout,
        box_id: row.box_id,
    })
}

/// Fixed-width UTC so `ORDER BY created_at` sorts chronologically.
fn encode_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            id: id.to_string(),
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

impl DocumentStore for SqliteDocumentStore {
    fn put_item(&mut self, doc: ItemDocument) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO items (id, name, takeout, box_id, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                takeout = excluded.takeout,
                box_id = excluded.box_id,
                created_at = excluded.created_at,
                modified_at = excluded.modified_at",
            params![
                doc.id,
                doc.name,
                doc.takeout,
                doc.box_id,
                encode_timestamp(doc.created_at),
                encode_timestamp(doc.modified_at),
            ],
        )?;
        Ok(())
    }

    fn get_item(&self, id: &str) -> Result<Option<ItemDocument>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id],
                read_item_row,
            )
            .optional()?;
        row.map(decode_item).transpose()
    }

    fn delete_item(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(self.conn.execute("DELETE FROM items WHERE id = ?1", params![id])? > 0)
    }

    fn put_box(&mut self, doc: BoxDocument) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO boxes (id, name, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                created_at = excluded.created_at,
                modified_at = excluded.modified_at",
            params![doc.id, doc.name, encode_timestamp(doc.created_at), encode_timestamp(doc.modified_at)],
        )?;
        Ok(())
    }

    fn get_box(&self, id: &str) -> Result<Option<BoxDocument>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, created_at, modified_at FROM boxes WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        row.map(|(id, name, created_at, modified_at)| decode_box(id, name, &created_at, &modified_at))
            .transpose()
    }

    fn delete_box(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(self.conn.execute("DELETE FROM boxes WHERE id = ?1", params![id])? > 0)
    }

    fn items(&self) -> Result<Vec<ItemDocument>, StoreError> {
        self.select_items(
            &format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY created_at, id"),
            [],
        )
    }

    fn boxes(&self) -> Result<Vec<BoxDocument>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, created_at, modified_at FROM boxes ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut docs = Vec::new();
        for row in rows {
            let (id, name, created_at, modified_at) = row?;
            docs.push(decode_box(id, name, &created_at, &modified_at)?);
        }
        Ok(docs)
    }

    fn items_in_box(&self, box_id: &str) -> Result<Vec<ItemDocument>, StoreError> {
        self.select_items(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE box_id = ?1 ORDER BY created_at, id"),
            params![box_id],
        )
    }
}

fn decode_box(id: String, name: String, created_at: &str, modified_at: &str) -> Result<BoxDocument, StoreError> {
    Ok(BoxDocument {
        created_at: parse_timestamp(&id, created_at)?,
        modified_at: parse_timestamp(&id, modified_at)?,
        id,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::SettingsView;
    use crate::model::{Item, ItemBox};
    use chrono::Duration;

    fn item_doc(id: &str, box_id: &str, offset_secs: i64) -> ItemDocument {
        let item = Item::new(id, format!("{id} name"), Utc::now() + Duration::seconds(offset_secs));
        ItemDocument::from_item(&item, box_id)
    }

    #[test]
    fn put_get_delete_item() {
        let mut store = SqliteDocumentStore::open_memory().unwrap();
        let doc = item_doc("a", "kitchen", 0);
        store.put_item(doc.clone()).unwrap();

        let loaded = store.get_item("a").unwrap().unwrap();
        assert_eq!(loaded.box_id, "kitchen");
        assert_eq!(loaded.created_at.timestamp_millis(), doc.created_at.timestamp_millis());

        let mut moved = doc.clone();
        moved.box_id = "garage".into();
        moved.takeout = true;
        store.put_item(moved).unwrap();
        let loaded = store.get_item("a").unwrap().unwrap();
        assert_eq!(loaded.box_id, "garage");
        assert!(loaded.takeout);

        assert!(store.delete_item("a").unwrap());
        assert!(store.get_item("a").unwrap().is_none());
        assert!(!store.delete_item("a").unwrap());
    }

    #[test]
    fn items_in_box_is_oldest_first() {
        let mut store = SqliteDocumentStore::open_memory().unwrap();
        store.put_item(item_doc("late", "kitchen", 30)).unwrap();
        store.put_item(item_doc("early", "kitchen", 0)).unwrap();
        store.put_item(item_doc("elsewhere", "garage", 10)).unwrap();

        let ids: Vec<String> = store
            .items_in_box("kitchen")
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["early", "late"]);
    }

    #[test]
    fn box_documents_roundtrip() {
        let mut store = SqliteDocumentStore::open_memory().unwrap();
        let doc = BoxDocument::from_box(&ItemBox::new("b1", "Kitchen", Utc::now()));
        store.put_box(doc.clone()).unwrap();
        assert_eq!(store.get_box("b1").unwrap().unwrap().name, "Kitchen");
        assert_eq!(store.boxes().unwrap().len(), 1);

        assert!(store.delete_box("b1").unwrap());
        assert!(store.get_box("b1").unwrap().is_none());
    }

    #[test]
    fn reopen_keeps_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boxkeeper.db");
        {
            let mut store = SqliteDocumentStore::open(&path).unwrap();
            store
                .put_box(BoxDocument::from_box(&ItemBox::new("b1", "Kitchen", Utc::now())))
                .unwrap();
            store.put_item(item_doc("a", "b1", 0)).unwrap();
        }

        let store = SqliteDocumentStore::open(&path).unwrap();
        let snapshot = store.load_snapshot(SettingsView::default()).unwrap();
        assert_eq!(snapshot.boxes["b1"], vec!["a".to_string()]);
        assert_eq!(snapshot.box_names["b1"], "Kitchen");
    }

    #[test]
    fn corrupt_timestamp_is_reported() {
        let store = SqliteDocumentStore::open_memory().unwrap();
        store
            .conn()
            .execute(
                "INSERT INTO items (id, name, takeout, box_id, created_at, modified_at)
                 VALUES ('bad', 'x', 0, 'b', 'yesterday', 'yesterday')",
                [],
            )
            .unwrap();
        assert!(matches!(store.items(), Err(StoreError::Corrupt { .. })));
    }
}
