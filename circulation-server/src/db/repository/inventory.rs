//! Inventory Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{InventoryItem, InventoryUpdate};
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const INVENTORY_TABLE: &str = "library_inventory";

#[derive(Clone)]
pub struct InventoryRepository {
    base: BaseRepository,
}

impl InventoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self, limit: usize, offset: usize) -> RepoResult<Vec<InventoryItem>> {
        let sql = format!(
            "SELECT * FROM library_inventory ORDER BY title LIMIT {} START {}",
            limit, offset
        );
        let items: Vec<InventoryItem> = self.base.db().query(&sql).await?.take(0)?;
        Ok(items)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<InventoryItem>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let item: Option<InventoryItem> = self.base.db().select(thing).await?;
        Ok(item)
    }

    pub async fn find_by_book_id(&self, book_id: &str) -> RepoResult<Option<InventoryItem>> {
        let book_id = book_id.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM library_inventory WHERE book_id = $book_id LIMIT 1")
            .bind(("book_id", book_id))
            .await?;
        let items: Vec<InventoryItem> = result.take(0)?;
        Ok(items.into_iter().next())
    }

    /// Resolve a desk search term: book_id first, then call number
    pub async fn resolve(&self, term: &str) -> RepoResult<Option<InventoryItem>> {
        if let Some(item) = self.find_by_book_id(term).await? {
            return Ok(Some(item));
        }
        let term = term.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM library_inventory WHERE call_number = $term LIMIT 1")
            .bind(("term", term))
            .await?;
        let items: Vec<InventoryItem> = result.take(0)?;
        Ok(items.into_iter().next())
    }

    /// Substring search over title, author and call number
    pub async fn search(&self, query: &str) -> RepoResult<Vec<InventoryItem>> {
        let pattern = query.to_lowercase();
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM library_inventory WHERE \
                 string::lowercase(title) CONTAINS $q \
                 OR string::lowercase(author ?? '') CONTAINS $q \
                 OR string::lowercase(call_number ?? '') CONTAINS $q \
                 ORDER BY title LIMIT 50",
            )
            .bind(("q", pattern))
            .await?;
        let items: Vec<InventoryItem> = result.take(0)?;
        Ok(items)
    }

    pub async fn create(&self, item: InventoryItem) -> RepoResult<InventoryItem> {
        let created: Option<InventoryItem> =
            self.base.db().create(INVENTORY_TABLE).content(item).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create inventory item".to_string()))
    }

    /// Update bibliographic fields; `total_copies` edits shift
    /// `available_copies` by the same delta inside one transaction so the
    /// outstanding-loan count is preserved.
    pub async fn update(&self, id: &str, data: InventoryUpdate) -> RepoResult<InventoryItem> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;

        if let Some(new_total) = data.total_copies {
            let mut result = self
                .base
                .db()
                .query(
                    "BEGIN TRANSACTION; \
                     LET $rows = (SELECT * FROM $thing); \
                     IF array::len($rows) == 0 { THROW 'inventory:not_found' }; \
                     LET $item = $rows[0]; \
                     LET $delta = $new_total - $item.total_copies; \
                     IF $item.available_copies + $delta < 0 { THROW 'inventory:copies_on_loan' }; \
                     UPDATE $thing SET total_copies = $new_total, \
                         available_copies += $delta, updated_at = $now; \
                     COMMIT TRANSACTION;",
                )
                .bind(("thing", thing.clone()))
                .bind(("new_total", new_total))
                .bind(("now", shared::util::now_millis()))
                .await?;
            // 事务 THROW 的业务码散落在各语句错误里，全部收集再匹配
            let errors = result.take_errors();
            if !errors.is_empty() {
                let joined = errors
                    .into_values()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(if joined.contains("inventory:not_found") {
                    RepoError::NotFound(format!("Inventory item {} not found", id))
                } else if joined.contains("inventory:copies_on_loan") {
                    RepoError::Validation(
                        "total_copies cannot drop below the number of copies on loan".to_string(),
                    )
                } else {
                    RepoError::Database(joined)
                });
            }
        }

        let mut set_parts: Vec<&str> = Vec::new();
        if data.title.is_some() {
            set_parts.push("title = $title");
        }
        if data.author.is_some() {
            set_parts.push("author = $author");
        }
        if data.call_number.is_some() {
            set_parts.push("call_number = $call_number");
        }
        if data.material_type.is_some() {
            set_parts.push("material_type = $material_type");
        }

        if !set_parts.is_empty() {
            set_parts.push("updated_at = $now");
            let query_str = format!("UPDATE $thing SET {} RETURN AFTER", set_parts.join(", "));
            let mut query = self
                .base
                .db()
                .query(&query_str)
                .bind(("thing", thing.clone()))
                .bind(("now", shared::util::now_millis()));
            if let Some(v) = data.title {
                query = query.bind(("title", v));
            }
            if let Some(v) = data.author {
                query = query.bind(("author", v));
            }
            if let Some(v) = data.call_number {
                query = query.bind(("call_number", v));
            }
            if let Some(v) = data.material_type {
                query = query.bind(("material_type", v));
            }
            let mut result = query.await?;
            let items: Vec<InventoryItem> = result.take(0)?;
            return items
                .into_iter()
                .next()
                .ok_or_else(|| RepoError::NotFound(format!("Inventory item {} not found", id)));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Inventory item {} not found", id)))
    }

    /// Hard delete — refused while copies are on loan or reservations open
    pub async fn delete(&self, id: &str) -> RepoResult<()> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Inventory item {} not found", id)))?;

        if existing.available_copies != existing.total_copies {
            return Err(RepoError::Validation(
                "Cannot delete an item with copies on loan".to_string(),
            ));
        }
        if existing.total_reservations > 0 {
            return Err(RepoError::Validation(
                "Cannot delete an item with open reservations".to_string(),
            ));
        }

        let _: Option<InventoryItem> = self.base.db().delete(thing).await?;
        Ok(())
    }
}
