use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{Category, CategoryWithCount};
use crate::repository::CategoryRepository;

impl CategoryRepository for Connection {
    fn insert_category(&self, name: &str) -> anyhow::Result<Category> {
        self.execute("INSERT INTO categories (name) VALUES (?1)", params![name])
            .context("failed to insert category")?;
        Ok(Category {
            id: self.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn find_category(&self, id: i64) -> anyhow::Result<Option<Category>> {
        let category = self
            .query_row(
                "SELECT id, name FROM categories WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Category {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("failed to load category")?;
        Ok(category)
    }

    fn categories_with_count(&self) -> anyhow::Result<Vec<CategoryWithCount>> {
        let mut stmt = self.prepare(
            "SELECT cat.id, cat.name, COUNT(c.id)
             FROM categories cat
             LEFT JOIN cars c ON c.category_id = cat.id AND c.is_available = 1
             GROUP BY cat.id, cat.name
             ORDER BY cat.id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CategoryWithCount {
                category: Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                },
                car_count: row.get::<_, i64>(2)? as u64,
            })
        })?;
        let categories = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load categories")?;
        Ok(categories)
    }
}
