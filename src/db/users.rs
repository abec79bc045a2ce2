use anyhow::Context;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_datetime, now, parse_datetime};
use crate::models::{NewUser, ProfilePatch, User};
use crate::repository::UserRepository;

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        bio: row.get(4)?,
        profile_image_id: row.get(5)?,
        created_at: parse_datetime(6, &row.get::<_, String>(6)?)?,
        updated_at: parse_datetime(7, &row.get::<_, String>(7)?)?,
    })
}

impl UserRepository for Connection {
    fn insert_user(&self, user: &NewUser) -> anyhow::Result<User> {
        let ts = format_datetime(&now());
        self.execute(
            "INSERT INTO users (name, email, phone, bio, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![user.name, user.email, user.phone, user.bio, ts],
        )
        .context("failed to insert user")?;

        let id = self.last_insert_rowid();
        self.find_user(id)?
            .with_context(|| format!("user {id} missing after insert"))
    }

    fn find_user(&self, id: i64) -> anyhow::Result<Option<User>> {
        let user = self
            .query_row(
                "SELECT id, name, email, phone, bio, profile_image_id, created_at, updated_at
                 FROM users WHERE id = ?1",
                params![id],
                parse_user_row,
            )
            .optional()
            .context("failed to load user")?;
        Ok(user)
    }

    fn update_profile(&self, id: i64, patch: &ProfilePatch) -> anyhow::Result<Option<User>> {
        let mut sets = vec!["updated_at = ?1".to_string()];
        let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(format_datetime(&now()))];

        for (column, value) in [
            ("name", &patch.name),
            ("email", &patch.email),
            ("phone", &patch.phone),
            ("bio", &patch.bio),
        ] {
            if let Some(value) = value {
                params_vec.push(Box::new(value.clone()));
                sets.push(format!("{column} = ?{}", params_vec.len()));
            }
        }

        params_vec.push(Box::new(id));
        let sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            sets.join(", "),
            params_vec.len()
        );
        let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        let count = self
            .execute(&sql, params_refs.as_slice())
            .context("failed to update profile")?;
        if count == 0 {
            return Ok(None);
        }
        self.find_user(id)
    }

    fn set_profile_image(&self, user_id: i64, asset_id: i64) -> anyhow::Result<bool> {
        let count = self
            .execute(
                "UPDATE users SET profile_image_id = ?1, updated_at = ?2 WHERE id = ?3",
                params![asset_id, format_datetime(&now()), user_id],
            )
            .context("failed to set profile image")?;
        Ok(count > 0)
    }
}
