use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_datetime, now, parse_datetime};
use crate::models::{Asset, NewAsset};
use crate::repository::AssetRepository;

const ASSET_COLUMNS: &str = "id, storage_key, url, name, mime, size, car_id, created_at";

fn parse_asset_row(row: &Row) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: row.get(0)?,
        storage_key: row.get(1)?,
        url: row.get(2)?,
        name: row.get(3)?,
        mime: row.get(4)?,
        size: row.get(5)?,
        car_id: row.get(6)?,
        created_at: parse_datetime(7, &row.get::<_, String>(7)?)?,
    })
}

impl AssetRepository for Connection {
    fn insert_asset(&self, asset: &NewAsset) -> anyhow::Result<Asset> {
        self.execute(
            "INSERT INTO assets (storage_key, url, name, mime, size, car_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                asset.storage_key,
                asset.url,
                asset.name,
                asset.mime,
                asset.size,
                asset.car_id,
                format_datetime(&now()),
            ],
        )
        .context("failed to insert asset")?;

        let id = self.last_insert_rowid();
        self.find_asset(id)?
            .with_context(|| format!("asset {id} missing after insert"))
    }

    fn find_asset(&self, id: i64) -> anyhow::Result<Option<Asset>> {
        let asset = self
            .query_row(
                &format!("SELECT {ASSET_COLUMNS} FROM assets WHERE id = ?1"),
                params![id],
                parse_asset_row,
            )
            .optional()
            .context("failed to load asset")?;
        Ok(asset)
    }

    fn assets_for_car(&self, car_id: i64) -> anyhow::Result<Vec<Asset>> {
        let mut stmt = self.prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM assets WHERE car_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![car_id], parse_asset_row)?;
        let assets = rows
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("failed to load car images")?;
        Ok(assets)
    }

    fn delete_asset(&self, id: i64) -> anyhow::Result<bool> {
        let count = self
            .execute("DELETE FROM assets WHERE id = ?1", params![id])
            .context("failed to delete asset")?;
        Ok(count > 0)
    }
}
