//! Catalog and loot-table rows for tests. The catalog is managed outside
//! this service, so tests insert it directly.

use crate::db::Db;
use crate::models::cosmetic::{Rarity, Slot, UnlockMethod};
use crate::services::{cosmetics, progression};
use rusqlite::params;

pub fn cosmetic(
    db: &Db,
    name: &str,
    slot: Slot,
    rarity: Rarity,
    unlock_level: i64,
    currency_cost: i64,
    prestige_only: bool,
) -> i64 {
    db.unit_of_work::<_, _, rusqlite::Error>(|uow| {
        uow.execute(
            "INSERT INTO cosmetics (name, slot, rarity, unlock_level, currency_cost, prestige_only)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![name, slot, rarity, unlock_level, currency_cost, prestige_only],
        )?;
        Ok(uow.last_insert_rowid())
    })
    .unwrap()
}

pub fn loot_table(db: &Db, name: &str, drop_probability: f64, is_active: bool) -> i64 {
    db.unit_of_work::<_, _, rusqlite::Error>(|uow| {
        uow.execute(
            "INSERT INTO loot_tables (name, drop_probability, is_active) VALUES (?1, ?2, ?3)",
            params![name, drop_probability, is_active],
        )?;
        Ok(uow.last_insert_rowid())
    })
    .unwrap()
}

pub fn loot_entry(db: &Db, loot_table_id: i64, cosmetic_id: i64, weight: i64) -> i64 {
    db.unit_of_work::<_, _, rusqlite::Error>(|uow| {
        uow.execute(
            "INSERT INTO loot_table_entries (loot_table_id, cosmetic_id, weight)
             VALUES (?1, ?2, ?3)",
            params![loot_table_id, cosmetic_id, weight],
        )?;
        Ok(uow.last_insert_rowid())
    })
    .unwrap()
}

pub fn grant(db: &Db, player_id: i64, cosmetic_id: i64) {
    db.unit_of_work(|uow| {
        cosmetics::grant_cosmetic(uow, player_id, cosmetic_id, UnlockMethod::Purchase)
    })
    .unwrap();
}

pub fn add_experience(db: &Db, player_id: i64, xp: i64) {
    db.unit_of_work(|uow| {
        progression::ensure_record(uow, player_id)?;
        progression::add_experience(uow, player_id, xp)
    })
    .unwrap();
}

pub fn ownership_count(db: &Db, player_id: i64) -> i64 {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT COUNT(*) FROM player_cosmetics WHERE player_id = ?1",
            params![player_id],
            |row| row.get(0),
        )
    })
    .unwrap()
}
