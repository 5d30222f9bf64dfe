use crate::db::{self, Db, UnitOfWork};
use crate::error::{log_failure, AppError};
use crate::models::cosmetic::*;
use crate::models::currency::TransactionKind;
use crate::services::{ledger, progression};
use crate::validation;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COSMETIC_COLUMNS: &str =
    "c.id, c.name, c.slot, c.rarity, c.unlock_level, c.currency_cost, c.prestige_only";

const DEFAULT_LOADOUT_NAME: &str = "Default";

fn cosmetic_from_row(row: &Row<'_>) -> rusqlite::Result<CosmeticItem> {
    Ok(CosmeticItem {
        id: row.get(0)?,
        name: row.get(1)?,
        slot: row.get(2)?,
        rarity: row.get(3)?,
        unlock_level: row.get(4)?,
        currency_cost: row.get(5)?,
        prestige_only: row.get::<_, i64>(6)? != 0,
    })
}

fn query_ids(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<i64>, rusqlite::Error> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get(0))?;
    rows.collect()
}

pub fn find_cosmetic(
    conn: &Connection,
    cosmetic_id: i64,
) -> Result<Option<CosmeticItem>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {COSMETIC_COLUMNS} FROM cosmetics c WHERE c.id = ?1"),
        params![cosmetic_id],
        cosmetic_from_row,
    )
    .optional()
}

fn require_cosmetic(conn: &Connection, cosmetic_id: i64) -> Result<CosmeticItem, AppError> {
    find_cosmetic(conn, cosmetic_id)?.ok_or(AppError::CosmeticNotFound(cosmetic_id))
}

pub fn owns(conn: &Connection, player_id: i64, cosmetic_id: i64) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM player_cosmetics WHERE player_id = ?1 AND cosmetic_id = ?2)",
        params![player_id, cosmetic_id],
        |row| row.get(0),
    )
}

/// Records ownership. A second grant of the same pair reports
/// [`GrantOutcome::AlreadyOwned`] instead of failing.
pub fn grant_cosmetic(
    uow: &UnitOfWork<'_>,
    player_id: i64,
    cosmetic_id: i64,
    method: UnlockMethod,
) -> Result<GrantOutcome, rusqlite::Error> {
    let inserted = uow.execute(
        "INSERT INTO player_cosmetics (player_id, cosmetic_id, unlocked_at, unlock_method)
         VALUES (?1, ?2, ?3, ?4)",
        params![player_id, cosmetic_id, db::now(), method],
    );
    match inserted {
        Ok(_) => {
            tracing::info!(player_id, cosmetic_id, %method, "cosmetic granted");
            Ok(GrantOutcome::Granted)
        }
        Err(e) if db::is_unique_violation(&e) => Ok(GrantOutcome::AlreadyOwned),
        Err(e) => Err(e),
    }
}

pub fn level_up_rewards(
    conn: &Connection,
    old_level: i64,
    new_level: i64,
) -> Result<Vec<i64>, rusqlite::Error> {
    query_ids(
        conn,
        "SELECT id FROM cosmetics
         WHERE prestige_only = 0 AND currency_cost = 0
           AND unlock_level > ?1 AND unlock_level <= ?2
         ORDER BY id",
        params![old_level, new_level],
    )
}

pub fn prestige_rewards(
    conn: &Connection,
    player_id: i64,
    tier: i64,
) -> Result<Vec<i64>, rusqlite::Error> {
    query_ids(
        conn,
        "SELECT c.id FROM cosmetics c
         WHERE c.prestige_only = 1 AND c.unlock_level = ?2
           AND NOT EXISTS (
               SELECT 1 FROM player_cosmetics pc
               WHERE pc.player_id = ?1 AND pc.cosmetic_id = c.id)
         ORDER BY c.id",
        params![player_id, tier],
    )
}

pub fn get_catalog(db: &Db) -> Result<Vec<CosmeticItem>, AppError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COSMETIC_COLUMNS} FROM cosmetics c ORDER BY c.id"
        ))?;
        let rows = stmt.query_map([], cosmetic_from_row)?;
        rows.collect::<Result<Vec<_>, _>>()
    })
    .map_err(|e| {
        tracing::error!(operation = "get_catalog", error = %e, "storage failure");
        AppError::from(e)
    })
}

pub fn get_owned_cosmetics(db: &Db, player_id: i64) -> Result<Vec<OwnedCosmetic>, AppError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COSMETIC_COLUMNS}, pc.unlocked_at, pc.unlock_method
             FROM player_cosmetics pc JOIN cosmetics c ON c.id = pc.cosmetic_id
             WHERE pc.player_id = ?1
             ORDER BY pc.unlocked_at, c.id"
        ))?;
        let rows = stmt.query_map(params![player_id], |row| {
            Ok(OwnedCosmetic {
                item: cosmetic_from_row(row)?,
                unlocked_at: row.get(7)?,
                unlock_method: row.get(8)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>()
    })
    .map_err(AppError::from)
    .map_err(log_failure(player_id, "get_owned_cosmetics"))
}

pub fn purchase_cosmetic(
    db: &Db,
    player_id: i64,
    cosmetic_id: i64,
) -> Result<PurchaseResult, AppError> {
    db.unit_of_work(|uow| {
        let item = require_cosmetic(uow, cosmetic_id)?;
        if owns(uow, player_id, cosmetic_id)? {
            return Err(AppError::CosmeticAlreadyOwned(cosmetic_id));
        }

        let reference = cosmetic_id.to_string();
        let debit = ledger::apply_currency_delta(
            uow,
            player_id,
            -item.currency_cost,
            TransactionKind::Purchase,
            Some(&reference),
        )?;
        let balance = match debit {
            Some(txn) => txn.balance_after,
            None => progression::load_or_create(uow, player_id)?.currency_balance,
        };

        // A concurrent grant between the check above and here surfaces as a
        // key conflict; failing rolls the debit back with it.
        if grant_cosmetic(uow, player_id, cosmetic_id, UnlockMethod::Purchase)?
            == GrantOutcome::AlreadyOwned
        {
            return Err(AppError::CosmeticAlreadyOwned(cosmetic_id));
        }

        Ok(PurchaseResult {
            cosmetic_id,
            cost: item.currency_cost,
            balance,
        })
    })
    .map_err(log_failure(player_id, "purchase_cosmetic"))
}

fn find_active_loadout(conn: &Connection, player_id: i64) -> Result<Option<i64>, rusqlite::Error> {
    conn.query_row(
        "SELECT id FROM loadouts WHERE player_id = ?1 AND is_active = 1",
        params![player_id],
        |row| row.get(0),
    )
    .optional()
}

/// Returns the player's active loadout, activating the oldest one or
/// creating a default one when none is active.
fn active_loadout_id(uow: &UnitOfWork<'_>, player_id: i64) -> Result<i64, rusqlite::Error> {
    if let Some(id) = find_active_loadout(uow, player_id)? {
        return Ok(id);
    }

    let oldest: Option<i64> = uow
        .query_row(
            "SELECT id FROM loadouts WHERE player_id = ?1 ORDER BY id LIMIT 1",
            params![player_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = oldest {
        uow.execute("UPDATE loadouts SET is_active = 1 WHERE id = ?1", params![id])?;
        return Ok(id);
    }

    uow.execute(
        "INSERT INTO loadouts (player_id, name, is_active, created_at) VALUES (?1, ?2, 1, ?3)",
        params![player_id, DEFAULT_LOADOUT_NAME, db::now()],
    )?;
    let id = uow.last_insert_rowid();
    tracing::debug!(player_id, loadout_id = id, "default loadout created");
    Ok(id)
}

pub fn equip_cosmetic(db: &Db, player_id: i64, cosmetic_id: i64) -> Result<(), AppError> {
    db.unit_of_work(|uow| {
        let item = require_cosmetic(uow, cosmetic_id)?;
        if !owns(uow, player_id, cosmetic_id)? {
            return Err(AppError::CosmeticNotOwned(cosmetic_id));
        }

        let loadout_id = active_loadout_id(uow, player_id)?;
        uow.execute(
            "DELETE FROM loadout_slots WHERE loadout_id = ?1 AND slot = ?2",
            params![loadout_id, item.slot],
        )?;
        uow.execute(
            "INSERT INTO loadout_slots (loadout_id, slot, cosmetic_id) VALUES (?1, ?2, ?3)",
            params![loadout_id, item.slot, cosmetic_id],
        )?;

        tracing::info!(
            player_id,
            loadout_id,
            cosmetic_id,
            slot = %item.slot,
            "cosmetic equipped"
        );
        Ok(())
    })
    .map_err(log_failure(player_id, "equip_cosmetic"))
}

pub fn unequip_slot(db: &Db, player_id: i64, slot: Slot) -> Result<(), AppError> {
    db.unit_of_work(|uow| {
        let Some(loadout_id) = find_active_loadout(uow, player_id)? else {
            return Ok(());
        };
        uow.execute(
            "DELETE FROM loadout_slots WHERE loadout_id = ?1 AND slot = ?2",
            params![loadout_id, slot],
        )?;
        Ok(())
    })
    .map_err(log_failure(player_id, "unequip_slot"))
}

fn loadout_slots(
    conn: &Connection,
    loadout_id: i64,
) -> Result<Vec<SlotAssignment>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT slot, cosmetic_id FROM loadout_slots WHERE loadout_id = ?1 ORDER BY slot",
    )?;
    let rows = stmt.query_map(params![loadout_id], |row| {
        Ok(SlotAssignment {
            slot: row.get(0)?,
            cosmetic_id: row.get(1)?,
        })
    })?;
    rows.collect()
}

pub fn list_loadouts(db: &Db, player_id: i64) -> Result<Vec<Loadout>, AppError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, name, is_active, created_at FROM loadouts
             WHERE player_id = ?1 ORDER BY id",
        )?;
        let headers = stmt
            .query_map(params![player_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)? != 0,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut loadouts = Vec::with_capacity(headers.len());
        for (id, name, is_active, created_at) in headers {
            loadouts.push(Loadout {
                id,
                name,
                is_active,
                created_at,
                slots: loadout_slots(conn, id)?,
            });
        }
        Ok(loadouts)
    })
    .map_err(AppError::from)
    .map_err(log_failure(player_id, "list_loadouts"))
}

// The player's first loadout starts active.
pub fn create_loadout(
    db: &Db,
    player_id: i64,
    req: CreateLoadoutRequest,
) -> Result<Loadout, AppError> {
    let name = validation::validate_loadout_name(&req.name)?;

    db.unit_of_work(|uow| {
        let has_any: bool = uow.query_row(
            "SELECT EXISTS(SELECT 1 FROM loadouts WHERE player_id = ?1)",
            params![player_id],
            |row| row.get(0),
        )?;
        let created_at = db::now();
        let inserted = uow.execute(
            "INSERT INTO loadouts (player_id, name, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![player_id, name, !has_any, created_at],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if db::is_unique_violation(&e) => {
                return Err(AppError::BadRequest(format!("Loadout {name} already exists")));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Loadout {
            id: uow.last_insert_rowid(),
            name: name.clone(),
            is_active: !has_any,
            created_at,
            slots: Vec::new(),
        })
    })
    .map_err(log_failure(player_id, "create_loadout"))
}

pub fn activate_loadout(db: &Db, player_id: i64, loadout_id: i64) -> Result<(), AppError> {
    db.unit_of_work(|uow| {
        let exists: bool = uow.query_row(
            "SELECT EXISTS(SELECT 1 FROM loadouts WHERE id = ?1 AND player_id = ?2)",
            params![loadout_id, player_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(AppError::LoadoutNotFound(loadout_id));
        }

        uow.execute(
            "UPDATE loadouts SET is_active = 0 WHERE player_id = ?1 AND is_active = 1",
            params![player_id],
        )?;
        uow.execute("UPDATE loadouts SET is_active = 1 WHERE id = ?1", params![loadout_id])?;
        tracing::info!(player_id, loadout_id, "loadout activated");
        Ok(())
    })
    .map_err(log_failure(player_id, "activate_loadout"))
}
