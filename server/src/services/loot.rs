use crate::db::Db;
use crate::error::{log_failure, AppError};
use crate::models::cosmetic::{GrantOutcome, UnlockMethod};
use crate::models::loot::*;
use crate::services::cosmetics;
use rand::Rng;
use rusqlite::{params, Connection};

fn active_tables(conn: &Connection) -> Result<Vec<LootTable>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, name, drop_probability, is_active FROM loot_tables
         WHERE is_active = 1 ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(LootTable {
            id: row.get(0)?,
            name: row.get(1)?,
            drop_probability: row.get(2)?,
            is_active: row.get::<_, i64>(3)? != 0,
        })
    })?;
    rows.collect()
}

fn table_entries(
    conn: &Connection,
    loot_table_id: i64,
) -> Result<Vec<LootTableEntry>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT id, loot_table_id, cosmetic_id, weight, min_quantity, max_quantity
         FROM loot_table_entries WHERE loot_table_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![loot_table_id], |row| {
        Ok(LootTableEntry {
            id: row.get(0)?,
            loot_table_id: row.get(1)?,
            cosmetic_id: row.get(2)?,
            weight: row.get(3)?,
            min_quantity: row.get(4)?,
            max_quantity: row.get(5)?,
        })
    })?;
    rows.collect()
}

pub fn select_table<'a, R: Rng + ?Sized>(
    tables: &'a [LootTable],
    rng: &mut R,
) -> Option<&'a LootTable> {
    tables
        .iter()
        .find(|table| rng.gen::<f64>() < table.drop_probability)
}

pub fn pick_by_weight(entries: &[LootTableEntry], roll: i64) -> Option<&LootTableEntry> {
    let mut cumulative = 0i64;
    entries.iter().find(|entry| {
        cumulative = cumulative.saturating_add(entry.weight);
        roll < cumulative
    })
}

pub fn roll_entry<'a, R: Rng + ?Sized>(
    loot_table_id: i64,
    entries: &'a [LootTableEntry],
    rng: &mut R,
) -> Result<&'a LootTableEntry, AppError> {
    if entries.is_empty() {
        return Err(AppError::EmptyLootTable(loot_table_id));
    }
    let total_weight = entries
        .iter()
        .fold(0i64, |sum, entry| sum.saturating_add(entry.weight));
    if total_weight <= 0 {
        return Err(AppError::NonPositiveWeight(loot_table_id));
    }

    let roll = rng.gen_range(0..total_weight);
    pick_by_weight(entries, roll).ok_or(AppError::NonPositiveWeight(loot_table_id))
}

/// Dropping something the player already owns still succeeds as a duplicate.
pub fn generate_loot_drop<R: Rng + ?Sized>(
    db: &Db,
    player_id: i64,
    rng: &mut R,
) -> Result<LootDrop, AppError> {
    db.unit_of_work(|uow| {
        let tables = active_tables(uow)?;
        if tables.is_empty() {
            return Err(AppError::NoActiveLootTables);
        }
        let table = select_table(&tables, rng).ok_or(AppError::NoDropFromAnyTable)?;

        let entries = table_entries(uow, table.id)?;
        let entry = roll_entry(table.id, &entries, rng)?;

        let cosmetic = cosmetics::find_cosmetic(uow, entry.cosmetic_id)?.ok_or_else(|| {
            AppError::NotFound(format!(
                "cosmetic {} referenced by loot table entry {}",
                entry.cosmetic_id, entry.id
            ))
        })?;

        let outcome =
            cosmetics::grant_cosmetic(uow, player_id, cosmetic.id, UnlockMethod::LootDrop)?;
        let duplicate = outcome == GrantOutcome::AlreadyOwned;
        tracing::info!(
            player_id,
            loot_table_id = table.id,
            cosmetic_id = cosmetic.id,
            duplicate,
            "loot dropped"
        );

        Ok(LootDrop {
            loot_table_id: table.id,
            duplicate,
            cosmetic,
        })
    })
    .map_err(log_failure(player_id, "generate_loot_drop"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cosmetic::{Rarity, Slot};
    use crate::services::fixtures;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn entry(id: i64, weight: i64) -> LootTableEntry {
        LootTableEntry {
            id,
            loot_table_id: 1,
            cosmetic_id: id,
            weight,
            min_quantity: 1,
            max_quantity: 1,
        }
    }

    #[test]
    fn test_pick_by_weight_walks_cumulative_ranges() {
        let entries = [entry(1, 1), entry(2, 3), entry(3, 2)];
        assert_eq!(pick_by_weight(&entries, 0).unwrap().id, 1);
        assert_eq!(pick_by_weight(&entries, 1).unwrap().id, 2);
        assert_eq!(pick_by_weight(&entries, 3).unwrap().id, 2);
        assert_eq!(pick_by_weight(&entries, 4).unwrap().id, 3);
        assert_eq!(pick_by_weight(&entries, 5).unwrap().id, 3);
        assert!(pick_by_weight(&entries, 6).is_none());
    }

    #[test]
    fn test_weighted_ratio_converges() {
        let entries = [entry(1, 1), entry(2, 3)];
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);
        let draws = 100_000;
        let mut heavy = 0;
        for _ in 0..draws {
            if roll_entry(1, &entries, &mut rng).unwrap().id == 2 {
                heavy += 1;
            }
        }
        let ratio = heavy as f64 / draws as f64;
        assert!((ratio - 0.75).abs() < 0.01, "ratio was {ratio}");
    }

    #[test]
    fn test_roll_entry_rejects_bad_tables() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            roll_entry(4, &[], &mut rng).unwrap_err(),
            AppError::EmptyLootTable(4)
        ));
        assert!(matches!(
            roll_entry(5, &[entry(1, 0), entry(2, 0)], &mut rng).unwrap_err(),
            AppError::NonPositiveWeight(5)
        ));
    }

    #[test]
    fn test_no_active_tables() {
        let db = Db::open_in_memory().unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        assert!(matches!(
            generate_loot_drop(&db, 1, &mut rng).unwrap_err(),
            AppError::NoActiveLootTables
        ));

        fixtures::loot_table(&db, "Retired", 1.0, false);
        assert!(matches!(
            generate_loot_drop(&db, 1, &mut rng).unwrap_err(),
            AppError::NoActiveLootTables
        ));
    }

    #[test]
    fn test_zero_chance_tables_never_drop() {
        let db = Db::open_in_memory().unwrap();
        let skin = fixtures::cosmetic(&db, "Ash", Slot::WeaponSkin, Rarity::Common, 1, 0, false);
        let table = fixtures::loot_table(&db, "Never", 0.0, true);
        fixtures::loot_entry(&db, table, skin, 1);

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(matches!(
                generate_loot_drop(&db, 1, &mut rng).unwrap_err(),
                AppError::NoDropFromAnyTable
            ));
        }
        assert_eq!(fixtures::ownership_count(&db, 1), 0);
    }

    #[test]
    fn test_selected_table_without_entries() {
        let db = Db::open_in_memory().unwrap();
        let table = fixtures::loot_table(&db, "Empty", 1.0, true);
        let mut rng = StdRng::seed_from_u64(4);
        let err = generate_loot_drop(&db, 1, &mut rng).unwrap_err();
        assert!(matches!(err, AppError::EmptyLootTable(id) if id == table));
    }

    #[test]
    fn test_first_guaranteed_table_wins() {
        let db = Db::open_in_memory().unwrap();
        let first = fixtures::cosmetic(&db, "First", Slot::Emote, Rarity::Common, 1, 0, false);
        let second = fixtures::cosmetic(&db, "Second", Slot::Emote, Rarity::Common, 1, 0, false);
        let table_a = fixtures::loot_table(&db, "A", 1.0, true);
        let table_b = fixtures::loot_table(&db, "B", 1.0, true);
        fixtures::loot_entry(&db, table_a, first, 1);
        fixtures::loot_entry(&db, table_b, second, 1);

        let mut rng = StdRng::seed_from_u64(5);
        let drop = generate_loot_drop(&db, 1, &mut rng).unwrap();
        assert_eq!(drop.loot_table_id, table_a);
        assert_eq!(drop.cosmetic.id, first);
        assert_eq!(drop.cosmetic.name, "First");
    }

    #[test]
    fn test_duplicate_drop_is_a_noop() {
        let db = Db::open_in_memory().unwrap();
        let taunt = fixtures::cosmetic(&db, "Laugh", Slot::Taunt, Rarity::Uncommon, 1, 0, false);
        let table = fixtures::loot_table(&db, "Only", 1.0, true);
        fixtures::loot_entry(&db, table, taunt, 5);

        let mut rng = StdRng::seed_from_u64(6);
        let first = generate_loot_drop(&db, 1, &mut rng).unwrap();
        assert!(!first.duplicate);
        let second = generate_loot_drop(&db, 1, &mut rng).unwrap();
        assert!(second.duplicate);
        assert_eq!(second.cosmetic.id, taunt);
        assert_eq!(fixtures::ownership_count(&db, 1), 1);

        let owned = cosmetics::get_owned_cosmetics(&db, 1).unwrap();
        assert_eq!(owned[0].unlock_method, UnlockMethod::LootDrop);
    }
}
