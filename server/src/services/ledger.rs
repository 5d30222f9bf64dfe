use crate::db::{self, Db, UnitOfWork};
use crate::error::{log_failure, AppError};
use crate::models::currency::*;
use crate::services::progression;
use rusqlite::{params, Connection, OptionalExtension, Row};

const MAX_HISTORY: i64 = 200;

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<CurrencyTransaction> {
    Ok(CurrencyTransaction {
        id: row.get(0)?,
        player_id: row.get(1)?,
        amount: row.get(2)?,
        balance_after: row.get(3)?,
        kind: row.get(4)?,
        reference_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn current_balance(conn: &Connection, player_id: i64) -> Result<i64, rusqlite::Error> {
    Ok(conn
        .query_row(
            "SELECT currency_balance FROM player_progression WHERE player_id = ?1",
            params![player_id],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0))
}

/// Credits or debits the player's balance and appends the matching ledger
/// row, both inside `uow`.
///
/// A zero amount is a no-op and returns `None`. A debit larger than the
/// balance fails with [`AppError::InsufficientCurrency`] without writing.
pub fn apply_currency_delta(
    uow: &UnitOfWork<'_>,
    player_id: i64,
    amount: i64,
    kind: TransactionKind,
    reference_id: Option<&str>,
) -> Result<Option<CurrencyTransaction>, AppError> {
    if amount == 0 {
        return Ok(None);
    }
    progression::ensure_record(uow, player_id)?;
    let balance = current_balance(uow, player_id)?;
    if balance.checked_add(amount).is_none() {
        return Err(AppError::BadRequest(format!(
            "Amount {amount} overflows balance {balance}"
        )));
    }

    let Some(balance_after) = progression::adjust_balance(uow, player_id, amount)? else {
        return Err(AppError::InsufficientCurrency {
            balance,
            required: amount.saturating_neg(),
        });
    };

    let created_at = db::now();
    uow.execute(
        "INSERT INTO currency_transactions
         (player_id, amount, balance_after, kind, reference_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![player_id, amount, balance_after, kind, reference_id, created_at],
    )?;
    let id = uow.last_insert_rowid();

    tracing::info!(player_id, amount, balance_after, %kind, "currency delta applied");

    Ok(Some(CurrencyTransaction {
        id,
        player_id,
        amount,
        balance_after,
        kind,
        reference_id: reference_id.map(str::to_string),
        created_at,
    }))
}

pub fn grant_currency(
    db: &Db,
    player_id: i64,
    req: CurrencyGrantRequest,
) -> Result<CurrencyTransaction, AppError> {
    let kind = req.kind.unwrap_or(TransactionKind::AdminGrant);
    if !matches!(
        kind,
        TransactionKind::AdminGrant | TransactionKind::Refund | TransactionKind::Other
    ) {
        return Err(AppError::BadRequest(format!(
            "Transaction kind {kind} cannot be granted directly"
        )));
    }
    if req.amount == 0 {
        return Err(AppError::BadRequest("Amount must be non-zero".into()));
    }

    db.unit_of_work(|uow| {
        apply_currency_delta(uow, player_id, req.amount, kind, req.reference_id.as_deref())?
            .ok_or_else(|| AppError::Internal("non-zero delta produced no transaction".into()))
    })
    .map_err(log_failure(player_id, "grant_currency"))
}

/// Newest first.
pub fn get_transactions(
    db: &Db,
    player_id: i64,
    limit: i64,
) -> Result<Vec<CurrencyTransaction>, AppError> {
    let limit = limit.clamp(1, MAX_HISTORY);

    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, player_id, amount, balance_after, kind, reference_id, created_at
             FROM currency_transactions WHERE player_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![player_id, limit], transaction_from_row)?;
        rows.collect::<Result<Vec<_>, _>>()
    })
    .map_err(AppError::from)
    .map_err(log_failure(player_id, "get_transactions"))
}

pub fn audit_ledger(db: &Db, player_id: i64) -> Result<LedgerAudit, AppError> {
    db.with_conn(|conn| {
        let balance = current_balance(conn, player_id)?;

        let mut stmt = conn.prepare(
            "SELECT id, player_id, amount, balance_after, kind, reference_id, created_at
             FROM currency_transactions WHERE player_id = ?1
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![player_id], transaction_from_row)?;

        let mut replayed_balance = 0i64;
        let mut transaction_count = 0i64;
        let mut snapshots_match = true;
        for row in rows {
            let txn = row?;
            replayed_balance += txn.amount;
            transaction_count += 1;
            if txn.balance_after != replayed_balance {
                tracing::warn!(
                    player_id,
                    transaction_id = txn.id,
                    recorded = txn.balance_after,
                    replayed = replayed_balance,
                    "ledger snapshot mismatch"
                );
                snapshots_match = false;
            }
        }

        Ok(LedgerAudit {
            player_id,
            balance,
            replayed_balance,
            transaction_count,
            consistent: snapshots_match && replayed_balance == balance,
        })
    })
    .map_err(AppError::from)
    .map_err(log_failure(player_id, "audit_ledger"))
}
