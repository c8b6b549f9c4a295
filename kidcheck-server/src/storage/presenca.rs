//! Attendance ledger: which children are at which event, the per-event
//! pickup code handed to each guardian, and the checkout flag.
//!
//! Codes are issued inside a single `BEGIN IMMEDIATE` transaction, so two
//! concurrent registrations for the same event serialise on SQLite's write
//! lock and never read the same maximum. `cultos.ultimo_codigo` keeps the
//! highest code ever issued for the event; codes are never renumbered and a
//! deleted code is never handed out again.

use super::models::{Crianca, NewPresenca, Presenca};
use super::schema::{criancas, cultos, presenca};
use super::{Entity, StorageError, Store};
use diesel::dsl::{exists, max};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, info};

const ALREADY_REGISTERED: &str = "Criança já está registrada neste culto";

/// Next code for an event: one past both the high-water mark and any code
/// present in the table (rows imported without a mark still count).
pub fn next_codigo(ultimo_codigo: i32, max_existente: Option<i32>) -> i32 {
    ultimo_codigo.max(max_existente.unwrap_or(0)) + 1
}

impl Store {
    /// Registers `crianca_id` at `culto_id` and returns the new row.
    ///
    /// Fails with `NotFound` when either side is missing and with `Conflict`
    /// when the pair is already registered.
    pub async fn add_crianca_to_culto(
        &self,
        culto_id: i32,
        crianca_id: i32,
    ) -> Result<Presenca, StorageError> {
        let row = self
            .with_conn(move |conn| {
                conn.immediate_transaction(|conn| insert_presenca(conn, culto_id, crianca_id))
            })
            .await
            .map_err(unique_violation_as_conflict)?;
        info!(
            culto_id,
            crianca_id,
            codigo = ?row.codigo,
            "presenca registrada"
        );
        Ok(row)
    }

    /// Idempotent; returns whether a row was removed. Other codes are untouched.
    pub async fn remove_crianca_from_culto(
        &self,
        culto_id: i32,
        crianca_id: i32,
    ) -> Result<bool, StorageError> {
        let deleted = self
            .with_conn(move |conn| {
                Ok(diesel::delete(
                    presenca::table
                        .filter(presenca::culto_id.eq(culto_id))
                        .filter(presenca::crianca_id.eq(crianca_id)),
                )
                .execute(conn)?)
            })
            .await?;
        debug!(culto_id, crianca_id, deleted, "presenca removida");
        Ok(deleted > 0)
    }

    /// Children at the event with their attendance rows, by code (rows
    /// without a code last), then by name.
    pub async fn list_criancas_in_culto(
        &self,
        culto_id: i32,
    ) -> Result<Vec<(Crianca, Presenca)>, StorageError> {
        self.with_conn(move |conn| {
            conn.transaction(|conn| -> Result<Vec<(Crianca, Presenca)>, StorageError> {
                let known: bool =
                    diesel::select(exists(cultos::table.find(culto_id))).get_result(conn)?;
                if !known {
                    return Err(StorageError::NotFound(Entity::Culto));
                }
                Ok(presenca::table
                    .inner_join(criancas::table)
                    .filter(presenca::culto_id.eq(culto_id))
                    .order((
                        presenca::codigo.is_null().asc(),
                        presenca::codigo.asc(),
                        criancas::nome.asc(),
                    ))
                    .select((Crianca::as_select(), Presenca::as_select()))
                    .load::<(Crianca, Presenca)>(conn)?)
            })
        })
        .await
    }

    /// Sets the checkout flag of an existing attendance row.
    pub async fn set_checkout(
        &self,
        culto_id: i32,
        crianca_id: i32,
        checked_out: bool,
    ) -> Result<Presenca, StorageError> {
        self.with_conn(move |conn| {
            diesel::update(
                presenca::table
                    .filter(presenca::culto_id.eq(culto_id))
                    .filter(presenca::crianca_id.eq(crianca_id)),
            )
            .set(presenca::checked_out.eq(checked_out))
            .returning(Presenca::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or(StorageError::NotFound(Entity::Presenca))
        })
        .await
    }
}

fn insert_presenca(
    conn: &mut SqliteConnection,
    culto_id: i32,
    crianca_id: i32,
) -> Result<Presenca, StorageError> {
    let ultimo: Option<i32> = cultos::table
        .find(culto_id)
        .select(cultos::ultimo_codigo)
        .first(conn)
        .optional()?;
    let Some(ultimo) = ultimo else {
        return Err(StorageError::NotFound(Entity::Culto));
    };

    let crianca_known: bool =
        diesel::select(exists(criancas::table.find(crianca_id))).get_result(conn)?;
    if !crianca_known {
        return Err(StorageError::NotFound(Entity::Crianca));
    }

    let already: bool = diesel::select(exists(
        presenca::table
            .filter(presenca::culto_id.eq(culto_id))
            .filter(presenca::crianca_id.eq(crianca_id)),
    ))
    .get_result(conn)?;
    if already {
        return Err(StorageError::Conflict(ALREADY_REGISTERED.into()));
    }

    let max_existente: Option<i32> = presenca::table
        .filter(presenca::culto_id.eq(culto_id))
        .select(max(presenca::codigo))
        .first(conn)?;
    let codigo = next_codigo(ultimo, max_existente);

    diesel::update(cultos::table.find(culto_id))
        .set(cultos::ultimo_codigo.eq(codigo))
        .execute(conn)?;

    let row = diesel::insert_into(presenca::table)
        .values(&NewPresenca {
            crianca_id,
            culto_id,
            codigo: Some(codigo),
        })
        .returning(Presenca::as_returning())
        .get_result(conn)?;
    Ok(row)
}

/// The UNIQUE constraints back up the in-transaction checks.
fn unique_violation_as_conflict(err: StorageError) -> StorageError {
    match err {
        StorageError::Database(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            _,
        )) => StorageError::Conflict(ALREADY_REGISTERED.into()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_code_is_one() {
        assert_eq!(next_codigo(0, None), 1);
    }

    #[test]
    fn follows_the_highest_code() {
        assert_eq!(next_codigo(3, Some(3)), 4);
        assert_eq!(next_codigo(0, Some(5)), 6);
    }

    #[test]
    fn deleted_top_code_is_not_reissued() {
        // codes 1..=3 issued, row 3 deleted: table max is 2, mark is 3
        assert_eq!(next_codigo(3, Some(2)), 4);
        // every row deleted
        assert_eq!(next_codigo(3, None), 4);
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let err = StorageError::Database(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(String::from("UNIQUE constraint failed")),
        ));
        assert!(matches!(
            unique_violation_as_conflict(err),
            StorageError::Conflict(_)
        ));
        let other = StorageError::InvalidInput("x".into());
        assert!(matches!(
            unique_violation_as_conflict(other),
            StorageError::InvalidInput(_)
        ));
    }
}
