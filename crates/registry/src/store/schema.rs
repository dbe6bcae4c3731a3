//! Schema definition for the person and patient tables.

use rusqlite::Connection;

use crate::error::StoreResult;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Creates the schema when missing. Safe to call repeatedly.
///
/// The person key is generated inside the database (`randomblob(16)`) and
/// captured by the insert path with `RETURNING`. The CPF uniqueness
/// constraint is the arbiter for racing registrations of the same CPF.
pub fn initialize_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS person (
            id       BLOB PRIMARY KEY DEFAULT (randomblob(16)),
            cpf      TEXT NOT NULL UNIQUE,
            name     TEXT NOT NULL CHECK (length(name) > 0),
            state    TEXT,
            city     TEXT,
            district TEXT,
            street   TEXT,
            number   INTEGER CHECK (number BETWEEN 0 AND 99999),
            phone1   TEXT,
            phone2   TEXT
        );

        CREATE TABLE IF NOT EXISTS patient (
            person_id        BLOB PRIMARY KEY REFERENCES person(id),
            sex              TEXT NOT NULL CHECK (sex IN ('M', 'F')),
            birth_date       TEXT NOT NULL,
            deceased_at      TEXT,
            race             TEXT NOT NULL
                CHECK (race IN ('BRANCO', 'PRETO', 'PARDO', 'AMARELO', 'INDIGENA')),
            weight_kg        REAL NOT NULL CHECK (weight_kg > 0 AND weight_kg < 1000),
            emergency_phone1 TEXT,
            emergency_phone2 TEXT
        );",
    )?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    if version.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
        tracing::info!(version = SCHEMA_VERSION, "schema created");
    }

    Ok(())
}
