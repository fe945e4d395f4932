// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL migration files are compiled into the binary at build time via
//! `embed_migrations!`. Migrations run automatically on database open.

use servq_core::ServqError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied migrations in its own `refinery_schema_history` table.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), ServqError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| ServqError::Storage {
            source: Box::new(e),
        })?;
    for migration in report.applied_migrations() {
        tracing::debug!(
            version = migration.version(),
            name = migration.name(),
            "applied migration"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_create_queue_tables() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        for expected in ["ephemeral", "queue_stats", "tokens"] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}: {tables:?}");
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        run_migrations(&mut conn).unwrap();
    }

    #[test]
    fn second_running_token_in_a_lane_violates_index() {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let insert = "INSERT INTO tokens (code, provider_id, customer_id, service_id, service_date,
                      queue_position, status, created_at)
                      VALUES (?1, 1, ?2, 1, '2026-03-01', ?2, 'running', '2026-03-01T09:00:00.000Z')";
        conn.execute(insert, rusqlite::params!["TKN-A", 1]).unwrap();
        let err = conn.execute(insert, rusqlite::params!["TKN-B", 2]);
        assert!(err.is_err());
    }
}
