use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;

const MAX_CONNECTIONS: u32 = 5;

/// Filesystem path of a `sqlite:` URL, without any `?mode=` style options.
fn sqlite_path(database_url: &str) -> &str {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    path.split('?').next().unwrap_or(path)
}

pub fn create_pool(database_url: &str) -> Result<DbPool, r2d2::Error> {
    let manager = match sqlite_path(database_url) {
        ":memory:" => SqliteConnectionManager::memory(),
        path => SqliteConnectionManager::file(Path::new(path)),
    }
    .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));

    Pool::builder().max_size(MAX_CONNECTIONS).build(manager)
}

/// Single-connection pool so every checkout sees the same in-memory database.
pub fn create_memory_pool() -> Result<DbPool, r2d2::Error> {
    Pool::builder()
        .max_size(1)
        .build(SqliteConnectionManager::memory())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_path() {
        assert_eq!(sqlite_path("sqlite:fdgym.db?mode=rwc"), "fdgym.db");
        assert_eq!(sqlite_path("sqlite:///var/lib/fdgym.db"), "/var/lib/fdgym.db");
        assert_eq!(sqlite_path("data/gym.db"), "data/gym.db");
        assert_eq!(sqlite_path("sqlite::memory:"), ":memory:");
    }
}
