//! Durable local key/value store of JSON blobs.

use crate::errors::AppResult;
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct KvStore<'a> {
    conn: &'a Connection,
}

impl<'a> KvStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        let raw: Option<String> = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |r| r.get(0))
            .optional()?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, json, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// `true` when something was removed.
    pub fn remove(&self, key: &str) -> AppResult<bool> {
        let n = self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(n > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::DbPool;
    use crate::errors::AppError;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        a: u32,
        b: String,
    }

    #[test]
    fn set_get_overwrite_remove() {
        let pool = DbPool::in_memory().unwrap();
        let kv = KvStore::new(&pool.conn);

        assert_eq!(kv.get::<Blob>("x").unwrap(), None);
        kv.set("x", &Blob { a: 1, b: "one".into() }).unwrap();
        kv.set("x", &Blob { a: 2, b: "two".into() }).unwrap();
        assert_eq!(kv.get::<Blob>("x").unwrap(), Some(Blob { a: 2, b: "two".into() }));

        assert!(kv.remove("x").unwrap());
        assert!(!kv.remove("x").unwrap());
        assert_eq!(kv.get::<Blob>("x").unwrap(), None);
    }

    #[test]
    fn wrong_shape_is_a_json_error() {
        let pool = DbPool::in_memory().unwrap();
        let kv = KvStore::new(&pool.conn);
        kv.set("x", &"just a string").unwrap();
        assert!(matches!(kv.get::<Blob>("x"), Err(AppError::Json(_))));
    }
}
