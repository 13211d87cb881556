use async_trait::async_trait;
use futures::lock::Mutex;
use rusqlite::{params_from_iter, Connection};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{ClientKind, ConnectionConfig};
use crate::error::{Error, Result};
use crate::query::{SqlQuery, Value};

/// One result row: column name to value, in select-list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Value of the first column with this name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Something raw SQL can be submitted to.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Submit one statement and collect every returned row.
    async fn raw(&self, query: SqlQuery) -> Result<Vec<Row>>;

    /// Submit one statement and keep only the first returned row.
    async fn raw_one(&self, query: SqlQuery) -> Result<Option<Row>> {
        Ok(self.raw(query).await?.into_iter().next())
    }
}

/// Connection handle to a single SQLite database.
///
/// Clones share the same session. The session stays open until
/// [`Database::destroy`] is called; after that every clone fails with
/// [`Error::ConnectionClosed`].
#[derive(Clone)]
pub struct Database {
    name: String,
    connection: Arc<Mutex<Option<Connection>>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}

impl Database {
    /// Open a session for the given connection descriptor
    pub fn open(config: &ConnectionConfig) -> Result<Self> {
        if config.client != ClientKind::Sqlite3 {
            return Err(Error::UnsupportedClient(config.client.as_str().to_string()));
        }
        if config.user.is_some() || config.password.is_some() {
            debug!("sqlite3 ignores user and password for {}", config.database);
        }

        info!("opening sqlite database at path: {}", config.database);
        let connection = if config.database == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(&config.database)?
        };
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self {
            name: config.database.clone(),
            connection: Arc::new(Mutex::new(Some(connection))),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&ConnectionConfig::sqlite(":memory:"))
    }

    /// Path or `:memory:` this handle was opened on
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn raw(&self, query: SqlQuery) -> Result<Vec<Row>> {
        let guard = self.connection.lock().await;
        let conn = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        log_query(&query);
        let rows = query_rows(conn, &query)?;
        debug!("returned {} rows", rows.len());
        Ok(rows)
    }

    /// Run a statement without a result set, returning the changed row count
    pub async fn execute(&self, query: SqlQuery) -> Result<usize> {
        let guard = self.connection.lock().await;
        let conn = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        log_query(&query);
        let changed = conn.execute(&query.statement, params_from_iter(query.params.values.iter()))?;
        Ok(changed)
    }

    /// Run several `;`-separated statements without parameters
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        let guard = self.connection.lock().await;
        let conn = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// Release the session. Must be called once before the process exits.
    pub async fn destroy(&self) -> Result<()> {
        let connection = self
            .connection
            .lock()
            .await
            .take()
            .ok_or(Error::ConnectionClosed)?;
        connection.close().map_err(|(_, e)| e)?;
        info!("closed sqlite database at path: {}", self.name);
        Ok(())
    }

    pub async fn is_open(&self) -> bool {
        self.connection.lock().await.is_some()
    }
}

#[async_trait]
impl Executor for Database {
    async fn raw(&self, query: SqlQuery) -> Result<Vec<Row>> {
        Database::raw(self, query).await
    }
}

fn log_query(query: &SqlQuery) {
    match query.interpolate() {
        Ok(sql) => debug!(%sql, "executing"),
        Err(_) => debug!(sql = %query.statement, bindings = query.params.len(), "executing"),
    }
}

fn query_rows(conn: &Connection, query: &SqlQuery) -> Result<Vec<Row>> {
    let mut stmt = conn.prepare(&query.statement)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params_from_iter(query.params.values.iter()))?;

    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for (index, name) in columns.iter().enumerate() {
            values.push((name.clone(), Value::from(row.get_ref(index)?)));
        }
        result.push(Row::new(values));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use tempfile::NamedTempFile;

    async fn create_test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.execute_batch(
            r#"
            CREATE TABLE users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                age INTEGER
            );
            "#,
        )
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_basic_operations() {
        let db = create_test_db().await;

        let inserted = db
            .execute(
                SqlQuery::new("INSERT INTO users (name, email, age) VALUES (?, ?, ?)")
                    .with_params(params!["John Doe", "john@example.com", 30]),
            )
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let user = db
            .raw_one(SqlQuery::new("SELECT id, name, email, age FROM users WHERE id = ?").bind(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.columns().collect::<Vec<_>>(), ["id", "name", "email", "age"]);
        assert_eq!(user.get("name"), Some(&Value::Text("John Doe".into())));
        assert_eq!(user.get("age"), Some(&Value::Integer(30)));

        db.execute(SqlQuery::new("DELETE FROM users WHERE id = ?").bind(1))
            .await
            .unwrap();
        let deleted = db
            .raw_one(SqlQuery::new("SELECT * FROM users WHERE id = ?").bind(1))
            .await
            .unwrap();
        assert!(deleted.is_none());
    }

    #[tokio::test]
    async fn null_columns_come_back_as_null() {
        let db = create_test_db().await;
        let row = db
            .raw_one(
                SqlQuery::new("INSERT INTO users (name, email, age) VALUES (?, ?, ?) RETURNING age")
                    .with_params(params!["Jane", "jane@example.com", Option::<i64>::None]),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(row.get("age").unwrap().is_null());
    }

    #[tokio::test]
    async fn numbered_placeholders_bind_by_index() {
        let db = create_test_db().await;
        let row = db
            .raw_one(SqlQuery::new("SELECT ?1 AS a, ?1 AS b, ?2 AS c").with_params(params!["x", 2]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get("a"), Some(&Value::Text("x".into())));
        assert_eq!(row.get("b"), Some(&Value::Text("x".into())));
        assert_eq!(row.get("c"), Some(&Value::Integer(2)));
        assert_eq!(
            SqlQuery::new("SELECT ?1 AS a, ?1 AS b, ?2 AS c").placeholder_count(),
            2
        );
    }

    #[tokio::test]
    async fn binding_mismatch_surfaces_driver_error() {
        let db = create_test_db().await;
        let result = db
            .raw(SqlQuery::new("SELECT * FROM users WHERE id = ? AND name = ?").bind(1))
            .await;
        assert!(matches!(result, Err(Error::Sqlite(_))));
    }

    #[tokio::test]
    async fn sql_errors_propagate_unchanged() {
        let db = create_test_db().await;
        let result = db.raw(SqlQuery::new("SELEC * FROM users")).await;
        assert!(matches!(result, Err(Error::Sqlite(_))));
    }

    #[tokio::test]
    async fn destroy_closes_every_clone() {
        let db = create_test_db().await;
        let clone = db.clone();
        assert!(clone.is_open().await);

        db.destroy().await.unwrap();

        assert!(!clone.is_open().await);
        let result = clone.raw(SqlQuery::new("SELECT 1")).await;
        assert!(matches!(result, Err(Error::ConnectionClosed)));
        assert!(matches!(db.destroy().await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn file_database_persists_across_sessions() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = ConnectionConfig::sqlite(temp_file.path().to_str().unwrap());

        let db = Database::open(&config).unwrap();
        db.execute_batch("CREATE TABLE notes (body TEXT); INSERT INTO notes VALUES ('kept');")
            .await
            .unwrap();
        db.destroy().await.unwrap();

        let reopened = Database::open(&config).unwrap();
        let rows = reopened.raw(SqlQuery::new("SELECT body FROM notes")).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("body").and_then(Value::as_str), Some("kept"));
        reopened.destroy().await.unwrap();
    }

    #[test]
    fn only_sqlite_clients_can_be_opened() {
        let config = ConnectionConfig {
            client: ClientKind::Postgres,
            user: Some("app".into()),
            password: None,
            database: "shop".into(),
        };
        match Database::open(&config) {
            Err(Error::UnsupportedClient(client)) => assert_eq!(client, "postgres"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rows_serialize_in_column_order() {
        let row = Row::new(vec![
            ("name".into(), Value::Text("Rex".into())),
            ("id".into(), Value::Integer(4)),
        ]);
        assert_eq!(serde_json::to_string(&row).unwrap(), r#"{"name":"Rex","id":4}"#);
    }
}
