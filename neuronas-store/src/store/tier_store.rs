//! One tier's SQLite connection and codec.

use crate::codec::Compression;
use crate::error::{Error, Result};
use crate::store::schema::initialize_schema;
use crate::tier::{Table, Tier};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Records decoded from one tier table.
#[derive(Debug, Clone, Default)]
pub struct DecodedRows {
    pub records: Vec<Value>,
    /// Row ids that failed to decompress or decode
    pub skipped: Vec<i64>,
}

/// Persistent store for a single tier.
///
/// Holds one long-lived connection for the lifetime of the store; every
/// record is compressed with the tier's codec on write and decompressed with
/// the same codec on read.
pub struct TierStore {
    tier: Tier,
    codec: Compression,
    conn: Mutex<Connection>,
}

impl TierStore {
    /// Open the tier database at the given path.
    pub fn open(tier: Tier, codec: Compression, path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::debug!(%tier, %codec, path = %path.as_ref().display(), "opened tier store");
        Ok(Self::from_connection(tier, codec, conn))
    }

    /// Create an in-memory tier database with all tables (for testing).
    pub fn in_memory(tier: Tier, codec: Compression) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(tier, codec, conn))
    }

    pub fn from_connection(tier: Tier, codec: Compression, conn: Connection) -> Self {
        Self {
            tier,
            codec,
            conn: Mutex::new(conn),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn codec(&self) -> Compression {
        self.codec
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::Internal(format!("Failed to lock {} connection: {}", self.tier, e)))
    }

    /// Create missing whitelisted tables.
    pub fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        initialize_schema(&conn)?;
        Ok(())
    }

    /// Append a raw blob as a new row, returning its id.
    ///
    /// The write runs in its own transaction and is rolled back on failure.
    pub fn append(&self, table: Table, blob: &[u8]) -> Result<i64> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            &format!("INSERT INTO {} (data) VALUES (?1)", table.as_str()),
            params![blob],
        )?;
        let row_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(row_id)
    }

    /// Load every row of a table ordered by id.
    pub fn load_rows(&self, table: Table) -> Result<Vec<(i64, Vec<u8>)>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, data FROM {} ORDER BY id",
            table.as_str()
        ))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, Vec<u8>>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Serialize, compress and append a record.
    pub fn append_record(&self, table: Table, data: &Value) -> Result<i64> {
        let json = serde_json::to_vec(data)?;
        let blob = self.codec.compress(&json)?;
        self.append(table, &blob)
    }

    /// Decode a stored blob with this tier's codec.
    pub fn decode(&self, blob: &[u8]) -> Result<Value> {
        let json = self.codec.decompress(blob)?;
        Ok(serde_json::from_slice(&json)?)
    }

    /// Load and decode every record of a table, skipping undecodable rows.
    pub fn load_records(&self, table: Table) -> Result<DecodedRows> {
        let mut decoded = DecodedRows::default();
        for (row_id, blob) in self.load_rows(table)? {
            match self.decode(&blob) {
                Ok(value) => decoded.records.push(value),
                Err(e) => {
                    tracing::warn!(
                        tier = %self.tier,
                        table = %table,
                        row_id,
                        error = %e,
                        "skipping undecodable row"
                    );
                    decoded.skipped.push(row_id);
                }
            }
        }
        Ok(decoded)
    }

    /// Number of rows in a table.
    pub fn count(&self, table: Table) -> Result<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", table.as_str()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Close the connection.
    pub fn close(self) -> Result<()> {
        let conn = self.conn.into_inner().unwrap_or_else(|e| e.into_inner());
        conn.close().map_err(|(_, e)| Error::from(e))?;
        tracing::debug!(tier = %self.tier, "closed tier store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_and_load() {
        let store = TierStore::in_memory(Tier::L2, Compression::Zlib).unwrap();
        let first = store.append_record(Table::Metrics, &json!({"score": 0.42})).unwrap();
        let second = store.append_record(Table::Metrics, &json!([1, 2, 3])).unwrap();
        assert!(second > first);

        let rows = store.load_records(Table::Metrics).unwrap();
        assert_eq!(rows.records, vec![json!({"score": 0.42}), json!([1, 2, 3])]);
        assert!(rows.skipped.is_empty());
        assert_eq!(store.count(Table::Metrics).unwrap(), 2);
        assert_eq!(store.count(Table::Memory).unwrap(), 0);
    }

    #[test]
    fn test_blobs_are_compressed() {
        let store = TierStore::in_memory(Tier::L3, Compression::Zstd).unwrap();
        let data = json!({"text": "neuron ".repeat(200)});
        store.append_record(Table::Knowledge, &data).unwrap();

        let rows = store.load_rows(Table::Knowledge).unwrap();
        let raw_len = serde_json::to_vec(&data).unwrap().len();
        assert!(rows[0].1.len() < raw_len);
    }

    #[test]
    fn test_undecodable_rows_are_skipped() {
        let store = TierStore::in_memory(Tier::L2, Compression::Zlib).unwrap();
        store.append_record(Table::Memory, &json!("good")).unwrap();
        let bad = store.append(Table::Memory, b"not zlib").unwrap();
        // Valid zlib but not JSON
        let not_json = Compression::Zlib.compress(b"{oops").unwrap();
        let bad_json = store.append(Table::Memory, &not_json).unwrap();

        let rows = store.load_records(Table::Memory).unwrap();
        assert_eq!(rows.records, vec![json!("good")]);
        assert_eq!(rows.skipped, vec![bad, bad_json]);
    }

    #[test]
    fn test_missing_table_is_storage_error() {
        let conn = Connection::open_in_memory().unwrap();
        let store = TierStore::from_connection(Tier::L1, Compression::None, conn);

        let err = store.append_record(Table::Settings, &json!(1)).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));

        store.initialize_schema().unwrap();
        store.append_record(Table::Settings, &json!(1)).unwrap();
        assert_eq!(store.count(Table::Settings).unwrap(), 1);
    }

    #[test]
    fn test_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("l3.db");

        let store = TierStore::open(Tier::L3, Compression::Zstd, &path).unwrap();
        store.initialize_schema().unwrap();
        store.append_record(Table::Hypotheses, &json!({"h": 1})).unwrap();
        store.close().unwrap();

        let store = TierStore::open(Tier::L3, Compression::Zstd, &path).unwrap();
        let rows = store.load_records(Table::Hypotheses).unwrap();
        assert_eq!(rows.records, vec![json!({"h": 1})]);
    }

    #[test]
    fn test_codec_mismatch_skips_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("l2.db");

        let writer = TierStore::open(Tier::L2, Compression::Zstd, &path).unwrap();
        writer.initialize_schema().unwrap();
        writer.append_record(Table::Metrics, &json!(7)).unwrap();
        writer.close().unwrap();

        let reader = TierStore::open(Tier::L2, Compression::Zlib, &path).unwrap();
        let rows = reader.load_records(Table::Metrics).unwrap();
        assert!(rows.records.is_empty());
        assert_eq!(rows.skipped.len(), 1);
    }
}
