//! JSON Snapshot Store - 文件系统快照实现
//!
//! 缓存目录下两个文件：
//! - envelope.json: `{ key: [f32, ...] }`
//! - minmax.json: `{ key: [{"min": f32, "max": f32}, ...] }`
//!
//! 每个文件先写到同目录的临时文件，再原子 rename 覆盖。

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::application::ports::{Snapshot, SnapshotError, SnapshotStorePort};

pub const ENVELOPE_FILE: &str = "envelope.json";
pub const MIN_MAX_FILE: &str = "minmax.json";

/// JSON 快照存储
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    /// 缓存目录，首次写入时创建
    dir: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn read_table<T: DeserializeOwned>(&self, name: &str) -> Result<HashMap<String, T>, SnapshotError> {
        let path = self.dir.join(name);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// 两个文件互相独立，一个读不出来只丢弃它自己
    fn load_table<T: DeserializeOwned>(&self, name: &str) -> HashMap<String, T> {
        match self.read_table(name) {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    path = %self.dir.join(name).display(),
                    error = %e,
                    "Waveform snapshot table unreadable, treating as empty"
                );
                HashMap::new()
            }
        }
    }

    fn write_table<T: Serialize>(&self, name: &str, table: &HashMap<String, T>) -> Result<(), SnapshotError> {
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, table)?;
            writer.flush()?;
        }
        temp.persist(self.dir.join(name))
            .map_err(|e| SnapshotError::IoError(e.error.to_string()))?;
        Ok(())
    }
}

impl SnapshotStorePort for JsonSnapshotStore {
    fn load(&self) -> Result<Snapshot, SnapshotError> {
        let snapshot = Snapshot {
            envelopes: self.load_table(ENVELOPE_FILE),
            min_max: self.load_table(MIN_MAX_FILE),
        };

        tracing::debug!(
            dir = %self.dir.display(),
            entries = snapshot.entry_count(),
            "Waveform snapshot loaded"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        fs::create_dir_all(&self.dir)?;
        self.write_table(ENVELOPE_FILE, &snapshot.envelopes)?;
        self.write_table(MIN_MAX_FILE, &snapshot.min_max)?;
        Ok(())
    }
}
