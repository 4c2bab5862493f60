use crate::prelude::DB;
use std::{
    sync::Weak,
    thread,
    time::Duration,
};
use tempfile::TempDir;

/// Keeps a temporary DB directory alive for as long as the DB is in use and
/// destroys it on drop
pub struct DbLifetime {
    weak_db_ref: Weak<DB>,
    optional_tempdir: Option<TempDir>,
}

impl DbLifetime {
    pub fn new(tempdir: TempDir, weak_db_ref: Weak<DB>) -> Self {
        Self { optional_tempdir: Some(tempdir), weak_db_ref }
    }
}

impl Drop for DbLifetime {
    fn drop(&mut self) {
        for _ in 0..16 {
            if self.weak_db_ref.strong_count() > 0 {
                // Give other threads a chance to drop their DB references
                thread::sleep(Duration::from_millis(50));
            } else {
                break;
            }
        }
        if let Some(dir) = self.optional_tempdir.take() {
            let options = rocksdb::Options::default();
            let _ = DB::destroy(&options, dir.path());
        }
    }
}

pub fn get_temp_dir() -> std::io::Result<TempDir> {
    let dir = std::env::temp_dir().join("blockdag");
    std::fs::create_dir_all(&dir)?;
    tempfile::tempdir_in(dir)
}

/// Creates a DB within a temp directory under `<OS temp dir>/blockdag`.
/// Evaluates to `Result<(DbLifetime, Arc<DB>), StoreError>`; callers must keep
/// the `DbLifetime` guard alive while the DB is in use.
#[macro_export]
macro_rules! create_temp_db {
    ($conn_builder: expr) => {{
        $crate::utils::get_temp_dir().map_err($crate::prelude::StoreError::from).and_then(|db_tempdir| {
            let db_path = db_tempdir.path().to_owned();
            $conn_builder
                .with_db_path(db_path)
                .build()
                .map(|db| ($crate::utils::DbLifetime::new(db_tempdir, std::sync::Arc::downgrade(&db)), db))
        })
    }};
}
