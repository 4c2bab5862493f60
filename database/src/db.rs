use crate::errors::StoreError;
use rocksdb::{DBWithThreadMode, MultiThreaded};
use std::{path::PathBuf, sync::Arc};

/// The DB type used for block-DAG stores
pub type DB = DBWithThreadMode<MultiThreaded>;

#[derive(Debug, Clone)]
pub struct ConnBuilder {
    db_path: Option<PathBuf>,
    create_if_missing: bool,
    parallelism: usize,
    files_limit: i32,
    mem_budget: usize,
}

impl Default for ConnBuilder {
    fn default() -> Self {
        ConnBuilder { db_path: None, create_if_missing: true, parallelism: 1, files_limit: 500, mem_budget: 64 * 1024 * 1024 }
    }
}

impl ConnBuilder {
    pub fn with_db_path(self, db_path: PathBuf) -> Self {
        ConnBuilder { db_path: Some(db_path), ..self }
    }

    pub fn with_create_if_missing(self, create_if_missing: bool) -> Self {
        ConnBuilder { create_if_missing, ..self }
    }

    pub fn with_parallelism(self, parallelism: impl Into<usize>) -> Self {
        ConnBuilder { parallelism: parallelism.into(), ..self }
    }

    pub fn with_files_limit(self, files_limit: impl Into<i32>) -> Self {
        ConnBuilder { files_limit: files_limit.into(), ..self }
    }

    pub fn with_mem_budget(self, mem_budget: impl Into<usize>) -> Self {
        ConnBuilder { mem_budget: mem_budget.into(), ..self }
    }

    pub fn build(self) -> Result<Arc<DB>, StoreError> {
        let db_path = self.db_path.ok_or_else(|| StoreError::DataInconsistency("db path was not specified".to_string()))?;
        let mut opts = rocksdb::Options::default();
        if self.parallelism > 1 {
            opts.increase_parallelism(self.parallelism as i32);
        }
        opts.optimize_level_style_compaction(self.mem_budget);
        opts.create_if_missing(self.create_if_missing);
        opts.set_max_open_files(self.files_limit);
        Ok(Arc::new(DB::open(&opts, db_path)?))
    }
}
