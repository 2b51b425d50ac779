//! LMDB implementation of MetaStore.
//!
//! Each call runs in its own short transaction, so it must not be used while
//! a [`crate::WriteBatch`] is open on the same thread.

use quill_store::meta::MetaStore;
use quill_store::StoreError;

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

impl MetaStore for LmdbEnvironment {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut wtxn = self.env().write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, key.as_bytes(), value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env().read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(<[u8]>::to_vec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_version_defaults_to_zero_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let env = LmdbEnvironment::open(dir.path(), 20, 10 * 1024 * 1024).expect("open");

        assert_eq!(env.get_schema_version().unwrap(), 0);
        env.set_schema_version(3).unwrap();
        assert_eq!(env.get_schema_version().unwrap(), 3);
        assert!(env.get_meta("missing").unwrap().is_none());
    }

    #[test]
    fn malformed_schema_version_is_corruption() {
        let dir = tempfile::tempdir().expect("tempdir");
        let env = LmdbEnvironment::open(dir.path(), 20, 10 * 1024 * 1024).expect("open");

        env.put_meta(quill_store::meta::SCHEMA_VERSION_KEY, &[1, 2]).unwrap();
        assert!(matches!(env.get_schema_version(), Err(StoreError::Corruption(_))));
    }
}
