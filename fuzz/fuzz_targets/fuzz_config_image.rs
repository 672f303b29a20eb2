//! Fuzz target: `ConfigStore::load` over an arbitrary stored image.
//!
//! Whatever bytes are sitting in flash, loading must never panic and must
//! always produce a record of the current layout version.
//!
//! cargo fuzz run fuzz_config_image

#![no_main]

use envsense::app::config_store::ConfigStore;
use envsense::app::ports::StoragePort;
use envsense::config::CONFIG_VERSION;
use envsense::error::StorageError;
use libfuzzer_sys::fuzz_target;

struct OneBlob(Vec<u8>);

impl StoragePort for OneBlob {
    fn read(&self, _ns: &str, _key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let n = self.0.len().min(buf.len());
        buf[..n].copy_from_slice(&self.0[..n]);
        Ok(n)
    }

    fn write(&mut self, _ns: &str, _key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.0 = data.to_vec();
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let store = ConfigStore::load(OneBlob(data.to_vec())).expect("in-memory store never fails");
    assert_eq!(store.config().version, CONFIG_VERSION);
    assert!(store.config().t_offset.is_finite());
});
