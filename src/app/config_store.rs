//! Configuration store, the single source of truth for persisted settings.
//!
//! Owns the in-memory [`DeviceConfig`] and the storage backend behind a
//! [`StoragePort`].  The record is persisted as one fixed-size image under a
//! fixed key:
//!
//! ```text
//!   0        4                                   RECORD_SIZE
//!   ┌────────┬───────────────────────────────────┬─────────┐
//!   │version │ postcard(rest of DeviceConfig)    │ 0x00 …  │
//!   │ u32 LE │                                   │ padding │
//!   └────────┴───────────────────────────────────┴─────────┘
//! ```
//!
//! A stored image whose version tag differs from [`CONFIG_VERSION`], or that
//! does not decode to a consistent record, is never trusted: the compiled
//! defaults are written over it and read back.

use log::{info, warn};

use crate::app::ports::StoragePort;
use crate::app::summary::ConfigSummary;
use crate::config::{
    CONFIG_VERSION, ConfigField, DeviceConfig, PORT_RANGE, SAMPLE_INTERVAL_RANGE, TEMP_OFFSET_RANGE,
};
use crate::error::{ConfigError, StorageError};

pub const CONFIG_NAMESPACE: &str = "envsense";
pub const CONFIG_KEY: &str = "config";

/// Size of the stored image in bytes.
pub const RECORD_SIZE: usize = 512;

pub struct ConfigStore<S: StoragePort> {
    storage: S,
    config: DeviceConfig,
}

impl<S: StoragePort> ConfigStore<S> {
    /// Load the stored record, migrating to defaults when needed.
    ///
    /// Only an I/O failure of the backing store is an error; it must be
    /// treated as a fatal init condition by the caller.
    pub fn load(storage: S) -> Result<Self, ConfigError> {
        let mut store = Self {
            storage,
            config: DeviceConfig::default(),
        };
        store.reload()?;
        Ok(store)
    }

    /// Re-read the stored record into memory, discarding unsaved changes.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        if let Some(cfg) = self.read_stored()? {
            info!("ConfigStore: loaded record v{}", cfg.version);
            self.config = cfg;
            return Ok(());
        }

        warn!("ConfigStore: no usable record, writing defaults (v{})", CONFIG_VERSION);
        self.config = DeviceConfig::default();
        self.commit()?;

        // Read back so the in-memory record is exactly what storage holds.
        match self.read_stored()? {
            Some(cfg) => {
                self.config = cfg;
                Ok(())
            }
            None => Err(ConfigError::Storage(StorageError::Io)),
        }
    }

    /// Validate and assign one field in memory.  Does not persist.
    ///
    /// Returns the field that was changed so the caller can tell whether the
    /// telemetry destination is affected.
    pub fn set(&mut self, field_key: &str, raw_value: &str) -> Result<ConfigField, ConfigError> {
        let field: ConfigField = field_key.parse().inspect_err(|_| {
            warn!("ConfigStore: unknown field '{}'", field_key);
        })?;

        match self.config.apply(field, raw_value) {
            Ok(()) if field.is_secret() => info!("ConfigStore: set {} (redacted)", field.key()),
            Ok(()) => info!("ConfigStore: set {} = '{}'", field.key(), raw_value),
            Err(e) => {
                warn!("ConfigStore: rejected {}", e);
                return Err(e);
            }
        }
        Ok(field)
    }

    /// Persist the whole in-memory record as one image.
    pub fn commit(&mut self) -> Result<(), ConfigError> {
        let image = encode_image(&self.config)?;
        self.storage.write(CONFIG_NAMESPACE, CONFIG_KEY, &image).inspect_err(|e| {
            warn!("ConfigStore: commit failed: {}", e);
        })?;
        info!("ConfigStore: committed record v{} ({} bytes)", self.config.version, RECORD_SIZE);
        Ok(())
    }

    /// Replace the in-memory record with compiled defaults and persist it.
    pub fn reset_to_defaults(&mut self) -> Result<(), ConfigError> {
        info!("ConfigStore: resetting to defaults");
        self.config = DeviceConfig::default();
        self.commit()
    }

    /// Read-only view of the live record.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Redacted snapshot for the admin shell.
    pub fn to_summary(&self, mac: &[u8; 6]) -> ConfigSummary {
        ConfigSummary::new(&self.config, mac)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Returns `Ok(None)` for anything that is not a trustworthy record.
    fn read_stored(&self) -> Result<Option<DeviceConfig>, ConfigError> {
        let mut image = [0u8; RECORD_SIZE];
        let len = match self.storage.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut image) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("ConfigStore: no stored record");
                return Ok(None);
            }
            Err(e) => {
                warn!("ConfigStore: storage unreadable: {}", e);
                return Err(e.into());
            }
        };
        Ok(decode_image(&image[..len]))
    }
}

/// Serialise `config` into a zero-padded fixed-size image.
pub fn encode_image(config: &DeviceConfig) -> Result<[u8; RECORD_SIZE], ConfigError> {
    let mut image = [0u8; RECORD_SIZE];
    postcard::to_slice(config, &mut image).map_err(|_| ConfigError::Encode)?;
    Ok(image)
}

/// Version tag of a stored image, if it is long enough to carry one.
pub fn image_version(image: &[u8]) -> Option<u32> {
    let tag: [u8; 4] = image.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(tag))
}

/// Decode a stored image, rejecting foreign versions and inconsistent records.
pub fn decode_image(image: &[u8]) -> Option<DeviceConfig> {
    let version = image_version(image);
    if version != Some(CONFIG_VERSION) {
        warn!("ConfigStore: stored version {:?} != {}", version, CONFIG_VERSION);
        return None;
    }
    match postcard::from_bytes::<DeviceConfig>(image) {
        Ok(cfg) if is_consistent(&cfg) => Some(cfg),
        Ok(_) => {
            warn!("ConfigStore: stored record has out-of-range fields");
            None
        }
        Err(_) => {
            warn!("ConfigStore: stored record is corrupted");
            None
        }
    }
}

fn is_consistent(cfg: &DeviceConfig) -> bool {
    PORT_RANGE.contains(&(cfg.http_port as i64))
        && PORT_RANGE.contains(&(cfg.db_port as i64))
        && SAMPLE_INTERVAL_RANGE.contains(&(cfg.sample_interval_secs as i64))
        && TEMP_OFFSET_RANGE.contains(&cfg.t_offset)
}
