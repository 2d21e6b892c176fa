//! Saved network credential store.
//!
//! A flat JSON object mapping SSID to credential record, rewritten as a whole
//! file on every save. The on-disk field names (`passwd`, `wep`) are the wire
//! format other tools on the device already read, so they are kept as-is.
//! There is no locking and no partial-update path; concurrent writers are
//! last-write-wins at the file level.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::SwitchError;

/// Credential scheme a saved network authenticates with.
///
/// Persisted as the integer `wep` flag (0 = WPA, anything else = WEP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    #[default]
    Wpa,
    Wep,
}

/// A saved credential record for one network.
///
/// An empty password means an open network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCredential {
    #[serde(rename = "passwd")]
    pub password: String,
    #[serde(rename = "wep", with = "wep_flag")]
    pub security: Security,
}

/// Serde helpers for the integer-encoded `wep` field.
mod wep_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Security;

    pub fn serialize<S: Serializer>(security: &Security, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u8(match security {
            Security::Wpa => 0,
            Security::Wep => 1,
        })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Security, D::Error> {
        let flag = u8::deserialize(de)?;
        Ok(if flag == 0 { Security::Wpa } else { Security::Wep })
    }
}

/// The whole-file credential store: SSID -> credential.
///
/// `BTreeMap` keeps the serialized file in a stable order across saves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialStore {
    networks: BTreeMap<String, NetworkCredential>,
}

impl CredentialStore {
    /// Reads and parses the store file.
    ///
    /// The three outcomes are distinct and every caller must handle them:
    /// - `Err(StoreMissing)` - the file does not exist
    /// - `Err(StoreCorrupt)` - the file exists but is not a valid JSON map
    /// - `Ok(store)` - fully parsed
    pub fn load(path: &Path) -> Result<Self, SwitchError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SwitchError::StoreMissing(path.to_path_buf()));
            }
            Err(e) => {
                return Err(SwitchError::StoreRead {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| SwitchError::StoreCorrupt {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`load`](Self::load), but a missing file yields an empty store.
    /// A corrupt or unreadable file is still an error.
    pub fn load_or_empty(path: &Path) -> Result<Self, SwitchError> {
        match Self::load(path) {
            Ok(store) => Ok(store),
            Err(SwitchError::StoreMissing(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Writes the whole store back to disk, creating parent directories as
    /// needed. Not atomic; the read-modify-write cycle is unguarded.
    pub fn save(&self, path: &Path) -> Result<(), SwitchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SwitchError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string(self).map_err(SwitchError::StoreEncode)?;

        fs::write(path, content).map_err(|source| SwitchError::StoreWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn lookup(&self, ssid: &str) -> Option<&NetworkCredential> {
        self.networks.get(ssid)
    }

    pub fn contains(&self, ssid: &str) -> bool {
        self.networks.contains_key(ssid)
    }

    /// Inserts or replaces the record for `ssid`.
    pub fn upsert(&mut self, ssid: &str, credential: NetworkCredential) {
        self.networks.insert(ssid.to_string(), credential);
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NetworkCredential)> {
        self.networks.iter()
    }
}
