//! JSON helpers for detector configuration and custom dictionaries.

use std::{fs, path::Path};

use crate::{DetectorParams, Dictionary, DictionaryError, DictionarySpec};

#[derive(thiserror::Error, Debug)]
pub enum DetectorIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
}

impl DetectorParams {
    /// Load parameters from a JSON file; missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectorIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write these parameters to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectorIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl DictionarySpec {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DetectorIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DetectorIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Read and validate a dictionary from a JSON [`DictionarySpec`].
pub fn load_dictionary(path: impl AsRef<Path>) -> Result<Dictionary, DetectorIoError> {
    Ok(Dictionary::from_spec(&DictionarySpec::load_json(path)?)?)
}
