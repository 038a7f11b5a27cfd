//!
//! # Config files
//!
//! TOML settings files. Failures name the file they concern.
//!
use std::fmt::Debug;
use std::fs::{self, File};
use std::io::{Error as IoError, Write};
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("failed to write config file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: IoError,
    },
    #[error("invalid config{}", in_file(.path))]
    Parse {
        /// none when parsed from a string
        path: Option<PathBuf>,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to encode config")]
    Encode(#[from] toml::ser::Error),
}

fn in_file(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" in {}", path.display()))
        .unwrap_or_default()
}

pub trait ConfigFile: Sized {
    fn save_to<T: AsRef<Path>>(&self, path: T) -> Result<(), ConfigFileError>;

    fn load_from<T: AsRef<Path>>(path: T) -> Result<Self, ConfigFileError>;

    fn load_str(config: &str) -> Result<Self, ConfigFileError>;
}

impl<S> ConfigFile for S
where
    S: Serialize + DeserializeOwned + Debug,
{
    fn save_to<T: AsRef<Path>>(&self, path: T) -> Result<(), ConfigFileError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "saving config");
        let toml = toml::to_string(self)?;

        let write = |source| ConfigFileError::Write {
            path: path.to_owned(),
            source,
        };
        let mut file = File::create(path).map_err(write)?;
        file.write_all(toml.as_bytes()).map_err(write)?;
        file.sync_all().map_err(write)
    }

    fn load_from<T: AsRef<Path>>(path: T) -> Result<Self, ConfigFileError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading config");

        let content = fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigFileError::Parse {
            path: Some(path.to_owned()),
            source,
        })
    }

    fn load_str(config: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(config).map_err(|source| ConfigFileError::Parse { path: None, source })
    }
}
