use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{Application, Company, Job, Resume, User};

use super::{InMemoryEntityStore, StoreError};

/// JSON snapshot of every collection, used to hydrate the in-memory store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub resumes: Vec<Resume>,
}

#[derive(Debug)]
pub enum SeedError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Store(StoreError),
}

impl std::fmt::Display for SeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedError::Io(err) => write!(f, "failed to read seed file: {}", err),
            SeedError::Json(err) => write!(f, "invalid seed data: {}", err),
            SeedError::Store(err) => write!(f, "could not load seed into store: {}", err),
        }
    }
}

impl std::error::Error for SeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeedError::Io(err) => Some(err),
            SeedError::Json(err) => Some(err),
            SeedError::Store(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SeedError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<StoreError> for SeedError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl SeedData {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SeedError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn into_store(self) -> Result<InMemoryEntityStore, SeedError> {
        Ok(InMemoryEntityStore::from_seed(self)?)
    }
}
