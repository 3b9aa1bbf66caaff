use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Which content store holds source documents and rendered artifacts.
///
/// Lives in core so configuration can select it without depending on the
/// storage crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// S3 or an S3-compatible server; libraries are buckets
    S3,
    /// Directory tree; libraries are sub-directories
    Local,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::S3 => "s3",
            StorageBackend::Local => "local",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "s3" | "minio" => Ok(StorageBackend::S3),
            "local" | "fs" => Ok(StorageBackend::Local),
            other => Err(anyhow::anyhow!(
                "Unknown STORAGE_BACKEND '{}' (expected s3 or local)",
                other
            )),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
