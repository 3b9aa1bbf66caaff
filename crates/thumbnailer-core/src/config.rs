//! Configuration module
//!
//! All settings come from environment variables (optionally via a `.env`
//! file), are parsed once at startup into `Config` and passed down
//! explicitly. Nothing reads the environment after startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::routing::RoutingTable;
use crate::storage_types::StorageBackend;

// Defaults
const SERVICE_NAME: &str = "thumbnailer";
const PREFETCH: usize = 5;
const DOWNSTREAM_ACTIONS: &str = r#"{"success": false, "error": false}"#;
const THUMBNAIL_LIBRARY: &str = "miniofiles";
const THUMBNAIL_PREFIX: &str = "file-artifacts";
const HIGH_RES_WIDTH: u32 = 1200;
const HIGH_RES_DENSITY: u32 = 300;
const HIGH_RES_ROUTING_KEY: &str = "image_processing";
const RENDER_TIMEOUT_MS: u64 = 10_000;
const GRAPH_DATABASE: &str = "neo4j";

/// External tool command lines (program followed by fixed leading arguments)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolConfig {
    pub raster: String,
    pub converter: String,
    pub inspector: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            raster: "convert".to_string(),
            converter: "unoconv".to_string(),
            inspector: "pdfinfo".to_string(),
        }
    }
}

/// What gets rendered per message and where the results go
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub artifact_library: String,
    pub artifact_prefix: String,
    pub thumbnail_width: Option<u32>,
    pub thumbnail_height: Option<u32>,
    pub paginate: bool,
    pub generate_high_res: bool,
    pub high_res_width: u32,
    pub high_res_density: u32,
    /// Fixed destination for high-resolution page announcements
    pub high_res_routing_key: String,
    pub render_timeout: Duration,
    pub scratch_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            artifact_library: THUMBNAIL_LIBRARY.to_string(),
            artifact_prefix: THUMBNAIL_PREFIX.to_string(),
            thumbnail_width: None,
            thumbnail_height: None,
            paginate: false,
            generate_high_res: false,
            high_res_width: HIGH_RES_WIDTH,
            high_res_density: HIGH_RES_DENSITY,
            high_res_routing_key: HIGH_RES_ROUTING_KEY.to_string(),
            render_timeout: Duration::from_millis(RENDER_TIMEOUT_MS),
            scratch_dir: env::temp_dir(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_storage_path: Option<PathBuf>,
    pub s3_region: Option<String>,
    // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub s3_endpoint: Option<String>,
}

#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// Base URL of the graph database HTTP endpoint; `None` selects the in-memory graph
    pub url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: String,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub service_name: String,
    pub environment: String,
    /// Maximum number of messages processed concurrently
    pub prefetch: usize,
    pub downstream_actions: String,
    pub routing_override_file: Option<PathBuf>,
    pub log_format: String,
    pub render: RenderConfig,
    pub tools: ToolConfig,
    pub storage: StorageConfig,
    pub graph: GraphConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key/value source. `from_env` uses the process environment.
    pub fn from_lookup<F>(get: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |key: &str, default: bool| -> Result<bool, anyhow::Error> {
            match get(key) {
                Some(v) => v
                    .to_lowercase()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("{} must be true or false", key)),
                None => Ok(default),
            }
        };

        let render_defaults = RenderConfig::default();
        let tool_defaults = ToolConfig::default();

        let render = RenderConfig {
            artifact_library: get("THUMBNAIL_LIBRARY")
                .unwrap_or(render_defaults.artifact_library),
            artifact_prefix: get("THUMBNAIL_PREFIX").unwrap_or(render_defaults.artifact_prefix),
            thumbnail_width: parse_optional(get("THUMBNAIL_WIDTH"), "THUMBNAIL_WIDTH")?,
            thumbnail_height: parse_optional(get("THUMBNAIL_HEIGHT"), "THUMBNAIL_HEIGHT")?,
            paginate: flag("PAGINATE_RESULTS", false)?,
            generate_high_res: flag("GENERATE_HIGH_RES", false)?,
            high_res_width: parse_optional(get("HIGH_RES_WIDTH"), "HIGH_RES_WIDTH")?
                .unwrap_or(HIGH_RES_WIDTH),
            high_res_density: parse_optional(get("HIGH_RES_DENSITY"), "HIGH_RES_DENSITY")?
                .unwrap_or(HIGH_RES_DENSITY),
            high_res_routing_key: get("HIGH_RES_ROUTING_KEY")
                .unwrap_or(render_defaults.high_res_routing_key),
            render_timeout: Duration::from_millis(
                parse_optional(get("TIMEOUT"), "TIMEOUT")?.unwrap_or(RENDER_TIMEOUT_MS),
            ),
            scratch_dir: get("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(render_defaults.scratch_dir),
        };

        let tools = ToolConfig {
            raster: get("RASTER_TOOL").unwrap_or(tool_defaults.raster),
            converter: get("CONVERTER_TOOL").unwrap_or(tool_defaults.converter),
            inspector: get("INSPECTOR_TOOL").unwrap_or(tool_defaults.inspector),
        };

        let storage = StorageConfig {
            backend: match get("STORAGE_BACKEND") {
                Some(v) => v.parse()?,
                None => StorageBackend::Local,
            },
            local_storage_path: get("LOCAL_STORAGE_PATH").map(PathBuf::from),
            s3_region: get("S3_REGION").or_else(|| get("AWS_REGION")),
            s3_endpoint: get("S3_ENDPOINT"),
        };

        let graph = GraphConfig {
            url: get("GRAPH_URL"),
            user: get("GRAPH_USER"),
            password: get("GRAPH_PASSWORD"),
            database: get("GRAPH_DATABASE").unwrap_or_else(|| GRAPH_DATABASE.to_string()),
        };

        let config = Config {
            service_name: get("SERVICE_NAME").unwrap_or_else(|| SERVICE_NAME.to_string()),
            environment: get("ENVIRONMENT")
                .or_else(|| get("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            prefetch: parse_optional(get("PREFETCH"), "PREFETCH")?.unwrap_or(PREFETCH),
            downstream_actions: get("DOWNSTREAM_ACTIONS")
                .unwrap_or_else(|| DOWNSTREAM_ACTIONS.to_string()),
            routing_override_file: get("ROUTING_OVERRIDE_FILE").map(PathBuf::from),
            log_format: get("LOG_FORMAT")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| "compact".to_string()),
            render,
            tools,
            storage,
            graph,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.prefetch == 0 {
            return Err(anyhow::anyhow!("PREFETCH must be greater than zero"));
        }

        if self.render.high_res_width == 0 {
            return Err(anyhow::anyhow!("HIGH_RES_WIDTH must be greater than zero"));
        }

        if self.render.render_timeout.is_zero() {
            return Err(anyhow::anyhow!("TIMEOUT must be greater than zero"));
        }

        if self.render.artifact_library.contains('/') {
            return Err(anyhow::anyhow!("THUMBNAIL_LIBRARY must not contain '/'"));
        }

        if self.render.artifact_prefix.contains("..") {
            return Err(anyhow::anyhow!("THUMBNAIL_PREFIX must not contain '..'"));
        }

        // Routing values are checked here so a bad table fails startup, not the first message.
        self.routing_table()?;

        match self.storage.backend {
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::S3 => {
                if self.storage.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
        }

        if self.graph.url.is_some() && self.graph.user.is_some() != self.graph.password.is_some() {
            return Err(anyhow::anyhow!(
                "GRAPH_USER and GRAPH_PASSWORD must be set together"
            ));
        }

        Ok(())
    }

    /// Routing table for this service, including the override file if configured
    pub fn routing_table(&self) -> Result<RoutingTable, anyhow::Error> {
        RoutingTable::load(
            &self.service_name,
            &self.downstream_actions,
            self.routing_override_file.as_deref(),
        )
        .context("Invalid routing configuration")
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }
}

fn parse_optional<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
) -> Result<Option<T>, anyhow::Error> {
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| anyhow::anyhow!("{} must be a valid number, got '{}'", key, v))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoutingOutcome;
    use crate::routing::RouteTarget;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let config = config_from(&[("LOCAL_STORAGE_PATH", "/var/lib/thumbnailer")]).unwrap();
        assert_eq!(config.service_name, "thumbnailer");
        assert_eq!(config.prefetch, 5);
        assert_eq!(config.render.artifact_library, "miniofiles");
        assert_eq!(config.render.artifact_prefix, "file-artifacts");
        assert!(!config.render.paginate);
        assert!(!config.render.generate_high_res);
        assert_eq!(config.render.high_res_width, 1200);
        assert_eq!(config.render.render_timeout, Duration::from_millis(10_000));
        assert_eq!(config.tools, ToolConfig::default());
        assert_eq!(config.storage.backend, StorageBackend::Local);
        assert!(config.graph.url.is_none());

        let routing = config.routing_table().unwrap();
        assert_eq!(routing.resolve(RoutingOutcome::Success), RouteTarget::Terminate);
    }

    #[test]
    fn flags_and_numbers_are_parsed() {
        let config = config_from(&[
            ("LOCAL_STORAGE_PATH", "/data"),
            ("PAGINATE_RESULTS", "TRUE"),
            ("GENERATE_HIGH_RES", "true"),
            ("HIGH_RES_WIDTH", "2400"),
            ("TIMEOUT", "50000"),
            ("THUMBNAIL_WIDTH", "600"),
            ("DOWNSTREAM_ACTIONS", r#"{"success": ["a", "b"], "error": "errors"}"#),
        ])
        .unwrap();

        assert!(config.render.paginate);
        assert!(config.render.generate_high_res);
        assert_eq!(config.render.high_res_width, 2400);
        assert_eq!(config.render.render_timeout, Duration::from_secs(50));
        assert_eq!(config.render.thumbnail_width, Some(600));
        assert_eq!(config.render.thumbnail_height, None);
        assert_eq!(
            config.routing_table().unwrap().resolve(RoutingOutcome::Error),
            RouteTarget::Forward("errors".to_string())
        );
    }

    #[test]
    fn invalid_values_fail_startup() {
        assert!(config_from(&[("LOCAL_STORAGE_PATH", "/data"), ("TIMEOUT", "soon")]).is_err());
        assert!(config_from(&[("LOCAL_STORAGE_PATH", "/data"), ("TIMEOUT", "0")]).is_err());
        assert!(config_from(&[("LOCAL_STORAGE_PATH", "/data"), ("PREFETCH", "0")]).is_err());
        assert!(config_from(&[("LOCAL_STORAGE_PATH", "/data"), ("PAGINATE_RESULTS", "yes")]).is_err());
        assert!(config_from(&[
            ("LOCAL_STORAGE_PATH", "/data"),
            ("DOWNSTREAM_ACTIONS", r#"{"success": 42}"#)
        ])
        .is_err());
    }

    #[test]
    fn storage_backend_requirements_are_enforced() {
        assert!(config_from(&[]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "s3")]).is_err());

        let config = config_from(&[
            ("STORAGE_BACKEND", "s3"),
            ("S3_REGION", "us-east-1"),
            ("S3_ENDPOINT", "http://minio:9000"),
        ])
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.s3_endpoint.as_deref(), Some("http://minio:9000"));
    }

    #[test]
    fn graph_credentials_come_in_pairs() {
        let result = config_from(&[
            ("LOCAL_STORAGE_PATH", "/data"),
            ("GRAPH_URL", "http://neo4j:7474"),
            ("GRAPH_USER", "neo4j"),
        ]);
        assert!(result.is_err());
    }
}
