//! Routing resolution
//!
//! Maps a routing outcome to the downstream destination(s) of a message.
//! Lookup order: the override table entry for this service and outcome, then
//! the deployment's default table, then terminate. Resolution performs no I/O;
//! the override file is read once when the table is built.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::models::RoutingOutcome;

/// Where a message goes next
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRouteTarget")]
pub enum RouteTarget {
    /// No further routing: the message is dropped deliberately
    Terminate,
    /// Forward once to this destination
    Forward(String),
    /// Forward one unmodified copy to each destination
    FanOut(Vec<String>),
}

impl RouteTarget {
    pub fn destinations(&self) -> Vec<&str> {
        match self {
            RouteTarget::Terminate => Vec::new(),
            RouteTarget::Forward(destination) => vec![destination.as_str()],
            RouteTarget::FanOut(destinations) => destinations.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.destinations().is_empty()
    }
}

/// Shape accepted in configuration: `false`, `null`, a string or a list of strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRouteTarget {
    Flag(bool),
    Single(String),
    Many(Vec<String>),
    Null(()),
}

impl TryFrom<RawRouteTarget> for RouteTarget {
    type Error = String;

    fn try_from(raw: RawRouteTarget) -> Result<Self, Self::Error> {
        match raw {
            RawRouteTarget::Flag(false) | RawRouteTarget::Null(()) => Ok(RouteTarget::Terminate),
            RawRouteTarget::Flag(true) => {
                Err("routing values must be a string, a list of strings, or false".to_string())
            }
            RawRouteTarget::Single(destination) if destination.trim().is_empty() => {
                Err("routing destination must not be empty".to_string())
            }
            RawRouteTarget::Single(destination) => Ok(RouteTarget::Forward(destination)),
            RawRouteTarget::Many(destinations) => {
                if destinations.iter().any(|d| d.trim().is_empty()) {
                    return Err("routing destination must not be empty".to_string());
                }
                Ok(RouteTarget::FanOut(destinations))
            }
        }
    }
}

/// Per-status routing table; keys are status codes such as `success` and `error`.
pub type StatusRoutes = HashMap<String, RouteTarget>;

#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    service_name: String,
    defaults: StatusRoutes,
    /// Service name -> status -> target
    overrides: HashMap<String, StatusRoutes>,
}

impl RoutingTable {
    pub fn new(service_name: impl Into<String>, defaults: StatusRoutes) -> Self {
        Self {
            service_name: service_name.into(),
            defaults,
            overrides: HashMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, StatusRoutes>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Build the table from the default routes (JSON object) and an optional override file.
    pub fn load(
        service_name: &str,
        defaults_json: &str,
        override_file: Option<&Path>,
    ) -> anyhow::Result<Self> {
        let defaults: StatusRoutes = serde_json::from_str(defaults_json)
            .context("DOWNSTREAM_ACTIONS must be a JSON object of status -> string | [string] | false")?;

        let overrides = match override_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).with_context(|| {
                    format!("Failed to read routing override file {}", path.display())
                })?;
                serde_json::from_str::<HashMap<String, StatusRoutes>>(&raw).with_context(|| {
                    format!("Invalid routing override file {}", path.display())
                })?
            }
            None => HashMap::new(),
        };

        tracing::debug!(
            service = %service_name,
            default_routes = defaults.len(),
            override_services = overrides.len(),
            "Routing table loaded"
        );

        Ok(Self::new(service_name, defaults).with_overrides(overrides))
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Resolve the next hop(s) for a status code
    pub fn resolve_status(&self, status: &str) -> RouteTarget {
        self.overrides
            .get(&self.service_name)
            .and_then(|routes| routes.get(status))
            .or_else(|| self.defaults.get(status))
            .cloned()
            .unwrap_or(RouteTarget::Terminate)
    }

    pub fn resolve(&self, outcome: RoutingOutcome) -> RouteTarget {
        self.resolve_status(outcome.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table(json: &str) -> RoutingTable {
        RoutingTable::load("thumbnailer", json, None).unwrap()
    }

    #[test]
    fn single_destination_and_terminate() {
        let table = table(r#"{"success": "next.queue", "error": false}"#);
        assert_eq!(table.resolve(RoutingOutcome::Success).destinations(), vec!["next.queue"]);
        assert_eq!(table.resolve(RoutingOutcome::Error), RouteTarget::Terminate);
        assert!(table.resolve(RoutingOutcome::Error).is_terminal());
    }

    #[test]
    fn list_fans_out_to_every_destination() {
        let table = table(r#"{"success": ["a", "b"]}"#);
        assert_eq!(table.resolve(RoutingOutcome::Success).destinations(), vec!["a", "b"]);
    }

    #[test]
    fn absent_and_null_statuses_terminate() {
        let table = table(r#"{"success": null}"#);
        assert_eq!(table.resolve(RoutingOutcome::Success), RouteTarget::Terminate);
        assert_eq!(table.resolve(RoutingOutcome::Error), RouteTarget::Terminate);
    }

    #[test]
    fn true_is_rejected() {
        let result = RoutingTable::load("thumbnailer", r#"{"success": true}"#, None);
        assert!(result.is_err());
    }

    #[test]
    fn override_for_this_service_takes_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"thumbnailer": {{"success": "override.queue"}}, "other": {{"error": "other.errors"}}}}"#
        )
        .unwrap();

        let table = RoutingTable::load(
            "thumbnailer",
            r#"{"success": "default.queue", "error": "default.errors"}"#,
            Some(file.path()),
        )
        .unwrap();

        assert_eq!(
            table.resolve(RoutingOutcome::Success),
            RouteTarget::Forward("override.queue".to_string())
        );
        // Other services' overrides never apply; missing override falls back to defaults.
        assert_eq!(
            table.resolve(RoutingOutcome::Error),
            RouteTarget::Forward("default.errors".to_string())
        );
    }

    #[test]
    fn override_can_terminate_a_default_route() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "thumbnailer".to_string(),
            HashMap::from([("success".to_string(), RouteTarget::Terminate)]),
        );
        let table = RoutingTable::new(
            "thumbnailer",
            HashMap::from([("success".to_string(), RouteTarget::Forward("next".to_string()))]),
        )
        .with_overrides(overrides);

        assert!(table.resolve(RoutingOutcome::Success).is_terminal());
    }

    #[test]
    fn missing_override_file_is_an_error() {
        let result = RoutingTable::load(
            "thumbnailer",
            "{}",
            Some(Path::new("/nonexistent/routing-overrides.json")),
        );
        assert!(result.is_err());
    }
}
