use std::fmt::{Display, Formatter, Result as FmtResult};

/// The single classification folded from a message's whole processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingOutcome {
    Success,
    Error,
}

impl RoutingOutcome {
    /// Status code used as the key in routing tables
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingOutcome::Success => "success",
            RoutingOutcome::Error => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RoutingOutcome::Success)
    }
}

impl Display for RoutingOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
