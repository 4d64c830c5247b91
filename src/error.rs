use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised by the simulation core.
///
/// Only configuration and start-up can fail. Once a [`crate::Simulation`]
/// exists, stepping and sampling are infallible.
#[derive(Debug, Error)]
pub enum SimError {
    /// A non-overlapping initial layout was not found within the attempt budget.
    #[error(
        "could not place disk {placed} of {requested} without overlap after {attempts} attempts"
    )]
    PlacementFailure {
        placed: usize,
        requested: usize,
        attempts: usize,
    },

    /// Two disks share the same centre, so no collision normal exists.
    #[error("disks {i} and {j} have coincident centres")]
    DegenerateCollision { i: usize, j: usize },

    /// Rejected parameter set.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Malformed TOML configuration file.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_failure_message_names_counts() {
        let e = SimError::PlacementFailure {
            placed: 3,
            requested: 10,
            attempts: 1000,
        };
        let msg = e.to_string();
        assert!(msg.contains("3 of 10"));
        assert!(msg.contains("1000"));
    }

    #[test]
    fn invalid_configuration_is_informative() {
        let msg = SimError::invalid("radius must be > 0").to_string();
        assert!(msg.contains("invalid configuration"));
        assert!(msg.contains("radius"));
    }
}
