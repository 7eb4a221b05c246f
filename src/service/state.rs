use std::fmt;

/// Lifecycle of a service. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceState {
    #[default]
    Created,
    Running,
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Created => "created",
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
