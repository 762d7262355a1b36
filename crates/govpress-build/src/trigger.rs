//! Who may start a build.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{BuildError, BuildResult};

/// Privileges a principal can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    /// May trigger bundle builds on demand.
    ManageBuilds,
}

/// Identity behind a manual trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Account name.
    pub name: String,
    /// Granted capabilities.
    pub capabilities: BTreeSet<Capability>,
}

impl Principal {
    /// Principal with no capabilities.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Grant `capability`.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Whether `capability` was granted.
    #[must_use]
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Principal for a local account: root and listed operators may manage builds.
#[must_use]
pub fn principal_for(user: &str, is_root: bool, operators: &[String]) -> Principal {
    let principal = Principal::new(user);
    if is_root || operators.iter().any(|operator| operator == user) {
        principal.with_capability(Capability::ManageBuilds)
    } else {
        principal
    }
}

/// What started a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Recurring scheduler job.
    Scheduled,
    /// On-demand request.
    Manual(Principal),
}

impl Trigger {
    /// Label recorded in logs and the build report.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => f.write_str("scheduled"),
            Self::Manual(principal) => write!(f, "manual:{}", principal.name),
        }
    }
}

/// Admission check run before any work.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerGate;

impl TriggerGate {
    /// Admit scheduled runs and manual runs from principals holding [`Capability::ManageBuilds`].
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Unauthorized`] for other manual triggers.
    pub fn authorize(self, trigger: &Trigger) -> BuildResult<()> {
        match trigger {
            Trigger::Scheduled => Ok(()),
            Trigger::Manual(principal) if principal.has(Capability::ManageBuilds) => Ok(()),
            Trigger::Manual(principal) => Err(BuildError::Unauthorized {
                principal: principal.name.clone(),
            }),
        }
    }
}
