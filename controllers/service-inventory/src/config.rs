//! Controller configuration, read from environment variables.

use crate::error::ControllerError;
use inventory_client::Selector;
use inventory_client::selector::DEFAULT_MANAGER;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_APPLY_TIMEOUT_SECS: u64 = 60;

/// Settings for one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Tracing deployment instance whose services are managed
    pub instance_name: String,
    /// Namespace of the managed services
    pub namespace: String,
    /// Multi-document YAML of desired Services
    pub manifest_path: PathBuf,
    /// Value of the managed-by label
    pub managed_by: String,
    /// Log the plan instead of applying it
    pub dry_run: bool,
    /// Deadline for the whole pass
    pub apply_timeout: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let instance_name = required(&lookup, "INSTANCE_NAME")?;
        let manifest_path = PathBuf::from(required(&lookup, "DESIRED_MANIFEST")?);
        let namespace = lookup("WATCH_NAMESPACE")
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let managed_by = lookup("MANAGED_BY")
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MANAGER.to_string());

        let dry_run = match lookup("DRY_RUN") {
            None => false,
            Some(value) => value.parse::<bool>().map_err(|_| {
                ControllerError::InvalidConfig(format!(
                    "DRY_RUN must be true or false, got {:?}",
                    value
                ))
            })?,
        };

        let apply_timeout = match lookup("APPLY_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_APPLY_TIMEOUT_SECS),
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ControllerError::InvalidConfig(format!(
                        "APPLY_TIMEOUT_SECS must be a positive number of seconds, got {:?}",
                        value
                    )));
                }
            },
        };

        Ok(Self {
            instance_name,
            namespace,
            manifest_path,
            managed_by,
            dry_run,
            apply_timeout,
        })
    }

    /// Selector matching the services this instance manages.
    pub fn selector(&self) -> Selector {
        Selector::for_instance_managed_by(&self.namespace, &self.instance_name, &self.managed_by)
    }
}

fn required<F>(lookup: &F, name: &str) -> Result<String, ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.is_empty()).ok_or_else(|| {
        ControllerError::InvalidConfig(format!("{} environment variable is required", name))
    })
}
