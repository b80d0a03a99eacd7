//! One reconciliation run: desired state in, minimal enable/disable calls
//! out.
//!
//! The live mount table is fetched once, up front, so no decision acts on
//! state observed mid-run. Each configuration file is evaluated as it is
//! parsed; after the walk, every live mount absent from the desired set is
//! disabled. Per-path failures are collected rather than aborting the run,
//! and surface together at the end.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::client::VaultApi;
use crate::config::{AuthMount, DesiredMount};
use crate::diff;
use crate::error::{Error, Result};
use crate::loader;

/// Auth types the service refuses to disable; attempting it answers 400.
const PROTECTED_TYPES: &[&str] = &["token"];

pub struct Reconciler<'a> {
    client: &'a dyn VaultApi,
    root: PathBuf,
}

/// What one run did, for the final log line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub enabled: usize,
    pub disabled: usize,
    pub unchanged: usize,
}

impl<'a> Reconciler<'a> {
    pub fn new(client: &'a dyn VaultApi, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            root: root.into(),
        }
    }

    pub async fn run(&self) -> Result<ReconcileSummary> {
        // Nothing can proceed without the live table, so this one call is
        // fail-fast. Keys are canonicalized here, once; everything after
        // compares slash-free paths.
        let live = canonicalize_live(self.client.list_auth_mounts().await?);
        debug!(mounts = live.len(), "fetched live auth mounts");

        let mut desired: BTreeMap<String, DesiredMount> = BTreeMap::new();
        let mut summary = ReconcileSummary::default();
        let mut failures: Vec<Error> = Vec::new();

        for entry in loader::walk_config_files(&self.root) {
            let file = match entry {
                Ok(file) => file,
                Err(err) => {
                    failures.push(err);
                    continue;
                }
            };
            let mount = match DesiredMount::from_file(&file) {
                Ok(Some(mount)) => mount,
                Ok(None) => continue,
                Err(err) => {
                    failures.push(err);
                    continue;
                }
            };
            if desired.contains_key(&mount.path) {
                warn!(path = %mount.path, "duplicate mount declaration, last file wins");
            }
            match self.ensure_mount(&mount, live.get(&mount.path)).await {
                Ok(Action::Enabled) => summary.enabled += 1,
                Ok(Action::Unchanged) => summary.unchanged += 1,
                Err(err) => failures.push(err),
            }
            desired.insert(mount.path.clone(), mount);
        }

        summary.disabled += self
            .disable_unconfigured(&live, &desired, &mut failures)
            .await;

        info!(
            enabled = summary.enabled,
            disabled = summary.disabled,
            unchanged = summary.unchanged,
            failed = failures.len(),
            "reconciliation complete"
        );

        if failures.is_empty() {
            Ok(summary)
        } else {
            Err(Error::Failures(failures))
        }
    }

    /// Enable `mount` unless the live entry already carries its exact
    /// configuration.
    async fn ensure_mount(
        &self,
        mount: &DesiredMount,
        live: Option<&AuthMount>,
    ) -> Result<Action> {
        if let Some(live) = live {
            let applied = diff::is_applied(&mount.options.config, &live.config)
                .map_err(|source| remote("compare", &mount.path, source))?;
            if applied {
                info!(path = %mount.path, auth_type = %mount.options.auth_type, "already applied");
                return Ok(Action::Unchanged);
            }
        }
        info!(path = %mount.path, auth_type = %mount.options.auth_type, "enabling auth mount");
        self.client
            .enable_auth_mount(&mount.path, &mount.options)
            .await
            .map_err(|source| remote("enable", &mount.path, source))?;
        Ok(Action::Enabled)
    }

    /// Disable every live mount the configuration tree does not declare,
    /// except non-disableable types.
    async fn disable_unconfigured(
        &self,
        live: &BTreeMap<String, AuthMount>,
        desired: &BTreeMap<String, DesiredMount>,
        failures: &mut Vec<Error>,
    ) -> usize {
        let mut disabled = 0;
        for (path, mount) in live {
            if desired.contains_key(path) {
                continue;
            }
            if PROTECTED_TYPES.contains(&mount.auth_type.as_str()) {
                debug!(path = %path, auth_type = %mount.auth_type, "cannot be disabled, leaving in place");
                continue;
            }
            info!(path = %path, auth_type = %mount.auth_type, "disabling auth mount");
            match self.client.disable_auth_mount(path).await {
                Ok(()) => disabled += 1,
                Err(source) => failures.push(remote("disable", path, source)),
            }
        }
        disabled
    }
}

enum Action {
    Enabled,
    Unchanged,
}

fn remote(op: &'static str, path: &str, source: Error) -> Error {
    Error::Remote {
        op,
        path: path.to_string(),
        source: Box::new(source),
    }
}

/// The service reports mount paths with a trailing slash; desired paths are
/// file stems without one. Strip it at the boundary so the rest of the run
/// deals in one key form.
fn canonicalize_live(
    live: std::collections::HashMap<String, AuthMount>,
) -> BTreeMap<String, AuthMount> {
    live.into_iter()
        .map(|(path, mount)| (path.trim_matches('/').to_string(), mount))
        .collect()
}
