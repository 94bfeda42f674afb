//! Push command - mirror a local directory into a remote Drive folder
//!
//! 1. Layers command-line flags over the configuration file
//! 2. Validates every required input before any remote interaction
//! 3. Scans the local tree and wires the Drive adapter into the reconciler
//! 4. Prints the header, one status line per entry, and the elapsed time

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use dirpush_core::config::{PushConfig, PushConfigBuilder, ValidationError};
use dirpush_core::{CeilingPolicy, OpContext, OperationGovernor, PushError};
use dirpush_drive::{DriveClient, DriveHierarchy, RetryPolicy};
use dirpush_sync::{scan_tree, ReconcileSummary, Reconciler};

use crate::output::{format_elapsed, StdoutReporter};

/// Environment variable consulted for the access token
pub const ACCESS_TOKEN_ENV: &str = "DIRPUSH_ACCESS_TOKEN";

/// Flags of a push run; each one overrides the matching config file entry
#[derive(Debug, Default, Args)]
pub struct PushCommand {
    /// Id of the remote folder to push into
    #[arg(long, alias = "gdrive-root-id", value_name = "ID")]
    pub remote_root_id: Option<String>,

    /// Local directory to push (absolute or relative)
    #[arg(long, alias = "local-dir-to-push", value_name = "DIR")]
    pub local_dir: Option<PathBuf>,

    /// Id of the remote folder that receives replaced files
    #[arg(long, alias = "old-files-dir", value_name = "ID")]
    pub quarantine_id: Option<String>,

    /// Maximum number of mutating remote operations
    #[arg(long, value_name = "N")]
    pub max_ops: Option<u64>,

    /// OAuth bearer token for the Drive API
    #[arg(long, env = "DIRPUSH_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Drive API base URL
    #[arg(long, value_name = "URL")]
    pub api_base_url: Option<String>,
}

/// Inputs of a run that passed validation
#[derive(Debug, Clone)]
pub struct ResolvedRun {
    pub config: PushConfig,
    pub access_token: String,
}

impl PushCommand {
    /// Builds the effective configuration.
    ///
    /// An explicit `config_path` must load; otherwise the default location is
    /// tried and missing files fall back to defaults.
    ///
    /// # Errors
    /// [`PushError::Config`] listing every missing or invalid input, or a
    /// load failure of an explicit config file.
    pub fn resolve(&self, config_path: Option<&Path>) -> Result<ResolvedRun> {
        let base = match config_path {
            Some(path) => PushConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => PushConfig::load_or_default(&PushConfig::default_path()),
        };

        let config = self.apply(base);
        let mut errors = config.validate();

        let access_token = self
            .access_token
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if access_token.is_empty() {
            errors.push(ValidationError {
                field: "access_token".into(),
                message: format!("must be provided with --access-token or {ACCESS_TOKEN_ENV}"),
            });
        }

        if !errors.is_empty() {
            return Err(PushError::Config(errors).into());
        }
        Ok(ResolvedRun {
            config,
            access_token,
        })
    }

    /// Layers the flags that were given over `base`
    fn apply(&self, base: PushConfig) -> PushConfig {
        let mut builder = PushConfigBuilder::from_config(base);
        if let Some(id) = &self.remote_root_id {
            builder = builder.root_id(id.clone());
        }
        if let Some(id) = &self.quarantine_id {
            builder = builder.quarantine_id(id.clone());
        }
        if let Some(dir) = &self.local_dir {
            builder = builder.local_dir(dir.clone());
        }
        if let Some(max_ops) = self.max_ops {
            builder = builder.max_ops(max_ops);
        }
        if let Some(url) = &self.api_base_url {
            builder = builder.api_base_url(url.clone());
        }
        builder.build()
    }
}

/// Runs one push with validated inputs
///
/// Exceeding the operation ceiling terminates the process from inside the
/// governor.
pub async fn execute(run: ResolvedRun, cancel: CancellationToken) -> Result<ReconcileSummary> {
    let ResolvedRun {
        config,
        access_token,
    } = run;
    let root_id = config.root_id().map_err(PushError::from)?;
    let quarantine_id = config.quarantine_id().map_err(PushError::from)?;
    let local_dir = absolute_dir(&config.local.dir)?;

    let start = Instant::now();
    println!(
        "Pushing contents of {:?} to remote folder {:?}\n",
        local_dir.display().to_string(),
        root_id.as_str()
    );
    println!("{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"));

    let mut tree = scan_tree(&local_dir).map_err(PushError::from)?;

    let governor = Arc::new(OperationGovernor::new(
        config.limits.max_ops,
        CeilingPolicy::ExitProcess,
    ));
    let ctx = OpContext::new(Arc::clone(&governor), cancel);

    let client = DriveClient::with_base_url(access_token, config.remote.api_base_url.clone());
    let retry = RetryPolicy::from_millis(config.upload.retry_base_ms, config.upload.retry_max_ms);
    let hierarchy = DriveHierarchy::with_retry_policy(client, retry);

    let reconciler = Reconciler::new(
        Arc::new(hierarchy),
        quarantine_id,
        ctx,
        Arc::new(StdoutReporter),
    );
    let summary = reconciler.run(&mut tree, root_id).await?;

    info!(
        operations = governor.executed(),
        ceiling = governor.ceiling(),
        "Push completed"
    );
    println!("Took {}", format_elapsed(start.elapsed()));
    Ok(summary)
}

fn absolute_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(cwd.join(dir))
}
