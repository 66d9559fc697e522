//! Trusty URI stamping and signing.
//!
//! Computing trusty URIs and signatures is delegated to the external `np`
//! tool. The pipeline only sees the [`IdentityStamper`] trait so tests can
//! substitute a fake that never spawns a process.
//!
//! Exactly one tool operation runs per submission:
//!
//! | `sign_nanopub` | Command | Output |
//! |----------------|---------|--------|
//! | `false` | `np mktrusty -o <id>.trusty.trig <id>.trig` | trusty file |
//! | `true` | `np sign -a <type> -k <key> -o <id>.sign.trig <id>.trig` | signed file |
//!
//! Signing also assigns the trusty URI, so no separate `mktrusty` pass runs.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::NanopubConfig;
use crate::context::SubmissionContext;

// ---------------------------------------------------------------------------
// StampError
// ---------------------------------------------------------------------------

/// Errors from the identifier tool. All of them are fatal to the submission.
#[derive(Debug, thiserror::Error)]
pub enum StampError {
    /// The executable could not be started.
    #[error("failed to run identifier tool: {0}")]
    Spawn(#[from] std::io::Error),

    /// The tool did not finish within the configured timeout.
    #[error("identifier tool timed out after {0:?}")]
    Timeout(Duration),

    /// The tool exited unsuccessfully.
    #[error("identifier tool exited with {status}")]
    Failed {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

// ---------------------------------------------------------------------------
// IdentityStamper
// ---------------------------------------------------------------------------

/// Turns the raw input file of a submission into a stamped document.
#[async_trait]
pub trait IdentityStamper: Send + Sync + 'static {
    /// Stamp `ctx`'s input file and return the path of the stamped document.
    async fn stamp(&self, ctx: &SubmissionContext) -> Result<PathBuf, StampError>;
}

/// Which tool operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StampMode {
    Trusty,
    Sign { key_type: String, private_key: String },
}

// ---------------------------------------------------------------------------
// NpClient
// ---------------------------------------------------------------------------

/// [`IdentityStamper`] backed by the `np` command-line tool.
#[derive(Debug, Clone)]
pub struct NpClient {
    exec: String,
    timeout: Duration,
    mode: StampMode,
}

impl NpClient {
    pub fn new(exec: impl Into<String>, timeout: Duration, mode: StampMode) -> Self {
        Self {
            exec: exec.into(),
            timeout,
            mode,
        }
    }

    pub fn from_config(cfg: &NanopubConfig) -> Self {
        let mode = if cfg.sign_nanopub {
            StampMode::Sign {
                key_type: cfg.sign_key_type.clone(),
                private_key: cfg.sign_private_key.clone(),
            }
        } else {
            StampMode::Trusty
        };
        Self::new(cfg.client_exec.clone(), cfg.client_timeout, mode)
    }

    pub fn mode(&self) -> &StampMode {
        &self.mode
    }

    /// Tool arguments and the resulting output path for `ctx`.
    fn invocation(&self, ctx: &SubmissionContext) -> (Vec<String>, PathBuf) {
        match &self.mode {
            StampMode::Trusty => (
                vec![
                    "mktrusty".into(),
                    "-o".into(),
                    ctx.trusty_file(),
                    ctx.input_file(),
                ],
                ctx.trusty_path(),
            ),
            StampMode::Sign {
                key_type,
                private_key,
            } => (
                vec![
                    "sign".into(),
                    "-a".into(),
                    key_type.clone(),
                    "-k".into(),
                    private_key.clone(),
                    "-o".into(),
                    ctx.signed_file(),
                    ctx.input_file(),
                ],
                ctx.signed_path(),
            ),
        }
    }
}

#[async_trait]
impl IdentityStamper for NpClient {
    async fn stamp(&self, ctx: &SubmissionContext) -> Result<PathBuf, StampError> {
        let (args, output) = self.invocation(ctx);
        debug!("stamper: running {} {}", self.exec, args.join(" "));

        let child = Command::new(&self.exec)
            .args(&args)
            .current_dir(ctx.workdir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let out = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("stamper: {} timed out after {:?}", self.exec, self.timeout);
                return Err(StampError::Timeout(self.timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
        if !out.status.success() {
            warn!(
                "stamper: failed to make trusty URI ({}):\n{stdout}\n\n{stderr}",
                out.status
            );
            return Err(StampError::Failed {
                status: out.status,
                stdout,
                stderr,
            });
        }
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
