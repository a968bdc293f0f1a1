//! Backend selection
//!
//! Every bucket and object command takes `--local` / `--persist-to`. The
//! backend is chosen once per invocation and handed to the command as a
//! trait object.

use std::path::PathBuf;

use clap::Args;
use r2_api::{Credentials, RemoteClient};
use r2_core::{Config, Error, LocalStore, ObjectStore, Result, resolve_root};

use crate::output::{Formatter, OutputConfig};

/// Backend selection flags shared by bucket and object commands
#[derive(Args, Debug, Clone, Default)]
pub struct BackendArgs {
    /// Operate on the local emulation store instead of the remote API
    #[arg(long)]
    pub local: bool,

    /// Directory for local state (default: .r2/state); only used with --local
    #[arg(long, value_name = "DIR")]
    pub persist_to: Option<PathBuf>,
}

/// Settings resolved from global flags, the environment and the config file
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub output: OutputConfig,
    pub account_id: Option<String>,
    pub api_token: Option<String>,
    pub api_url: String,
}

impl Context {
    /// Open the store selected by `backend`
    pub fn open_store(
        &self,
        backend: &BackendArgs,
        formatter: &Formatter,
    ) -> Result<Box<dyn ObjectStore>> {
        if backend.local {
            let explicit = backend
                .persist_to
                .as_deref()
                .or(self.config.local.persist_to.as_deref());
            let root = resolve_root(explicit)?;
            tracing::debug!(root = %root.path().display(), "Using local store");
            return Ok(Box::new(LocalStore::open(&root)));
        }

        if backend.persist_to.is_some() {
            formatter.warning("--persist-to only applies together with --local; ignoring it");
        }

        let account_id = self.account_id.clone().ok_or_else(|| {
            Error::Auth("No account id. Pass --account-id or set CLOUDFLARE_ACCOUNT_ID".into())
        })?;
        let api_token = self.api_token.clone().ok_or_else(|| {
            Error::Auth("No API token. Pass --api-token or set CLOUDFLARE_API_TOKEN".into())
        })?;

        tracing::debug!(api_url = %self.api_url, "Using remote API");
        let client = RemoteClient::new(
            Credentials {
                account_id,
                api_token,
            },
            &self.api_url,
        )?;
        Ok(Box::new(client))
    }
}
