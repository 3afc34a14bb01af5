//! Provider configuration
//!
//! Read once at start-up from environment variables:
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `CALICO_API_URL` | API server URL | `https://kubernetes.default.svc` |
//! | `CALICO_TOKEN` | bearer token | none |
//! | `CALICO_TOKEN_FILE` | file holding the bearer token | none |
//! | `CALICO_CA_CERT` | PEM bundle to trust | none |
//! | `CALICO_INSECURE_SKIP_TLS_VERIFY` | skip TLS verification | `false` |
//! | `CALICO_TIMEOUT_SECS` | per-request timeout | `30` |

use crate::error::ProviderError;
use calico_client::{CalicoClient, ClientOptions};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default API server URL (in-cluster service)
pub const DEFAULT_API_URL: &str = "https://kubernetes.default.svc";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the Calico API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_url: String,
    pub token: Option<String>,
    /// Read when the client is built; `token` takes precedence
    pub token_file: Option<PathBuf>,
    pub ca_cert: Option<PathBuf>,
    pub insecure_skip_tls_verify: bool,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            token_file: None,
            ca_cert: None,
            insecure_skip_tls_verify: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ProviderConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout = match var("CALICO_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    ProviderError::InvalidProviderConfig(format!(
                        "CALICO_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                if secs == 0 {
                    return Err(ProviderError::InvalidProviderConfig(
                        "CALICO_TIMEOUT_SECS must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let insecure_skip_tls_verify = match var("CALICO_INSECURE_SKIP_TLS_VERIFY") {
            Some(raw) => parse_flag("CALICO_INSECURE_SKIP_TLS_VERIFY", &raw)?,
            None => false,
        };

        Ok(Self {
            api_url: var("CALICO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token: var("CALICO_TOKEN"),
            token_file: var("CALICO_TOKEN_FILE").map(PathBuf::from),
            ca_cert: var("CALICO_CA_CERT").map(PathBuf::from),
            insecure_skip_tls_verify,
            timeout,
        })
    }

    /// Bearer token, reading `token_file` if no inline token is set
    pub fn resolve_token(&self) -> Result<Option<String>, ProviderError> {
        if let Some(token) = &self.token {
            return Ok(Some(token.clone()));
        }

        match &self.token_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| ProviderError::io(path, e))?;
                Ok(Some(raw.trim().to_string()).filter(|t| !t.is_empty()))
            }
            None => Ok(None),
        }
    }

    /// Build the REST client described by this configuration
    pub fn to_client(&self) -> Result<CalicoClient, ProviderError> {
        let ca_cert_pem = self
            .ca_cert
            .as_ref()
            .map(|path| std::fs::read(path).map_err(|e| ProviderError::io(path, e)))
            .transpose()?;

        let options = ClientOptions {
            timeout: self.timeout,
            ca_cert_pem,
            insecure_skip_tls_verify: self.insecure_skip_tls_verify,
        };

        Ok(CalicoClient::new(self.api_url.clone(), self.resolve_token()?, options)?)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ProviderError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ProviderError::InvalidProviderConfig(format!(
            "{} must be true or false, got '{}'",
            key, raw
        ))),
    }
}
