//! Bearer credential resolution
//!
//! Two sources can supply a token: the ambient one read from the environment
//! at startup, and one typed in during the session. The ambient token wins.

use std::fmt;

use thiserror::Error;

/// A resolved bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Get the raw token
    pub fn token(&self) -> &str {
        &self.0
    }

    /// Get the authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Where the active credential came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Ambient,
    Session,
}

impl CredentialSource {
    pub fn label(&self) -> &'static str {
        match self {
            CredentialSource::Ambient => "environment",
            CredentialSource::Session => "session",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Not authenticated: set {env_var} or enter a token for this session")]
    Unauthenticated { env_var: String },
}

/// Credential inputs, passed explicitly instead of read from globals
#[derive(Clone, Default)]
pub struct CredentialSources {
    env_var: String,
    ambient: Option<String>,
    session: Option<String>,
}

impl CredentialSources {
    /// Create with an already-read ambient value
    pub fn new(env_var: impl Into<String>, ambient: Option<String>) -> Self {
        Self {
            env_var: env_var.into(),
            ambient: non_blank(ambient),
            session: None,
        }
    }

    /// Read the ambient token from an environment variable.
    /// An unset variable is a valid, unauthenticated state.
    pub fn from_env(env_var: &str) -> Self {
        let ambient = std::env::var(env_var).ok();
        if ambient.is_some() {
            tracing::info!("Ambient token found in {}", env_var);
        } else {
            tracing::info!("{} not set; a session token will be required", env_var);
        }
        Self::new(env_var, ambient)
    }

    /// Store a manually entered token for the rest of the session
    pub fn set_session(&mut self, token: impl Into<String>) {
        self.session = non_blank(Some(token.into()));
    }

    pub fn clear_session(&mut self) {
        self.session = None;
    }

    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    pub fn has_ambient(&self) -> bool {
        self.ambient.is_some()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Which source `resolve` would use, if any
    pub fn active_source(&self) -> Option<CredentialSource> {
        if self.ambient.is_some() {
            Some(CredentialSource::Ambient)
        } else if self.session.is_some() {
            Some(CredentialSource::Session)
        } else {
            None
        }
    }

    /// Resolve the credential: ambient first, then session
    pub fn resolve(&self) -> Result<Credential, CredentialError> {
        self.ambient
            .as_deref()
            .or(self.session.as_deref())
            .map(Credential::new)
            .ok_or_else(|| CredentialError::Unauthenticated {
                env_var: self.env_var.clone(),
            })
    }
}

impl fmt::Debug for CredentialSources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSources")
            .field("env_var", &self.env_var)
            .field("ambient", &self.ambient.as_ref().map(|_| "***"))
            .field("session", &self.session.as_ref().map(|_| "***"))
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
