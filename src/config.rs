// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 the wsaa-client contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration types for the WSAA client.
//!
//! This module provides configuration structures for setting up a client
//! instance: the taxpayer identifier, signing material locations, endpoint
//! selection, ticket cache directory, and exchange timeout.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{Result, WsaaError};

/// Deployment environment selecting the authentication endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Production endpoint (`wsaa.afip.gov.ar`).
    Production,
    /// Testing/homologation endpoint (`wsaahomo.afip.gov.ar`).
    #[default]
    Testing,
}

impl Environment {
    /// The `loginCms` endpoint URL for this environment.
    pub fn endpoint_url(&self) -> Url {
        let raw = match self {
            Self::Production => "https://wsaa.afip.gov.ar/ws/services/LoginCms",
            Self::Testing => "https://wsaahomo.afip.gov.ar/ws/services/LoginCms",
        };
        Url::parse(raw).expect("valid built-in endpoint URL")
    }
}

/// Location of the PEM signing material used to produce the CMS login
/// request.
///
/// The files are read lazily, at issuance time, so a missing file surfaces
/// as a [`WsaaError::Credential`] from `get_ticket` rather than at
/// configuration time.
#[derive(Clone)]
pub struct SigningIdentity {
    /// Path to the PEM-encoded X.509 certificate.
    pub certificate_path: PathBuf,

    /// Path to the matching PEM-encoded RSA private key.
    pub key_path: PathBuf,

    /// Passphrase for an encrypted (PKCS#8) private key.
    pub passphrase: Option<String>,
}

impl SigningIdentity {
    /// Create an identity from certificate and key paths.
    pub fn new(certificate_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            certificate_path: certificate_path.into(),
            key_path: key_path.into(),
            passphrase: None,
        }
    }

    /// Set the private key passphrase.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("certificate_path", &self.certificate_path)
            .field("key_path", &self.key_path)
            .field("passphrase", &self.passphrase.is_some())
            .finish()
    }
}

/// Configuration for a WSAA client.
#[derive(Debug, Clone)]
pub struct WsaaClientConfig {
    /// Taxpayer identifier (CUIT) all tickets from this instance are bound
    /// to. Digits only.
    pub cuit: String,

    /// Signing material for the CMS login request.
    pub identity: SigningIdentity,

    /// Deployment environment selecting the default endpoint URL.
    pub environment: Environment,

    /// Explicit endpoint override.
    ///
    /// Takes precedence over `environment`; used by test harnesses to point
    /// the client at a local mock server.
    pub endpoint_override: Option<Url>,

    /// Directory holding the per-(CUIT, service) ticket files.
    pub cache_dir: PathBuf,

    /// Timeout for the login exchange, the only unbounded-wait point.
    pub timeout: Duration,
}

impl WsaaClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> WsaaClientConfigBuilder {
        WsaaClientConfigBuilder::new()
    }

    /// Resolve the `loginCms` endpoint URL.
    pub fn endpoint_url(&self) -> Url {
        self.endpoint_override
            .clone()
            .unwrap_or_else(|| self.environment.endpoint_url())
    }
}

/// Builder for [`WsaaClientConfig`].
#[derive(Debug, Default)]
pub struct WsaaClientConfigBuilder {
    cuit: Option<String>,
    certificate_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
    passphrase: Option<String>,
    environment: Option<Environment>,
    endpoint_override: Option<Url>,
    cache_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl WsaaClientConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the taxpayer identifier (CUIT).
    pub fn cuit(mut self, cuit: impl Into<String>) -> Self {
        self.cuit = Some(cuit.into());
        self
    }

    /// Set the path to the PEM-encoded signing certificate.
    pub fn certificate_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate_path = Some(path.into());
        self
    }

    /// Set the path to the PEM-encoded private key.
    pub fn key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.key_path = Some(path.into());
        self
    }

    /// Set the passphrase for an encrypted private key.
    pub fn key_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// Set the full signing identity at once.
    pub fn identity(mut self, identity: SigningIdentity) -> Self {
        self.certificate_path = Some(identity.certificate_path);
        self.key_path = Some(identity.key_path);
        self.passphrase = identity.passphrase;
        self
    }

    /// Select the deployment environment.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Override the endpoint URL (takes precedence over the environment).
    pub fn endpoint_url(mut self, url: impl AsRef<str>) -> std::result::Result<Self, url::ParseError> {
        self.endpoint_override = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Override the endpoint URL from a pre-parsed URL.
    pub fn endpoint_url_parsed(mut self, url: Url) -> Self {
        self.endpoint_override = Some(url);
        self
    }

    /// Set the ticket cache directory.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Set the exchange timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WsaaError::Validation`] if the CUIT is missing or not
    /// digits-only, or if either signing material path is missing.
    pub fn build(self) -> Result<WsaaClientConfig> {
        let cuit = self
            .cuit
            .ok_or_else(|| WsaaError::validation("cuit is required"))?;
        validate_cuit(&cuit)?;

        let certificate_path = self
            .certificate_path
            .ok_or_else(|| WsaaError::validation("certificate_path is required"))?;
        let key_path = self
            .key_path
            .ok_or_else(|| WsaaError::validation("key_path is required"))?;

        Ok(WsaaClientConfig {
            cuit,
            identity: SigningIdentity {
                certificate_path,
                key_path,
                passphrase: self.passphrase,
            },
            environment: self.environment.unwrap_or_default(),
            endpoint_override: self.endpoint_override,
            cache_dir: self.cache_dir.unwrap_or_else(std::env::temp_dir),
            timeout: self.timeout.unwrap_or(Duration::from_secs(30)),
        })
    }
}

/// Check that a CUIT is non-empty and digits only.
///
/// The CUIT feeds the deterministic cache file name, so the same check
/// guards path safety.
pub(crate) fn validate_cuit(cuit: &str) -> Result<()> {
    if cuit.is_empty() {
        return Err(WsaaError::validation("cuit must not be empty"));
    }
    if !cuit.chars().all(|c| c.is_ascii_digit()) {
        return Err(WsaaError::validation(format!(
            "cuit '{}' must contain only digits",
            cuit
        )));
    }
    Ok(())
}
