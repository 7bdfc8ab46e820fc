//! WSAA client implementation.
//!
//! This module provides the main `WsaaClient` struct, the single entry
//! point callers use to obtain authentication tickets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::cache::TicketCache;
use crate::config::WsaaClientConfig;
use crate::endpoint::LoginCmsClient;
use crate::error::{Result, WsaaError};
use crate::signer::CmsSigner;
use crate::ticket::{LoginTicketResponse, TicketCredentials, ticket_safety_margin};
use crate::tra::{LoginTicketRequest, validate_service_name};

/// Client for obtaining authentication tickets.
///
/// `WsaaClient` hides the issue/cache/refresh cycle behind a single call:
/// [`get_ticket`](Self::get_ticket) returns cached credentials while they
/// are comfortably inside their validity window and transparently issues a
/// fresh ticket when they are not. Concurrent callers asking for the same
/// (CUIT, service) pair share one issuance instead of racing the endpoint,
/// which matters because the service rejects a login while a previously
/// issued ticket is still current.
///
/// # Example
///
/// ```no_run
/// use wsaa_client::{Environment, WsaaClient, WsaaClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = WsaaClientConfig::builder()
///     .cuit("20111111111")
///     .certificate_path("taxpayer.crt")
///     .key_path("taxpayer.key")
///     .environment(Environment::Testing)
///     .build()?;
///
/// let client = WsaaClient::new(config)?;
///
/// let credentials = client.get_ticket("wsfe").await?;
/// println!("token: {}", credentials.token);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WsaaClient {
    config: WsaaClientConfig,
    endpoint: LoginCmsClient,
    cache: TicketCache,
    issuance_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl WsaaClient {
    /// Create a new WSAA client with the given configuration.
    ///
    /// Credential files are not touched here; they are read lazily on the
    /// first issuance so a client can be constructed before the material
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: WsaaClientConfig) -> Result<Self> {
        let endpoint = LoginCmsClient::new(&config)?;
        let cache = TicketCache::new(&config.cache_dir);

        Ok(Self {
            config,
            endpoint,
            cache,
            issuance_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &WsaaClientConfig {
        &self.config
    }

    /// Obtain valid credentials for a service.
    ///
    /// Returns the cached token/sign pair when one exists and is not within
    /// the safety margin of its expiration; otherwise issues a fresh ticket,
    /// persists it, and returns its credentials.
    pub async fn get_ticket(&self, service: &str) -> Result<TicketCredentials> {
        Ok(self.login_ticket(service).await?.credentials)
    }

    /// Like [`get_ticket`](Self::get_ticket), but returns the whole ticket,
    /// validity window and response header included.
    ///
    /// Useful when the caller needs the expiration time, for example to
    /// schedule its own work around the ticket's lifetime.
    pub async fn login_ticket(&self, service: &str) -> Result<LoginTicketResponse> {
        validate_service_name(service)?;

        let margin = ticket_safety_margin();
        let cuit = &self.config.cuit;

        // Fast path: a comfortably fresh cached ticket needs no lock.
        if let Some(ticket) = self.cache.read(cuit, service).await
            && ticket.is_valid(Utc::now(), margin)
        {
            tracing::debug!("using cached ticket for {}:{}", cuit, service);
            return Ok(ticket);
        }

        let lock = self.issuance_lock(service);
        let _guard = lock.lock().await;

        // Another task may have finished issuing while this one waited.
        if let Some(ticket) = self.cache.read(cuit, service).await
            && ticket.is_valid(Utc::now(), margin)
        {
            tracing::debug!("reusing ticket issued concurrently for {}:{}", cuit, service);
            return Ok(ticket);
        }

        tracing::info!("issuing ticket for {}:{}", cuit, service);
        let ticket = self.issue(service).await?;
        self.cache.write(cuit, service, &ticket).await?;

        // Read back the persisted copy rather than trusting the in-memory
        // one; the cache round trip is part of the contract.
        let persisted = self
            .cache
            .read(cuit, service)
            .await
            .ok_or_else(|| WsaaError::protocol("freshly cached ticket could not be read back"))?;

        if !persisted.is_valid(Utc::now(), margin) {
            return Err(WsaaError::protocol(format!(
                "endpoint issued a ticket already within the safety margin (expires {})",
                persisted.header.expiration_time
            )));
        }

        Ok(persisted)
    }

    /// Run one full issuance: build the request, sign it, exchange it.
    async fn issue(&self, service: &str) -> Result<LoginTicketResponse> {
        let signer = CmsSigner::from_identity(&self.config.identity).await?;

        let request = LoginTicketRequest::build(service, Utc::now())?;
        let signed = signer.sign(&request.to_xml(), Utc::now())?;

        self.endpoint.exchange(&signed).await
    }

    /// Per-(CUIT, service) issuance lock, created lazily.
    ///
    /// The map's mutex is held only for the lookup; the returned async
    /// mutex is what serializes the issuance itself.
    fn issuance_lock(&self, service: &str) -> Arc<tokio::sync::Mutex<()>> {
        let key = format!("{}:{}", self.config.cuit, service);
        let mut locks = self.issuance_locks.lock().unwrap();
        locks.entry(key).or_default().clone()
    }
}
