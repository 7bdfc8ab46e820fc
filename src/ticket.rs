//! Parsed login ticket responses (TA).
//!
//! A TA is the endpoint's answer to a signed login request: an echoed
//! header (unique id, validity window) plus the opaque token/sign
//! credential pair business services consume. This module parses the
//! ticket XML defensively and owns the validity predicate the cache and
//! façade share.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WsaaError};
use crate::xml;

/// Safety margin, in minutes, added to "now" when judging whether a cached
/// ticket is still usable.
///
/// Mirrors the request skew margin: a ticket that expires within this
/// window could lapse mid-flight inside a caller's own remote call, so it
/// is treated as already expired.
pub const TICKET_SAFETY_MINUTES: i64 = 10;

/// The ticket safety margin as a [`Duration`].
pub fn ticket_safety_margin() -> Duration {
    Duration::minutes(TICKET_SAFETY_MINUTES)
}

/// Header block of a ticket response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHeader {
    /// Distinguished name of the issuing endpoint, when echoed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Distinguished name of the requesting party, when echoed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Request identifier echoed by the endpoint.
    pub unique_id: u32,
    /// Ticket generation time, as reported by the endpoint.
    pub generation_time: DateTime<Utc>,
    /// Ticket expiration time, as reported by the endpoint.
    pub expiration_time: DateTime<Utc>,
}

/// The token/sign pair consumers attach to business service calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketCredentials {
    /// Opaque authentication token.
    pub token: String,
    /// Opaque request signature.
    pub sign: String,
}

/// A parsed login ticket response.
///
/// This is the entity persisted to the ticket cache and returned by
/// [`crate::WsaaClient::login_ticket`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginTicketResponse {
    /// Echoed request header with the granted validity window.
    pub header: ResponseHeader,
    /// Granted credentials.
    pub credentials: TicketCredentials,
}

impl LoginTicketResponse {
    /// Parse a ticket response document.
    ///
    /// Element names are matched case-insensitively with namespace prefixes
    /// stripped, since envelopes differ between endpoint deployments. Every
    /// required field is checked; a missing or malformed one is a
    /// [`WsaaError::Protocol`].
    pub fn from_xml(text: &str) -> Result<Self> {
        let root = xml::element_text(text, "loginticketresponse")
            .ok_or_else(|| WsaaError::protocol("missing loginTicketResponse element"))?;
        let header = xml::element_text(root, "header")
            .ok_or_else(|| WsaaError::protocol("missing header element in ticket response"))?;
        let credentials = xml::element_text(root, "credentials").ok_or_else(|| {
            WsaaError::protocol("missing credentials element in ticket response")
        })?;

        let unique_id = required_text(header, "uniqueid")?;
        let unique_id = unique_id.parse::<u32>().map_err(|e| {
            WsaaError::protocol(format!("invalid uniqueId '{}': {}", unique_id, e))
        })?;

        Ok(Self {
            header: ResponseHeader {
                source: optional_text(header, "source"),
                destination: optional_text(header, "destination"),
                unique_id,
                generation_time: required_time(header, "generationtime")?,
                expiration_time: required_time(header, "expirationtime")?,
            },
            credentials: TicketCredentials {
                token: required_text(credentials, "token")?,
                sign: required_text(credentials, "sign")?,
            },
        })
    }

    /// Whether the ticket is still usable at `now`, leaving `safety_margin`
    /// of remaining lifetime.
    ///
    /// Fails closed: a ticket whose expiration equals `now + safety_margin`
    /// exactly is already invalid.
    pub fn is_valid(&self, now: DateTime<Utc>, safety_margin: Duration) -> bool {
        now + safety_margin < self.header.expiration_time
    }
}

fn required_text(scope: &str, name: &str) -> Result<String> {
    xml::element_value(scope, name)
        .map(xml::unescape)
        .ok_or_else(|| {
            WsaaError::protocol(format!("missing {} element in ticket response", name))
        })
}

fn optional_text(scope: &str, name: &str) -> Option<String> {
    xml::element_value(scope, name).map(xml::unescape)
}

fn required_time(scope: &str, name: &str) -> Result<DateTime<Utc>> {
    let raw = required_text(scope, name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| WsaaError::protocol(format!("invalid {} '{}': {}", name, raw, e)))
}
