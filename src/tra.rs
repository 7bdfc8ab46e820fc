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

//! Login ticket request (TRA) construction.
//!
//! A TRA is the time-bounded XML document submitted to the authentication
//! endpoint. Its validity window straddles the moment of creation by a
//! fixed skew margin on each side, so moderate clock drift between this
//! host and the endpoint does not invalidate the request. The margin is
//! policy, not configuration: it absorbs drift, it does not extend ticket
//! lifetime.
//!
//! The rendered XML is what gets signed, so [`LoginTicketRequest::to_xml`]
//! is deterministic: single line, fixed field order, no insignificant
//! whitespace.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::error::{Result, WsaaError};

/// Clock-skew margin, in minutes, applied on both sides of the request
/// validity window.
pub const REQUEST_SKEW_MINUTES: i64 = 10;

/// The request skew margin as a [`Duration`].
pub fn request_skew_margin() -> Duration {
    Duration::minutes(REQUEST_SKEW_MINUTES)
}

/// A login ticket request (TRA), ready for signing.
///
/// Ephemeral: built per issuance, signed, submitted once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTicketRequest {
    /// Request identifier, seconds since the Unix epoch at creation.
    pub unique_id: u32,
    /// Start of the validity window (creation time minus the skew margin).
    pub generation_time: DateTime<Utc>,
    /// End of the validity window (creation time plus the skew margin).
    pub expiration_time: DateTime<Utc>,
    /// Identifier of the target web service, e.g. `wsfe`.
    pub service: String,
}

impl LoginTicketRequest {
    /// Build a request for `service` as of `now`.
    ///
    /// Pure function of its inputs; no I/O. Fails only on malformed input:
    /// an empty or ill-formed service name, or a clock outside the epoch
    /// range the wire format can carry.
    pub fn build(service: &str, now: DateTime<Utc>) -> Result<Self> {
        validate_service_name(service)?;

        let unique_id = u32::try_from(now.timestamp())
            .map_err(|_| WsaaError::validation("current time is outside the representable epoch range"))?;
        let margin = request_skew_margin();

        Ok(Self {
            unique_id,
            generation_time: now - margin,
            expiration_time: now + margin,
            service: service.to_owned(),
        })
    }

    /// Render the canonical TRA document.
    pub fn to_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <loginTicketRequest version=\"1.0\">\
             <header>\
             <uniqueId>{}</uniqueId>\
             <generationTime>{}</generationTime>\
             <expirationTime>{}</expirationTime>\
             </header>\
             <service>{}</service>\
             </loginTicketRequest>",
            self.unique_id,
            format_time(self.generation_time),
            format_time(self.expiration_time),
            self.service,
        )
    }
}

/// Check that a service name is non-empty and uses only `[A-Za-z0-9_.-]`.
///
/// The same alphabet keeps the derived cache file name safe, so this check
/// guards both the wire format and the filesystem.
pub(crate) fn validate_service_name(service: &str) -> Result<()> {
    if service.is_empty() {
        return Err(WsaaError::validation("service name must not be empty"));
    }
    if !service
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        return Err(WsaaError::validation(format!(
            "service name '{}' contains characters outside [A-Za-z0-9_.-]",
            service
        )));
    }
    Ok(())
}

fn format_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}
