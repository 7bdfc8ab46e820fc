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

//! # wsaa-client
//!
//! A Rust client for WSAA, the authentication and authorization web service
//! that fronts AFIP's fiscal web services.
//!
//! Every AFIP web service call must carry an authentication ticket (TA): a
//! short-lived token/sign credential pair issued per taxpayer (CUIT) and per
//! target service. This library obtains those tickets, caches them on disk,
//! and refreshes them before they expire.
//!
//! ## Features
//!
//! - **Async-first design** using Tokio
//! - **CMS-signed login requests**: SHA-256 digests, RSA PKCS#1 v1.5
//!   signatures, signing time as an authenticated attribute
//! - **Persistent ticket cache**, one atomically replaced file per
//!   (CUIT, service) pair
//! - **Single-flight issuance**: concurrent callers of the same pair share
//!   one login instead of racing the endpoint
//! - **Production and testing endpoints** built in, plus an override for
//!   test harnesses
//!
//! ## Quick Start
//!
//! ```no_run
//! use wsaa_client::{Environment, WsaaClient, WsaaClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Configure the taxpayer identity and environment
//!     let config = WsaaClientConfig::builder()
//!         .cuit("20111111111")
//!         .certificate_path("taxpayer.crt")
//!         .key_path("taxpayer.key")
//!         .environment(Environment::Testing)
//!         .build()?;
//!
//!     let client = WsaaClient::new(config)?;
//!
//!     // Served from the cache when a fresh ticket exists, otherwise a
//!     // new one is issued and persisted.
//!     let credentials = client.get_ticket("wsfe").await?;
//!     println!("token: {}", credentials.token);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Inspecting ticket lifetime
//!
//! ```no_run
//! use wsaa_client::{WsaaClient, WsaaClientConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = WsaaClientConfig::builder()
//!     .cuit("20111111111")
//!     .certificate_path("taxpayer.crt")
//!     .key_path("taxpayer.key")
//!     .build()?;
//! let client = WsaaClient::new(config)?;
//!
//! let ticket = client.login_ticket("wsfe").await?;
//! println!("wsfe ticket valid until {}", ticket.header.expiration_time);
//! # Ok(())
//! # }
//! ```
//!
//! ## Protocol notes
//!
//! A login is a single SOAP exchange:
//!
//! 1. Build a login ticket request (TRA): a small XML document carrying a
//!    unique id, a clock-skew-tolerant validity window, and the target
//!    service name (`tra` module).
//! 2. Sign it as a CMS/PKCS#7 SignedData message with the taxpayer's X.509
//!    certificate (`signer` module).
//! 3. POST the base64 DER to the `loginCms` operation (`endpoint` module).
//! 4. Parse the returned ticket: credentials plus a validity window
//!    (`ticket` module).
//!
//! Issued tickets live for hours, and the service rejects a new login while
//! a previously issued ticket is still current. The client therefore
//! persists every ticket it obtains (`cache` module) and reuses it until it
//! is within ten minutes of expiration.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cache;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod signer;
pub mod ticket;
pub mod tra;

mod xml;

// Re-export main types at crate root for convenience
pub use cache::TicketCache;
pub use client::WsaaClient;
pub use config::{Environment, SigningIdentity, WsaaClientConfig, WsaaClientConfigBuilder};
pub use endpoint::LoginCmsClient;
pub use error::{Result, WsaaError};
pub use signer::CmsSigner;
pub use ticket::{LoginTicketResponse, ResponseHeader, TicketCredentials};
pub use tra::LoginTicketRequest;

// Re-export x509_cert::Certificate for convenience
pub use x509_cert::Certificate;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("wsaa-client/", env!("CARGO_PKG_VERSION"));
