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

//! Simple ticket issuance example.
//!
//! This example demonstrates basic client usage: obtain a token/sign pair
//! for one service, served from the cache when a fresh ticket exists.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example get_ticket -- --cuit 20111111111 \
//!     --cert taxpayer.crt --key taxpayer.key --service wsfe
//! ```

use std::env;
use std::process::exit;

use wsaa_client::{Environment, WsaaClient, WsaaClientConfig};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let flag = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .map(|s| s.as_str())
    };

    let cuit = flag("--cuit").unwrap_or("20111111111");
    let cert_path = flag("--cert").unwrap_or("taxpayer.crt");
    let key_path = flag("--key").unwrap_or("taxpayer.key");
    let service = flag("--service").unwrap_or("wsfe");
    let environment = if args.iter().any(|a| a == "--production") {
        Environment::Production
    } else {
        Environment::Testing
    };

    println!("WSAA Ticket Example");
    println!("===================");
    println!("CUIT: {}", cuit);
    println!("Service: {}", service);
    println!("Environment: {:?}", environment);
    println!();

    // Build client configuration
    let config = match WsaaClientConfig::builder()
        .cuit(cuit)
        .certificate_path(cert_path)
        .key_path(key_path)
        .environment(environment)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build config: {}", e);
            exit(1);
        }
    };

    // Create WSAA client
    let client = match WsaaClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create WSAA client: {}", e);
            exit(1);
        }
    };

    // Obtain credentials (issues a fresh ticket on a cache miss)
    println!("Requesting ticket for {}...", service);
    match client.get_ticket(service).await {
        Ok(credentials) => {
            println!("  Ticket obtained!");
            println!("  Token: {}", credentials.token);
            println!("  Sign:  {}", credentials.sign);
        }
        Err(e) => {
            eprintln!("  Failed to obtain ticket: {}", e);
            if let Some(code) = e.fault_code() {
                eprintln!("  Fault code: {}", code);
            }
            exit(1);
        }
    }

    println!();
    println!("Done!");
}
