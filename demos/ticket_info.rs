//! Ticket lifetime inspection example.
//!
//! This example fetches the full login ticket instead of just its
//! credentials and prints the validity window the endpoint granted,
//! which is useful when scheduling work around a ticket's lifetime.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example ticket_info -- --cuit 20111111111 \
//!     --cert taxpayer.crt --key taxpayer.key --service wsfe
//! ```

use std::env;
use std::process::exit;

use wsaa_client::{WsaaClient, WsaaClientConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

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

    let config = match WsaaClientConfig::builder()
        .cuit(cuit)
        .certificate_path(cert_path)
        .key_path(key_path)
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to build config: {}", e);
            exit(1);
        }
    };

    let client = match WsaaClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create WSAA client: {}", e);
            exit(1);
        }
    };

    let ticket = match client.login_ticket(service).await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to obtain ticket: {}", e);
            exit(1);
        }
    };

    let remaining = ticket.header.expiration_time - chrono::Utc::now();

    println!("Ticket for {}:{}", cuit, service);
    println!("  Unique id:  {}", ticket.header.unique_id);
    println!("  Generated:  {}", ticket.header.generation_time);
    println!("  Expires:    {}", ticket.header.expiration_time);
    println!("  Remaining:  {} minutes", remaining.num_minutes());
    if let Some(source) = &ticket.header.source {
        println!("  Source:     {}", source);
    }
    if let Some(destination) = &ticket.header.destination {
        println!("  Issued to:  {}", destination);
    }
}
