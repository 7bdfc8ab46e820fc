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

//! Integration tests for get_ticket issuance and cache behavior

use chrono::Utc;

use crate::integration::{self, MockWsaaServer, TEST_CUIT, TEST_SERVICE};
use wsaa_client::{TicketCache, WsaaClient, WsaaError};

#[tokio::test]
async fn test_first_call_issues_and_caches() {
    let mock = MockWsaaServer::start().await;
    let dir = tempfile::tempdir().expect("temp dir");

    // Endpoint answers with a ticket good for twelve hours
    mock.mock_login_success(&integration::ticket_xml("T1", "S1", 12 * 60))
        .await;

    let client =
        WsaaClient::new(integration::test_config(&mock, dir.path())).expect("client creation");

    let credentials = client
        .get_ticket(TEST_SERVICE)
        .await
        .expect("issuance should succeed");
    assert_eq!(credentials.token, "T1");
    assert_eq!(credentials.sign, "S1");

    // Exactly one login, and the ticket landed in the cache
    assert_eq!(mock.login_request_count().await, 1);
    let cache = TicketCache::new(dir.path().join("cache"));
    let cached = cache
        .read(TEST_CUIT, TEST_SERVICE)
        .await
        .expect("cached entry");
    assert_eq!(cached.credentials.token, "T1");
}

#[tokio::test]
async fn test_valid_cached_ticket_skips_network() {
    // No mock is mounted: any request would fail the test
    let mock = MockWsaaServer::start().await;
    let dir = tempfile::tempdir().expect("temp dir");

    let cache = TicketCache::new(dir.path().join("cache"));
    cache
        .write(TEST_CUIT, TEST_SERVICE, &integration::ticket_expiring_in(60))
        .await
        .expect("seed cache");

    let client =
        WsaaClient::new(integration::test_config(&mock, dir.path())).expect("client creation");

    let credentials = client
        .get_ticket(TEST_SERVICE)
        .await
        .expect("cache hit should succeed");
    assert_eq!(credentials.token, "cached-token");
    assert_eq!(credentials.sign, "cached-sign");
    assert_eq!(mock.login_request_count().await, 0);
}

#[tokio::test]
async fn test_ticket_inside_safety_margin_is_refreshed() {
    let mock = MockWsaaServer::start().await;
    let dir = tempfile::tempdir().expect("temp dir");

    // Five minutes of headroom is inside the ten-minute safety margin
    let cache = TicketCache::new(dir.path().join("cache"));
    cache
        .write(TEST_CUIT, TEST_SERVICE, &integration::ticket_expiring_in(5))
        .await
        .expect("seed cache");

    mock.mock_login_success(&integration::ticket_xml("T2", "S2", 12 * 60))
        .await;

    let client =
        WsaaClient::new(integration::test_config(&mock, dir.path())).expect("client creation");

    let credentials = client
        .get_ticket(TEST_SERVICE)
        .await
        .expect("refresh should succeed");
    assert_eq!(credentials.token, "T2");
    assert_eq!(mock.login_request_count().await, 1);

    // The stale entry was replaced
    let replaced = cache
        .read(TEST_CUIT, TEST_SERVICE)
        .await
        .expect("replaced entry");
    assert_eq!(replaced.credentials.token, "T2");
}

#[tokio::test]
async fn test_corrupt_cache_entry_degrades_to_reissue() {
    let mock = MockWsaaServer::start().await;
    let dir = tempfile::tempdir().expect("temp dir");

    let cache_dir = dir.path().join("cache");
    std::fs::create_dir_all(&cache_dir).expect("cache dir");
    let cache = TicketCache::new(&cache_dir);
    std::fs::write(cache.entry_path(TEST_CUIT, TEST_SERVICE), b"][ not json")
        .expect("write corrupt entry");

    mock.mock_login_success(&integration::ticket_xml("T1", "S1", 12 * 60))
        .await;

    let client =
        WsaaClient::new(integration::test_config(&mock, dir.path())).expect("client creation");

    let credentials = client
        .get_ticket(TEST_SERVICE)
        .await
        .expect("corruption should degrade to a miss");
    assert_eq!(credentials.token, "T1");
    assert_eq!(mock.login_request_count().await, 1);
}

#[tokio::test]
async fn test_fresh_ticket_already_inside_margin_fails_closed() {
    let mock = MockWsaaServer::start().await;
    let dir = tempfile::tempdir().expect("temp dir");

    // The endpoint misbehaves: the issued ticket expires in five minutes
    mock.mock_login_success(&integration::ticket_xml("T1", "S1", 5))
        .await;

    let client =
        WsaaClient::new(integration::test_config(&mock, dir.path())).expect("client creation");

    let err = client.get_ticket(TEST_SERVICE).await.unwrap_err();
    assert!(matches!(err, WsaaError::Protocol(_)), "got {:?}", err);

    // One issuance attempt, no retry loop
    assert_eq!(mock.login_request_count().await, 1);
}

#[tokio::test]
async fn test_login_ticket_round_trips_header() {
    let mock = MockWsaaServer::start().await;
    let dir = tempfile::tempdir().expect("temp dir");

    mock.mock_login_success(&integration::ticket_xml("T1", "S1", 12 * 60))
        .await;

    let client =
        WsaaClient::new(integration::test_config(&mock, dir.path())).expect("client creation");

    let first = client
        .login_ticket(TEST_SERVICE)
        .await
        .expect("issuance should succeed");
    assert_eq!(first.header.unique_id, 2122749997);
    assert_eq!(
        first.header.source.as_deref(),
        Some("CN=wsaahomo, O=AFIP, C=AR")
    );
    assert_eq!(first.header.destination.as_deref(), Some("SERIE 2026"));
    assert!(first.header.expiration_time > Utc::now());

    // Second call is served from the cache, byte-for-byte equal
    let second = client
        .login_ticket(TEST_SERVICE)
        .await
        .expect("cache hit should succeed");
    assert_eq!(second, first);
    assert_eq!(mock.login_request_count().await, 1);
}
