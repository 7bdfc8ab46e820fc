//! Integration test utilities and helpers
//!
//! This module provides common test infrastructure for WSAA client
//! integration tests: a mock authentication endpoint speaking the
//! `loginCms` SOAP shape, taxpayer identity fixtures, and config helpers.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::signature::Keypair;
use sha2::Sha256;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use x509_cert::builder::{Builder, CertificateBuilder, Profile};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Validity;

use wsaa_client::{
    LoginTicketResponse, ResponseHeader, TicketCredentials, WsaaClientConfig,
};

/// CUIT used throughout the integration tests.
pub const TEST_CUIT: &str = "20111111111";

/// Service name used throughout the integration tests.
pub const TEST_SERVICE: &str = "wsfe";

/// Path of the `loginCms` operation on the mock server.
pub const LOGIN_CMS_PATH: &str = "/ws/services/LoginCms";

/// Mock authentication endpoint for integration tests.
pub struct MockWsaaServer {
    server: MockServer,
}

impl MockWsaaServer {
    /// Create a new mock endpoint.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Get the base URL of the mock server.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Full URL of the `loginCms` operation.
    pub fn login_cms_url(&self) -> String {
        format!("{}{}", self.server.uri(), LOGIN_CMS_PATH)
    }

    /// Get a reference to the inner MockServer for custom mocking.
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Mock a successful loginCms response carrying the given ticket XML.
    pub async fn mock_login_success(&self, ticket_xml: &str) {
        Mock::given(method("POST"))
            .and(path(LOGIN_CMS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(soap_response(ticket_xml))
                    .insert_header("Content-Type", "text/xml; charset=utf-8"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a SOAP fault. The real service reports faults with HTTP 500.
    pub async fn mock_login_fault(&self, code: &str, message: &str) {
        Mock::given(method("POST"))
            .and(path(LOGIN_CMS_PATH))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_string(soap_fault(code, message))
                    .insert_header("Content-Type", "text/xml; charset=utf-8"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a plain HTTP error with no SOAP body.
    pub async fn mock_login_http_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(LOGIN_CMS_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string("service unavailable"))
            .mount(&self.server)
            .await;
    }

    /// Mock a successful response delivered after `delay`.
    pub async fn mock_login_delayed(&self, ticket_xml: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(LOGIN_CMS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(delay)
                    .set_body_string(soap_response(ticket_xml))
                    .insert_header("Content-Type", "text/xml; charset=utf-8"),
            )
            .mount(&self.server)
            .await;
    }

    /// Number of loginCms requests the mock has received.
    pub async fn login_request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| {
                requests
                    .iter()
                    .filter(|r| r.url.path() == LOGIN_CMS_PATH)
                    .count()
            })
            .unwrap_or(0)
    }
}

/// Serialized loginTicketResponse whose window opens an hour ago and closes
/// `expires_in_minutes` from now.
pub fn ticket_xml(token: &str, sign: &str, expires_in_minutes: i64) -> String {
    let generation = Utc::now() - chrono::Duration::hours(1);
    let expiration = Utc::now() + chrono::Duration::minutes(expires_in_minutes);

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <loginTicketResponse version=\"1.0\">\
         <header>\
         <source>CN=wsaahomo, O=AFIP, C=AR</source>\
         <destination>SERIE 2026</destination>\
         <uniqueId>2122749997</uniqueId>\
         <generationTime>{}</generationTime>\
         <expirationTime>{}</expirationTime>\
         </header>\
         <credentials><token>{}</token><sign>{}</sign></credentials>\
         </loginTicketResponse>",
        generation.to_rfc3339_opts(SecondsFormat::Secs, true),
        expiration.to_rfc3339_opts(SecondsFormat::Secs, true),
        token,
        sign
    )
}

/// A parsed ticket whose validity window ends `minutes` from now, for
/// seeding the cache directly.
pub fn ticket_expiring_in(minutes: i64) -> LoginTicketResponse {
    LoginTicketResponse {
        header: ResponseHeader {
            source: None,
            destination: None,
            unique_id: 1,
            generation_time: Utc::now() - chrono::Duration::hours(1),
            expiration_time: Utc::now() + chrono::Duration::minutes(minutes),
        },
        credentials: TicketCredentials {
            token: "cached-token".to_string(),
            sign: "cached-sign".to_string(),
        },
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Wrap a ticket in the SOAP envelope the service answers with.
pub fn soap_response(ticket_xml: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <soapenv:Body>\
         <ns1:loginCmsResponse xmlns:ns1=\"http://wsaa.view.sua.dvadac.desein.afip.gov\">\
         <ns1:loginCmsReturn>{}</ns1:loginCmsReturn>\
         </ns1:loginCmsResponse>\
         </soapenv:Body>\
         </soapenv:Envelope>",
        escape_xml(ticket_xml)
    )
}

/// A SOAP fault body in the service's shape.
pub fn soap_fault(code: &str, message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <soapenv:Body><soapenv:Fault>\
         <faultcode>ns1:{}</faultcode>\
         <faultstring>{}</faultstring>\
         </soapenv:Fault></soapenv:Body></soapenv:Envelope>",
        code, message
    )
}

/// Taxpayer identity fixture: a 2048-bit key and matching self-signed
/// certificate, generated once per test binary.
pub fn test_identity_pem() -> &'static (String, String) {
    static IDENTITY: OnceLock<(String, String)> = OnceLock::new();
    IDENTITY.get_or_init(generate_identity)
}

fn generate_identity() -> (String, String) {
    use der::EncodePem;

    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("generate RSA key");

    let signer = SigningKey::<Sha256>::new(private_key.clone());
    let spki_der = signer
        .verifying_key()
        .to_public_key_der()
        .expect("encode public key");
    let spki =
        SubjectPublicKeyInfoOwned::try_from(spki_der.as_bytes()).expect("parse public key info");

    let subject =
        Name::from_str("CN=wsaa-client integration tests,O=wsaa-client").expect("subject DN");
    let builder = CertificateBuilder::new(
        Profile::Root,
        SerialNumber::from(1u32),
        Validity::from_now(Duration::from_secs(3600)).expect("validity"),
        subject,
        spki,
        &signer,
    )
    .expect("certificate builder");
    let certificate = builder
        .build::<rsa::pkcs1v15::Signature>()
        .expect("self-signed certificate");

    let cert_pem = certificate
        .to_pem(der::pem::LineEnding::LF)
        .expect("certificate PEM");
    let key_pem = private_key
        .to_pkcs8_pem(der::pem::LineEnding::LF)
        .expect("key PEM")
        .to_string();

    (cert_pem, key_pem)
}

/// Write the identity fixture into `dir`, returning (cert_path, key_path).
pub fn write_identity(dir: &Path) -> (PathBuf, PathBuf) {
    let (cert_pem, key_pem) = test_identity_pem();
    let cert_path = dir.join("taxpayer.crt");
    let key_path = dir.join("taxpayer.key");
    std::fs::write(&cert_path, cert_pem).expect("write certificate fixture");
    std::fs::write(&key_path, key_pem).expect("write key fixture");

    (cert_path, key_path)
}

/// Client configuration pointing at the mock server, with the identity
/// fixture and cache rooted in `dir`.
pub fn test_config(mock: &MockWsaaServer, dir: &Path) -> WsaaClientConfig {
    let (cert_path, key_path) = write_identity(dir);

    WsaaClientConfig::builder()
        .cuit(TEST_CUIT)
        .certificate_path(cert_path)
        .key_path(key_path)
        .endpoint_url(&mock.login_cms_url())
        .expect("valid mock URL")
        .cache_dir(dir.join("cache"))
        .timeout(Duration::from_secs(5))
        .build()
        .expect("valid test config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let mock = MockWsaaServer::start().await;
        assert!(mock.url().starts_with("http://"));
        assert!(mock.login_cms_url().ends_with(LOGIN_CMS_PATH));
    }

    #[test]
    fn test_identity_fixture_is_valid_material() {
        let (cert_pem, key_pem) = test_identity_pem();
        assert!(cert_pem.contains("BEGIN CERTIFICATE"));
        assert!(key_pem.contains("BEGIN PRIVATE KEY"));

        wsaa_client::CmsSigner::from_pem(cert_pem, key_pem, None)
            .expect("fixture parses as signing material");
    }
}
