//! HTTP transport for the authentication endpoint's `loginCms` operation.
//!
//! The endpoint speaks SOAP 1.1: the signed request travels base64-encoded
//! inside a `loginCms` envelope, and the issued ticket comes back XML-escaped
//! in `loginCmsReturn`. Parsing is deliberately tolerant of namespace
//! prefixes and attribute noise since the service's envelope shape has
//! shifted over time.

use tracing::debug;
use url::Url;

use crate::config::WsaaClientConfig;
use crate::error::{Result, WsaaError};
use crate::ticket::LoginTicketResponse;
use crate::xml;

/// Client for the `loginCms` SOAP operation.
#[derive(Debug, Clone)]
pub struct LoginCmsClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl LoginCmsClient {
    /// Build the HTTP client for the configured endpoint.
    ///
    /// The exchange timeout from the configuration caps the whole request,
    /// connection establishment included.
    pub fn new(config: &WsaaClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(crate::USER_AGENT)
            .use_rustls_tls()
            .build()
            .map_err(|e| WsaaError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint_url(),
        })
    }

    /// Submit a signed login request and parse the issued ticket.
    ///
    /// `signed_request` is the base64-encoded CMS structure produced by
    /// [`CmsSigner::sign`](crate::CmsSigner::sign).
    pub async fn exchange(&self, signed_request: &str) -> Result<LoginTicketResponse> {
        let envelope = request_envelope(signed_request);

        debug!("POST {}", self.endpoint);
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", "\"\"")
            .body(envelope)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WsaaError::transport(format!("login request timed out: {}", e))
                } else {
                    WsaaError::transport(format!("login request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WsaaError::transport(format!("failed to read login response: {}", e)))?;
        debug!("loginCms returned HTTP {}", status);

        parse_exchange_response(status, &body)
    }
}

/// Wrap a base64 CMS payload in the `loginCms` SOAP envelope.
///
/// The base64 alphabet contains no XML metacharacters, so the payload is
/// embedded verbatim.
fn request_envelope(signed_request: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\" \
         xmlns:wsaa=\"http://wsaa.view.sua.dvadac.desein.afip.gov\">\
         <soapenv:Header/>\
         <soapenv:Body>\
         <wsaa:loginCms><wsaa:in0>{}</wsaa:in0></wsaa:loginCms>\
         </soapenv:Body>\
         </soapenv:Envelope>",
        signed_request
    )
}

/// Interpret a `loginCms` response body.
///
/// A SOAP fault outranks the HTTP status: the service reports faults with
/// HTTP 500, and those are remote rejections, not transport failures.
fn parse_exchange_response(
    status: reqwest::StatusCode,
    body: &str,
) -> Result<LoginTicketResponse> {
    if let Some((code, message)) = parse_fault(body) {
        return Err(WsaaError::remote_rejection(code, message));
    }

    if !status.is_success() {
        return Err(WsaaError::transport(format!(
            "login request returned HTTP {}",
            status
        )));
    }

    let escaped = xml::element_value(body, "loginCmsReturn")
        .ok_or_else(|| WsaaError::protocol("response is missing loginCmsReturn"))?;
    let ticket_xml = xml::unescape(escaped);

    LoginTicketResponse::from_xml(&ticket_xml)
}

/// Extract a SOAP fault's code and string, if the body carries one.
///
/// The namespace prefix of the fault code is dropped; callers match on the
/// service's bare codes such as `coe.alreadyAuthenticated`.
fn parse_fault(body: &str) -> Option<(String, String)> {
    let code = xml::element_value(body, "faultcode");
    let message = xml::element_value(body, "faultstring");
    if code.is_none() && message.is_none() {
        return None;
    }

    let code = code
        .map(|v| {
            let v = xml::unescape(v);
            match v.rsplit_once(':') {
                Some((_, local)) => local.to_string(),
                None => v,
            }
        })
        .unwrap_or_default();
    let message = message.map(xml::unescape).unwrap_or_default();

    Some((code, message))
}
