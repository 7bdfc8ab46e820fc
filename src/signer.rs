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

//! CMS signing of login ticket requests.
//!
//! The authentication endpoint accepts a TRA only as a CMS/PKCS#7
//! SignedData message: the request XML travels as the encapsulated
//! `id-data` content, signed with the taxpayer's X.509 certificate. The
//! signature covers the content-type, message-digest, and signing-time
//! authenticated attributes, using SHA-256 digests and an RSA PKCS#1 v1.5
//! signature, which keeps the output byte-identical for a fixed signing
//! time.
//!
//! Every failure in this module is a [`WsaaError::Credential`]: unusable
//! key material will never sign successfully, so nothing here is
//! retryable.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use cms::builder::{SignedDataBuilder, SignerInfoBuilder};
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::ContentInfo;
use cms::signed_data::{EncapsulatedContentInfo, SignerIdentifier};
use der::asn1::{SetOfVec, UtcTime};
use der::{Any, DecodePem, Encode, Tag};
use pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use sha2::Sha256;
use x509_cert::Certificate;
use x509_cert::attr::Attribute;
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::config::SigningIdentity;
use crate::error::{Result, WsaaError};

mod oid {
    use const_oid::ObjectIdentifier;

    /// id-data (RFC 5652): the encapsulated content type.
    pub const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");

    /// id-signingTime (RFC 5652 Section 11.3).
    pub const ID_SIGNING_TIME: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.5");

    /// id-sha256 (RFC 5754).
    pub const ID_SHA_256: ObjectIdentifier =
        ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
}

/// CMS signer bound to one certificate/private-key pair.
pub struct CmsSigner {
    certificate: Certificate,
    signing_key: SigningKey<Sha256>,
}

impl CmsSigner {
    /// Load signing material from the identity's file paths.
    ///
    /// Runs before any network activity, so a missing or unreadable file
    /// fails the issuance without touching the endpoint.
    pub async fn from_identity(identity: &SigningIdentity) -> Result<Self> {
        let cert_pem = tokio::fs::read_to_string(&identity.certificate_path)
            .await
            .map_err(|e| {
                WsaaError::credential(format!(
                    "failed to read certificate {}: {}",
                    identity.certificate_path.display(),
                    e
                ))
            })?;
        let key_pem = tokio::fs::read_to_string(&identity.key_path)
            .await
            .map_err(|e| {
                WsaaError::credential(format!(
                    "failed to read private key {}: {}",
                    identity.key_path.display(),
                    e
                ))
            })?;

        Self::from_pem(&cert_pem, &key_pem, identity.passphrase.as_deref())
    }

    /// Parse signing material from PEM text.
    pub fn from_pem(cert_pem: &str, key_pem: &str, passphrase: Option<&str>) -> Result<Self> {
        let certificate = Certificate::from_pem(cert_pem)
            .map_err(|e| WsaaError::credential(format!("malformed certificate: {}", e)))?;
        let private_key = parse_private_key(key_pem, passphrase)?;

        Ok(Self {
            certificate,
            signing_key: SigningKey::new(private_key),
        })
    }

    /// The signing certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// Sign the serialized request, returning base64-encoded DER.
    ///
    /// `signing_time` becomes the authenticated signing-time attribute; it
    /// is the moment of signing, not the request's generation time, and is
    /// injected so tests can pin it.
    pub fn sign(&self, request_xml: &str, signing_time: DateTime<Utc>) -> Result<String> {
        let content = EncapsulatedContentInfo {
            econtent_type: oid::ID_DATA,
            econtent: Some(
                Any::new(Tag::OctetString, request_xml.as_bytes()).map_err(|e| {
                    WsaaError::credential(format!("failed to wrap request content: {}", e))
                })?,
            ),
        };

        let digest_algorithm = AlgorithmIdentifierOwned {
            oid: oid::ID_SHA_256,
            parameters: None,
        };

        let signer_identifier = SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: self.certificate.tbs_certificate.issuer.clone(),
            serial_number: self.certificate.tbs_certificate.serial_number.clone(),
        });

        let mut signer_info = SignerInfoBuilder::new(
            &self.signing_key,
            signer_identifier,
            digest_algorithm.clone(),
            &content,
            None,
        )
        .map_err(|e| WsaaError::credential(format!("failed to prepare signer info: {}", e)))?;

        // The builder adds the content-type and message-digest attributes
        // itself; only signing-time needs adding here.
        signer_info
            .add_signed_attribute(signing_time_attribute(signing_time)?)
            .map_err(|e| {
                WsaaError::credential(format!("failed to add signing-time attribute: {}", e))
            })?;

        let mut builder = SignedDataBuilder::new(&content);
        builder
            .add_digest_algorithm(digest_algorithm)
            .map_err(|e| WsaaError::credential(format!("failed to add digest algorithm: {}", e)))?;
        builder
            .add_certificate(CertificateChoices::Certificate(self.certificate.clone()))
            .map_err(|e| WsaaError::credential(format!("failed to add certificate: {}", e)))?;
        builder
            .add_signer_info::<SigningKey<Sha256>, rsa::pkcs1v15::Signature>(signer_info)
            .map_err(|e| WsaaError::credential(format!("signing failed: {}", e)))?;

        let content_info: ContentInfo = builder
            .build()
            .map_err(|e| WsaaError::credential(format!("failed to assemble signed data: {}", e)))?;

        let der = content_info
            .to_der()
            .map_err(|e| WsaaError::credential(format!("failed to encode signed data: {}", e)))?;

        Ok(BASE64_STANDARD.encode(der))
    }
}

impl std::fmt::Debug for CmsSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmsSigner")
            .field("subject", &self.certificate.tbs_certificate.subject.to_string())
            .finish_non_exhaustive()
    }
}

/// Parse a PEM private key: PKCS#8 (encrypted when a passphrase is given),
/// falling back to the legacy PKCS#1 container.
fn parse_private_key(key_pem: &str, passphrase: Option<&str>) -> Result<RsaPrivateKey> {
    if let Some(passphrase) = passphrase {
        return RsaPrivateKey::from_pkcs8_encrypted_pem(key_pem, passphrase)
            .map_err(|e| WsaaError::credential(format!("failed to decrypt private key: {}", e)));
    }

    RsaPrivateKey::from_pkcs8_pem(key_pem)
        .or_else(|_| RsaPrivateKey::from_pkcs1_pem(key_pem))
        .map_err(|e| WsaaError::credential(format!("malformed private key: {}", e)))
}

/// Build the signing-time authenticated attribute (RFC 5652 Section 11.3).
fn signing_time_attribute(signing_time: DateTime<Utc>) -> Result<Attribute> {
    let seconds = u64::try_from(signing_time.timestamp())
        .map_err(|_| WsaaError::credential("signing time predates the Unix epoch"))?;
    let utc_time = UtcTime::from_unix_duration(std::time::Duration::from_secs(seconds))
        .map_err(|e| WsaaError::credential(format!("signing time out of UTCTime range: {}", e)))?;
    let value = Any::encode_from(&utc_time)
        .map_err(|e| WsaaError::credential(format!("failed to encode signing time: {}", e)))?;

    let mut values = SetOfVec::new();
    values
        .insert(value)
        .map_err(|e| WsaaError::credential(format!("failed to build attribute set: {}", e)))?;

    Ok(Attribute {
        oid: oid::ID_SIGNING_TIME,
        values,
    })
}
