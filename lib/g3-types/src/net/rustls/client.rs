/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use rustls::client::Resumption;
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::CertificateDer;
use rustls_pki_types::pem::PemObject;

use super::no_verify::NoServerCertVerifier;

const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct RustlsClientConfig {
    pub driver: Arc<ClientConfig>,
    pub handshake_timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RustlsClientConfigBuilder {
    no_session_cache: bool,
    disable_sni: bool,
    no_verify: bool,
    ca_certs: Vec<CertificateDer<'static>>,
    no_default_ca_certs: bool,
    alpn_protocols: Vec<Vec<u8>>,
    handshake_timeout: Duration,
}

impl Default for RustlsClientConfigBuilder {
    fn default() -> Self {
        RustlsClientConfigBuilder {
            no_session_cache: false,
            disable_sni: false,
            no_verify: false,
            ca_certs: Vec::new(),
            no_default_ca_certs: false,
            alpn_protocols: Vec::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl RustlsClientConfigBuilder {
    pub fn set_no_session_cache(&mut self) {
        self.no_session_cache = true;
    }

    pub fn set_disable_sni(&mut self) {
        self.disable_sni = true;
    }

    /// Skip server certificate verification.
    pub fn set_no_verify(&mut self) {
        self.no_verify = true;
    }

    pub fn set_no_default_ca_certificates(&mut self) {
        self.no_default_ca_certs = true;
    }

    pub fn add_ca_certificate(&mut self, cert: CertificateDer<'static>) {
        self.ca_certs.push(cert);
    }

    pub fn load_ca_certificates_pem(&mut self, pem: &[u8]) -> anyhow::Result<usize> {
        let mut count = 0;
        for r in CertificateDer::pem_slice_iter(pem) {
            let cert = r.map_err(|e| anyhow!("invalid pem certificate: {e}"))?;
            self.ca_certs.push(cert);
            count += 1;
        }
        if count == 0 {
            return Err(anyhow!("no certificate found"));
        }
        Ok(count)
    }

    pub fn set_alpn_protocols(&mut self, protocols: Vec<Vec<u8>>) {
        self.alpn_protocols = protocols;
    }

    pub fn set_handshake_timeout(&mut self, timeout: Duration) {
        self.handshake_timeout = timeout;
    }

    #[inline]
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    pub fn build(&self) -> anyhow::Result<RustlsClientConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| anyhow!("failed to set tls protocol versions: {e}"))?;

        let mut config = if self.no_verify {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoServerCertVerifier::new(provider)))
                .with_no_client_auth()
        } else {
            let mut root_store = RootCertStore::empty();
            if !self.no_default_ca_certs {
                root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            }
            for cert in &self.ca_certs {
                root_store
                    .add(cert.clone())
                    .map_err(|e| anyhow!("failed to add ca certificate: {e}"))?;
            }
            if root_store.is_empty() {
                return Err(anyhow!("no ca certificate available"));
            }
            builder
                .with_root_certificates(root_store)
                .with_no_client_auth()
        };

        if self.no_session_cache {
            config.resumption = Resumption::disabled();
        }
        config.enable_sni = !self.disable_sni;
        config.alpn_protocols.clone_from(&self.alpn_protocols);

        Ok(RustlsClientConfig {
            driver: Arc::new(config),
            handshake_timeout: self.handshake_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_default() {
        let config = RustlsClientConfigBuilder::default().build().unwrap();
        assert!(config.driver.enable_sni);
        assert_eq!(config.handshake_timeout, Duration::from_secs(30));
    }

    #[test]
    fn build_no_verify() {
        let mut builder = RustlsClientConfigBuilder::default();
        builder.set_no_verify();
        builder.set_disable_sni();
        builder.set_no_default_ca_certificates();
        builder.set_alpn_protocols(vec![b"http/1.1".to_vec()]);
        let config = builder.build().unwrap();
        assert!(!config.driver.enable_sni);
        assert_eq!(config.driver.alpn_protocols, vec![b"http/1.1".to_vec()]);
    }

    #[test]
    fn no_root() {
        let mut builder = RustlsClientConfigBuilder::default();
        builder.set_no_default_ca_certificates();
        assert!(builder.build().is_err());
        assert!(builder.load_ca_certificates_pem(b"not a pem").is_err());
    }
}
