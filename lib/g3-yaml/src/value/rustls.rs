/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use rustls_pki_types::ServerName;
use yaml_rust::Yaml;

use g3_types::net::RustlsClientConfigBuilder;

pub fn as_rustls_server_name(v: &Yaml) -> anyhow::Result<ServerName<'static>> {
    if let Yaml::String(s) = v {
        ServerName::try_from(s.to_string()).map_err(|e| anyhow!("invalid tls server name {s}: {e}"))
    } else {
        Err(anyhow!(
            "yaml value type for tls server name should be 'string'"
        ))
    }
}

fn add_ca_certificates(builder: &mut RustlsClientConfigBuilder, v: &Yaml) -> anyhow::Result<()> {
    let pem_list = crate::value::as_list(v, crate::value::as_string)?;
    for (i, pem) in pem_list.iter().enumerate() {
        builder
            .load_ca_certificates_pem(pem.as_bytes())
            .context(format!("invalid pem certificate #{i}"))?;
    }
    Ok(())
}

fn set_client_by_yaml_kv(
    builder: &mut RustlsClientConfigBuilder,
    k: &str,
    v: &Yaml,
) -> anyhow::Result<()> {
    match crate::key::normalize(k).as_str() {
        "no_session_cache" => {
            if crate::value::as_bool(v)? {
                builder.set_no_session_cache();
            }
            Ok(())
        }
        "disable_sni" => {
            if crate::value::as_bool(v)? {
                builder.set_disable_sni();
            }
            Ok(())
        }
        "no_verify" | "insecure" => {
            if crate::value::as_bool(v)? {
                builder.set_no_verify();
            }
            Ok(())
        }
        "ca_certificate" | "ca_cert" | "server_auth_certificate" => {
            add_ca_certificates(builder, v)
                .context(format!("invalid ca certificate value for key {k}"))
        }
        "no_default_ca_certificate" | "no_default_ca_cert" => {
            if crate::value::as_bool(v)? {
                builder.set_no_default_ca_certificates();
            }
            Ok(())
        }
        "alpn_protocols" | "alpn" => {
            let protocols = crate::value::as_list(v, crate::value::as_string)
                .context(format!("invalid string list value for key {k}"))?;
            builder.set_alpn_protocols(protocols.into_iter().map(String::into_bytes).collect());
            Ok(())
        }
        "handshake_timeout" => {
            let timeout = crate::humanize::as_duration(v)
                .context(format!("invalid humanize duration value for key {k}"))?;
            builder.set_handshake_timeout(timeout);
            Ok(())
        }
        _ => Err(anyhow!("invalid key {k}")),
    }
}

/// Parse a tls client config map, a `true` value means the default config.
pub fn as_rustls_client_config_builder(v: &Yaml) -> anyhow::Result<RustlsClientConfigBuilder> {
    let mut builder = RustlsClientConfigBuilder::default();
    match v {
        Yaml::Hash(map) => {
            crate::foreach_kv(map, |k, v| set_client_by_yaml_kv(&mut builder, k, v))?;
            Ok(builder)
        }
        Yaml::Boolean(true) => Ok(builder),
        _ => Err(anyhow!(
            "yaml value type for rustls client config should be 'map' or 'true'"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn client_config() {
        let yaml = yaml_doc!(
            r#"
                no-session-cache: true
                disable_sni: yes
                no_verify: true
                alpn: http/1.1
                handshake_timeout: 5s
            "#
        );
        let builder = as_rustls_client_config_builder(&yaml).unwrap();

        let mut expected = RustlsClientConfigBuilder::default();
        expected.set_no_session_cache();
        expected.set_disable_sni();
        expected.set_no_verify();
        expected.set_alpn_protocols(vec![b"http/1.1".to_vec()]);
        expected.set_handshake_timeout(Duration::from_secs(5));
        assert_eq!(builder, expected);

        let builder = as_rustls_client_config_builder(&Yaml::Boolean(true)).unwrap();
        assert_eq!(builder, RustlsClientConfigBuilder::default());
    }

    #[test]
    fn client_config_invalid() {
        let yaml = yaml_doc!("ca_certificate: not a pem");
        assert!(as_rustls_client_config_builder(&yaml).is_err());

        let yaml = yaml_doc!("max_fragment_size: 1024");
        assert!(as_rustls_client_config_builder(&yaml).is_err());

        assert!(as_rustls_client_config_builder(&Yaml::Boolean(false)).is_err());
    }

    #[test]
    fn server_name() {
        let name = as_rustls_server_name(&Yaml::String("example.net".to_string())).unwrap();
        assert_eq!(name, ServerName::try_from("example.net").unwrap());
        assert!(as_rustls_server_name(&Yaml::String("bad name!".to_string())).is_err());
        assert!(as_rustls_server_name(&Yaml::Integer(1)).is_err());
    }
}
