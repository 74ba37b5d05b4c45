/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use anyhow::{Context, anyhow};
use http::{HeaderName, HeaderValue};
use yaml_rust::Yaml;

use g3_io_ext::StreamCopyConfig;

use crate::options::{BuildOptions, ClientTemplate};
use crate::relay::RelayServerConfig;
use crate::transport::TransportConfig;

impl TransportConfig {
    pub fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match g3_yaml::key::normalize(k).as_str() {
            "connect_timeout" => {
                let timeout = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                self.set_connect_timeout(timeout);
                Ok(())
            }
            "max_header_size" => {
                let size = g3_yaml::humanize::as_usize(v)
                    .context(format!("invalid humanize usize value for key {k}"))?;
                self.set_max_header_size(size);
                Ok(())
            }
            "tls_client" | "tls" => {
                let builder = g3_yaml::value::as_rustls_client_config_builder(v)
                    .context(format!("invalid rustls tls client config value for key {k}"))?;
                self.set_tls_client(builder);
                Ok(())
            }
            "tls_name" => {
                let name = g3_yaml::value::as_rustls_server_name(v)
                    .context(format!("invalid tls server name value for key {k}"))?;
                self.set_tls_name(name);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {}", k)),
        }
    }
}

impl ClientTemplate {
    fn set_headers_by_yaml(&mut self, v: &Yaml) -> anyhow::Result<()> {
        let Yaml::Hash(map) = v else {
            return Err(anyhow!("yaml value type for 'headers' should be 'map'"));
        };
        g3_yaml::foreach_kv(map, |k, v| {
            let name = HeaderName::from_str(k).map_err(|e| anyhow!("invalid header name: {e}"))?;
            let value = g3_yaml::value::as_string(v)?;
            let value =
                HeaderValue::from_str(&value).map_err(|e| anyhow!("invalid header value: {e}"))?;
            self.set_header(name, value);
            Ok(())
        })
    }
}

impl BuildOptions {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        let mut opts = BuildOptions::default();
        match v {
            Yaml::Hash(map) => {
                g3_yaml::foreach_kv(map, |k, v| opts.set_by_yaml_kv(k, v))?;
                Ok(opts)
            }
            Yaml::Null => Ok(opts),
            _ => Err(anyhow!("yaml value type for build options should be 'map'")),
        }
    }

    pub fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match g3_yaml::key::normalize(k).as_str() {
            "timeout" => {
                let timeout = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                self.set_timeout(timeout);
                Ok(())
            }
            "dial_timeout" => {
                let timeout = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                self.set_dial_timeout(timeout);
                Ok(())
            }
            "headers" => {
                let mut client = self.client_template().clone();
                client
                    .set_headers_by_yaml(v)
                    .context(format!("invalid headers value for key {k}"))?;
                self.set_client_template(client);
                Ok(())
            }
            _ => {
                let mut transport = self.transport().clone();
                transport.set_by_yaml_kv(k, v)?;
                self.set_transport(transport);
                Ok(())
            }
        }
    }
}

impl RelayServerConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        let mut config = RelayServerConfig::default();
        match v {
            Yaml::Hash(map) => {
                g3_yaml::foreach_kv(map, |k, v| config.set_by_yaml_kv(k, v))?;
                Ok(config)
            }
            Yaml::Null => Ok(config),
            _ => Err(anyhow!("yaml value type for relay config should be 'map'")),
        }
    }

    pub fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match g3_yaml::key::normalize(k).as_str() {
            "listen_port" | "port" => {
                let port = g3_yaml::value::as_u16(v)
                    .context(format!("invalid u16 value for key {k}"))?;
                self.set_listen_port(port);
                Ok(())
            }
            "negotiation_timeout" => {
                let timeout = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                self.set_negotiation_timeout(timeout);
                Ok(())
            }
            "connect_timeout" => {
                let timeout = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                self.set_connect_timeout(timeout);
                Ok(())
            }
            "drain_timeout" => {
                let timeout = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
                self.set_drain_timeout(timeout);
                Ok(())
            }
            "copy_buffer_size" => {
                let size = g3_yaml::humanize::as_usize(v)
                    .context(format!("invalid humanize usize value for key {k}"))?;
                let mut copy: StreamCopyConfig = *self.copy_config();
                copy.set_buffer_size(size);
                self.set_copy_config(copy);
                Ok(())
            }
            "copy_yield_size" => {
                let size = g3_yaml::humanize::as_usize(v)
                    .context(format!("invalid humanize usize value for key {k}"))?;
                let mut copy: StreamCopyConfig = *self.copy_config();
                copy.set_yield_size(size);
                self.set_copy_config(copy);
                Ok(())
            }
            _ => Err(anyhow!("invalid key {}", k)),
        }
    }
}
