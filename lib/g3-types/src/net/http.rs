/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use base64::prelude::*;
use url::Url;

use crate::auth::{AuthParseError, Password, Username};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpBasicAuth {
    pub username: Username,
    pub password: Password,
    encoded_value: String,
}

impl HttpBasicAuth {
    pub fn new(username: Username, password: Password) -> Self {
        let raw = format!("{}:{}", username.as_original(), password.as_original());
        HttpBasicAuth {
            username,
            password,
            encoded_value: BASE64_STANDARD.encode(raw),
        }
    }

    /// The base64 token, without the `Basic ` prefix.
    pub fn encoded_value(&self) -> &str {
        &self.encoded_value
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HttpAuth {
    None,
    Basic(HttpBasicAuth),
}

impl TryFrom<&Url> for HttpAuth {
    type Error = AuthParseError;

    fn try_from(url: &Url) -> Result<Self, Self::Error> {
        if url.username().is_empty() {
            return Ok(HttpAuth::None);
        }
        let username = Username::from_encoded(url.username())?;
        let password = match url.password() {
            Some(p) => Password::from_encoded(p)?,
            None => Password::empty(),
        };
        Ok(HttpAuth::Basic(HttpBasicAuth::new(username, password)))
    }
}
