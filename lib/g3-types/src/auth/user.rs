/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use percent_encoding::percent_decode_str;

use super::AuthParseError;

const USERNAME_MAX_LENGTH: usize = u8::MAX as usize;
const PASSWORD_MAX_LENGTH: usize = u8::MAX as usize;

/// A username that fits into a single length-prefixed SOCKS5 field.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Username {
    inner: String,
}

impl Username {
    pub fn empty() -> Self {
        Username {
            inner: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> u8 {
        self.inner.len() as u8
    }

    pub fn from_original(s: &str) -> Result<Self, AuthParseError> {
        if s.len() > USERNAME_MAX_LENGTH || s.contains(':') {
            return Err(AuthParseError::InvalidUsername);
        }
        Ok(Username {
            inner: s.to_string(),
        })
    }

    /// Build from the percent-encoded user part of an url.
    pub fn from_encoded(s: &str) -> Result<Self, AuthParseError> {
        let decoded = percent_decode_str(s)
            .decode_utf8()
            .map_err(|_| AuthParseError::InvalidUtf8Encoding)?;
        Username::from_original(decoded.as_ref())
    }

    pub fn as_original(&self) -> &str {
        &self.inner
    }
}

impl fmt::Debug for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Username").field(&self.inner).finish()
    }
}

#[derive(Clone, Eq, PartialEq)]
pub struct Password {
    inner: String,
}

impl Password {
    pub fn empty() -> Self {
        Password {
            inner: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> u8 {
        self.inner.len() as u8
    }

    pub fn from_original(s: &str) -> Result<Self, AuthParseError> {
        if s.len() > PASSWORD_MAX_LENGTH {
            return Err(AuthParseError::InvalidPassword);
        }
        Ok(Password {
            inner: s.to_string(),
        })
    }

    pub fn from_encoded(s: &str) -> Result<Self, AuthParseError> {
        let decoded = percent_decode_str(s)
            .decode_utf8()
            .map_err(|_| AuthParseError::InvalidUtf8Encoding)?;
        Password::from_original(decoded.as_ref())
    }

    pub fn as_original(&self) -> &str {
        &self.inner
    }
}

// never leak the secret in logs
impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_decode() {
        let u = Username::from_encoded("a%40b").unwrap();
        assert_eq!(u.as_original(), "a@b");
        assert_eq!(u.len(), 3);

        assert!(Username::from_original("a:b").is_err());
        assert!(Username::from_original(&"x".repeat(256)).is_err());
        assert!(Username::from_encoded("%FF").is_err());
    }

    #[test]
    fn password_decode() {
        let p = Password::from_encoded("p%3Ass").unwrap();
        assert_eq!(p.as_original(), "p:ss");
        assert_eq!(format!("{p:?}"), "Password(***)");
        assert!(Password::from_original(&"x".repeat(255)).is_ok());
        assert!(Password::from_original(&"x".repeat(256)).is_err());
    }
}
