//! Shared-secret access gate
//!
//! # Architecture
//!
//! - One global passkey for all reviewers, plus an allow-list of usernames
//! - Usernames are used for attribution only; they carry no permissions
//! - Successful Basic auth yields a persistent cookie so later requests skip
//!   the browser prompt
//! - No expiry, no revocation: rotating the passkey invalidates every cookie

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use thiserror::Error;

/// Name of the cookie carrying the encoded credentials
pub const AUTH_COOKIE_NAME: &str = "authCookie";

/// Cookie lifetime in seconds (ten years)
pub const AUTH_COOKIE_MAX_AGE: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GateError {
    #[error("Authorization header is not Basic")]
    NotBasic,

    #[error("Malformed credentials: {0}")]
    Malformed(String),

    #[error("Unknown username: {0}")]
    UnknownUser(String),

    #[error("Invalid passkey")]
    InvalidSecret,
}

/// Authenticated reviewer, attached to requests that pass the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Lowercased username from the allow-list
    pub username: String,
}

/// Single-value credential store with an allow-list of identities
#[derive(Debug, Clone)]
pub struct GateCredentials {
    passkey: String,
    usernames: Vec<String>,
}

impl GateCredentials {
    pub fn new(passkey: impl Into<String>, usernames: &[String]) -> Self {
        Self {
            passkey: passkey.into(),
            usernames: usernames.iter().map(|u| u.to_lowercase()).collect(),
        }
    }

    /// Check a username/secret pair against the store
    pub fn verify(&self, username: &str, secret: &str) -> Result<Identity, GateError> {
        let username = username.to_lowercase();
        if !self.usernames.contains(&username) {
            return Err(GateError::UnknownUser(username));
        }
        if secret != self.passkey {
            return Err(GateError::InvalidSecret);
        }
        Ok(Identity { username })
    }

    /// Verify the value of `Authorization: Basic ...`
    pub fn verify_basic_header(&self, header: &str) -> Result<Identity, GateError> {
        let (username, secret) = parse_basic_auth(header)?;
        self.verify(&username, &secret)
    }

    /// Verify a raw `Cookie` header, looking for [`AUTH_COOKIE_NAME`]
    pub fn verify_cookie_header(&self, header: &str) -> Result<Identity, GateError> {
        let value = find_cookie(header, AUTH_COOKIE_NAME)
            .ok_or_else(|| GateError::Malformed("auth cookie not present".to_string()))?;
        let (username, secret) = decode_pair(value, &URL_SAFE_NO_PAD)?;
        self.verify(&username, &secret)
    }

    /// Cookie value for an identity that just authenticated
    pub fn cookie_value(&self, identity: &Identity) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}:{}", identity.username, self.passkey))
    }

    /// Full `Set-Cookie` header value
    pub fn set_cookie_header(&self, identity: &Identity) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            AUTH_COOKIE_NAME,
            self.cookie_value(identity),
            AUTH_COOKIE_MAX_AGE
        )
    }
}

/// Decode `Basic <base64(username:secret)>`
pub fn parse_basic_auth(header: &str) -> Result<(String, String), GateError> {
    let (scheme, encoded) = header
        .trim()
        .split_once(' ')
        .ok_or(GateError::NotBasic)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(GateError::NotBasic);
    }
    decode_pair(encoded.trim(), &STANDARD)
}

fn decode_pair<E: Engine>(encoded: &str, engine: &E) -> Result<(String, String), GateError> {
    let bytes = engine
        .decode(encoded)
        .map_err(|e| GateError::Malformed(e.to_string()))?;
    let login = String::from_utf8(bytes).map_err(|e| GateError::Malformed(e.to_string()))?;

    // Secrets may contain ':'; usernames may not
    let (username, secret) = login
        .split_once(':')
        .ok_or_else(|| GateError::Malformed("missing ':' separator".to_string()))?;
    Ok((username.to_string(), secret.to_string()))
}

/// Find a cookie's value in a `Cookie` request header
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> GateCredentials {
        GateCredentials::new("hunter2", &["aldot".to_string(), "DCSL".to_string()])
    }

    fn basic(login: &str) -> String {
        format!("Basic {}", STANDARD.encode(login))
    }

    #[test]
    fn basic_header_accepts_allowed_user() {
        let identity = credentials().verify_basic_header(&basic("DCSL:hunter2")).unwrap();
        assert_eq!(identity.username, "dcsl");
    }

    #[test]
    fn basic_header_rejects_wrong_secret() {
        assert_eq!(
            credentials().verify_basic_header(&basic("aldot:nope")),
            Err(GateError::InvalidSecret)
        );
    }

    #[test]
    fn basic_header_rejects_unknown_user() {
        assert!(matches!(
            credentials().verify_basic_header(&basic("mallory:hunter2")),
            Err(GateError::UnknownUser(_))
        ));
    }

    #[test]
    fn basic_header_requires_basic_scheme() {
        assert_eq!(parse_basic_auth("Bearer abc"), Err(GateError::NotBasic));
        assert_eq!(parse_basic_auth("garbage"), Err(GateError::NotBasic));
        assert!(matches!(parse_basic_auth("Basic !!!"), Err(GateError::Malformed(_))));
    }

    #[test]
    fn secret_may_contain_colons() {
        let (user, secret) = parse_basic_auth(&basic("aldot:a:b:c")).unwrap();
        assert_eq!(user, "aldot");
        assert_eq!(secret, "a:b:c");
    }

    #[test]
    fn issued_cookie_is_accepted() {
        let creds = credentials();
        let identity = Identity { username: "aldot".to_string() };
        let header = format!("theme=dark; {}={}", AUTH_COOKIE_NAME, creds.cookie_value(&identity));
        assert_eq!(creds.verify_cookie_header(&header), Ok(identity));
    }

    #[test]
    fn cookie_from_old_passkey_is_rejected() {
        let old = GateCredentials::new("old", &["aldot".to_string()]);
        let identity = Identity { username: "aldot".to_string() };
        let header = format!("{}={}", AUTH_COOKIE_NAME, old.cookie_value(&identity));
        assert_eq!(credentials().verify_cookie_header(&header), Err(GateError::InvalidSecret));
    }

    #[test]
    fn set_cookie_is_persistent() {
        let creds = credentials();
        let header = creds.set_cookie_header(&Identity { username: "dcsl".to_string() });
        assert!(header.starts_with("authCookie="));
        assert!(header.contains("Max-Age=315360000"));
        assert!(header.contains("Path=/"));
    }

    #[test]
    fn find_cookie_picks_named_value() {
        assert_eq!(find_cookie("a=1; authCookie=xyz; b=2", "authCookie"), Some("xyz"));
        assert_eq!(find_cookie("a=1", "authCookie"), None);
    }
}
