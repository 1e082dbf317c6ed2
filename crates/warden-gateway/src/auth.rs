// auth.rs — Admin bearer authentication.
//
// Two credentials are accepted on admin endpoints, both as
// `Authorization: Bearer <credential>`:
//
//   1. a shared API key, compared verbatim against ADMIN_API_KEY;
//   2. a time-limited signed token: base64url(payload).base64url(tag),
//      where payload is {"sub", "exp", "jti"} JSON and the tag is
//      HMAC-SHA256 over the encoded payload.
//
// Token issuance is a library call only — credential storage and login
// flows are collaborators, not part of the gateway core.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use ring::hmac;
use serde_json::{json, Value};
use uuid::Uuid;

/// Verifier (and issuer) for admin credentials.
pub struct AdminAuth {
    api_key: Option<String>,
    token_key: hmac::Key,
}

impl AdminAuth {
    /// Build from configured credentials.
    ///
    /// Without a configured token secret, tokens are signed with a random
    /// per-process key: tokens issued by this process verify, nothing else
    /// does. Without an API key, only tokens are accepted.
    pub fn new(api_key: Option<String>, token_secret: Option<String>) -> Self {
        let key_bytes = match token_secret {
            Some(secret) => secret.into_bytes(),
            None => {
                let mut bytes = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut bytes);
                bytes
            }
        };
        Self {
            api_key,
            token_key: hmac::Key::new(hmac::HMAC_SHA256, &key_bytes),
        }
    }

    /// Issue a signed token for `subject`, valid for `ttl`.
    pub fn issue_token(&self, subject: &str, ttl: Duration) -> String {
        let payload = json!({
            "sub": subject,
            "exp": (Utc::now() + ttl).timestamp(),
            "jti": Uuid::new_v4(),
        });
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        let tag = hmac::sign(&self.token_key, body.as_bytes());
        format!("{}.{}", body, URL_SAFE_NO_PAD.encode(tag.as_ref()))
    }

    /// Verify a bearer credential: API key first, signed token second.
    pub fn verify(&self, credential: &str) -> bool {
        if let Some(key) = &self.api_key {
            if credential == key {
                return true;
            }
        }
        self.verify_token(credential)
    }

    /// Whether the request's Authorization header carries a valid bearer
    /// credential.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .is_some_and(|credential| self.verify(credential))
    }

    fn verify_token(&self, token: &str) -> bool {
        let Some((body, tag)) = token.split_once('.') else {
            return false;
        };
        let Ok(tag) = URL_SAFE_NO_PAD.decode(tag) else {
            return false;
        };
        if hmac::verify(&self.token_key, body.as_bytes(), &tag).is_err() {
            return false;
        }
        let Ok(payload) = URL_SAFE_NO_PAD.decode(body) else {
            return false;
        };
        let Ok(claims) = serde_json::from_slice::<Value>(&payload) else {
            return false;
        };
        match claims.get("exp").and_then(Value::as_i64) {
            Some(exp) => Utc::now().timestamp() <= exp,
            None => false,
        }
    }
}
