//! Signed session tokens.
//!
//! One token mechanism for every role: `{account_id}:{role}:{expires}:{sig}`
//! where `sig` is an HMAC-SHA256 over the first three fields. Every mutation
//! entry point goes through [`verify_token`]; there is no per-call-site
//! expiry logic.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::models::Role;

type HmacSha256 = Hmac<Sha256>;

/// Session lifetime: 24 hours, matching the signed cookie it replaces.
pub const SESSION_TTL_HOURS: i64 = 24;

/// The verified identity behind a request.
#[derive(Debug, Clone)]
pub struct Actor {
    pub account_id: String,
    pub role: Role,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin or instructor: the roles allowed to manage classes, events,
    /// and blog posts.
    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Instructor)
    }
}

/// Issue a token valid for [`SESSION_TTL_HOURS`] from `now`.
pub fn issue_token(secret: &str, account_id: &str, role: Role, now: DateTime<Utc>) -> String {
    let expires = (now + Duration::hours(SESSION_TTL_HOURS)).timestamp();
    let payload = format!("{account_id}:{}:{expires}", role.as_str());
    format!("{payload}:{}", sign(secret, &payload))
}

/// Verify a token: well-formed, unexpired, signature intact. Anything else
/// is `None`.
pub fn verify_token(secret: &str, token: &str, now: DateTime<Utc>) -> Option<Actor> {
    let parts: Vec<&str> = token.split(':').collect();
    let [account_id, role, expires, signature] = parts.as_slice() else {
        return None;
    };

    let payload = format!("{account_id}:{role}:{expires}");
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&hex::decode(signature).ok()?).ok()?;

    let expires: i64 = expires.parse().ok()?;
    if now.timestamp() >= expires {
        return None;
    }

    Some(Actor {
        account_id: (*account_id).to_string(),
        role: Role::parse(role)?,
    })
}

fn sign(secret: &str, payload: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Salted password hash, hex encoded.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, hash: &str) -> bool {
    hash_password(password, salt) == hash
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-session-secret";

    #[test]
    fn test_token_roundtrip() {
        let now = Utc::now();
        let token = issue_token(SECRET, "acct-1", Role::Parent, now);
        let actor = verify_token(SECRET, &token, now).unwrap();
        assert_eq!(actor.account_id, "acct-1");
        assert_eq!(actor.role, Role::Parent);
        assert!(!actor.is_admin());
        assert!(!actor.is_staff());
    }

    #[test]
    fn test_admin_roles() {
        let now = Utc::now();
        let token = issue_token(SECRET, "acct-2", Role::Admin, now);
        let actor = verify_token(SECRET, &token, now).unwrap();
        assert!(actor.is_admin());
        assert!(actor.is_staff());

        let token = issue_token(SECRET, "acct-3", Role::Instructor, now);
        let actor = verify_token(SECRET, &token, now).unwrap();
        assert!(!actor.is_admin());
        assert!(actor.is_staff());
    }

    #[test]
    fn test_expired_token_rejected() {
        let issued = Utc::now() - Duration::hours(SESSION_TTL_HOURS + 1);
        let token = issue_token(SECRET, "acct-1", Role::Parent, issued);
        assert!(verify_token(SECRET, &token, Utc::now()).is_none());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let now = Utc::now();
        let token = issue_token(SECRET, "acct-1", Role::Parent, now);
        let tampered = token.replace("parent", "admin");
        assert!(verify_token(SECRET, &tampered, now).is_none());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let now = Utc::now();
        let token = issue_token("other-secret", "acct-1", Role::Parent, now);
        assert!(verify_token(SECRET, &token, now).is_none());
    }

    #[test]
    fn test_garbage_token_rejected() {
        for token in ["", "a:b", "a:b:c:zz", "a:parent:notanumber:00"] {
            assert!(verify_token(SECRET, token, Utc::now()).is_none(), "{token}");
        }
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("hunter22", "salt");
        assert!(verify_password("hunter22", "salt", &hash));
        assert!(!verify_password("hunter23", "salt", &hash));
        assert!(!verify_password("hunter22", "other-salt", &hash));
    }
}
