use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

use crate::dao::models::AccountEntity;

/// Authenticated caller, resolved from the session token of a request.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub account: AccountEntity,
}

/// Lifetime used when the configured TTL overflows the clock.
const FALLBACK_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Server-side session registry keyed by opaque bearer tokens.
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
    ttl: Duration,
}

#[derive(Clone, Copy)]
struct SessionEntry {
    account_id: Uuid,
    expires_at: Instant,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Open a session for `account_id` and return its token.
    pub fn open(&self, account_id: Uuid) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.ttl)
            .or_else(|| now.checked_add(FALLBACK_TTL))
            .unwrap_or(now);
        self.sessions.insert(
            token.clone(),
            SessionEntry {
                account_id,
                expires_at,
            },
        );
        token
    }

    /// Account bound to `token`, dropping the entry when it has expired.
    pub fn resolve(&self, token: &str) -> Option<Uuid> {
        let entry = *self.sessions.get(token)?;
        if entry.expires_at <= Instant::now() {
            self.sessions.remove(token);
            return None;
        }
        Some(entry.account_id)
    }

    /// Forget `token`. Returns whether a session was removed.
    pub fn revoke(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every expired session and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.sessions.retain(|_, entry| {
            let alive = entry.expires_at > now;
            if !alive {
                removed += 1;
            }
            alive
        });
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_then_resolve_returns_account() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let account = Uuid::new_v4();
        let token = registry.open(account);
        assert_eq!(registry.resolve(&token), Some(account));
        assert_eq!(registry.resolve("unknown"), None);
    }

    #[test]
    fn revoked_token_no_longer_resolves() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let token = registry.open(Uuid::new_v4());
        assert!(registry.revoke(&token));
        assert!(!registry.revoke(&token));
        assert_eq!(registry.resolve(&token), None);
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let token = registry.open(Uuid::new_v4());
        assert_eq!(registry.resolve(&token), None);
        registry.open(Uuid::new_v4());
        assert_eq!(registry.purge_expired(), 1);
    }

    #[test]
    fn huge_ttl_does_not_overflow_the_clock() {
        let registry = SessionRegistry::new(Duration::MAX);
        let account = Uuid::new_v4();
        let token = registry.open(account);
        assert_eq!(registry.resolve(&token), Some(account));
        assert_eq!(registry.purge_expired(), 0);
    }

    #[test]
    fn sweep_counts_only_removed_sessions_under_concurrent_logins() {
        let registry = std::sync::Arc::new(SessionRegistry::new(Duration::ZERO));
        for _ in 0..64 {
            registry.open(Uuid::new_v4());
        }

        let opener = {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for _ in 0..256 {
                    registry.open(Uuid::new_v4());
                }
            })
        };
        let mut purged = 0;
        for _ in 0..16 {
            purged += registry.purge_expired();
        }
        opener.join().unwrap();
        purged += registry.purge_expired();
        assert_eq!(purged, 64 + 256);
    }
}
