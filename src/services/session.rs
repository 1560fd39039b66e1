// Signed-in user record shared with the HTTP request interceptor

use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// The user returned by sign-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub token: String,
}

/// Injected session holder with an explicit lifecycle: set on login,
/// cleared on logout, read by the request interceptor.
///
/// Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Option<UserSession>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that starts signed in
    pub fn with_session(session: UserSession) -> Self {
        let context = Self::new();
        context.set_on_login(session);
        context
    }

    pub fn set_on_login(&self, session: UserSession) {
        log::info!("Session started for user {}", session.id);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    pub fn clear_on_logout(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.take().is_some() {
            log::info!("Session cleared");
        }
    }

    pub fn current(&self) -> Option<UserSession> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current().is_some()
    }

    /// Value for the `Authorization` header, if signed in
    pub fn authorization_header(&self) -> Option<String> {
        self.current()
            .filter(|s| !s.token.is_empty())
            .map(|s| format!("Bearer {}", s.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserSession {
        UserSession {
            id: 42,
            email: Some("ada@example.com".into()),
            name: Some("Ada".into()),
            token: "tok-123".into(),
        }
    }

    #[test]
    fn test_lifecycle() {
        let context = SessionContext::new();
        assert!(!context.is_signed_in());
        assert_eq!(context.authorization_header(), None);

        context.set_on_login(user());
        assert_eq!(
            context.authorization_header().as_deref(),
            Some("Bearer tok-123")
        );

        context.clear_on_logout();
        assert!(context.current().is_none());
    }

    #[test]
    fn test_clones_share_record() {
        let context = SessionContext::new();
        let interceptor_view = context.clone();
        context.set_on_login(user());
        assert_eq!(interceptor_view.current().map(|s| s.id), Some(42));
    }

    #[test]
    fn test_session_survives_poisoned_lock() {
        let context = SessionContext::with_session(user());
        let holder = context.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.inner.write().unwrap();
            panic!("writer panicked");
        })
        .join();
        assert!(context.inner.is_poisoned());

        assert_eq!(context.current().map(|s| s.id), Some(42));
        context.clear_on_logout();
        assert!(!context.is_signed_in());
        context.set_on_login(user());
        assert_eq!(
            context.authorization_header().as_deref(),
            Some("Bearer tok-123")
        );
    }

    #[test]
    fn test_empty_token_sends_no_header() {
        let mut session = user();
        session.token.clear();
        let context = SessionContext::with_session(session);
        assert!(context.is_signed_in());
        assert_eq!(context.authorization_header(), None);
    }
}
