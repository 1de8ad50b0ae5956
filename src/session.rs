//! Request sessions
//!
//! The collaborator hands a session to every handler invocation. The core only
//! ever reads cookies from it.

use std::collections::BTreeMap;

/// Cookie access for one handler invocation
pub trait Session: Send + Sync {
    /// Returns the cookie value, if the session carries it
    fn cookie(&self, name: &str) -> Option<String>;

    /// Renders every cookie as a `Cookie` header value
    fn cookie_header(&self) -> Option<String> {
        None
    }
}

/// A session backed by a static cookie table from the configuration
#[derive(Debug, Clone, Default)]
pub struct CookieSession {
    cookies: BTreeMap<String, String>,
}

impl CookieSession {
    pub fn new(cookies: BTreeMap<String, String>) -> Self {
        Self { cookies }
    }

    /// A session without cookies
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Session for CookieSession {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).filter(|v| !v.is_empty()).cloned()
    }

    fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}
