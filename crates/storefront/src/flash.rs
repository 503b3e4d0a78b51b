//! Toast notifications.
//!
//! Form handlers queue a toast and redirect; the next full page render drains
//! the queue so each toast is shown exactly once.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

impl ToastLevel {
    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Info => "toast-info",
            Self::Error => "toast-error",
        }
    }
}

/// A one-shot message shown on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

/// Queue a toast for the next page render.
///
/// Session failures are logged; a lost toast never fails the request.
pub async fn push(session: &Session, toast: Toast) {
    let mut toasts = session
        .get::<Vec<Toast>>(session_keys::TOASTS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    toasts.push(toast);

    if let Err(e) = session.insert(session_keys::TOASTS, toasts).await {
        tracing::warn!("Failed to queue toast: {e}");
    }
}

/// Drain queued toasts.
pub async fn take(session: &Session) -> Vec<Toast> {
    match session.remove::<Vec<Toast>>(session_keys::TOASTS).await {
        Ok(toasts) => toasts.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Failed to read toasts: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_push_then_take_drains() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push(&session, Toast::success("Added to cart")).await;
        push(&session, Toast::error("Out of stock")).await;

        let toasts = take(&session).await;
        assert_eq!(toasts.len(), 2);
        assert_eq!(toasts[0], Toast::success("Added to cart"));
        assert_eq!(toasts[1].level, ToastLevel::Error);

        assert!(take(&session).await.is_empty());
    }
}
