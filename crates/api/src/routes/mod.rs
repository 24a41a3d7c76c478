//! API route definitions.

use axum::Router;
use chrono::{DateTime, Utc};
use envelope_core::ledger::TimeWindow;
use serde::Deserialize;

use crate::AppState;

pub mod accounts;
pub mod health;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(transactions::routes())
}

/// `since` and `until` query bounds, RFC 3339.
///
/// Unparseable values are ignored. A missing `until` means now.
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    /// Earliest booking time.
    pub since: Option<String>,
    /// Latest booking time.
    pub until: Option<String>,
}

impl WindowQuery {
    /// Resolves the bounds against the current time.
    #[must_use]
    pub fn window(&self) -> TimeWindow {
        let parse = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc))
        };

        TimeWindow {
            since: parse(&self.since),
            until: Some(parse(&self.until).unwrap_or_else(Utc::now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_parses_rfc3339() {
        let query = WindowQuery {
            since: Some("2024-01-01T00:00:00Z".into()),
            until: Some("2024-02-01T12:00:00+02:00".into()),
        };
        let window = query.window();
        assert_eq!(window.since.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(window.until.unwrap().to_rfc3339(), "2024-02-01T10:00:00+00:00");
    }

    #[test]
    fn test_window_ignores_garbage_and_defaults_until() {
        let before = Utc::now();
        let window = WindowQuery {
            since: Some("last tuesday".into()),
            until: None,
        }
        .window();
        assert!(window.since.is_none());
        assert!(window.until.unwrap() >= before);
    }
}
