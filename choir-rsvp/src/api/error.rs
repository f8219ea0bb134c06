//! API error responses
//!
//! Upstream failures reach users only as a short localized message plus an
//! opaque correlation id. The full error is logged under that id; status
//! codes, response bodies and credentials from Sheets never reach the client.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::ACCEPT_LANGUAGE, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::convert::Infallible;
use uuid::Uuid;

use choir_common::Error;

/// Language of user-facing error messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Locale {
    #[default]
    English,
    Hebrew,
}

impl Locale {
    /// Pick a locale from an `Accept-Language` value; first listed language wins
    pub fn from_accept_language(value: &str) -> Self {
        let primary = value
            .split(',')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if primary.starts_with("he") || primary.starts_with("iw") {
            Locale::Hebrew
        } else {
            Locale::English
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Locale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Locale::from_accept_language)
            .unwrap_or_default())
    }
}

/// Category of failure shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserMessage {
    RateLimited,
    UpstreamUnavailable,
    Internal,
}

impl UserMessage {
    pub fn code(self) -> &'static str {
        match self {
            UserMessage::RateLimited => "sheets_rate_limited",
            UserMessage::UpstreamUnavailable => "sheets_unavailable",
            UserMessage::Internal => "internal_error",
        }
    }

    pub fn text(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (UserMessage::RateLimited, Locale::English) => {
                "Google Sheets is receiving too many requests right now. Please try again in a minute."
            }
            (UserMessage::RateLimited, Locale::Hebrew) => {
                "גוגל שיטס מקבל כרגע יותר מדי בקשות. נסו שוב בעוד דקה."
            }
            (UserMessage::UpstreamUnavailable, Locale::English) => {
                "There was a temporary problem communicating with Google Sheets. Please try again."
            }
            (UserMessage::UpstreamUnavailable, Locale::Hebrew) => {
                "הייתה תקלה זמנית בתקשורת עם גוגל שיטס. נסו שוב."
            }
            (UserMessage::Internal, Locale::English) => {
                "Something went wrong. If this keeps happening, contact support with the reference code."
            }
            (UserMessage::Internal, Locale::Hebrew) => {
                "משהו השתבש. אם זה חוזר על עצמו, פנו לתמיכה עם קוד ההפניה."
            }
        }
    }

    fn status(self) -> StatusCode {
        match self {
            UserMessage::RateLimited => StatusCode::SERVICE_UNAVAILABLE,
            UserMessage::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            UserMessage::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Handler error carrying the requester's locale
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    locale: Locale,
}

impl ApiError {
    pub fn new(error: Error, locale: Locale) -> Self {
        Self { error, locale }
    }

    pub fn bad_request(message: impl Into<String>, locale: Locale) -> Self {
        Self::new(Error::InvalidInput(message.into()), locale)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let user_message = match &self.error {
            // The caller's own input; safe to echo back
            Error::InvalidInput(message) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
                    .into_response();
            }
            Error::Upstream(upstream) if upstream.is_rate_limited() => UserMessage::RateLimited,
            Error::Upstream(_) => UserMessage::UpstreamUnavailable,
            _ => UserMessage::Internal,
        };

        let correlation_id = Uuid::new_v4();
        tracing::error!(
            correlation_id = %correlation_id,
            code = user_message.code(),
            error = %self.error,
            "Request failed"
        );

        let body = Json(json!({
            "error": user_message.text(self.locale),
            "code": user_message.code(),
            "correlationId": correlation_id.to_string(),
        }));

        (user_message.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use choir_common::UpstreamError;

    #[test]
    fn test_locale_from_accept_language() {
        assert_eq!(Locale::from_accept_language("he-IL,he;q=0.9,en;q=0.8"), Locale::Hebrew);
        assert_eq!(Locale::from_accept_language("iw"), Locale::Hebrew);
        assert_eq!(Locale::from_accept_language("en-US,he;q=0.5"), Locale::English);
        assert_eq!(Locale::from_accept_language(""), Locale::English);
    }

    #[test]
    fn test_status_mapping() {
        let rate_limited = ApiError::new(Error::Upstream(UpstreamError::http(429, "x")), Locale::English);
        assert_eq!(rate_limited.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let unavailable = ApiError::new(Error::Upstream(UpstreamError::http(500, "x")), Locale::English);
        assert_eq!(unavailable.into_response().status(), StatusCode::BAD_GATEWAY);

        let bad = ApiError::bad_request("missing date", Locale::Hebrew);
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let internal = ApiError::new(Error::Internal("queue".to_string()), Locale::English);
        assert_eq!(internal.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
