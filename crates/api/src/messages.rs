use axum::http::StatusCode;
use extract::{ErrorKind, RequestedLocale};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::EmptyInput => StatusCode::BAD_REQUEST,
        ErrorKind::UpstreamRateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ParseFailed | ErrorKind::SchemaInvalid | ErrorKind::LocaleMismatch => StatusCode::BAD_GATEWAY,
    }
}

/// What the reader sees; never includes model output or upstream details.
pub fn user_message(kind: ErrorKind, locale: RequestedLocale) -> &'static str {
    match (locale, kind) {
        (RequestedLocale::Default, ErrorKind::EmptyInput) => "Text is required",
        (RequestedLocale::Default, ErrorKind::UpstreamRateLimited | ErrorKind::UpstreamUnavailable) => {
            "The analysis service is busy right now. Please try again in a moment."
        }
        (RequestedLocale::Default, ErrorKind::ParseFailed | ErrorKind::SchemaInvalid) => {
            "We could not analyze this text."
        }
        (RequestedLocale::Default, ErrorKind::LocaleMismatch) => {
            "The results came back in the wrong language. Please try again."
        }
        (RequestedLocale::Alternate, ErrorKind::EmptyInput) => "النص مطلوب",
        (RequestedLocale::Alternate, ErrorKind::UpstreamRateLimited | ErrorKind::UpstreamUnavailable) => {
            "خدمة التحليل مشغولة حاليًا. يرجى المحاولة مرة أخرى بعد قليل."
        }
        (RequestedLocale::Alternate, ErrorKind::ParseFailed | ErrorKind::SchemaInvalid) => {
            "تعذّر تحليل هذا النص."
        }
        (RequestedLocale::Alternate, ErrorKind::LocaleMismatch) => {
            "وصلت النتائج بلغة غير صحيحة. يرجى المحاولة مرة أخرى."
        }
    }
}
