use axum::http::StatusCode;
use modkit::api::problem::{Problem, ProblemResponse, ValidationError};

use crate::domain::error::DomainError;

const TYPE_BASE: &str = "https://errors.campus-connect.dev";

fn from_parts(
    status: StatusCode,
    code: &str,
    title: &str,
    detail: impl Into<String>,
    instance: &str,
) -> Problem {
    Problem::new(status, title, detail)
        .with_type(format!("{TYPE_BASE}/{}", code.to_ascii_lowercase()))
        .with_code(code)
        .with_instance(instance)
}

/// Map a domain error to an RFC 9457 response.
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    let problem = match e {
        DomainError::InvalidCredential => from_parts(
            StatusCode::UNAUTHORIZED,
            "CAMPUS_UNAUTHENTICATED",
            "Unauthenticated",
            "A valid bearer token is required",
            instance,
        ),
        DomainError::InvalidLogin => from_parts(
            StatusCode::UNAUTHORIZED,
            "CAMPUS_INVALID_LOGIN",
            "Invalid login",
            "Invalid email or password",
            instance,
        ),
        DomainError::Forbidden { .. } => from_parts(
            StatusCode::FORBIDDEN,
            "CAMPUS_FORBIDDEN",
            "Forbidden",
            e.to_string(),
            instance,
        ),
        DomainError::NotFound { .. } => from_parts(
            StatusCode::NOT_FOUND,
            "CAMPUS_NOT_FOUND",
            "Not found",
            e.to_string(),
            instance,
        ),
        DomainError::Validation { field, message } => from_parts(
            StatusCode::BAD_REQUEST,
            "CAMPUS_VALIDATION",
            "Validation error",
            format!("{field} {message}"),
            instance,
        )
        .with_errors(vec![ValidationError {
            detail: message.clone(),
            pointer: format!("/{field}"),
        }]),
        DomainError::EmailAlreadyExists { .. } => from_parts(
            StatusCode::CONFLICT,
            "CAMPUS_EMAIL_TAKEN",
            "Email already registered",
            e.to_string(),
            instance,
        ),
        DomainError::AlreadyRegistered => from_parts(
            StatusCode::CONFLICT,
            "CAMPUS_ALREADY_REGISTERED",
            "Already registered",
            e.to_string(),
            instance,
        ),
        DomainError::CapacityExceeded { .. } => from_parts(
            StatusCode::CONFLICT,
            "CAMPUS_EVENT_FULL",
            "Event full",
            e.to_string(),
            instance,
        ),
        DomainError::EventClosed => from_parts(
            StatusCode::CONFLICT,
            "CAMPUS_EVENT_CLOSED",
            "Event closed",
            e.to_string(),
            instance,
        ),
        DomainError::NotRegistered => from_parts(
            StatusCode::CONFLICT,
            "CAMPUS_NOT_REGISTERED",
            "Not registered",
            e.to_string(),
            instance,
        ),
        DomainError::Database { .. } => {
            tracing::error!(error = ?e, "Database error occurred");
            from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "CAMPUS_INTERNAL",
                "Internal error",
                "An internal error occurred",
                instance,
            )
        }
    };
    ProblemResponse(problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_and_code(e: DomainError) -> (u16, String) {
        let p = map_domain_error(&e, "/x").0;
        (p.status, p.code)
    }

    #[test]
    fn every_error_has_a_distinct_code_and_expected_status() {
        let cases = [
            (DomainError::InvalidCredential, 401, "CAMPUS_UNAUTHENTICATED"),
            (DomainError::InvalidLogin, 401, "CAMPUS_INVALID_LOGIN"),
            (DomainError::forbidden("create event"), 403, "CAMPUS_FORBIDDEN"),
            (DomainError::user_not_found(Uuid::nil()), 404, "CAMPUS_NOT_FOUND"),
            (DomainError::validation("title", "is required"), 400, "CAMPUS_VALIDATION"),
            (DomainError::email_already_exists("a@b.io"), 409, "CAMPUS_EMAIL_TAKEN"),
            (DomainError::AlreadyRegistered, 409, "CAMPUS_ALREADY_REGISTERED"),
            (DomainError::CapacityExceeded { limit: 1 }, 409, "CAMPUS_EVENT_FULL"),
            (DomainError::EventClosed, 409, "CAMPUS_EVENT_CLOSED"),
            (DomainError::NotRegistered, 409, "CAMPUS_NOT_REGISTERED"),
            (DomainError::database("boom"), 500, "CAMPUS_INTERNAL"),
        ];
        let mut seen = std::collections::HashSet::new();
        for (err, status, code) in cases {
            let (s, c) = status_and_code(err);
            assert_eq!(s, status, "{code}");
            assert_eq!(c, code);
            assert!(seen.insert(c), "duplicate code {code}");
        }
    }

    #[test]
    fn validation_problem_points_at_the_field() {
        let p = map_domain_error(&DomainError::validation("file_url", "malformed URL"), "/resources").0;
        assert_eq!(p.instance, "/resources");
        let errors = p.errors.unwrap();
        assert_eq!(errors[0].pointer, "/file_url");
        assert_eq!(errors[0].detail, "malformed URL");
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let p = map_domain_error(&DomainError::database("disk I/O error at /var/db"), "/events").0;
        assert!(!p.detail.contains("disk"));
    }
}
