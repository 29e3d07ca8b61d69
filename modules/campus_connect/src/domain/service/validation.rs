use url::Url;

use super::Service;
use crate::contract::model::{ContentDraft, DraftDetails};
use crate::domain::error::DomainError;

impl Service {
    /// Trimmed, normalized copy of `draft`, or the first offending field.
    pub(super) fn validate_draft(&self, draft: ContentDraft) -> Result<ContentDraft, DomainError> {
        let title = required("title", &draft.title)?;
        if title.chars().count() > self.config.max_title_length {
            return Err(DomainError::validation(
                "title",
                format!("must be at most {} characters", self.config.max_title_length),
            ));
        }
        let description = required("description", &draft.description)?;

        let details = match draft.details {
            DraftDetails::Announcement => DraftDetails::Announcement,
            DraftDetails::Event {
                date,
                location,
                registration_limit,
            } => DraftDetails::Event {
                date: Some(date.ok_or_else(|| DomainError::validation("date", "is required"))?),
                location: required("location", &location)?,
                registration_limit: check_limit(registration_limit)?,
            },
            DraftDetails::Resource { file_url, category } => DraftDetails::Resource {
                file_url: normalize_file_url(&file_url)?,
                category: required("category", &category)?,
            },
        };

        Ok(ContentDraft {
            title,
            description,
            details,
        })
    }

    pub(super) fn validate_comment(&self, text: &str) -> Result<String, DomainError> {
        let text = required("text", text)?;
        if text.chars().count() > self.config.max_comment_length {
            return Err(DomainError::validation(
                "text",
                format!(
                    "must be at most {} characters",
                    self.config.max_comment_length
                ),
            ));
        }
        Ok(text)
    }

    pub(super) fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.config.min_password_length {
            return Err(DomainError::validation(
                "password",
                format!(
                    "must be at least {} characters",
                    self.config.min_password_length
                ),
            ));
        }
        Ok(())
    }
}

pub(super) fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(DomainError::validation(field, "is required"));
    }
    Ok(v.to_string())
}

/// 0 means unlimited; the upper bound keeps the limit within `u32`.
pub(super) fn check_limit(limit: i64) -> Result<i64, DomainError> {
    if !(0..=i64::from(u32::MAX)).contains(&limit) {
        return Err(DomainError::validation(
            "registration_limit",
            format!("must be between 0 and {}", u32::MAX),
        ));
    }
    Ok(limit)
}

/// Lower-cased `local@domain.tld`.
pub(super) fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    let invalid = || DomainError::validation("email", "must be a valid email address");

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(email)
}

/// Links without a scheme are taken as https.
pub(super) fn normalize_file_url(raw: &str) -> Result<String, DomainError> {
    let raw = required("file_url", raw)?;
    let candidate = if raw.contains("://") {
        raw
    } else {
        format!("https://{raw}")
    };
    let malformed = || DomainError::validation("file_url", "malformed URL");
    let url = Url::parse(&candidate).map_err(|_| malformed())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().map_or(true, str::is_empty) {
        return Err(malformed());
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_of(err: DomainError) -> String {
        match err {
            DomainError::Validation { field, .. } => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required("title", "  Exam  ").unwrap(), "Exam");
        assert_eq!(field_of(required("title", "   ").unwrap_err()), "title");
    }

    #[test]
    fn registration_limit_must_fit_u32() {
        assert_eq!(check_limit(0).unwrap(), 0);
        assert_eq!(check_limit(4_294_967_295).unwrap(), 4_294_967_295);
        assert_eq!(field_of(check_limit(-1).unwrap_err()), "registration_limit");
        assert_eq!(field_of(check_limit(4_294_967_296).unwrap_err()), "registration_limit");
    }

    #[test]
    fn emails_are_lowercased_and_checked() {
        assert_eq!(
            normalize_email(" Dana@Campus.EDU ").unwrap(),
            "dana@campus.edu"
        );
        for bad in ["", "dana", "@campus.edu", "dana@campus", "dana@@campus.edu", "da na@x.io", "d@x..io"] {
            assert!(normalize_email(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn file_url_gets_https_when_scheme_missing() {
        assert_eq!(
            normalize_file_url("drive.example.com/notes.pdf").unwrap(),
            "https://drive.example.com/notes.pdf"
        );
        assert_eq!(
            normalize_file_url("http://files.campus.edu/a.pdf").unwrap(),
            "http://files.campus.edu/a.pdf"
        );
    }

    #[test]
    fn malformed_file_urls_are_rejected() {
        for bad in ["", "ftp://files.campus.edu/a", "https://", "http://exa mple.com"] {
            assert_eq!(
                field_of(normalize_file_url(bad).unwrap_err()),
                "file_url",
                "{bad:?} accepted"
            );
        }
    }
}
