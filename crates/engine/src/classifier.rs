//! Table-driven rejection classifier.
//!
//! Pure function over the raw error message (and optionally the raw response
//! body): case-insensitive substring match against an ordered phrase table,
//! first matching rule wins, no match means `Unknown`. Rule order matters —
//! "temporary email not allowed" must hit the disposable rule before the
//! generic invalid-email one.

use signupforge_core::{ProvisionError, RejectionCategory};

struct Rule {
    phrases: &'static [&'static str],
    category: RejectionCategory,
}

const RULES: &[Rule] = &[
    Rule {
        phrases: &[
            "disposable email",
            "temporary email",
            "temp mail",
            "voip number",
            "virtual number",
        ],
        category: RejectionCategory::DisposableDetected,
    },
    Rule {
        phrases: &[
            "email already exists",
            "email already registered",
            "email already in use",
            "email is taken",
        ],
        category: RejectionCategory::EmailExists,
    },
    Rule {
        phrases: &[
            "phone number already used",
            "phone already registered",
            "phone number already in use",
        ],
        category: RejectionCategory::PhoneUsed,
    },
    Rule {
        phrases: &["invalid email", "email not allowed", "email address is not valid"],
        category: RejectionCategory::InvalidEmail,
    },
    Rule {
        phrases: &["invalid phone", "phone not allowed", "phone number is not valid"],
        category: RejectionCategory::InvalidPhone,
    },
    Rule {
        phrases: &[
            "email verification failed",
            "phone verification failed",
            "verification code expired",
            "no verification email received",
        ],
        category: RejectionCategory::VerificationFailed,
    },
    Rule {
        phrases: &["rate limit", "too many requests", "too many attempts", "try again later"],
        category: RejectionCategory::RateLimited,
    },
    Rule {
        phrases: &[
            "out of stock",
            "no numbers available",
            "temporarily unavailable",
            "service unavailable",
            "no capacity",
        ],
        category: RejectionCategory::ServiceUnavailable,
    },
    Rule {
        phrases: &["account creation blocked", "blocked", "banned", "suspicious activity"],
        category: RejectionCategory::Blocked,
    },
    Rule {
        phrases: &[
            "malformed",
            "bad request",
            "missing required",
            "unsupported parameter",
            "invalid request body",
        ],
        category: RejectionCategory::MalformedRequest,
    },
];

/// Classify a raw error message, optionally together with the collaborator's
/// raw response body.
pub fn classify(error_message: &str, response_body: Option<&str>) -> RejectionCategory {
    let mut haystack = error_message.to_lowercase();
    if let Some(body) = response_body {
        haystack.push('\n');
        haystack.push_str(&body.to_lowercase());
    }

    for rule in RULES {
        if rule.phrases.iter().any(|phrase| haystack.contains(phrase)) {
            return rule.category;
        }
    }

    RejectionCategory::Unknown
}

/// Map a collaborator error into a category. Transport faults and vendor
/// capacity are categorized by the error variant rather than its text, so a
/// random connect-reset message never lands in the non-retriable bucket.
pub fn categorize_error(err: &ProvisionError) -> RejectionCategory {
    match err {
        ProvisionError::CollaboratorUnavailable(_) => RejectionCategory::ServiceUnavailable,
        ProvisionError::Transport(_) | ProvisionError::Timeout(_) => RejectionCategory::Transport,
        ProvisionError::Rejected(message) => classify(message, None),
        ProvisionError::Configuration(_) => RejectionCategory::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_rejection_phrases() {
        assert_eq!(
            classify("Email already exists", None),
            RejectionCategory::EmailExists
        );
        assert_eq!(
            classify("invalid phone number", None),
            RejectionCategory::InvalidPhone
        );
        assert_eq!(
            classify("429: rate limit exceeded", None),
            RejectionCategory::RateLimited
        );
        assert_eq!(
            classify("your account creation blocked by policy", None),
            RejectionCategory::Blocked
        );
        assert_eq!(
            classify("400 Bad Request", None),
            RejectionCategory::MalformedRequest
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            classify("DISPOSABLE EMAIL DETECTED", None),
            RejectionCategory::DisposableDetected
        );
    }

    #[test]
    fn test_body_is_searched_too() {
        let body = r#"{"error":"temporary email not allowed"}"#;
        assert_eq!(
            classify("signup failed", Some(body)),
            RejectionCategory::DisposableDetected
        );
    }

    #[test]
    fn test_rule_order_disposable_beats_invalid_email() {
        // Contains both a disposable phrase and "email not allowed"
        assert_eq!(
            classify("temporary email not allowed", None),
            RejectionCategory::DisposableDetected
        );
    }

    #[test]
    fn test_no_match_is_unknown() {
        assert_eq!(classify("something exploded", None), RejectionCategory::Unknown);
        assert_eq!(classify("", None), RejectionCategory::Unknown);
    }

    #[test]
    fn test_classify_is_idempotent() {
        let message = "Disposable email detected";
        assert_eq!(classify(message, None), classify(message, None));
    }

    #[test]
    fn test_transport_errors_categorize_by_variant() {
        let err = ProvisionError::Transport("connection reset by peer".to_string());
        assert_eq!(categorize_error(&err), RejectionCategory::Transport);
        assert!(categorize_error(&err).is_retriable());

        let err = ProvisionError::CollaboratorUnavailable("no numbers in stock".to_string());
        assert_eq!(categorize_error(&err), RejectionCategory::ServiceUnavailable);
    }

    #[test]
    fn test_rejected_errors_fall_through_to_table() {
        let err = ProvisionError::Rejected("email already in use".to_string());
        assert_eq!(categorize_error(&err), RejectionCategory::EmailExists);
    }
}
