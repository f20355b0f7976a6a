// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Payload Corpora
 * Static probe strings and signature tables consumed by the detection modules
 */

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

use crate::types::Risk;

/// A candidate probe string. Corpora are static and module-specific; they
/// are never derived from the target.
#[derive(Debug, Clone, Copy)]
pub struct Payload {
    pub value: &'static str,
    pub kind: &'static str,
    pub risk: Risk,
}

/// Reflection (XSS) corpus: tag-based, attribute-breakout, protocol-based
/// and auto-executing-attribute variants.
pub const XSS_PAYLOADS: &[Payload] = &[
    Payload { value: "<script>alert(1)</script>", kind: "basic", risk: Risk::High },
    Payload { value: "<img src=x onerror=alert(1)>", kind: "img_onerror", risk: Risk::High },
    Payload { value: "<svg/onload=alert(1)>", kind: "svg_onload", risk: Risk::High },
    Payload { value: "<body onload=alert(1)>", kind: "body_onload", risk: Risk::Medium },
    Payload { value: "<iframe src=javascript:alert(1)>", kind: "iframe", risk: Risk::High },
    Payload { value: "<script>alert(document.domain)</script>", kind: "domain", risk: Risk::High },
    Payload { value: "\" onmouseover=\"alert(1)\"", kind: "attribute", risk: Risk::Medium },
    Payload { value: "' onmouseover='alert(1)'", kind: "attribute", risk: Risk::Medium },
    Payload { value: "javascript:alert(1)", kind: "js_url", risk: Risk::High },
    Payload { value: "data:text/html,<script>alert(1)</script>", kind: "data_url", risk: Risk::High },
    Payload { value: "<input autofocus onfocus=alert(1)>", kind: "autofocus", risk: Risk::Medium },
    Payload { value: "<details open ontoggle=alert(1)>", kind: "details", risk: Risk::Low },
];

/// Injection (SQLi) corpus: quote-breakout, boolean-tautology,
/// comment-termination, delay-inducing and union-based types.
pub const SQLI_PAYLOADS: &[Payload] = &[
    Payload { value: "'", kind: "single_quote", risk: Risk::Low },
    Payload { value: "\"", kind: "double_quote", risk: Risk::Low },
    Payload { value: "' OR '1'='1", kind: "boolean_true", risk: Risk::Medium },
    Payload { value: "' OR 1=1--", kind: "comment", risk: Risk::Medium },
    Payload { value: "'; SELECT SLEEP(2)--", kind: "time_based", risk: Risk::High },
    Payload { value: "' UNION SELECT NULL--", kind: "union", risk: Risk::Medium },
    Payload { value: "' AND 1=2--", kind: "boolean_false", risk: Risk::Medium },
];

/// Backend-specific SQL error signatures. Evaluated in this exact order;
/// the first matching pattern wins and tags the backend family.
pub static SQL_ERROR_SIGNATURES: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    fn build(patterns: &[&str]) -> Vec<Regex> {
        patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("static pattern")
            })
            .collect()
    }

    vec![
        (
            "mysql",
            build(&[
                r"You have an error in your SQL syntax",
                r"MySQLSyntaxErrorException",
                r"Warning: mysql",
            ]),
        ),
        ("postgresql", build(&[r"PostgreSQL.*ERROR", r"PG::SyntaxError"])),
        (
            "mssql",
            build(&[r"Microsoft SQL Native Client", r"Incorrect syntax near"]),
        ),
        ("oracle", build(&[r"ORA-[0-9]{5}", r"Oracle error"])),
        (
            "generic",
            build(&[r"SQL syntax.*MySQL", r"Warning.*sql", r"Division by zero"]),
        ),
    ]
});

/// Identifier-shaped patterns harvested from page bodies by the reference
/// enumeration tester.
pub static ID_HARVEST_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    let patterns: &[(&str, &str)] = &[
        ("id", r"id=(\d+)"),
        ("user", r"user=(\d+)"),
        ("uid", r"uid=(\d+)"),
        ("account", r"account=(\d+)"),
        ("file", r"file=(\d+)"),
        ("doc", r"doc=(\d+)"),
        ("order", r"order=(\d+)"),
        ("invoice", r"invoice=(\d+)"),
        ("token", r"token=([a-zA-Z0-9]{8,})"),
        ("session", r"session=([a-zA-Z0-9]{16,})"),
    ];
    patterns
        .iter()
        .map(|(name, pattern)| {
            (
                *name,
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("static pattern"),
            )
        })
        .collect()
});

/// Conventional object-reference paths probed independently of harvested ids.
pub const COMMON_OBJECT_PATHS: &[&str] = &[
    "/user/1",
    "/profile/1",
    "/account/1",
    "/file/1",
    "/download/1",
    "/api/user/1",
    "/api/profile/1",
];

/// Case-insensitive phrases marking a response as an error page. A coarse
/// heuristic: a legitimate page mentioning one of these misclassifies.
pub const ERROR_PAGE_INDICATORS: &[&str] = &[
    "error",
    "not found",
    "404",
    "forbidden",
    "access denied",
    "invalid",
    "unauthorized",
];

/// Input names treated as anti-forgery tokens.
pub const CSRF_TOKEN_KEYWORDS: &[&str] =
    &["csrf", "token", "nonce", "authenticity", "_token", "anticsrf"];

/// Action-URL keywords that mark a form as security-critical.
pub const CRITICAL_FORM_KEYWORDS: &[&str] = &[
    "login", "logout", "register", "signup", "signin",
    "password", "changepass", "resetpass",
    "delete", "remove", "update", "edit", "save",
    "transfer", "pay", "purchase", "buy", "order",
    "admin", "moderator", "privilege",
    "email", "profile", "account", "settings",
];

/// Input-name keywords that mark a form as security-critical.
pub const CRITICAL_INPUT_KEYWORDS: &[&str] = &["password", "pass", "pwd", "secret", "token"];

/// Visible-text keywords that mark a form as security-critical.
pub const CRITICAL_FORM_TEXT_KEYWORDS: &[&str] = &["login", "sign in", "register", "password"];

/// Analytics cookies exempt from the cookie policy audit.
pub const ANALYTICS_COOKIES: &[&str] = &["__utma", "__utmb", "__utmc", "__utmz", "_ga", "_gid"];

/// Cookie names that strictly require HttpOnly.
pub const SENSITIVE_COOKIE_NAMES: &[&str] =
    &["session", "auth", "login", "token", "jwt", "access", "refresh"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_sizes_are_fixed() {
        assert_eq!(XSS_PAYLOADS.len(), 12);
        assert_eq!(SQLI_PAYLOADS.len(), 7);
        assert_eq!(COMMON_OBJECT_PATHS.len(), 7);
    }

    #[test]
    fn mysql_signature_matches_canonical_error() {
        let (family, patterns) = &SQL_ERROR_SIGNATURES[0];
        assert_eq!(*family, "mysql");
        assert!(patterns[0].is_match("You have an error in your SQL syntax"));
        assert!(patterns[0].is_match("you have an error in your sql syntax"));
    }

    #[test]
    fn signature_family_order_is_stable() {
        let families: Vec<_> = SQL_ERROR_SIGNATURES.iter().map(|(f, _)| *f).collect();
        assert_eq!(families, ["mysql", "postgresql", "mssql", "oracle", "generic"]);
    }

    #[test]
    fn harvest_patterns_capture_ids() {
        let (_, id_pattern) = &ID_HARVEST_PATTERNS[0];
        let caps = id_pattern.captures("href=/view?id=42").unwrap();
        assert_eq!(&caps[1], "42");

        let (_, session_pattern) = &ID_HARVEST_PATTERNS[9];
        assert!(session_pattern.is_match("session=abcdef0123456789"));
        assert!(!session_pattern.is_match("session=short"));
    }
}
