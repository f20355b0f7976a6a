// Copyright (c) 2026 Korento Security. All rights reserved.
// This software is proprietary and confidential.

/**
 * Korento Security - Input Discovery Engine
 * Extracts the testable input surface (forms, named inputs, links) of a page
 */

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// A form field carrying a `name` attribute. Nameless fields are
/// unsubmittable and are discarded during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub field_type: String,
    pub value: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredForm {
    pub action: String,
    pub method: String,
    pub enctype: String,
    pub inputs: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLink {
    /// Absolute URL, resolved against the page base.
    pub url: String,
    /// Trimmed visible text, at most 50 characters.
    pub text: String,
    /// Whether the raw href carried a query string.
    pub has_params: bool,
}

/// The input surface of one fetched page. Rebuilt fresh per fetch and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSurface {
    pub forms: Vec<DiscoveredForm>,
    pub links: Vec<DiscoveredLink>,
}

/// Parse a page into its input surface. Malformed markup never fails: the
/// parser is lenient and anything unextractable is simply absent from the
/// result. Output is deterministic and preserves document order.
pub fn extract(html: &str, base_url: &str) -> InputSurface {
    let document = Html::parse_document(html);

    let form_selector = Selector::parse("form").expect("static selector");
    let field_selector = Selector::parse("input, textarea, select").expect("static selector");
    let link_selector = Selector::parse("a[href]").expect("static selector");

    let mut surface = InputSurface::default();

    for form in document.select(&form_selector) {
        let mut inputs = Vec::new();
        for field in form.select(&field_selector) {
            let Some(name) = field.value().attr("name") else {
                continue;
            };
            inputs.push(FormField {
                name: name.to_string(),
                field_type: field.value().attr("type").unwrap_or("text").to_string(),
                value: field.value().attr("value").unwrap_or("").to_string(),
                id: field.value().attr("id").unwrap_or("").to_string(),
            });
        }

        surface.forms.push(DiscoveredForm {
            action: form.value().attr("action").unwrap_or("").to_string(),
            method: form
                .value()
                .attr("method")
                .unwrap_or("get")
                .to_lowercase(),
            enctype: form.value().attr("enctype").unwrap_or("").to_string(),
            inputs,
        });
    }

    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(err) => {
            debug!(base_url, %err, "unresolvable base URL, dropping links");
            return surface;
        }
    };

    for anchor in document.select(&link_selector) {
        let href = anchor.value().attr("href").unwrap_or("");
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let text: String = anchor.text().collect::<String>().trim().chars().take(50).collect();
        surface.links.push(DiscoveredLink {
            url: resolved.to_string(),
            text,
            has_params: href.contains('?'),
        });
    }

    surface
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <form action="/login" method="POST" enctype="multipart/form-data">
            <input type="text" name="username" id="user" />
            <input type="password" name="password" />
            <input type="hidden" name="csrf_token" value="abcdef0123456789abcd" />
            <input type="submit" value="Go" />
            <textarea name="comment"></textarea>
            <select name="role"><option>user</option></select>
        </form>
        <form>
            <input type="text" value="anonymous" />
        </form>
        <a href="/profile?id=7">My profile</a>
        <a href="https://elsewhere.example/page">External</a>
        <a href="no-scheme-relative">Relative</a>
        </body></html>
    "#;

    #[test]
    fn extracts_forms_in_document_order() {
        let surface = extract(PAGE, "http://target.example/");
        assert_eq!(surface.forms.len(), 2);

        let login = &surface.forms[0];
        assert_eq!(login.action, "/login");
        assert_eq!(login.method, "post");
        assert_eq!(login.enctype, "multipart/form-data");
        let names: Vec<_> = login.inputs.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["username", "password", "csrf_token", "comment", "role"]);
        assert_eq!(login.inputs[2].value, "abcdef0123456789abcd");
        assert_eq!(login.inputs[2].field_type, "hidden");
        assert_eq!(login.inputs[0].id, "user");
    }

    #[test]
    fn nameless_inputs_are_discarded() {
        let surface = extract(PAGE, "http://target.example/");
        // The submit button has a value but no name; the second form's sole
        // input has no name either.
        assert!(surface.forms[0].inputs.iter().all(|f| f.field_type != "submit"));
        assert!(surface.forms[1].inputs.is_empty());
    }

    #[test]
    fn links_resolve_to_absolute_urls() {
        let surface = extract(PAGE, "http://target.example/app/");
        assert_eq!(surface.links.len(), 3);
        assert_eq!(surface.links[0].url, "http://target.example/profile?id=7");
        assert!(surface.links[0].has_params);
        assert_eq!(surface.links[0].text, "My profile");
        assert_eq!(surface.links[1].url, "https://elsewhere.example/page");
        assert!(!surface.links[1].has_params);
        assert_eq!(surface.links[2].url, "http://target.example/app/no-scheme-relative");
    }

    #[test]
    fn defaults_apply_for_missing_attributes() {
        let surface = extract("<form><input name=\"q\"></form>", "http://t.example/");
        let form = &surface.forms[0];
        assert_eq!(form.action, "");
        assert_eq!(form.method, "get");
        assert_eq!(form.enctype, "");
        assert_eq!(form.inputs[0].field_type, "text");
        assert_eq!(form.inputs[0].value, "");
    }

    #[test]
    fn link_text_truncated_to_fifty_chars() {
        let long = format!("<a href=\"/x\">{}</a>", "a".repeat(80));
        let surface = extract(&long, "http://t.example/");
        assert_eq!(surface.links[0].text.chars().count(), 50);
    }

    #[test]
    fn extraction_is_deterministic() {
        let first = extract(PAGE, "http://target.example/");
        let second = extract(PAGE, "http://target.example/");
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_markup_yields_empty_surface() {
        let surface = extract("<<<>><form", "http://t.example/");
        assert!(surface.forms.len() <= 1);
        assert!(surface.links.is_empty());
    }

    #[test]
    fn bad_base_url_drops_links_not_forms() {
        let surface = extract(PAGE, "not a url");
        assert_eq!(surface.forms.len(), 2);
        assert!(surface.links.is_empty());
    }
}
