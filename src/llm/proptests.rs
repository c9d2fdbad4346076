//! Property-based tests for prompt rendering and JSON extraction
//!
//! - Rendering never touches text without placeholders
//! - Every known placeholder is replaced, unknown ones survive
//! - Fenced JSON objects parse to the same map as the bare object
//! - Extraction never panics on arbitrary text

use super::client::{parse_json_object, render_template, strip_code_fence, TemplateVars};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_key() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}"
}

/// Plain text that cannot contain a placeholder
fn arb_plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?\n]{0,80}"
}

fn arb_json_object() -> impl Strategy<Value = serde_json::Value> {
    proptest::collection::btree_map(arb_key(), "[a-zA-Z0-9 ]{0,20}", 0..6).prop_map(|m| {
        serde_json::Value::Object(
            m.into_iter()
                .map(|(k, v)| (k, serde_json::Value::String(v)))
                .collect(),
        )
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn render_without_placeholders_is_identity(text in arb_plain_text(), key in arb_key(), value in arb_plain_text()) {
        let vars = TemplateVars::new().with(key, value);
        prop_assert_eq!(render_template(&text, &vars), text);
    }

    #[test]
    fn render_replaces_known_and_keeps_unknown(
        known in arb_key(),
        value in arb_plain_text(),
        prefix in arb_plain_text(),
        suffix in arb_plain_text(),
    ) {
        let unknown = format!("{known}_missing");
        let template = format!("{prefix}{{{{{known}}}}}{suffix}{{{{{unknown}}}}}");
        let vars = TemplateVars::new().with(known.clone(), value.clone());

        let rendered = render_template(&template, &vars);

        prop_assert_eq!(rendered, format!("{prefix}{value}{suffix}{{{{{unknown}}}}}"));
    }

    #[test]
    fn fenced_object_matches_bare_object(obj in arb_json_object(), tagged in any::<bool>()) {
        let body = obj.to_string();
        let fence = if tagged { "```json" } else { "```" };
        let fenced = format!("{fence}\n{body}\n```");

        let parsed = parse_json_object(&fenced);
        prop_assert_eq!(serde_json::Value::Object(parsed), obj);
    }

    #[test]
    fn extraction_never_panics(text in ".{0,200}") {
        let stripped = strip_code_fence(&text);
        prop_assert!(stripped.len() <= text.len());
        let _ = parse_json_object(&text);
    }
}
