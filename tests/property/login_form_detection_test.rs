//! Property-based tests for login-form classification.
//!
//! Any form containing a password input is a login form, whatever its
//! `action` and whatever other inputs surround the password field.

use proptest::prelude::*;
use vaultfill::page::Document;
use vaultfill::services::form_scanner::{FormScanner, FormScannerTrait};

fn arb_input_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("text"),
        Just("email"),
        Just("hidden"),
        Just("checkbox"),
        Just("submit"),
        Just("tel"),
    ]
}

proptest! {
    #[test]
    fn password_input_always_classifies_form(
        action in "[ -~]{0,40}",
        before in prop::collection::vec(arb_input_type(), 0..4),
        after in prop::collection::vec(arb_input_type(), 0..4),
        nest_depth in 0usize..3,
    ) {
        let mut doc = Document::new("https://example.com/");
        let body = doc.body();
        let form = doc.append_element(body, "form", &[("action", action.as_str())]).unwrap();
        for t in &before {
            doc.append_element(form, "input", &[("type", *t)]).unwrap();
        }
        let mut parent = form;
        for _ in 0..nest_depth {
            parent = doc.append_element(parent, "div", &[]).unwrap();
        }
        let password = doc.append_element(parent, "input", &[("type", "password")]).unwrap();
        for t in &after {
            doc.append_element(form, "input", &[("type", *t)]).unwrap();
        }

        let scanner = FormScanner::new();
        prop_assert!(scanner.is_login_form(&doc, form));
        prop_assert_eq!(scanner.find_password_field(&doc, form), Some(password));

        let bindings = scanner.scan(&doc);
        prop_assert_eq!(bindings.len(), 1);
        prop_assert_eq!(bindings[0].password, Some(password));
    }

    #[test]
    fn forms_without_password_or_pattern_are_never_login_forms(
        action in "/(search|cart|blog|news)[a-z0-9/]{0,10}",
        inputs in prop::collection::vec(arb_input_type(), 0..5),
    ) {
        prop_assume!(!["login", "signin", "auth", "account", "user", "session", "password"]
            .iter()
            .any(|p| action.contains(p)));
        let mut doc = Document::new("https://example.com/");
        let body = doc.body();
        let form = doc.append_element(body, "form", &[("action", action.as_str())]).unwrap();
        for t in &inputs {
            doc.append_element(form, "input", &[("type", *t)]).unwrap();
        }

        prop_assert!(!FormScanner::new().is_login_form(&doc, form));
    }
}
