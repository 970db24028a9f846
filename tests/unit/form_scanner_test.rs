//! Unit tests for login-form detection and field resolution.

use rstest::rstest;
use vaultfill::page::document::OWNED_MARKER;
use vaultfill::page::Document;
use vaultfill::services::form_scanner::{FormScanner, FormScannerTrait};

fn doc() -> Document {
    Document::new("https://example.com/")
}

// ─── Classification ───

#[rstest]
#[case("/login")]
#[case("/signin")]
#[case("/oauth/auth")]
#[case("/account/new")]
#[case("/user")]
#[case("/session")]
#[case("/password/reset")]
fn action_patterns_mark_login_forms(#[case] action: &str) {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[("action", action)]).unwrap();
    doc.append_element(form, "input", &[("type", "text")]).unwrap();

    assert!(FormScanner::new().is_login_form(&doc, form));
}

#[rstest]
#[case("/search")]
#[case("/subscribe")]
#[case("")]
fn other_actions_without_password_are_not_login_forms(#[case] action: &str) {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[("action", action)]).unwrap();
    doc.append_element(form, "input", &[("type", "text")]).unwrap();

    assert!(!FormScanner::new().is_login_form(&doc, form));
}

#[test]
fn action_match_is_case_sensitive() {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[("action", "/LOGIN")]).unwrap();

    assert!(!FormScanner::new().is_login_form(&doc, form));
}

#[test]
fn password_input_wins_over_action() {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[("action", "/search")]).unwrap();
    doc.append_element(form, "input", &[("type", "password")]).unwrap();

    assert!(FormScanner::new().is_login_form(&doc, form));
}

// ─── Username resolution ───

#[test]
fn email_input_has_priority() {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[]).unwrap();
    doc.append_element(form, "input", &[("type", "text"), ("name", "username")]).unwrap();
    let email = doc.append_element(form, "input", &[("type", "email")]).unwrap();
    doc.append_element(form, "input", &[("type", "password")]).unwrap();

    assert_eq!(FormScanner::new().find_username_field(&doc, form), Some(email));
}

#[rstest]
#[case("user_name")]
#[case("Email")]
#[case("loginId")]
fn named_text_input_beats_plain_text(#[case] name: &str) {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[]).unwrap();
    doc.append_element(form, "input", &[("type", "text"), ("name", "company")]).unwrap();
    let named = doc.append_element(form, "input", &[("type", "text"), ("name", name)]).unwrap();

    assert_eq!(FormScanner::new().find_username_field(&doc, form), Some(named));
}

#[test]
fn falls_back_to_first_text_input() {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[]).unwrap();
    let first = doc.append_element(form, "input", &[]).unwrap();
    doc.append_element(form, "input", &[("type", "text")]).unwrap();

    assert_eq!(FormScanner::new().find_username_field(&doc, form), Some(first));
}

#[test]
fn first_password_field_is_used() {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[]).unwrap();
    let current = doc.append_element(form, "input", &[("type", "password")]).unwrap();
    doc.append_element(form, "input", &[("type", "password")]).unwrap();

    assert_eq!(FormScanner::new().find_password_field(&doc, form), Some(current));
}

// ─── Scan ───

#[test]
fn scan_returns_login_forms_with_fields() {
    let mut doc = doc();
    let body = doc.body();
    let search = doc.append_element(body, "form", &[("action", "/search")]).unwrap();
    doc.append_element(search, "input", &[("name", "q")]).unwrap();
    let login = doc.append_element(body, "form", &[]).unwrap();
    let user = doc.append_element(login, "input", &[("type", "email"), ("name", "user")]).unwrap();
    let pass = doc.append_element(login, "input", &[("type", "password")]).unwrap();

    let bindings = FormScanner::new().scan(&doc);

    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings[0].form, login);
    assert_eq!(bindings[0].username, Some(user));
    assert_eq!(bindings[0].password, Some(pass));
}

#[test]
fn scan_skips_extension_owned_forms() {
    let mut doc = doc();
    let body = doc.body();
    let panel = doc.append_element(body, "div", &[(OWNED_MARKER, "prompt")]).unwrap();
    let form = doc.append_element(panel, "form", &[]).unwrap();
    doc.append_element(form, "input", &[("type", "password")]).unwrap();

    assert!(FormScanner::new().scan(&doc).is_empty());
}

#[test]
fn scan_ignores_disconnected_forms() {
    let mut doc = doc();
    let body = doc.body();
    let form = doc.append_element(body, "form", &[]).unwrap();
    doc.append_element(form, "input", &[("type", "password")]).unwrap();
    doc.remove(form).unwrap();

    assert!(FormScanner::new().scan(&doc).is_empty());
}

// ─── Direct-fill targets ───

#[test]
fn fill_targets_span_the_whole_document() {
    let mut doc = doc();
    let body = doc.body();
    let user = doc.append_element(body, "input", &[("name", "username")]).unwrap();
    let wrapper = doc.append_element(body, "div", &[]).unwrap();
    let pass = doc.append_element(wrapper, "input", &[("type", "password")]).unwrap();

    assert_eq!(FormScanner::new().find_fill_targets(&doc), Some((user, pass)));
}

#[test]
fn fill_targets_need_both_fields() {
    let mut doc = doc();
    let body = doc.body();
    doc.append_element(body, "input", &[("type", "password")]).unwrap();

    assert_eq!(FormScanner::new().find_fill_targets(&doc), None);
}
