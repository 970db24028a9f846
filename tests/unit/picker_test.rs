//! Tests for the credential picker panel.

#[path = "../support/mod.rs"]
mod support;

use std::time::Duration;

use tokio::time::Instant;
use vaultfill::managers::credential_picker::{CredentialPicker, PickerClick, PICKER_DOM_ID};
use vaultfill::services::form_scanner::{FormScanner, FormScannerTrait};
use vaultfill::types::credential::Credential;
use vaultfill::types::page::{PanelPosition, ScrollOffset};

use support::{login_page, ORIGIN};

fn picker() -> CredentialPicker {
    CredentialPicker::new(Duration::from_millis(100))
}

fn one_credential() -> Vec<Credential> {
    vec![Credential::new(ORIGIN, "a@b.com", "p1")]
}

#[test]
fn renders_one_entry_per_credential_below_field() {
    let mut page = login_page();
    page.doc.set_scroll_offset(ScrollOffset { x: 4.0, y: 250.0 });
    let binding = FormScanner::new().scan(&page.doc)[0];
    let mut picker = picker();
    let credentials = vec![
        Credential::new(ORIGIN, "a@b.com", "p1"),
        Credential::new(ORIGIN, "c@d.com", "p2"),
    ];

    let root = picker
        .render(&mut page.doc, &binding, &credentials, Instant::now())
        .unwrap();

    let panel = picker.panel().unwrap();
    assert_eq!(page.doc.find_by_dom_id(PICKER_DOM_ID), Some(root));
    assert_eq!(panel.identifiers(), vec!["a@b.com", "c@d.com"]);
    assert_eq!(panel.anchor, page.password);
    // rect is (20, 100, 200x30): bottom 130 + scroll 250, left 20 + scroll 4
    assert_eq!(panel.position, PanelPosition { top: 380.0, left: 24.0 });
    assert!(page.doc.is_owned(root));
}

#[test]
fn rendering_again_replaces_existing_panel() {
    let mut page = login_page();
    let binding = FormScanner::new().scan(&page.doc)[0];
    let mut picker = picker();
    let now = Instant::now();

    let first = picker.render(&mut page.doc, &binding, &one_credential(), now).unwrap();
    let second = picker.render(&mut page.doc, &binding, &one_credential(), now).unwrap();

    assert_ne!(first, second);
    assert!(!page.doc.is_connected(first));
    assert_eq!(page.doc.find_by_dom_id(PICKER_DOM_ID), Some(second));
}

#[test]
fn selecting_entry_fills_both_fields_with_events() {
    let mut page = login_page();
    let binding = FormScanner::new().scan(&page.doc)[0];
    let mut picker = picker();
    let now = Instant::now();
    picker.render(&mut page.doc, &binding, &one_credential(), now).unwrap();
    let entry = picker.panel().unwrap().entry_nodes()[0];

    let outcome = picker
        .handle_click(&mut page.doc, entry, now + Duration::from_millis(500))
        .unwrap();

    assert_eq!(
        outcome,
        PickerClick::Selected {
            identifier: "a@b.com".to_string()
        }
    );
    assert_eq!(page.doc.value(page.email), Some("a@b.com"));
    assert_eq!(page.doc.value(page.password), Some("p1"));
    let targets: Vec<_> = page.doc.dispatched_events().iter().map(|e| e.target).collect();
    assert_eq!(targets, vec![page.email, page.password]);
    assert!(!picker.is_open());
    assert_eq!(page.doc.find_by_dom_id(PICKER_DOM_ID), None);
}

#[test]
fn opening_click_does_not_dismiss() {
    let mut page = login_page();
    let binding = FormScanner::new().scan(&page.doc)[0];
    let mut picker = picker();
    let now = Instant::now();
    picker.render(&mut page.doc, &binding, &one_credential(), now).unwrap();
    let body = page.doc.body();

    let outcome = picker.handle_click(&mut page.doc, body, now).unwrap();

    assert_eq!(outcome, PickerClick::Ignored);
    assert!(picker.is_open());
}

#[test]
fn outside_click_after_arming_dismisses() {
    let mut page = login_page();
    let binding = FormScanner::new().scan(&page.doc)[0];
    let mut picker = picker();
    let now = Instant::now();
    picker.render(&mut page.doc, &binding, &one_credential(), now).unwrap();

    let outcome = picker
        .handle_click(&mut page.doc, page.email, now + Duration::from_millis(100))
        .unwrap();

    assert_eq!(outcome, PickerClick::Dismissed);
    assert!(!picker.is_open());
}

#[test]
fn clicks_on_anchor_or_panel_keep_it_open() {
    let mut page = login_page();
    let binding = FormScanner::new().scan(&page.doc)[0];
    let mut picker = picker();
    let now = Instant::now();
    let root = picker.render(&mut page.doc, &binding, &one_credential(), now).unwrap();
    let later = now + Duration::from_secs(1);

    assert_eq!(
        picker.handle_click(&mut page.doc, page.password, later).unwrap(),
        PickerClick::Ignored
    );
    assert_eq!(
        picker.handle_click(&mut page.doc, root, later).unwrap(),
        PickerClick::Ignored
    );
    assert!(picker.is_open());
}

#[test]
fn click_without_panel_is_closed() {
    let mut page = login_page();
    let mut picker = picker();

    assert_eq!(
        picker.handle_click(&mut page.doc, page.email, Instant::now()).unwrap(),
        PickerClick::Closed
    );
}
