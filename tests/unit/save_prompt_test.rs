//! Tests for the save-consent prompt.

#[path = "../support/mod.rs"]
mod support;

use vaultfill::managers::save_prompt::{PromptAnswer, SavePrompt, SAVE_PROMPT_DOM_ID};
use vaultfill::types::credential::SaveRequest;

use support::{login_page, ORIGIN};

#[test]
fn incomplete_capture_shows_nothing() {
    let mut page = login_page();
    let mut prompt = SavePrompt::new();

    let shown = prompt
        .offer(&mut page.doc, SaveRequest::new(ORIGIN, "a@b.com", ""))
        .unwrap();

    assert!(!shown);
    assert!(!prompt.is_visible());
    assert_eq!(page.doc.find_by_dom_id(SAVE_PROMPT_DOM_ID), None);
}

#[test]
fn complete_capture_shows_owned_prompt() {
    let mut page = login_page();
    let mut prompt = SavePrompt::new();

    let shown = prompt
        .offer(&mut page.doc, SaveRequest::new(ORIGIN, "a@b.com", "p1"))
        .unwrap();

    assert!(shown);
    let root = page.doc.find_by_dom_id(SAVE_PROMPT_DOM_ID).unwrap();
    assert!(page.doc.is_owned(root));
    assert_eq!(prompt.pending_request().unwrap().username, "a@b.com");
}

#[test]
fn buttons_map_to_answers() {
    let mut page = login_page();
    let mut prompt = SavePrompt::new();
    prompt
        .offer(&mut page.doc, SaveRequest::new(ORIGIN, "a@b.com", "p1"))
        .unwrap();
    let yes = page.doc.find_by_dom_id("save-password-yes").unwrap();
    let no = page.doc.find_by_dom_id("save-password-no").unwrap();

    assert_eq!(prompt.answer_for_click(&page.doc, yes), Some(PromptAnswer::Accept));
    assert_eq!(prompt.answer_for_click(&page.doc, no), Some(PromptAnswer::Decline));
    assert_eq!(prompt.answer_for_click(&page.doc, page.email), None);
}

#[test]
fn accept_hands_over_request_and_hides() {
    let mut page = login_page();
    let mut prompt = SavePrompt::new();
    prompt
        .offer(&mut page.doc, SaveRequest::new(ORIGIN, "a@b.com", "p1"))
        .unwrap();

    let request = prompt.accept(&mut page.doc).unwrap();

    assert_eq!(request, SaveRequest::new(ORIGIN, "a@b.com", "p1"));
    assert!(!prompt.is_visible());
    assert_eq!(page.doc.find_by_dom_id(SAVE_PROMPT_DOM_ID), None);
    assert!(prompt.accept(&mut page.doc).is_none());
}

#[test]
fn decline_discards_capture() {
    let mut page = login_page();
    let mut prompt = SavePrompt::new();
    prompt
        .offer(&mut page.doc, SaveRequest::new(ORIGIN, "a@b.com", "p1"))
        .unwrap();

    prompt.decline(&mut page.doc);

    assert!(!prompt.is_visible());
    assert!(prompt.pending_request().is_none());
    assert_eq!(page.doc.find_by_dom_id(SAVE_PROMPT_DOM_ID), None);
}

#[test]
fn new_offer_replaces_old_prompt() {
    let mut page = login_page();
    let mut prompt = SavePrompt::new();
    prompt
        .offer(&mut page.doc, SaveRequest::new(ORIGIN, "old", "p0"))
        .unwrap();
    prompt
        .offer(&mut page.doc, SaveRequest::new(ORIGIN, "new", "p1"))
        .unwrap();

    let prompts = page
        .doc
        .descendants(page.doc.body())
        .into_iter()
        .filter(|id| page.doc.attribute(*id, "id") == Some(SAVE_PROMPT_DOM_ID))
        .count();
    assert_eq!(prompts, 1);
    assert_eq!(prompt.pending_request().unwrap().username, "new");
}
