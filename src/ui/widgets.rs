/// Widget DOM fragments. Builders return a detached fragment; the
/// renderer decides where it lands. Clicks post request envelopes into
/// the page channel through the injected `emit` hook.
use std::rc::Rc;

use serde_json::json;

use crate::contracts::{Envelope, events, markers};
use crate::dom::DocumentPort;

pub const DEFAULT_SUMMARY: &str = "AI summary coming soon...";

/// A semantic search input bar with a submit button.
pub fn search_bar<D: DocumentPort + 'static>(doc: &Rc<D>, emit: Rc<dyn Fn(Envelope)>) -> D::Node {
    let container = doc.create_element("div");
    doc.add_class(&container, "ts-searchbar");

    let input = doc.create_element("input");
    doc.set_attr(&input, "type", "text");
    doc.set_attr(&input, "placeholder", "Search threads semantically...");
    doc.add_class(&input, "ts-searchbar-input");

    let button = doc.create_element("button");
    doc.set_text(&button, "Search");
    doc.add_class(&button, "ts-searchbar-btn");

    {
        let handler_doc = Rc::clone(doc);
        let input = input.clone();
        doc.on_click(
            &button,
            Box::new(move || {
                let query = handler_doc.input_value(&input).trim().to_string();
                if query.is_empty() {
                    return;
                }
                log::info!("semantic search triggered");
                emit(Envelope::new(
                    events::REQUEST_SEARCH,
                    Some(json!({ "query": query })),
                ));
            }),
        );
    }

    doc.append_child(&container, &input);
    doc.append_child(&container, &button);
    container
}

/// AI-generated summary card shown below the visible post.
pub fn response_card<D: DocumentPort>(doc: &Rc<D>, summary: &str) -> D::Node {
    let container = doc.create_element("div");
    doc.add_class(&container, markers::RESPONSE_CARD);
    doc.set_attr(&container, markers::CARD_ATTR, "true");

    let header = doc.create_element("div");
    doc.add_class(&header, "ts-response-card-header");
    doc.set_text(&header, "💡 ThreadSense AI Response Summary");

    let content = doc.create_element("div");
    doc.add_class(&content, "ts-response-card-content");
    doc.set_text(&content, summary);

    doc.append_child(&container, &header);
    doc.append_child(&container, &content);
    container
}

/// Helper buttons for the composer area: duplicate lookup before posting
/// and an answer suggestion for the draft.
pub fn composer_area<D: DocumentPort>(doc: &Rc<D>, emit: Rc<dyn Fn(Envelope)>) -> D::Node {
    let container = doc.create_element("div");
    doc.add_class(&container, markers::COMPOSER);

    let duplicates = composer_button(
        doc,
        "Check for duplicates",
        events::REQUEST_DUPLICATE_CHECK,
        Rc::clone(&emit),
    );
    let suggestion = composer_button(doc, "Suggest an answer", events::REQUEST_AI_SUGGESTION, emit);

    doc.append_child(&container, &duplicates);
    doc.append_child(&container, &suggestion);
    container
}

fn composer_button<D: DocumentPort>(
    doc: &Rc<D>,
    label: &str,
    request_type: &'static str,
    emit: Rc<dyn Fn(Envelope)>,
) -> D::Node {
    let button = doc.create_element("button");
    doc.set_text(&button, label);
    doc.add_class(&button, "ts-composer-btn");

    doc.on_click(
        &button,
        Box::new(move || {
            let query = "Composer area draft query";
            log::info!("composer action triggered: {request_type}");
            emit(Envelope::new(request_type, Some(json!({ "query": query }))));
        }),
    );
    button
}
