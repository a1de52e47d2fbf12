#![no_main]

use libfuzzer_sys::fuzz_target;
use octo_github::webhook_payload::WebhookEvent;

const EVENTS: [&str; 4] = ["issues", "issue_comment", "discussion_comment", "push"];

fuzz_target!(|data: &[u8]| {
    let Some((selector, body)) = data.split_first() else {
        return;
    };
    let event_name = EVENTS[usize::from(*selector) % EVENTS.len()];
    if let Ok(event) = WebhookEvent::parse(event_name, body) {
        let name = event.name();
        assert!(name.starts_with(event_name));
        if let WebhookEvent::Unsubscribed { .. } = event {
            assert!(event.sender().is_none());
        } else {
            assert!(event.repository().is_some());
        }
    }
});
