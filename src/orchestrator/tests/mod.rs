
use crate::types::Event;
use std::time::Duration;
use tokio::sync::broadcast;

/// Collect events until one matches `stop`, or panic after a few seconds
pub(super) async fn events_until(
    events: &mut broadcast::Receiver<Event>,
    stop: impl Fn(&Event) -> bool,
) -> Vec<Event> {
    let mut seen = Vec::new();
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let event = events.recv().await.unwrap();
            let done = stop(&event);
            seen.push(event);
            if done {
                break;
            }
        }
    })
    .await;
    assert!(waited.is_ok(), "expected event not received; saw {seen:?}");
    seen
}
