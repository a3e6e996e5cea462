//! `GET /api/ext/progress/{request_id}` — one [`ProgressEvent`] per SSE
//! frame, `event:` set to the variant's tag. Uses
//! `tokio_stream::wrappers::ReceiverStream` to turn an mpsc channel into a
//! `Stream` the HTTP layer can hand to axum.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::events::{ProgressBus, ProgressEvent};

pub fn progress_stream(
    progress: &ProgressBus,
    request_id: String,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    let rx = progress.subscribe(request_id);
    let stream = ReceiverStream::new(rx).map(|event| Ok(to_sse_event(&event)));
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

fn to_sse_event(event: &ProgressEvent) -> Event {
    let name = match event {
        ProgressEvent::Started { .. } => "started",
        ProgressEvent::Navigating { .. } => "navigating",
        ProgressEvent::Waiting { .. } => "waiting",
        ProgressEvent::Capturing { .. } => "capturing",
        ProgressEvent::Parsing {} => "parsing",
        ProgressEvent::Complete { .. } => "complete",
        ProgressEvent::Error { .. } => "error",
    };
    match Event::default().event(name).json_data(event) {
        Ok(e) => e,
        Err(_) => Event::default().event("error").data("serialization failed"),
    }
}
