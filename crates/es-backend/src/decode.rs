//! Frame decoding: backend response bytes → protocol events.
//!
//! The backend streams Server-Sent Events; each `data:` payload is one frame,
//! one frame is one JSON event object. Framing and JSON decoding both happen
//! here; a frame that fails to decode is dropped (logged) and decoding
//! continues with the next one, so a single malformed frame never ends a
//! session. No interpretation of states or parts happens at this layer.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use es_protocol::ProtocolEvent;
use futures::Stream;
use tracing::warn;

/// SSE line/field state machine. Accumulates `data:` lines and closes a
/// frame on a blank line.
#[derive(Default)]
struct FrameState {
    /// Buffer for an incomplete line.
    line_buf: String,
    /// `data:` payload lines of the frame being accumulated.
    data_lines: Vec<String>,
}

impl FrameState {
    /// Process a complete line. Returns the frame payload when a frame closes.
    fn process_line(&mut self, line: &str) -> Option<String> {
        // Blank line closes the frame.
        if line.is_empty() {
            if self.data_lines.is_empty() {
                return None;
            }
            return Some(std::mem::take(&mut self.data_lines).join("\n"));
        }

        // `:` at column 0 is an SSE comment (keep-alive), skip it.
        if line.starts_with(':') {
            return None;
        }

        if let Some(colon_pos) = line.find(':') {
            let field = &line[..colon_pos];
            // Value starts after the colon, minus one optional leading space.
            let value_start = colon_pos + 1;
            let value = if line.len() > value_start && line.as_bytes()[value_start] == b' ' {
                &line[value_start + 1..]
            } else {
                &line[value_start..]
            };
            if field == "data" {
                self.data_lines.push(value.to_string());
            }
            // event/id/retry carry nothing for this protocol.
        }
        // Lines without a colon are field names with empty values, ignored.

        None
    }

    /// End of stream: flush any unterminated line and frame.
    fn flush(&mut self) -> Option<String> {
        if !self.line_buf.is_empty() {
            let line = std::mem::take(&mut self.line_buf);
            let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
            if let Some(frame) = self.process_line(&line) {
                return Some(frame);
            }
        }
        if self.data_lines.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.data_lines).join("\n"))
        }
    }
}

/// Stream adapter that turns a byte stream into decoded protocol events.
pub struct FrameDecoder<S> {
    inner: S,
    state: FrameState,
    pending: Vec<ProtocolEvent>,
}

impl<S> FrameDecoder<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            state: FrameState::default(),
            pending: Vec::new(),
        }
    }

    /// Decode one closed frame; malformed frames are dropped here.
    fn accept_frame(&mut self, frame: &str) {
        match ProtocolEvent::decode(frame) {
            Ok(event) => self.pending.push(event),
            Err(e) => warn!(error = %e, "dropping malformed frame"),
        }
    }
}

impl<S, E> Stream for FrameDecoder<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<ProtocolEvent, E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if !this.pending.is_empty() {
            return Poll::Ready(Some(Ok(this.pending.remove(0))));
        }

        loop {
            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let chunk = String::from_utf8_lossy(&bytes);
                    for c in chunk.chars() {
                        if c == '\n' {
                            let line = std::mem::take(&mut this.state.line_buf);
                            let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
                            if let Some(frame) = this.state.process_line(&line) {
                                this.accept_frame(&frame);
                            }
                        } else {
                            this.state.line_buf.push(c);
                        }
                    }

                    if !this.pending.is_empty() {
                        return Poll::Ready(Some(Ok(this.pending.remove(0))));
                    }
                    // No complete frame yet, keep polling for bytes.
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    if let Some(frame) = this.state.flush() {
                        this.accept_frame(&frame);
                    }
                    if this.pending.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(this.pending.remove(0))));
                }
                Poll::Pending => {
                    return Poll::Pending;
                }
            }
        }
    }
}

/// Decode protocol events from a byte stream.
pub fn decode_frames<S, E>(stream: S) -> FrameDecoder<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    FrameDecoder::new(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use es_protocol::{Part, TaskState};
    use futures::StreamExt;

    fn bytes_stream(
        chunks: Vec<&'static str>,
    ) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Unpin {
        futures::stream::iter(chunks.into_iter().map(|s| Ok(Bytes::from(s))))
    }

    async fn collect_events(
        chunks: Vec<&'static str>,
    ) -> Vec<ProtocolEvent> {
        decode_frames(bytes_stream(chunks))
            .map(|r| r.unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn decode_single_frame() {
        let events = collect_events(vec![
            "data: {\"kind\":\"status-update\",\"final\":false,\"status\":{\"state\":\"working\"}}\n\n",
        ])
        .await;

        assert_eq!(events.len(), 1);
        let ProtocolEvent::StatusUpdate(update) = &events[0] else {
            panic!("expected status update");
        };
        assert_eq!(update.status.state, TaskState::Working);
    }

    #[tokio::test]
    async fn decode_multiple_frames_in_order() {
        let events = collect_events(vec![
            "data: {\"kind\":\"task\",\"id\":\"t1\"}\n\ndata: {\"kind\":\"message\"}\n\n",
        ])
        .await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ProtocolEvent::Task(_)));
        assert!(matches!(events[1], ProtocolEvent::Message(_)));
    }

    #[tokio::test]
    async fn malformed_frame_between_valid_frames_is_dropped() {
        let events = collect_events(vec![
            "data: {\"kind\":\"task\",\"id\":\"t1\"}\n\n",
            "data: {this is not json\n\n",
            "data: {\"kind\":\"message\"}\n\n",
        ])
        .await;

        // Exactly the two valid events, in order, no abort.
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ProtocolEvent::Task(_)));
        assert!(matches!(events[1], ProtocolEvent::Message(_)));
    }

    #[tokio::test]
    async fn non_object_frame_is_dropped() {
        let events = collect_events(vec![
            "data: [1,2,3]\n\ndata: {\"kind\":\"task\"}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn unknown_kind_is_an_event_not_an_error() {
        let events = collect_events(vec![
            "data: {\"kind\":\"artifact-update\"}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProtocolEvent::Unknown { .. }));
    }

    #[tokio::test]
    async fn frame_split_across_chunks() {
        let events = collect_events(vec![
            "data: {\"kind\":\"status-update\",\"status\":{\"state\":\"comp",
            "leted\",\"message\":{\"parts\":[{\"kind\":\"text\",\"te",
            "xt\":\"hello world\"}]}},\"final\":true}\n\n",
        ])
        .await;

        assert_eq!(events.len(), 1);
        let ProtocolEvent::StatusUpdate(update) = &events[0] else {
            panic!("expected status update");
        };
        assert_eq!(
            update.status.message.as_ref().unwrap().parts[0],
            Part::Text {
                text: "hello world".to_string()
            }
        );
    }

    #[tokio::test]
    async fn crlf_line_endings() {
        let events = collect_events(vec![
            "data: {\"kind\":\"task\"}\r\n\r\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn comments_and_other_fields_are_ignored() {
        let events = collect_events(vec![
            ": keep-alive\nid: 42\nevent: status\ndata: {\"kind\":\"message\"}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProtocolEvent::Message(_)));
    }

    #[tokio::test]
    async fn multi_line_data_is_joined() {
        // A pretty-printed object split over two data lines.
        let events = collect_events(vec![
            "data: {\"kind\":\"task\",\ndata: \"id\":\"t9\"}\n\n",
        ])
        .await;
        assert_eq!(events.len(), 1);
        let ProtocolEvent::Task(raw) = &events[0] else {
            panic!("expected task");
        };
        assert_eq!(raw["id"], "t9");
    }

    #[tokio::test]
    async fn frame_at_stream_end_without_blank_line() {
        let events = collect_events(vec!["data: {\"kind\":\"message\"}"]).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ProtocolEvent::Message(_)));
    }

    #[tokio::test]
    async fn only_garbage_yields_nothing() {
        let events = collect_events(vec!["data: garbage\n\ndata: more garbage\n\n"]).await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn transport_error_is_propagated() {
        let inner = futures::stream::iter(vec![
            Ok(Bytes::from("data: {\"kind\":\"task\"}\n\n")),
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone")),
        ]);
        let mut decoder = decode_frames(inner);

        assert!(decoder.next().await.unwrap().is_ok());
        assert!(decoder.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn empty_data_field_is_dropped_not_fatal() {
        let events = collect_events(vec!["data:\n\ndata: {\"kind\":\"task\"}\n\n"]).await;
        assert_eq!(events.len(), 1);
    }
}
