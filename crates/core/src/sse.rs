//! Incremental Server-Sent Events frame decoding.
//!
//! Bytes arrive in arbitrary pieces; frames are delimited by a blank line. Carriage returns are
//! dropped on the way in so `\r\n\r\n` and `\n\n` delimit frames alike.

/// One dispatched SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if any.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes and returns every frame completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buf.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(pos) = memchr::memmem::find(&self.buf, b"\n\n") {
            let block: Vec<u8> = self.buf.drain(..pos + 2).collect();
            if let Some(frame) = parse_block(&String::from_utf8_lossy(&block)) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Dispatches whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buf);
        parse_block(&String::from_utf8_lossy(&rest))
    }
}

fn parse_block(block: &str) -> Option<SseFrame> {
    let mut event = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value.to_owned()),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event.is_none() && data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event,
        data: data.join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_split_across_pushes() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: slide\nda").is_empty());
        let frames = decoder.push(b"ta: {\"a\":1}\n\nevent: chunk\ndata: x\n\n");
        assert_eq!(
            frames,
            vec![
                SseFrame {
                    event: Some("slide".into()),
                    data: "{\"a\":1}".into()
                },
                SseFrame {
                    event: Some("chunk".into()),
                    data: "x".into()
                },
            ]
        );
    }

    #[test]
    fn test_crlf_delimiters_and_comments() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b": keep-alive\r\n\r\ndata: one\r\ndata: two\r\n\r\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: None,
                data: "one\ntwo".into()
            }]
        );
    }

    #[test]
    fn test_finish_flushes_trailing_frame() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(
            decoder.finish(),
            Some(SseFrame {
                event: None,
                data: "tail".into()
            })
        );
        assert_eq!(decoder.finish(), None);
    }
}
