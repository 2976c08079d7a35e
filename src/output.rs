//! Bounded capture of process output.

/// Appended to output that hit the byte cap.
pub const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// Accumulates bytes up to a fixed cap, silently discarding the rest.
///
/// Callers keep feeding it after the cap is reached so the producing process
/// never stalls on a full pipe.
#[derive(Debug)]
pub struct OutputCollector {
    limit: usize,
    buf: Vec<u8>,
    truncated: bool,
}

impl OutputCollector {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            buf: Vec::with_capacity(limit.min(8 * 1024)),
            truncated: false,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.buf.len());
        if chunk.len() > room {
            self.truncated = true;
        }
        self.buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    }

    pub fn finish(self) -> CollectedOutput {
        CollectedOutput {
            bytes: self.buf,
            truncated: self.truncated,
            limit: self.limit,
        }
    }
}

/// Output of one process, already bounded to the cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedOutput {
    bytes: Vec<u8>,
    truncated: bool,
    limit: usize,
}

impl CollectedOutput {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode as UTF-8 (lossily) and append the marker if anything was cut.
    ///
    /// The result never exceeds `limit + TRUNCATION_MARKER.len()` bytes.
    pub fn into_text(self) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        let mut truncated = self.truncated;

        // Replacement characters can widen invalid input past the cap
        if text.len() > self.limit {
            text.truncate(floor_char_boundary(&text, self.limit));
            truncated = true;
        }
        if truncated {
            text.push_str(TRUNCATION_MARKER);
        }
        text
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    (0..=index.min(s.len()))
        .rev()
        .find(|&i| s.is_char_boundary(i))
        .unwrap_or(0)
}
