pub const DEFAULT_PUBLISH_MARKER: &str = "#public";

/// Decides whether a note may be served at all. Runs on raw bytes, before
/// rendering and before anything reaches the indexes.
#[derive(Debug, Clone)]
pub struct PublishGate {
    marker: Vec<u8>,
}

impl PublishGate {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into().into_bytes(),
        }
    }

    pub fn is_public(&self, raw: &[u8]) -> bool {
        if self.marker.is_empty() {
            return false;
        }
        raw.windows(self.marker.len()).any(|w| w == self.marker.as_slice())
    }
}

impl Default for PublishGate {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLISH_MARKER)
    }
}
