//! Bounded rolling window over streamed output.

pub const DEFAULT_BUFFER_SIZE: usize = 500;

/// Keeps the most recent `capacity` characters of everything appended.
#[derive(Debug, Clone)]
pub struct RollingBuffer {
    text: String,
    chars: usize,
    capacity: usize,
}

impl RollingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            chars: 0,
            capacity,
        }
    }

    /// Append `chunk`, evicting the oldest characters beyond capacity.
    pub fn append(&mut self, chunk: &str) {
        self.text.push_str(chunk);
        self.chars += chunk.chars().count();

        if self.chars > self.capacity {
            let excess = self.chars - self.capacity;
            let cut = self
                .text
                .char_indices()
                .nth(excess)
                .map_or(self.text.len(), |(i, _)| i);
            self.text.drain(..cut);
            self.chars = self.capacity;
        }
    }

    pub fn contents(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.chars == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.chars = 0;
    }
}

impl Default for RollingBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}
