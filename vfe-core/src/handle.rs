//! Per-engine open-file state

use crate::flags::OpenMode;

/// One open file: mode, cursor and whatever the backend reads from.
///
/// An engine owns at most one handle. `None` in the engine stands for
/// "not open", so the cursor held here is always `>= 0`.
#[derive(Debug)]
pub struct FileHandle<B> {
    mode: OpenMode,
    position: i64,
    backing: B,
}

impl<B> FileHandle<B> {
    pub fn new(mode: OpenMode, position: i64, backing: B) -> Self {
        Self {
            mode,
            position: position.max(0),
            backing,
        }
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    /// Move the cursor; negative positions are rejected by the caller
    pub fn set_position(&mut self, position: i64) {
        self.position = position.max(0);
    }

    pub fn advance(&mut self, by: usize) {
        self.position = self.position.saturating_add(by as i64);
    }

    /// Pull the cursor back inside a file that shrank to `size`
    pub fn clamp_to(&mut self, size: i64) {
        if self.position > size {
            self.position = size.max(0);
        }
    }

    pub fn can_read(&self) -> bool {
        self.mode.contains(OpenMode::READ)
    }

    pub fn can_write(&self) -> bool {
        self.mode.is_writable()
    }

    pub fn backing(&self) -> &B {
        &self.backing
    }

    pub fn backing_mut(&mut self) -> &mut B {
        &mut self.backing
    }

    /// Bytes a read of `max` may copy from content of length `len`.
    ///
    /// `None` when the cursor lies beyond the end: that is a failed read,
    /// not an empty one.
    pub fn read_span(&self, len: usize, max: usize) -> Option<usize> {
        let remaining = len as i64 - self.position;
        if remaining < 0 {
            None
        } else {
            Some((remaining as usize).min(max))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_span() {
        let mut handle = FileHandle::new(OpenMode::READ, 0, ());
        assert_eq!(handle.read_span(5, 4), Some(4));
        handle.set_position(3);
        assert_eq!(handle.read_span(5, 4), Some(2));
        handle.set_position(5);
        assert_eq!(handle.read_span(5, 4), Some(0));
        handle.set_position(10);
        assert_eq!(handle.read_span(5, 4), None);
    }

    #[test]
    fn test_clamp_and_advance() {
        let mut handle = FileHandle::new(OpenMode::READ_WRITE, 8, ());
        handle.clamp_to(4);
        assert_eq!(handle.position(), 4);
        handle.clamp_to(10);
        assert_eq!(handle.position(), 4);
        handle.advance(3);
        assert_eq!(handle.position(), 7);
    }

    #[test]
    fn test_capabilities() {
        let handle = FileHandle::new(OpenMode::APPEND, 0, ());
        assert!(handle.can_write());
        assert!(!handle.can_read());
    }
}
