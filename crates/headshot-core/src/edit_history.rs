//! Linear undo/redo over successive edits of one base generation.

/// Frames in chronological edit order with a cursor on the visible one.
///
/// Applying an edit from a non-tip position drops every frame after the
/// cursor for good; there is no branching history. Lives in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHistory<T> {
    frames: Vec<T>,
    cursor: Option<usize>,
}

impl<T> Default for EditHistory<T> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            cursor: None,
        }
    }
}

impl<T> EditHistory<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Truncates to `[0..=cursor]`, appends `frame` and moves to it.
    pub fn apply_edit(&mut self, frame: T) -> &T {
        if let Some(cursor) = self.cursor {
            self.frames.truncate(cursor + 1);
        } else {
            self.frames.clear();
        }
        self.frames.push(frame);
        let tip = self.frames.len() - 1;
        self.cursor = Some(tip);
        &self.frames[tip]
    }

    /// Steps back one frame. Returns false (and does nothing) at the start.
    pub fn undo(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if cursor > 0 => {
                self.cursor = Some(cursor - 1);
                true
            }
            _ => false,
        }
    }

    /// Steps forward one frame. Returns false (and does nothing) at the tip.
    pub fn redo(&mut self) -> bool {
        match self.cursor {
            Some(cursor) if cursor + 1 < self.frames.len() => {
                self.cursor = Some(cursor + 1);
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.frames.clear();
        self.cursor = None;
    }

    pub fn current(&self) -> Option<&T> {
        self.cursor.and_then(|cursor| self.frames.get(cursor))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn frames(&self) -> &[T] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.cursor, Some(cursor) if cursor + 1 < self.frames.len())
    }
}
