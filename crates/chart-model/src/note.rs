use serde::{Deserialize, Serialize};

/// What a note asks of the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NoteKind {
    Tap,
    /// Sustained input until `end_time` (seconds, always after the head)
    Hold { end_time: f64 },
}

/// A single playable note in the canonical stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Absolute time in seconds
    pub time: f64,
    /// Lane index (0-indexed, contiguous per layout)
    pub lane: u32,
    pub kind: NoteKind,
}

impl Note {
    pub fn tap(lane: u32, time: f64) -> Self {
        Self {
            time,
            lane,
            kind: NoteKind::Tap,
        }
    }

    pub fn hold(lane: u32, time: f64, end_time: f64) -> Self {
        Self {
            time,
            lane,
            kind: NoteKind::Hold { end_time },
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(self.kind, NoteKind::Hold { .. })
    }

    /// Time the note releases; equals `time` for taps
    pub fn end_time(&self) -> f64 {
        match self.kind {
            NoteKind::Tap => self.time,
            NoteKind::Hold { end_time } => end_time,
        }
    }

    /// Hold length in seconds (0 for taps)
    pub fn duration(&self) -> f64 {
        self.end_time() - self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_has_no_duration() {
        let note = Note::tap(3, 1.25);
        assert!(!note.is_hold());
        assert_eq!(note.end_time(), 1.25);
        assert_eq!(note.duration(), 0.0);
    }

    #[test]
    fn test_hold_duration() {
        let note = Note::hold(0, 1.0, 2.5);
        assert!(note.is_hold());
        assert_eq!(note.end_time(), 2.5);
        assert!((note.duration() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_serde_roundtrip() {
        let note = Note::hold(2, 0.5, 0.75);
        let json = serde_json::to_string(&note).unwrap();
        let back: Note = serde_json::from_str(&json).unwrap();
        assert_eq!(note, back);
    }
}
