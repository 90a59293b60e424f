use chart_model::{Note, NoteKind};

use crate::window::WindowedNotes;

/// Hold load per window: overlap of every hold with the window, in window lengths.
///
/// A hold contributes to each window its span touches, so a long hold spreads
/// across all of them rather than landing only where it starts.
pub fn ln_strain(notes: &[Note], windows: &WindowedNotes) -> Vec<f64> {
    let size = windows.window_size();
    let mut strain = vec![0.0; windows.len()];

    for note in notes {
        let NoteKind::Hold { end_time } = note.kind else {
            continue;
        };
        let first = windows.index_of(note.time);
        let last = windows.index_of(end_time);
        for (i, slot) in strain.iter_mut().enumerate().take(last + 1).skip(first) {
            let (start, end) = windows.bounds(i);
            let overlap = end_time.min(end) - note.time.max(start);
            if overlap > 0.0 {
                *slot += overlap / size;
            }
        }
    }
    strain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_spreads_across_windows() {
        let notes = vec![Note::tap(1, 0.0), Note::hold(0, 0.5, 3.25)];
        let windows = WindowedNotes::new(&notes, 0.0, 1.0, 4);
        let strain = ln_strain(&notes, &windows);
        let expected = [0.5, 1.0, 1.0, 0.25];
        for (got, want) in strain.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "{strain:?}");
        }
    }

    #[test]
    fn test_overlap_sums_to_duration() {
        let notes = vec![
            Note::tap(0, 0.0),
            Note::hold(1, 0.3, 4.9),
            Note::hold(2, 1.1, 1.4),
            Note::hold(3, 2.0, 5.0),
        ];
        let windows = WindowedNotes::new(&notes, 0.0, 0.5, 10);
        let strain = ln_strain(&notes, &windows);
        let total: f64 = strain.iter().sum::<f64>() * 0.5;
        let held: f64 = notes.iter().map(Note::duration).sum();
        assert!((total - held).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_holds_stack() {
        let notes = vec![Note::hold(0, 0.0, 1.0), Note::hold(1, 0.0, 1.0)];
        let windows = WindowedNotes::new(&notes, 0.0, 1.0, 1);
        assert_eq!(ln_strain(&notes, &windows), vec![2.0]);
    }
}
