use chart_model::{Chart, Note, sanitize_window_size};

/// Notes that share one timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    pub time: f64,
    /// Ascending lane indices
    pub lanes: Vec<u32>,
}

impl Chord {
    pub fn size(&self) -> usize {
        self.lanes.len()
    }
}

/// Notes bucketed into fixed windows anchored at `origin`.
///
/// Window `i` covers `[origin + i*W, origin + (i+1)*W)`; a note exactly on
/// the far edge of the last window is kept in the last window. Window
/// lengths go through [`sanitize_window_size`].
#[derive(Debug, Clone)]
pub struct WindowedNotes {
    origin: f64,
    window_size: f64,
    buckets: Vec<Vec<Note>>,
}

impl WindowedNotes {
    pub fn new(notes: &[Note], origin: f64, window_size: f64, count: usize) -> Self {
        let mut windowed = Self {
            origin,
            window_size: sanitize_window_size(window_size),
            buckets: vec![Vec::new(); count.max(1)],
        };
        for note in notes {
            let index = windowed.index_of(note.time);
            windowed.buckets[index].push(*note);
        }
        for bucket in &mut windowed.buckets {
            bucket.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.lane.cmp(&b.lane)));
        }
        windowed
    }

    pub fn from_chart(chart: &Chart, window_size: f64) -> Self {
        let window_size = sanitize_window_size(window_size);
        Self::new(
            &chart.notes,
            chart.meta.start_time,
            window_size,
            chart.meta.window_count(window_size),
        )
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn window_size(&self) -> f64 {
        self.window_size
    }

    /// Window index for a time, clamped into `[0, len)`
    pub fn index_of(&self, time: f64) -> usize {
        let offset = ((time - self.origin) / self.window_size).floor();
        if offset.is_nan() || offset <= 0.0 {
            return 0;
        }
        (offset as usize).min(self.buckets.len() - 1)
    }

    /// Start and end time of window `i`
    pub fn bounds(&self, i: usize) -> (f64, f64) {
        let start = self.origin + i as f64 * self.window_size;
        (start, start + self.window_size)
    }

    pub fn notes(&self, i: usize) -> &[Note] {
        &self.buckets[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Note]> {
        self.buckets.iter().map(Vec::as_slice)
    }

    /// Group window `i` into chords in time order
    pub fn chords(&self, i: usize) -> Vec<Chord> {
        group_chords(&self.buckets[i])
    }
}

/// Group time-sorted notes into chords of identical timestamps
pub fn group_chords(notes: &[Note]) -> Vec<Chord> {
    let mut chords: Vec<Chord> = Vec::new();
    for note in notes {
        match chords.last_mut() {
            Some(chord) if chord.time == note.time => chord.lanes.push(note.lane),
            _ => chords.push(Chord {
                time: note.time,
                lanes: vec![note.lane],
            }),
        }
    }
    for chord in &mut chords {
        chord.lanes.sort_unstable();
    }
    chords
}
