// Long-note pairing shared by both readers

use std::cmp::Ordering;
use std::collections::HashMap;

use log::debug;

use crate::note::Note;

/// How a provisional event takes part in hold pairing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventRole {
    Tap,
    /// Dedicated hold channel: alternates head, tail, head, ...
    HoldBoundary,
    /// Closes the most recent open tap on its lane
    TailMarker,
    /// Hold whose tail the source already states
    Span { end_time: f64 },
}

/// A lane-stamped event before hold pairing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneEvent {
    pub time: f64,
    pub lane: u32,
    pub role: EventRole,
}

/// Pair heads and tails into holds and produce the sorted canonical stream.
///
/// Unclosed hold heads degrade to taps, tail markers without an open tap are
/// dropped, and pairs without positive length become taps.
pub fn resolve_long_notes(mut events: Vec<LaneEvent>) -> Vec<Note> {
    events.sort_by(|a, b| a.time.total_cmp(&b.time));

    let mut notes: Vec<Note> = Vec::with_capacity(events.len());
    // Per-lane head time on a hold channel
    let mut open_heads: HashMap<u32, f64> = HashMap::new();
    // Per-lane index into `notes` of the latest tap a marker may close
    let mut open_taps: HashMap<u32, usize> = HashMap::new();
    let mut dropped_markers = 0usize;

    for event in events {
        match event.role {
            EventRole::Tap => {
                open_taps.insert(event.lane, notes.len());
                notes.push(Note::tap(event.lane, event.time));
            }
            EventRole::HoldBoundary => match open_heads.remove(&event.lane) {
                Some(head) => notes.push(paired(event.lane, head, event.time)),
                None => {
                    open_heads.insert(event.lane, event.time);
                }
            },
            EventRole::TailMarker => match open_taps.remove(&event.lane) {
                Some(index) => {
                    let head = notes[index].time;
                    notes[index] = paired(event.lane, head, event.time);
                }
                None => dropped_markers += 1,
            },
            EventRole::Span { end_time } => {
                notes.push(paired(event.lane, event.time, end_time));
            }
        }
    }

    if !open_heads.is_empty() || dropped_markers > 0 {
        debug!(
            "{} unclosed hold heads degraded to taps, {} unmatched tail markers dropped",
            open_heads.len(),
            dropped_markers
        );
    }
    notes.extend(open_heads.into_iter().map(|(lane, head)| Note::tap(lane, head)));

    // Longer notes first so a hold survives a duplicate tap at the same spot
    notes.sort_by(|a, b| {
        a.time
            .total_cmp(&b.time)
            .then(a.lane.cmp(&b.lane))
            .then(b.end_time().total_cmp(&a.end_time()))
    });
    notes.dedup_by(|b, a| a.lane == b.lane && a.time.total_cmp(&b.time) == Ordering::Equal);
    notes
}

fn paired(lane: u32, head: f64, tail: f64) -> Note {
    if tail > head {
        Note::hold(lane, head, tail)
    } else {
        Note::tap(lane, head)
    }
}
