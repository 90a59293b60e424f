use chart_model::{HandSlot, HandSplit};

use crate::window::WindowedNotes;

/// Per-window hand balance signals
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HandBalance {
    /// `|left - right|` actions per second
    pub alt_cost: Vec<f64>,
    /// `max(left, right)` actions per second
    pub hand_strain: Vec<f64>,
}

/// Count distinct timestamps per hand in each window.
///
/// A boundary lane goes to the hand with fewer actions so far in the window,
/// the left hand on ties.
pub fn hand_balance(windows: &WindowedNotes, hands: &HandSplit) -> HandBalance {
    let size = windows.window_size();
    let mut balance = HandBalance::default();

    for notes in windows.iter() {
        let mut left = HandCounter::default();
        let mut right = HandCounter::default();
        for note in notes {
            let counter = match hands.slot(note.lane) {
                HandSlot::Left => &mut left,
                HandSlot::Right => &mut right,
                HandSlot::Boundary if left.actions <= right.actions => &mut left,
                HandSlot::Boundary => &mut right,
            };
            counter.hit(note.time);
        }
        balance
            .alt_cost
            .push(left.actions.abs_diff(right.actions) as f64 / size);
        balance
            .hand_strain
            .push(left.actions.max(right.actions) as f64 / size);
    }
    balance
}

/// Distinct action count for time-sorted hits
#[derive(Default)]
struct HandCounter {
    actions: usize,
    last_time: Option<f64>,
}

impl HandCounter {
    fn hit(&mut self, time: f64) {
        if self.last_time != Some(time) {
            self.actions += 1;
            self.last_time = Some(time);
        }
    }
}
