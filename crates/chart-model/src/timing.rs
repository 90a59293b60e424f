// Measure walk: grid positions -> absolute seconds

use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use crate::layout::LaneLayout;
use crate::reader::grid::{
    CHANNEL_BPM_INLINE, CHANNEL_BPM_TABLE, CHANNEL_STOP, GridSource, ObjectCode, Position,
    RawEvent,
};

/// STOP durations are expressed in 1/192 of a 4/4 measure
const STOP_TICKS_PER_BEAT: f64 = 48.0;

/// A playable grid event stamped with its absolute time and lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub time: f64,
    pub lane: u32,
    pub channel: u16,
    pub value: ObjectCode,
}

/// Output of the measure walk
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTiming {
    /// Playable events in walk order
    pub events: Vec<TimedEvent>,
    /// Time at the end of the last measure
    pub end_time: f64,
    pub final_bpm: f64,
}

/// Walks measures in order carrying the current tempo and clock
pub struct TimingResolver;

impl TimingResolver {
    pub fn resolve(source: &GridSource, layout: &LaneLayout) -> ResolvedTiming {
        let mut by_measure: BTreeMap<u32, BTreeMap<Position, Vec<&RawEvent>>> = BTreeMap::new();
        for event in &source.events {
            by_measure
                .entry(event.measure)
                .or_default()
                .entry(event.position)
                .or_default()
                .push(event);
        }

        let max_measure = by_measure.keys().next_back().copied().unwrap_or(0);
        let mut bpm = source.initial_bpm;
        let mut time = 0.0;
        let mut events = Vec::new();
        let empty = BTreeMap::new();

        for measure in 0..=max_measure {
            let beats = 4.0 * source.measure_length(measure);
            let at_positions = by_measure.get(&measure).unwrap_or(&empty);

            let mut positions: BTreeSet<Position> = at_positions.keys().copied().collect();
            positions.insert(Position::START);
            positions.insert(Position::END);

            let mut prev = Position::START;
            for pos in positions {
                time += (pos.as_f64() - prev.as_f64()) * beats * 60.0 / bpm;
                prev = pos;

                let Some(here) = at_positions.get(&pos) else {
                    continue;
                };

                for event in here {
                    if let Some(lane) = layout.lane_of(event.channel) {
                        events.push(TimedEvent {
                            time,
                            lane,
                            channel: event.channel,
                            value: event.value,
                        });
                    }
                }

                // Inline first so a table change at the same position wins
                for event in here.iter().filter(|e| e.channel == CHANNEL_BPM_INLINE) {
                    match event.value.as_hex().and_then(|v| valid_bpm(v as f64)) {
                        Some(next) => bpm = next,
                        None => trace!("ignoring inline tempo {}", event.value),
                    }
                }
                for event in here.iter().filter(|e| e.channel == CHANNEL_BPM_TABLE) {
                    let next = event
                        .value
                        .as_base36()
                        .and_then(|id| source.bpm_table.get(&id))
                        .and_then(|&v| valid_bpm(v));
                    match next {
                        Some(next) => bpm = next,
                        None => trace!("ignoring tempo reference {}", event.value),
                    }
                }

                for event in here.iter().filter(|e| e.channel == CHANNEL_STOP) {
                    let ticks = event
                        .value
                        .as_base36()
                        .and_then(|id| source.stop_table.get(&id))
                        .copied();
                    if let Some(ticks) = ticks {
                        time += stop_seconds(ticks, bpm);
                    }
                }
            }
        }

        ResolvedTiming {
            events,
            end_time: time,
            final_bpm: bpm,
        }
    }
}

fn valid_bpm(bpm: f64) -> Option<f64> {
    (bpm.is_finite() && bpm > 0.0).then_some(bpm)
}

fn stop_seconds(ticks: f64, bpm: f64) -> f64 {
    ticks / STOP_TICKS_PER_BEAT * 60.0 / bpm
}
