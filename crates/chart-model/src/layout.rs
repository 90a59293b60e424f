// Lane layouts: channel -> lane mapping and hand partition

use std::collections::{BTreeSet, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

/// Which hand a lane belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandSlot {
    Left,
    Right,
    /// Assigned per window to whichever hand is less busy
    Boundary,
}

/// Partition of lanes between the two hands
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HandSplit {
    pub left: Vec<u32>,
    pub right: Vec<u32>,
    pub boundary: Option<u32>,
}

impl HandSplit {
    /// Even split for one-sided play; an odd key count leaves the center lane shared
    pub fn symmetric(key_count: u32) -> Self {
        let half = key_count / 2;
        let boundary = (key_count % 2 == 1).then_some(half);
        let right_start = half + key_count % 2;
        Self {
            left: (0..half).collect(),
            right: (right_start..key_count).collect(),
            boundary,
        }
    }

    /// Dual-side play: first half left, second half right
    pub fn midpoint(key_count: u32) -> Self {
        let half = key_count.div_ceil(2);
        Self {
            left: (0..half).collect(),
            right: (half..key_count).collect(),
            boundary: None,
        }
    }

    fn fixed(left: &[u32], boundary: Option<u32>, right: &[u32]) -> Self {
        Self {
            left: left.to_vec(),
            right: right.to_vec(),
            boundary,
        }
    }

    pub fn slot(&self, lane: u32) -> HandSlot {
        if self.left.contains(&lane) {
            HandSlot::Left
        } else if self.right.contains(&lane) {
            HandSlot::Right
        } else {
            HandSlot::Boundary
        }
    }
}

enum SplitRule {
    Fixed {
        left: &'static [u32],
        boundary: Option<u32>,
        right: &'static [u32],
    },
    Midpoint,
}

/// One known layout: channels listed in lane order
struct CatalogEntry {
    name: &'static str,
    channels: &'static [u16],
    dual_side: bool,
    split: SplitRule,
}

/// Known layouts in priority order
const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        name: "5K",
        channels: &[0x11, 0x12, 0x13, 0x14, 0x15],
        dual_side: false,
        split: SplitRule::Fixed {
            left: &[0, 1],
            boundary: Some(2),
            right: &[3, 4],
        },
    },
    CatalogEntry {
        name: "5K+SC",
        channels: &[0x16, 0x11, 0x12, 0x13, 0x14, 0x15],
        dual_side: false,
        split: SplitRule::Fixed {
            left: &[0, 1, 2],
            boundary: None,
            right: &[3, 4, 5],
        },
    },
    CatalogEntry {
        name: "7K",
        channels: &[0x11, 0x12, 0x13, 0x14, 0x15, 0x18, 0x19],
        dual_side: false,
        split: SplitRule::Fixed {
            left: &[0, 1, 2],
            boundary: Some(3),
            right: &[4, 5, 6],
        },
    },
    CatalogEntry {
        name: "7K+SC",
        channels: &[0x16, 0x11, 0x12, 0x13, 0x14, 0x15, 0x18, 0x19],
        dual_side: false,
        split: SplitRule::Fixed {
            left: &[0, 1, 2, 3],
            boundary: Some(4),
            right: &[5, 6, 7],
        },
    },
    CatalogEntry {
        name: "9K",
        channels: &[0x11, 0x12, 0x13, 0x14, 0x15, 0x22, 0x23, 0x24, 0x25],
        dual_side: false,
        split: SplitRule::Fixed {
            left: &[0, 1, 2, 3],
            boundary: Some(4),
            right: &[5, 6, 7, 8],
        },
    },
    CatalogEntry {
        name: "10K",
        channels: &[
            0x11, 0x12, 0x13, 0x14, 0x15, 0x21, 0x22, 0x23, 0x24, 0x25,
        ],
        dual_side: true,
        split: SplitRule::Midpoint,
    },
    CatalogEntry {
        name: "10K+SC",
        channels: &[
            0x16, 0x11, 0x12, 0x13, 0x14, 0x15, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26,
        ],
        dual_side: true,
        split: SplitRule::Midpoint,
    },
    CatalogEntry {
        name: "14K",
        channels: &[
            0x11, 0x12, 0x13, 0x14, 0x15, 0x18, 0x19, 0x21, 0x22, 0x23, 0x24, 0x25, 0x28, 0x29,
        ],
        dual_side: true,
        split: SplitRule::Midpoint,
    },
    CatalogEntry {
        name: "14K+SC",
        channels: &[
            0x16, 0x11, 0x12, 0x13, 0x14, 0x15, 0x18, 0x19, 0x21, 0x22, 0x23, 0x24, 0x25, 0x28,
            0x29, 0x26,
        ],
        dual_side: true,
        split: SplitRule::Midpoint,
    },
];

/// Key-count tiers used when no catalog entry covers the channels
const FALLBACK_TIERS: &[u32] = &[5, 6, 7, 8, 9, 10, 12, 14, 16];

/// Resolved lane layout for one chart
#[derive(Debug, Clone, PartialEq)]
pub struct LaneLayout {
    pub name: String,
    pub key_count: u32,
    pub is_dual_side: bool,
    pub hands: HandSplit,
    channel_lanes: HashMap<u16, u32>,
}

impl LaneLayout {
    /// Pick the most specific catalog layout covering `used` (folded tap channels).
    pub fn detect(used: &BTreeSet<u16>) -> Self {
        Self::detect_for_player(used, 1)
    }

    /// Like [`LaneLayout::detect`]; a `#PLAYER` of 2 or 3 marks a heuristic
    /// layout as dual-side even without 2P channels.
    pub fn detect_for_player(used: &BTreeSet<u16>, player: u32) -> Self {
        let best = CATALOG
            .iter()
            .filter(|entry| used.iter().all(|ch| entry.channels.contains(ch)))
            .min_by_key(|entry| entry.channels.len());

        let layout = match best {
            Some(entry) => Self::from_entry(entry),
            None => Self::heuristic(used, matches!(player, 2 | 3)),
        };
        debug!(
            "layout {} ({} keys) for channels {:02X?}",
            layout.name, layout.key_count, used
        );
        layout
    }

    /// osu!mania: one side, lanes are already indices
    pub fn osu(key_count: u32) -> Self {
        Self {
            name: format!("{key_count}K"),
            key_count,
            is_dual_side: false,
            hands: HandSplit::symmetric(key_count),
            channel_lanes: HashMap::new(),
        }
    }

    /// Lane for a playable channel (hold channels fold onto their tap twin)
    pub fn lane_of(&self, channel: u16) -> Option<u32> {
        let tap = fold_channel(channel)?;
        self.channel_lanes.get(&tap).copied()
    }

    fn from_entry(entry: &CatalogEntry) -> Self {
        let key_count = entry.channels.len() as u32;
        let hands = match entry.split {
            SplitRule::Fixed {
                left,
                boundary,
                right,
            } => HandSplit::fixed(left, boundary, right),
            SplitRule::Midpoint => HandSplit::midpoint(key_count),
        };
        Self {
            name: entry.name.to_string(),
            key_count,
            is_dual_side: entry.dual_side,
            hands,
            channel_lanes: entry
                .channels
                .iter()
                .enumerate()
                .map(|(lane, &ch)| (ch, lane as u32))
                .collect(),
        }
    }

    fn heuristic(used: &BTreeSet<u16>, dual_side_hint: bool) -> Self {
        let is_dual_side = dual_side_hint || used.iter().any(|&ch| (0x21..=0x29).contains(&ch));
        let count = used.len() as u32;
        let key_count = FALLBACK_TIERS
            .iter()
            .copied()
            .find(|&tier| tier >= count)
            .unwrap_or(count);
        let hands = if is_dual_side {
            HandSplit::midpoint(key_count)
        } else {
            HandSplit::symmetric(key_count)
        };
        Self {
            name: format!("{key_count}K (heuristic)"),
            key_count,
            is_dual_side,
            hands,
            channel_lanes: used
                .iter()
                .enumerate()
                .map(|(lane, &ch)| (ch, lane as u32))
                .collect(),
        }
    }
}

/// Map a playable channel to its tap channel; `None` for everything else
pub fn fold_channel(channel: u16) -> Option<u16> {
    match channel {
        0x11..=0x19 | 0x21..=0x29 => Some(channel),
        0x51..=0x59 | 0x61..=0x69 => Some(channel - 0x40),
        _ => None,
    }
}

/// Channels reserved for hold heads and tails
pub fn is_hold_channel(channel: u16) -> bool {
    matches!(channel, 0x51..=0x59 | 0x61..=0x69)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(list: &[u16]) -> BTreeSet<u16> {
        list.iter().copied().collect()
    }

    #[test]
    fn test_detect_7k() {
        let layout = LaneLayout::detect(&channels(&[0x11, 0x12, 0x13, 0x14, 0x15, 0x18, 0x19]));
        assert_eq!(layout.key_count, 7);
        assert!(!layout.is_dual_side);
        assert_eq!(layout.lane_of(0x11), Some(0));
        assert_eq!(layout.lane_of(0x19), Some(6));
        assert_eq!(layout.lane_of(0x16), None);
    }

    #[test]
    fn test_detect_7k_with_scratch() {
        let layout = LaneLayout::detect(&channels(&[
            0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x18, 0x19,
        ]));
        assert_eq!(layout.key_count, 8);
        assert_eq!(layout.name, "7K+SC");
        assert_eq!(layout.lane_of(0x16), Some(0));
        assert_eq!(layout.lane_of(0x11), Some(1));
        assert_eq!(layout.lane_of(0x56), Some(0));
        assert_eq!(layout.hands.boundary, Some(4));
    }

    #[test]
    fn test_detect_prefers_smallest_superset() {
        let layout = LaneLayout::detect(&channels(&[0x11, 0x13]));
        assert_eq!(layout.name, "5K");
        let layout = LaneLayout::detect(&channels(&[0x11, 0x22]));
        assert_eq!(layout.name, "9K");
        assert!(!layout.is_dual_side);
        let layout = LaneLayout::detect(&channels(&[0x11, 0x21]));
        assert_eq!(layout.name, "10K");
        assert!(layout.is_dual_side);
    }

    #[test]
    fn test_detect_14k_lane_order() {
        let layout = LaneLayout::detect(&channels(&[0x11, 0x19, 0x21, 0x29, 0x16, 0x26]));
        assert_eq!(layout.name, "14K+SC");
        assert_eq!(layout.key_count, 16);
        assert_eq!(layout.lane_of(0x16), Some(0));
        assert_eq!(layout.lane_of(0x21), Some(8));
        assert_eq!(layout.lane_of(0x26), Some(15));
        assert_eq!(layout.hands, HandSplit::midpoint(16));
    }

    #[test]
    fn test_detect_heuristic_fallback() {
        // 17 (free zone) is in no catalog entry
        let layout = LaneLayout::detect(&channels(&[0x11, 0x12, 0x17]));
        assert_eq!(layout.key_count, 5);
        assert!(!layout.is_dual_side);
        assert_eq!(layout.lane_of(0x17), Some(2));

        let layout = LaneLayout::detect(&channels(&[0x11, 0x17, 0x21, 0x27]));
        assert!(layout.is_dual_side);
        assert_eq!(layout.key_count, 5);
        assert_eq!(layout.lane_of(0x27), Some(3));
    }

    #[test]
    fn test_player_hint_only_affects_fallback() {
        let layout = LaneLayout::detect_for_player(&channels(&[0x11, 0x12, 0x17]), 3);
        assert!(layout.is_dual_side);
        assert_eq!(layout.hands, HandSplit::midpoint(5));

        let layout = LaneLayout::detect_for_player(&channels(&[0x11, 0x12, 0x13]), 3);
        assert_eq!(layout.name, "5K");
        assert!(!layout.is_dual_side);
    }

    #[test]
    fn test_fold_channel() {
        assert_eq!(fold_channel(0x51), Some(0x11));
        assert_eq!(fold_channel(0x69), Some(0x29));
        assert_eq!(fold_channel(0x31), None);
        assert_eq!(fold_channel(0x01), None);
        assert!(is_hold_channel(0x59));
        assert!(!is_hold_channel(0x11));
    }

    #[test]
    fn test_hand_split_symmetric() {
        let split = HandSplit::symmetric(7);
        assert_eq!(split.left, vec![0, 1, 2]);
        assert_eq!(split.boundary, Some(3));
        assert_eq!(split.right, vec![4, 5, 6]);
        assert_eq!(split.slot(3), HandSlot::Boundary);

        let split = HandSplit::symmetric(4);
        assert_eq!(split.left, vec![0, 1]);
        assert_eq!(split.right, vec![2, 3]);
        assert_eq!(split.boundary, None);
    }

    #[test]
    fn test_osu_layout() {
        let layout = LaneLayout::osu(4);
        assert_eq!(layout.name, "4K");
        assert_eq!(layout.key_count, 4);
        assert_eq!(layout.hands.slot(1), HandSlot::Left);
        assert_eq!(layout.hands.slot(2), HandSlot::Right);
    }
}
