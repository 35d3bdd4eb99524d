//! Window layout coordination.
//!
//! A resize gesture both reads and writes shared state: the tracker window's
//! size is snapped to the cell grid and capped by its content, the corrected
//! size is forced onto the OS window, and the same size is written back into
//! settings through an ordinary action. Because the forced resize echoes
//! back as another native resize event, a gesture that already matches the
//! tracked dimensions is absorbed; that comparison is the re-entry guard.

use dexwatch_protocol::{Action, RootState, WindowDimensions, WindowKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeGesture {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectedSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutResponse {
    /// Nothing to do: the gesture is degenerate or an echo of a forced
    /// resize already reflected in state.
    Absorb,
    /// Force the window to `size` and record it via `action`.
    Snap {
        size: CorrectedSize,
        action: Action,
    },
    /// Record the raw gesture via `action`; no forced resize.
    PassThrough { action: Action },
}

/// Grid-snaps a tracker resize gesture: the width loses its remainder
/// modulo the cell size and the height is additionally capped by the number
/// of rows the tracked items can fill. Returns `None` for a gesture too
/// narrow to hold a single cell.
pub fn snap_tracker_size(
    gesture: ResizeGesture,
    cell_size: u32,
    item_count: usize,
) -> Option<CorrectedSize> {
    if cell_size == 0 {
        return None;
    }

    let width = gesture.width - gesture.width % cell_size;
    let cells_per_row = width / cell_size;
    if cells_per_row == 0 {
        return None;
    }

    let snapped_height = gesture.height - gesture.height % cell_size;
    let height = if item_count == 0 {
        // An empty tracker has no content to cap against.
        snapped_height
    } else {
        let max_rows = (item_count as u32 + cells_per_row - 1) / cells_per_row;
        snapped_height.min(max_rows * cell_size)
    };

    Some(CorrectedSize { width, height })
}

/// Maps a native resize gesture on `kind`'s window to the layout response:
/// snap-and-record for the tracker, pass-through for the counter, nothing
/// for windows whose size is not tracked.
pub fn on_resize(kind: WindowKind, state: &RootState, gesture: ResizeGesture) -> LayoutResponse {
    match kind {
        WindowKind::Tracker => {
            let corrected = match snap_tracker_size(
                gesture,
                state.settings.cell_size,
                state.tracker.pokemon.len(),
            ) {
                Some(corrected) => corrected,
                None => return LayoutResponse::Absorb,
            };

            let current = state.settings.dimensions.tracker;
            if dims_equal(current, corrected.width, corrected.height) {
                return LayoutResponse::Absorb;
            }

            LayoutResponse::Snap {
                size: corrected,
                action: Action::SetTrackerDimensions {
                    width: corrected.width,
                    height: corrected.height,
                },
            }
        }
        WindowKind::Count => {
            let current = state.settings.dimensions.count;
            if dims_equal(current, gesture.width, gesture.height) {
                return LayoutResponse::Absorb;
            }
            LayoutResponse::PassThrough {
                action: Action::SetCountDimensions {
                    width: gesture.width,
                    height: gesture.height,
                },
            }
        }
        WindowKind::Settings => LayoutResponse::Absorb,
    }
}

fn dims_equal(current: WindowDimensions, width: u32, height: u32) -> bool {
    current.width == width && current.height == height
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexwatch_protocol::{SpeciesRef, TrackerItem};

    fn state_with_items(cell_size: u32, item_count: usize) -> RootState {
        let mut state = RootState::default();
        state.settings.cell_size = cell_size;
        state.tracker.pokemon = (0..item_count)
            .map(|index| TrackerItem {
                definition: SpeciesRef {
                    id: index as u32 + 1,
                    name: format!("species-{}", index + 1),
                    sprite: None,
                    default_state: None,
                },
                state: "blank".to_string(),
            })
            .collect();
        state
    }

    #[test]
    fn snaps_width_and_caps_height_by_content() {
        // cellSize=48, width 500, 12 items: 10 cells per row, 2 rows.
        let corrected = snap_tracker_size(
            ResizeGesture {
                width: 500,
                height: 400,
            },
            48,
            12,
        )
        .expect("corrected size");

        assert_eq!(corrected.width, 480);
        assert_eq!(corrected.height, 96);
    }

    #[test]
    fn height_snaps_to_grid_when_under_the_content_cap() {
        // 4 items in 9 columns: one row, cap 48; a 40px-tall gesture snaps
        // to 0 before the cap applies.
        let corrected = snap_tracker_size(
            ResizeGesture {
                width: 468,
                height: 40,
            },
            48,
            4,
        )
        .expect("corrected size");
        assert_eq!(corrected.height, 0);

        let corrected = snap_tracker_size(
            ResizeGesture {
                width: 468,
                height: 100,
            },
            48,
            4,
        )
        .expect("corrected size");
        assert_eq!(corrected.height, 48);
    }

    #[test]
    fn gesture_narrower_than_one_cell_is_degenerate() {
        assert_eq!(
            snap_tracker_size(
                ResizeGesture {
                    width: 47,
                    height: 400
                },
                48,
                12
            ),
            None
        );
    }

    #[test]
    fn empty_tracker_skips_the_row_cap() {
        let corrected = snap_tracker_size(
            ResizeGesture {
                width: 500,
                height: 400,
            },
            48,
            0,
        )
        .expect("corrected size");
        assert_eq!(corrected.width, 480);
        assert_eq!(corrected.height, 384);
    }

    #[test]
    fn tracker_resize_snaps_and_records() {
        let state = state_with_items(48, 12);
        let response = on_resize(
            WindowKind::Tracker,
            &state,
            ResizeGesture {
                width: 500,
                height: 400,
            },
        );

        match response {
            LayoutResponse::Snap { size, action } => {
                assert_eq!(size.width, 480);
                assert_eq!(size.height, 96);
                assert_eq!(
                    action,
                    Action::SetTrackerDimensions {
                        width: 480,
                        height: 96
                    }
                );
            }
            other => panic!("expected snap, got {:?}", other),
        }
    }

    #[test]
    fn forced_resize_echo_is_absorbed() {
        // 480 is a fixed point of the snap, so the echoed gesture resolves
        // to the dimensions already in state.
        let mut state = state_with_items(48, 12);
        state.settings.dimensions.tracker = WindowDimensions {
            width: 480,
            height: 96,
        };

        // The OS reports the size we just forced; nothing re-dispatches.
        let response = on_resize(
            WindowKind::Tracker,
            &state,
            ResizeGesture {
                width: 480,
                height: 96,
            },
        );
        assert_eq!(response, LayoutResponse::Absorb);
    }

    #[test]
    fn count_resize_passes_through_unsnapped() {
        let state = state_with_items(48, 12);
        let response = on_resize(
            WindowKind::Count,
            &state,
            ResizeGesture {
                width: 333,
                height: 77,
            },
        );

        assert_eq!(
            response,
            LayoutResponse::PassThrough {
                action: Action::SetCountDimensions {
                    width: 333,
                    height: 77
                }
            }
        );
    }

    #[test]
    fn count_resize_matching_state_is_absorbed() {
        let mut state = state_with_items(48, 0);
        state.settings.dimensions.count = WindowDimensions {
            width: 150,
            height: 75,
        };
        let response = on_resize(
            WindowKind::Count,
            &state,
            ResizeGesture {
                width: 150,
                height: 75,
            },
        );
        assert_eq!(response, LayoutResponse::Absorb);
    }

    #[test]
    fn settings_window_size_is_untracked() {
        let state = state_with_items(48, 3);
        let response = on_resize(
            WindowKind::Settings,
            &state,
            ResizeGesture {
                width: 640,
                height: 480,
            },
        );
        assert_eq!(response, LayoutResponse::Absorb);
    }
}
