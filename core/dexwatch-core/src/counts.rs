//! Read-model for the counter window: how many tracked items sit in each
//! state the active profile wants counted.

use serde::Serialize;

use dexwatch_protocol::RootState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCount {
    pub name: String,
    pub color: String,
    pub count: usize,
}

fn count_for(state: &RootState, name: &str) -> usize {
    state
        .tracker
        .pokemon
        .iter()
        .filter(|item| item.state == name)
        .count()
}

/// Counts for every state definition flagged `showCount`, in profile order.
pub fn visible_counts(state: &RootState) -> Vec<StateCount> {
    state
        .settings
        .active_profile
        .states
        .iter()
        .filter(|definition| definition.show_count == Some(true))
        .map(|definition| StateCount {
            name: definition.name.clone(),
            color: definition.color.clone(),
            count: count_for(state, &definition.name),
        })
        .collect()
}

/// The count for the profile's primary state, when one is flagged.
pub fn primary_count(state: &RootState) -> Option<StateCount> {
    state
        .settings
        .active_profile
        .primary_state()
        .map(|definition| StateCount {
            name: definition.name.clone(),
            color: definition.color.clone(),
            count: count_for(state, &definition.name),
        })
}
