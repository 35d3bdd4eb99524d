//! Wire protocol and shared state types for dexwatch.
//!
//! This crate is shared by the host process and every window process to
//! prevent schema drift. The host remains the authority on validation and
//! ordering, but windows reuse the same types to construct valid messages
//! and to deserialize the seed snapshot and replayed actions.
//!
//! The domain model serializes with the field names of the persisted
//! snapshot, so one set of serde definitions serves the socket and the
//! on-disk state file alike.

pub mod action;
pub mod state;
pub mod wire;

pub use action::Action;
pub use state::{
    BackgroundColors, Dimensions, Profile, ProfilesState, RootState, SettingsState, SpeciesRef,
    SpriteSet, TrackerItem, TrackerState, TrackerStateDefinition, WindowDimensions,
};
pub use wire::{ClientMessage, ErrorInfo, HostMessage, WindowKind};

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024; // 1MB
