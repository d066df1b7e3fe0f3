//! # Slot Rotation
//!
//! Two credential slots ("one" and "two") let the database password rotate
//! without downtime. An indicator secret records which slot was promoted last
//! and when; [`RotationSelector`] turns that into the slot to read now.

pub mod selector;
pub mod slot;

pub use selector::{RotationSelector, RotationWindow, DEFAULT_ROTATION_WINDOW_MINUTES};
pub use slot::{ActiveSlotSecret, Slot};
