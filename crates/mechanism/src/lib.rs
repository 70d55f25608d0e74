//! Weapon slide mechanics built on the grab kernel.
//!
//! A slide is an interactable whose completion runs from 0 (home) to 1
//! (locked back). [`SlideAction`] reacts to the ends of travel, while
//! [`SlideRelease`] and [`SlideSlap`] are two ways of sending a locked slide
//! home again.

pub mod breech;
pub mod slap;
pub mod slide;

pub use breech::{Breech, Chamber};
pub use slap::{SlapConfig, SlideSlap};
pub use slide::{DEFAULT_TOLERANCE, SlideAction, SlideRelease, SlideReleaseConfig};
