//! Renders the LCARS app icon and writes it as an 8-bit RGBA PNG
//!
//! [`design`] holds the pixel function, [`png`] the container encoder,
//! [`inspect`] reads the result back and [`icon_set`] derives the desktop
//! bundle icons from it.

pub mod design;
pub mod generate;
pub mod icon_set;
pub mod inspect;
pub mod png;
