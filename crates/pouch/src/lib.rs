//! Player storage pouch: stows an object released close to it and holds it
//! in place until a hand takes it back.

pub mod pouch;

pub use pouch::{PlayerPouch, PouchConfig};
