//! Value objects - immutable types identified by their value.

mod couple;
mod gender;

pub use couple::Couple;
pub use gender::Gender;
