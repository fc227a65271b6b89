//! Entities - objects with identity that persist across restarts.

mod marriage;
mod marriage_list;
mod marriage_player;

pub use marriage::Marriage;
pub use marriage_list::MarriageList;
pub use marriage_player::MarriagePlayer;
