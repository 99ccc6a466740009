/// Stage composition of background and character layers.
pub mod compose;
