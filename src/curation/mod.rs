/// Contact-sheet classification and tag mapping.
pub mod bridge;
