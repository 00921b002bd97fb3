pub mod box_score;
pub mod palette;
