pub mod judging;
pub mod standings;
