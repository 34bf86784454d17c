pub mod consistency;
pub mod judging;
pub mod standings;
