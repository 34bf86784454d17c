pub mod contest;
pub mod judging;
pub mod judging_run;
pub mod rejudging;
pub mod scorecache;
pub mod team;
pub mod user;
