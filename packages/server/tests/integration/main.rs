mod common;

mod http;
mod rejudging;
mod standings;
