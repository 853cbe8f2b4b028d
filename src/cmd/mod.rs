pub mod browse;
pub mod detail;
pub mod output;
pub mod play;
