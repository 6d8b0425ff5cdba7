pub mod matching;
pub mod ranking;
