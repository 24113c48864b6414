pub mod answer;
pub mod job;
pub mod message;
