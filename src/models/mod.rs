pub mod job;
pub mod prediction;
pub mod project;
pub mod row;
