pub mod equipment;
pub mod job;
pub mod order;
pub mod recommendation;
