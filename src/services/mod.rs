pub mod agents;
pub mod messages;
pub mod pipeline;
pub mod queue;
pub mod registry;
pub mod worker;
