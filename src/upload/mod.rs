pub mod chunk;
pub mod completed_parts;
pub mod e_tag;
pub mod orchestrator;
pub mod part_registry;
pub mod session;
