//! Semantic Dockerfile model: stages, resolved images, instruction buckets.

pub mod dockerfile;
pub mod instruction;
pub mod stage;

pub use dockerfile::Dockerfile;
pub use instruction::Instruction;
pub use stage::{BuildStage, ParentImage};
