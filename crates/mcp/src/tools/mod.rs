mod math;
mod registry;

pub use math::AddTool;
pub use registry::{Tool, ToolDefinition, ToolRegistry};
