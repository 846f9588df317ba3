mod greeting;
mod registry;

pub use greeting::GreetingResource;
pub use registry::{ResourceHandler, ResourceRegistry, ResourceTemplateEntry};
