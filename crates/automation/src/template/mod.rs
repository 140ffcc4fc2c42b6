//! Message template rendering.

mod renderer;

pub use renderer::TemplateRenderer;
