pub mod sink;
pub mod view;

pub use sink::{BodyInstance, BodyView, RenderBuffer, RenderSink};
pub use view::ViewTransform;
