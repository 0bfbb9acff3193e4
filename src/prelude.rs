pub use crate::error::Error;

pub use crate::rhi::Backend;
pub use crate::rhi::command::*;
pub use crate::rhi::device::Device;
pub use crate::rhi::queue::{Queue, QueueType};
pub use crate::rhi::sync::Fence;
pub use crate::rhi::types::*;

pub use crate::graph::pass::*;
pub use crate::graph::record::PassResources;
pub use crate::graph::render_graph::RenderGraph;
pub use crate::graph::resource::{
    BufferRef, BufferViewRef, ResourceRef, TextureRef, TextureViewRef,
};
