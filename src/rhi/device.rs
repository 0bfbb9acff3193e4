//! The device capability trait the graph allocates through.

use anyhow::Result;

use super::{Backend, BufferDesc, BufferViewDesc, QueueType, TextureDesc, TextureViewDesc};

/// A logical GPU device. The graph receives one by reference at construction and uses
/// it to allocate concrete resources during devirtualization, to create the command
/// buffers of an execute cycle and to look up submission queues.
///
/// Allocation and submission can fail (device loss, out of memory); such failures are
/// fatal to the graph that encounters them. Creation methods hand ownership of the
/// returned handle to the caller; owned handles are returned through the matching
/// `destroy_*` method.
pub trait Device<B: Backend> {
    fn create_buffer(&self, desc: &BufferDesc) -> Result<B::Buffer>;
    fn create_texture(&self, desc: &TextureDesc) -> Result<B::Texture>;
    /// Create a view over a range of `buffer`.
    fn create_buffer_view(&self, buffer: &B::Buffer, desc: &BufferViewDesc)
        -> Result<B::BufferView>;
    /// Create a view over a subresource range of `texture`.
    fn create_texture_view(
        &self,
        texture: &B::Texture,
        desc: &TextureViewDesc,
    ) -> Result<B::TextureView>;

    fn destroy_buffer(&self, buffer: B::Buffer);
    fn destroy_texture(&self, texture: B::Texture);
    fn destroy_buffer_view(&self, view: B::BufferView);
    fn destroy_texture_view(&self, view: B::TextureView);

    fn create_command_buffer(&self) -> Result<B::CommandBuffer>;
    fn create_fence(&self, signaled: bool) -> Result<B::Fence>;

    /// Number of queues of the given type exposed by this device.
    fn queue_count(&self, ty: QueueType) -> usize;
    /// Look up a queue by type and index. Returns `None` if no such queue exists.
    fn queue(&self, ty: QueueType, index: usize) -> Option<&B::Queue>;
}
