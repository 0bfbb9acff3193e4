//! Command recording traits implemented by backend command buffers and encoders,
//! together with the barrier and pass begin info types the graph feeds them.

use super::{Backend, BufferState, ClearColor, ClearDepthStencil, LoadOp, StoreOp, TextureState};

/// A state transition on a single resource, recorded into a command stream before
/// the pass that needs the resource in its `after` state.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub enum ResourceBarrier<B: Backend> {
    Buffer {
        buffer: B::Buffer,
        before: BufferState,
        after: BufferState,
    },
    Texture {
        texture: B::Texture,
        before: TextureState,
        after: TextureState,
    },
}

impl<B: Backend> ResourceBarrier<B> {
    /// Transition a buffer between two usage states.
    pub fn buffer_transition(buffer: B::Buffer, before: BufferState, after: BufferState) -> Self {
        Self::Buffer {
            buffer,
            before,
            after,
        }
    }

    /// Transition a texture between two usage states.
    pub fn texture_transition(
        texture: B::Texture,
        before: TextureState,
        after: TextureState,
    ) -> Self {
        Self::Texture {
            texture,
            before,
            after,
        }
    }
}

/// A color attachment of a graphics pass, referencing concrete view handles.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct ColorAttachment<B: Backend> {
    pub view: Option<B::TextureView>,
    /// Multisample resolve target, if any.
    pub resolve: Option<B::TextureView>,
    pub clear_value: ClearColor,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

/// The depth/stencil attachment of a graphics pass, referencing a concrete view handle.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct DepthStencilAttachment<B: Backend> {
    pub view: Option<B::TextureView>,
    pub clear_value: ClearDepthStencil,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    pub depth_read_only: bool,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub stencil_read_only: bool,
}

/// Parameters for opening a compute pass on a command encoder.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct ComputePassBeginInfo<B: Backend> {
    pub pipeline: Option<B::ComputePipeline>,
}

/// Parameters for opening a graphics pass on a command encoder.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct GraphicsPassBeginInfo<B: Backend> {
    pub pipeline: Option<B::RasterPipeline>,
    pub color_attachments: Vec<ColorAttachment<B>>,
    pub depth_stencil_attachment: Option<DepthStencilAttachment<B>>,
}

/// A backend command buffer. Recording happens through the encoder returned by
/// [`begin`](CommandBuffer::begin); once the encoder is ended the buffer can be
/// submitted to a queue.
pub trait CommandBuffer<B: Backend> {
    /// Open the command buffer for recording.
    fn begin(&mut self) -> B::CommandEncoder;
}

/// Top-level command encoder of a command buffer. Barriers are recorded here,
/// compute and graphics work is recorded through the sub-encoders.
pub trait CommandEncoder<B: Backend> {
    /// Record a resource state transition.
    fn resource_barrier(&mut self, barrier: ResourceBarrier<B>);
    /// Open a compute pass. No other recording may happen on this encoder until the
    /// returned sub-encoder is ended.
    fn begin_compute_pass(&mut self, info: ComputePassBeginInfo<B>) -> B::ComputePassEncoder;
    /// Open a graphics pass. No other recording may happen on this encoder until the
    /// returned sub-encoder is ended.
    fn begin_graphics_pass(&mut self, info: GraphicsPassBeginInfo<B>) -> B::GraphicsPassEncoder;
    /// Finish recording. The owning command buffer may be submitted afterwards.
    fn end(self);
}

/// Sub-encoder scoping the commands of one compute pass.
pub trait ComputePassEncoder<B: Backend> {
    fn end_pass(self);
}

/// Sub-encoder scoping the commands of one graphics pass.
pub trait GraphicsPassEncoder<B: Backend> {
    fn end_pass(self);
}
