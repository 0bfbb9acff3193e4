//! An in-memory [`Backend`] for tests and documentation examples.
//!
//! [`DummyDevice`] hands out sequentially numbered handles, counts what was created and
//! destroyed, and snapshots every queue submission into a log of [`Command`]s. Nothing
//! reaches a GPU; executing a graph against this backend produces an inspectable
//! transcript of the barriers, passes and submissions it recorded.
//!
//! Pass content is recorded through inherent helpers on the encoders
//! ([`DummyComputePassEncoder::dispatch`], [`DummyGraphicsPassEncoder::draw`],
//! [`DummyCommandEncoder::marker`]), mirroring how a concrete backend exposes its
//! recording surface as inherent methods on its encoder types.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use crate::rhi::{
    Backend, BufferDesc, BufferState, BufferViewDesc, CommandBuffer, CommandEncoder,
    ComputePassBeginInfo, ComputePassEncoder, Device, Fence, GraphicsPassBeginInfo,
    GraphicsPassEncoder, Queue, QueueType, ResourceBarrier, TextureDesc, TextureState,
    TextureViewDesc,
};

/// Marker type implementing [`Backend`] with purely in-memory resources.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct DummyBackend;

impl Backend for DummyBackend {
    type Device = DummyDevice;
    type Queue = DummyQueue;
    type CommandBuffer = DummyCommandBuffer;
    type CommandEncoder = DummyCommandEncoder;
    type ComputePassEncoder = DummyComputePassEncoder;
    type GraphicsPassEncoder = DummyGraphicsPassEncoder;
    type Buffer = DummyBuffer;
    type Texture = DummyTexture;
    type BufferView = DummyBufferView;
    type TextureView = DummyTextureView;
    type ComputePipeline = DummyComputePipeline;
    type RasterPipeline = DummyRasterPipeline;
    type Fence = DummyFence;
}

/// Opaque buffer handle handed out by [`DummyDevice`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DummyBuffer {
    id: u64,
}

impl DummyBuffer {
    /// Device-unique id, stable across clones.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Opaque texture handle handed out by [`DummyDevice`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DummyTexture {
    id: u64,
}

impl DummyTexture {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Opaque buffer view handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DummyBufferView {
    id: u64,
}

impl DummyBufferView {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Opaque texture view handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DummyTextureView {
    id: u64,
}

impl DummyTextureView {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Stand-in compute pipeline carrying only a debug name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DummyComputePipeline {
    pub name: String,
}

impl DummyComputePipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Stand-in raster pipeline carrying only a debug name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DummyRasterPipeline {
    pub name: String,
}

impl DummyRasterPipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A command as the dummy encoders record it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    BufferBarrier {
        buffer: u64,
        before: BufferState,
        after: BufferState,
    },
    TextureBarrier {
        texture: u64,
        before: TextureState,
        after: TextureState,
    },
    BeginComputePass {
        pipeline: Option<String>,
    },
    EndComputePass,
    BeginGraphicsPass {
        pipeline: Option<String>,
        color_attachments: usize,
        has_depth_stencil: bool,
    },
    EndGraphicsPass,
    Dispatch {
        groups: [u32; 3],
    },
    Draw {
        vertices: u32,
        instances: u32,
    },
    /// Free-form label recorded through [`DummyCommandEncoder::marker`].
    Marker(String),
}

impl Command {
    /// Whether this command is a buffer or texture barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self, Command::BufferBarrier { .. } | Command::TextureBarrier { .. })
    }
}

/// One queue submission as logged by the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub queue_type: QueueType,
    pub queue_index: usize,
    pub commands: Vec<Command>,
    /// Whether a fence was attached to the submission.
    pub fenced: bool,
}

/// Allocation statistics for one handle kind.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct AllocStats {
    pub created: usize,
    pub destroyed: usize,
}

impl AllocStats {
    /// Handles created but not yet destroyed.
    pub fn live(&self) -> usize {
        self.created - self.destroyed
    }
}

/// Fence signalled synchronously when a submission carrying it is logged.
#[derive(Debug, Default)]
pub struct DummyFence {
    signaled: AtomicBool,
}

impl Fence for DummyFence {
    fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.signaled.store(false, Ordering::Release);
    }

    fn wait(&self) {
        // Submissions signal at submit time, so an unsignalled fence here can only
        // mean the submission never happened.
        assert!(
            self.is_signaled(),
            "waiting on a dummy fence that no submission has signalled"
        );
    }
}

/// Command buffer accumulating [`Command`]s for inspection.
#[derive(Debug, Default)]
pub struct DummyCommandBuffer {
    commands: Arc<Mutex<Vec<Command>>>,
}

impl CommandBuffer<DummyBackend> for DummyCommandBuffer {
    fn begin(&mut self) -> DummyCommandEncoder {
        // Re-beginning resets the recording, like native command buffers do.
        self.commands.lock().unwrap().clear();
        DummyCommandEncoder {
            commands: self.commands.clone(),
        }
    }
}

/// Top-level encoder of a [`DummyCommandBuffer`].
#[derive(Debug)]
pub struct DummyCommandEncoder {
    commands: Arc<Mutex<Vec<Command>>>,
}

impl DummyCommandEncoder {
    /// Record a free-form marker, visible in the submission log.
    pub fn marker(&mut self, label: impl Into<String>) {
        self.commands.lock().unwrap().push(Command::Marker(label.into()));
    }
}

impl CommandEncoder<DummyBackend> for DummyCommandEncoder {
    fn resource_barrier(&mut self, barrier: ResourceBarrier<DummyBackend>) {
        let command = match barrier {
            ResourceBarrier::Buffer {
                buffer,
                before,
                after,
            } => Command::BufferBarrier {
                buffer: buffer.id,
                before,
                after,
            },
            ResourceBarrier::Texture {
                texture,
                before,
                after,
            } => Command::TextureBarrier {
                texture: texture.id,
                before,
                after,
            },
        };
        self.commands.lock().unwrap().push(command);
    }

    fn begin_compute_pass(
        &mut self,
        info: ComputePassBeginInfo<DummyBackend>,
    ) -> DummyComputePassEncoder {
        self.commands.lock().unwrap().push(Command::BeginComputePass {
            pipeline: info.pipeline.map(|pipeline| pipeline.name),
        });
        DummyComputePassEncoder {
            commands: self.commands.clone(),
        }
    }

    fn begin_graphics_pass(
        &mut self,
        info: GraphicsPassBeginInfo<DummyBackend>,
    ) -> DummyGraphicsPassEncoder {
        self.commands.lock().unwrap().push(Command::BeginGraphicsPass {
            pipeline: info.pipeline.map(|pipeline| pipeline.name),
            color_attachments: info.color_attachments.len(),
            has_depth_stencil: info.depth_stencil_attachment.is_some(),
        });
        DummyGraphicsPassEncoder {
            commands: self.commands.clone(),
        }
    }

    fn end(self) {}
}

/// Sub-encoder for one compute pass.
#[derive(Debug)]
pub struct DummyComputePassEncoder {
    commands: Arc<Mutex<Vec<Command>>>,
}

impl DummyComputePassEncoder {
    /// Record a dispatch marker.
    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.commands.lock().unwrap().push(Command::Dispatch { groups: [x, y, z] });
    }
}

impl ComputePassEncoder<DummyBackend> for DummyComputePassEncoder {
    fn end_pass(self) {
        self.commands.lock().unwrap().push(Command::EndComputePass);
    }
}

/// Sub-encoder for one graphics pass.
#[derive(Debug)]
pub struct DummyGraphicsPassEncoder {
    commands: Arc<Mutex<Vec<Command>>>,
}

impl DummyGraphicsPassEncoder {
    /// Record a draw marker.
    pub fn draw(&mut self, vertices: u32, instances: u32) {
        self.commands.lock().unwrap().push(Command::Draw {
            vertices,
            instances,
        });
    }
}

impl GraphicsPassEncoder<DummyBackend> for DummyGraphicsPassEncoder {
    fn end_pass(self) {
        self.commands.lock().unwrap().push(Command::EndGraphicsPass);
    }
}

/// A queue that snapshots every submission into the device log.
#[derive(Debug)]
pub struct DummyQueue {
    queue_type: QueueType,
    index: usize,
    state: Arc<Mutex<DeviceState>>,
}

impl Queue<DummyBackend> for DummyQueue {
    fn submit(&self, commands: &DummyCommandBuffer, fence: Option<&DummyFence>) -> Result<()> {
        let recorded = commands.commands.lock().unwrap().clone();
        self.state.lock().unwrap().submissions.push(Submission {
            queue_type: self.queue_type,
            queue_index: self.index,
            commands: recorded,
            fenced: fence.is_some(),
        });
        if let Some(fence) = fence {
            fence.signaled.store(true, Ordering::Release);
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct HandleLog {
    created: usize,
    destroyed: Vec<u64>,
}

impl HandleLog {
    fn stats(&self) -> AllocStats {
        AllocStats {
            created: self.created,
            destroyed: self.destroyed.len(),
        }
    }
}

#[derive(Debug, Default)]
struct DeviceState {
    next_id: u64,
    buffers: HandleLog,
    textures: HandleLog,
    buffer_views: HandleLog,
    texture_views: HandleLog,
    submissions: Vec<Submission>,
}

impl DeviceState {
    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// An in-memory device. Creation hands out sequentially numbered handles, and all queue
/// submissions land in a log inspectable through [`DummyDevice::submissions`].
#[derive(Debug)]
pub struct DummyDevice {
    state: Arc<Mutex<DeviceState>>,
    graphics_queues: Vec<DummyQueue>,
    compute_queues: Vec<DummyQueue>,
}

impl DummyDevice {
    /// A device with one graphics and one compute queue.
    pub fn new() -> Self {
        Self::with_queues(1, 1)
    }

    /// A device exposing the given number of graphics and compute queues.
    pub fn with_queues(graphics: usize, compute: usize) -> Self {
        let state = Arc::new(Mutex::new(DeviceState::default()));
        let queue = |queue_type, index| DummyQueue {
            queue_type,
            index,
            state: state.clone(),
        };
        let graphics_queues = (0..graphics).map(|i| queue(QueueType::Graphics, i)).collect();
        let compute_queues = (0..compute).map(|i| queue(QueueType::Compute, i)).collect();
        Self {
            state,
            graphics_queues,
            compute_queues,
        }
    }

    fn queues(&self, ty: QueueType) -> &[DummyQueue] {
        match ty {
            QueueType::Graphics => &self.graphics_queues,
            QueueType::Compute => &self.compute_queues,
            QueueType::Transfer => &[],
        }
    }

    /// Every submission logged so far, in submit order.
    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn buffer_stats(&self) -> AllocStats {
        self.state.lock().unwrap().buffers.stats()
    }

    pub fn texture_stats(&self) -> AllocStats {
        self.state.lock().unwrap().textures.stats()
    }

    pub fn buffer_view_stats(&self) -> AllocStats {
        self.state.lock().unwrap().buffer_views.stats()
    }

    pub fn texture_view_stats(&self) -> AllocStats {
        self.state.lock().unwrap().texture_views.stats()
    }

    /// Ids of destroyed buffers, in destruction order.
    pub fn destroyed_buffers(&self) -> Vec<u64> {
        self.state.lock().unwrap().buffers.destroyed.clone()
    }

    /// Ids of destroyed textures, in destruction order.
    pub fn destroyed_textures(&self) -> Vec<u64> {
        self.state.lock().unwrap().textures.destroyed.clone()
    }

    /// Ids of destroyed buffer views, in destruction order.
    pub fn destroyed_buffer_views(&self) -> Vec<u64> {
        self.state.lock().unwrap().buffer_views.destroyed.clone()
    }

    /// Ids of destroyed texture views, in destruction order.
    pub fn destroyed_texture_views(&self) -> Vec<u64> {
        self.state.lock().unwrap().texture_views.destroyed.clone()
    }
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device<DummyBackend> for DummyDevice {
    fn create_buffer(&self, _desc: &BufferDesc) -> Result<DummyBuffer> {
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        state.buffers.created += 1;
        Ok(DummyBuffer { id })
    }

    fn create_texture(&self, _desc: &TextureDesc) -> Result<DummyTexture> {
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        state.textures.created += 1;
        Ok(DummyTexture { id })
    }

    fn create_buffer_view(
        &self,
        _buffer: &DummyBuffer,
        _desc: &BufferViewDesc,
    ) -> Result<DummyBufferView> {
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        state.buffer_views.created += 1;
        Ok(DummyBufferView { id })
    }

    fn create_texture_view(
        &self,
        _texture: &DummyTexture,
        _desc: &TextureViewDesc,
    ) -> Result<DummyTextureView> {
        let mut state = self.state.lock().unwrap();
        let id = state.fresh_id();
        state.texture_views.created += 1;
        Ok(DummyTextureView { id })
    }

    fn destroy_buffer(&self, buffer: DummyBuffer) {
        self.state.lock().unwrap().buffers.destroyed.push(buffer.id);
    }

    fn destroy_texture(&self, texture: DummyTexture) {
        self.state.lock().unwrap().textures.destroyed.push(texture.id);
    }

    fn destroy_buffer_view(&self, view: DummyBufferView) {
        self.state.lock().unwrap().buffer_views.destroyed.push(view.id);
    }

    fn destroy_texture_view(&self, view: DummyTextureView) {
        self.state.lock().unwrap().texture_views.destroyed.push(view.id);
    }

    fn create_command_buffer(&self) -> Result<DummyCommandBuffer> {
        Ok(DummyCommandBuffer::default())
    }

    fn create_fence(&self, signaled: bool) -> Result<DummyFence> {
        Ok(DummyFence {
            signaled: AtomicBool::new(signaled),
        })
    }

    fn queue_count(&self, ty: QueueType) -> usize {
        self.queues(ty).len()
    }

    fn queue(&self, ty: QueueType, index: usize) -> Option<&DummyQueue> {
        self.queues(ty).get(index)
    }
}
