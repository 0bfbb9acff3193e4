//! The render hardware interface: the capability traits a GPU backend implements to
//! drive the graph.
//!
//! The graph is generic over a [`Backend`], a family of associated types covering the
//! device, its queues, command buffers with their encoders, resource handles and the
//! fence primitive. Handles are opaque to the graph; it only ever stores them, hands
//! them back to the device, or embeds them in barriers and pass begin infos. They are
//! required to be cheaply clonable (raw ids or refcounted handles, as native APIs
//! provide).
//!
//! Pass *content* is deliberately absent here: the encoder traits only expose the
//! scheduling surface the graph itself needs (barriers, opening and closing passes).
//! Concrete backends add their draw/dispatch/copy commands as inherent methods on
//! their encoder types, where user execute closures can reach them.

use std::fmt::Debug;

pub mod command;
pub mod device;
pub mod queue;
pub mod sync;
pub mod types;

pub use command::*;
pub use device::Device;
pub use queue::{Queue, QueueType};
pub use sync::Fence;
pub use types::*;

/// A GPU backend: one implementation of the render hardware interface.
pub trait Backend: Sized + 'static {
    type Device: Device<Self>;
    type Queue: Queue<Self>;
    type CommandBuffer: CommandBuffer<Self>;
    type CommandEncoder: CommandEncoder<Self>;
    type ComputePassEncoder: ComputePassEncoder<Self>;
    type GraphicsPassEncoder: GraphicsPassEncoder<Self>;
    type Buffer: Clone + Debug;
    type Texture: Clone + Debug;
    type BufferView: Clone + Debug;
    type TextureView: Clone + Debug;
    type ComputePipeline: Clone + Debug;
    type RasterPipeline: Clone + Debug;
    type Fence: Fence;
}
