//! Queue abstraction for command submission.

use anyhow::Result;

use super::Backend;

/// Functionality class of a hardware queue. Note that backends commonly multiplex
/// logical queues over fewer hardware queues; the graph only cares about the exposed
/// capability.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash)]
pub enum QueueType {
    #[default]
    Graphics,
    Compute,
    Transfer,
}

/// A logical command queue on the device.
pub trait Queue<B: Backend> {
    /// Submit a finished command buffer for execution. When `fence` is given, the
    /// backend signals it once the submission completes on the device.
    fn submit(&self, commands: &B::CommandBuffer, fence: Option<&B::Fence>) -> Result<()>;
}
