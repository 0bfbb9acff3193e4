//! CPU-GPU synchronization primitives.

/// A fence signalled by the device when a submission completes. Used by callers to
/// wait for the streams submitted by an execute cycle.
pub trait Fence {
    /// Whether the fence has been signalled.
    fn is_signaled(&self) -> bool;
    /// Return the fence to the unsignalled state.
    fn reset(&self);
    /// Block until the fence is signalled.
    fn wait(&self);
}
