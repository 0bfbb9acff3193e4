//! The render graph schedules GPU passes over virtual resources. Each pass declares the
//! resources it reads and writes; the graph then culls resources nobody consumes, computes
//! the state transitions ("barriers") between dependent passes, allocates concrete
//! resources only for what survived, and records and submits the resulting command
//! streams.
//!
//! A graph covers one frame's worth of work and is driven through three phases, in order,
//! exactly once:
//!
//! 1. [`RenderGraph::setup`] runs every pass's setup callable, fixing resource usage and
//!    pass descriptions.
//! 2. [`RenderGraph::compile`] culls resources no pass reads and precomputes the
//!    transition for every (resource, pass) touch.
//! 3. [`RenderGraph::execute`] devirtualizes surviving resources, records both command
//!    streams with their barriers and submits them to the device's queues.
//!
//! Synchronization is automatic **within each command stream**. Work routed to the async
//! compute stream runs concurrently with the main stream on the device; ordering between
//! the two is the caller's burden, via the fences passed to execute.
//!
//! # Example
//!
//! ```
//! use deimos::prelude::*;
//! use deimos::dummy::{DummyBackend, DummyDevice};
//!
//! fn main() -> anyhow::Result<()> {
//!     let device = DummyDevice::new();
//!     let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
//!
//!     // A staging upload feeding a compute pass.
//!     let staging = graph.create_buffer(
//!         "staging",
//!         BufferDesc {
//!             size: 1 << 16,
//!             usage: BufferUsage::COPY_SRC,
//!         },
//!     );
//!     let particles = graph.create_buffer(
//!         "particles",
//!         BufferDesc {
//!             size: 1 << 16,
//!             usage: BufferUsage::COPY_DST | BufferUsage::STORAGE,
//!         },
//!     );
//!
//!     graph.add_copy_pass("upload", move |pass| {
//!         pass.read(staging).write(particles);
//!         Box::new(move |_cmd, resources| {
//!             let _src = resources.buffer(staging);
//!             let _dst = resources.buffer(particles);
//!             // Record the copy through the backend's own encoder surface here.
//!         })
//!     });
//!
//!     graph.add_compute_pass("integrate", move |pass| {
//!         pass.read(particles);
//!         Box::new(move |_cmd, resources| {
//!             let _particles = resources.buffer(particles);
//!         })
//!     });
//!
//!     graph.setup();
//!     graph.compile();
//!     graph.execute(None, None)?;
//!     Ok(())
//! }
//! ```
//!
//! For the pass kinds and their builders, see the [`pass`] module documentation.

pub mod pass;
pub mod record;
pub mod render_graph;
pub mod resource;

pub(crate) mod transition;

pub use render_graph::RenderGraph;
