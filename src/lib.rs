//! Backend-agnostic render graph for scheduling one frame of GPU work.
//!
//! Deimos separates *what* a frame does from *how* a GPU API runs it. Rendering code
//! declares logical passes and the virtual resources they read and write; the graph then
//! culls resources nobody consumes, computes the state transitions ("barriers") between
//! dependent passes, allocates concrete resources only for what survived, and records and
//! submits the resulting command streams. Synchronization within a command stream is
//! fully automatic. The GPU API itself sits behind the [`rhi`] capability traits, so the
//! same graph code runs against anything implementing [`Backend`](rhi::Backend).
//!
//! To get started, the easiest way is to simply
//! ```
//! use deimos::prelude::*;
//! ```
//!
//! # Example
//!
//! One frame against the bundled in-memory backend: render the scene into a view over an
//! externally owned swapchain image, then run a luminance analysis over the result. Note
//! that the analysis pass declares reads on both the view and the image behind it: the
//! graph keeps a resource only if some pass reads it, and a view needs its parent kept
//! alive too.
//! ```
//! use deimos::prelude::*;
//! use deimos::dummy::{DummyBackend, DummyDevice};
//!
//! fn main() -> anyhow::Result<()> {
//!     let device = DummyDevice::new();
//!
//!     // The image this frame presents to, owned outside the graph.
//!     let swapchain_image = device.create_texture(&TextureDesc {
//!         extent: Extent3d::new(1920, 1080, 1),
//!         mip_levels: 1,
//!         samples: 1,
//!         dimension: TextureDimension::D2,
//!         format: PixelFormat::Bgra8Srgb,
//!         usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
//!     })?;
//!
//!     let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
//!     let backbuffer = graph.import_texture("backbuffer", swapchain_image);
//!     let target = graph.create_texture_view("backbuffer_view", backbuffer, TextureViewDesc::default());
//!
//!     graph.add_raster_pass("scene", move |pass| {
//!         pass.write(target).set_pass_desc(RasterPassDesc {
//!             color_attachments: vec![ColorAttachmentDesc {
//!                 view: Some(target),
//!                 ..Default::default()
//!             }],
//!             ..Default::default()
//!         });
//!         Box::new(move |cmd, _resources| {
//!             cmd.draw(3, 1);
//!         })
//!     });
//!
//!     graph.add_compute_pass("luminance", move |pass| {
//!         pass.read(target).read(backbuffer);
//!         Box::new(move |cmd, resources| {
//!             let _view = resources.texture_view(target);
//!             cmd.dispatch(1920 / 16, 1080 / 16, 1);
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
//! For further example code, check out the following modules
//! - [`graph`] for declaring resources and passes and driving a frame through its phases.
//! - [`graph::pass`](crate::graph::pass) for the three pass kinds and their builders.
//! - [`rhi`] for the capability traits a GPU backend implements.
//! - [`dummy`] for the in-memory backend used by tests and documentation examples.

#[macro_use]
extern crate derivative;
#[macro_use] extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod dummy;
pub mod error;
pub mod graph;
pub mod rhi;
