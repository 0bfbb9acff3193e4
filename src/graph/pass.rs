//! Pass declaration and the builders handed to pass setup callables.
//!
//! A [`RenderGraph`](crate::graph::RenderGraph) knows three kinds of passes. *Copy* passes record
//! transfer commands straight into the frame's command encoder. *Compute* passes record into a
//! compute pass encoder and may opt into the async compute stream with
//! [`ComputePassBuilder::async_compute`]. *Raster* passes record into a graphics pass encoder and
//! carry a [`RasterPassDesc`] describing their attachments.
//!
//! Declaring a pass is split in two phases. The setup callable given to
//! [`RenderGraph::add_copy_pass`](crate::graph::RenderGraph::add_copy_pass) and friends runs
//! during [`RenderGraph::setup`](crate::graph::RenderGraph::setup). It declares the resources the
//! pass touches through the builder it is handed and returns the pass's execute closure. That
//! closure runs during [`RenderGraph::execute`](crate::graph::RenderGraph::execute), after the
//! barriers for the pass were recorded, and receives the pass encoder together with a
//! [`PassResources`] to look up concrete backend handles.
//!
//! # Example
//!
//! ```
//! use deimos::prelude::*;
//! use deimos::dummy::{DummyBackend, DummyDevice};
//!
//! let device = DummyDevice::new();
//! let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
//!
//! let particles = graph.create_buffer(
//!     "particles",
//!     BufferDesc {
//!         size: 65536,
//!         usage: BufferUsage::STORAGE,
//!     },
//! );
//!
//! graph.add_compute_pass("integrate", move |pass| {
//!     pass.write(particles).async_compute(true);
//!     Box::new(move |_cmd, resources| {
//!         let _buffer = resources.buffer(particles);
//!         // Bind and dispatch through the backend's encoder here.
//!     })
//! });
//! ```

use std::fmt;
use std::mem;

use indexmap::IndexSet;

use crate::graph::record::PassResources;
use crate::graph::resource::{ResourceRef, TextureViewRef};
use crate::rhi::{Backend, ClearColor, ClearDepthStencil, LoadOp, StoreOp};

/// Execute closure of a copy pass. Records transfer commands into the frame's encoder.
pub type CopyPassExecuteFn<'cb, B> =
    Box<dyn FnOnce(&mut <B as Backend>::CommandEncoder, &PassResources<'_, B>) + 'cb>;

/// Execute closure of a compute pass. Records into the pass's compute encoder.
pub type ComputePassExecuteFn<'cb, B> =
    Box<dyn FnOnce(&mut <B as Backend>::ComputePassEncoder, &PassResources<'_, B>) + 'cb>;

/// Execute closure of a raster pass. Records into the pass's graphics encoder.
pub type RasterPassExecuteFn<'cb, B> =
    Box<dyn FnOnce(&mut <B as Backend>::GraphicsPassEncoder, &PassResources<'_, B>) + 'cb>;

/// Setup phase of a copy pass. Declares the pass's resource sets and returns the closure
/// that records its commands.
pub trait CopyPassSetup<'cb, B: Backend> {
    /// Declare resources on `pass` and return the execute closure.
    fn setup(&mut self, pass: &mut CopyPassBuilder<'_>) -> CopyPassExecuteFn<'cb, B>;
}

impl<'cb, B, F> CopyPassSetup<'cb, B> for F
where
    B: Backend,
    F: FnMut(&mut CopyPassBuilder<'_>) -> CopyPassExecuteFn<'cb, B>,
{
    fn setup(&mut self, pass: &mut CopyPassBuilder<'_>) -> CopyPassExecuteFn<'cb, B> {
        self(pass)
    }
}

/// Setup phase of a compute pass.
pub trait ComputePassSetup<'cb, B: Backend> {
    /// Declare resources on `pass` and return the execute closure.
    fn setup(&mut self, pass: &mut ComputePassBuilder<'_, B>) -> ComputePassExecuteFn<'cb, B>;
}

impl<'cb, B, F> ComputePassSetup<'cb, B> for F
where
    B: Backend,
    F: FnMut(&mut ComputePassBuilder<'_, B>) -> ComputePassExecuteFn<'cb, B>,
{
    fn setup(&mut self, pass: &mut ComputePassBuilder<'_, B>) -> ComputePassExecuteFn<'cb, B> {
        self(pass)
    }
}

/// Setup phase of a raster pass.
pub trait RasterPassSetup<'cb, B: Backend> {
    /// Declare resources on `pass` and return the execute closure.
    fn setup(&mut self, pass: &mut RasterPassBuilder<'_, B>) -> RasterPassExecuteFn<'cb, B>;
}

impl<'cb, B, F> RasterPassSetup<'cb, B> for F
where
    B: Backend,
    F: FnMut(&mut RasterPassBuilder<'_, B>) -> RasterPassExecuteFn<'cb, B>,
{
    fn setup(&mut self, pass: &mut RasterPassBuilder<'_, B>) -> RasterPassExecuteFn<'cb, B> {
        self(pass)
    }
}

pub(crate) type BoxedCopySetup<'cb, B> = Box<dyn CopyPassSetup<'cb, B> + 'cb>;
pub(crate) type BoxedComputeSetup<'cb, B> = Box<dyn ComputePassSetup<'cb, B> + 'cb>;
pub(crate) type BoxedRasterSetup<'cb, B> = Box<dyn RasterPassSetup<'cb, B> + 'cb>;

/// Static description of a compute pass, set during setup with
/// [`ComputePassBuilder::set_pass_desc`].
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""), Default(bound = ""))]
pub struct ComputePassDesc<B: Backend> {
    /// Pipeline the pass encoder is begun with. `None` leaves pipeline selection to the
    /// execute closure.
    pub pipeline: Option<B::ComputePipeline>,
}

/// A color attachment of a raster pass, referring to its texture view by graph handle.
/// Resolved to the concrete view when the pass is recorded.
///
/// Attachments are not implicitly part of the pass's resource sets. An attachment that other
/// passes consume must also be declared with [`RasterPassBuilder::write`].
#[derive(Debug, Copy, Clone)]
pub struct ColorAttachmentDesc {
    pub view: Option<TextureViewRef>,
    /// Multisample resolve target, if any.
    pub resolve: Option<TextureViewRef>,
    /// Color the attachment is cleared to when `load_op` is [`LoadOp::Clear`].
    pub clear_value: ClearColor,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
}

impl Default for ColorAttachmentDesc {
    fn default() -> Self {
        Self {
            view: None,
            resolve: None,
            clear_value: ClearColor::default(),
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
        }
    }
}

/// The depth/stencil attachment of a raster pass.
#[derive(Debug, Copy, Clone)]
pub struct DepthStencilAttachmentDesc {
    pub view: Option<TextureViewRef>,
    /// Clear values used by aspects whose load op is [`LoadOp::Clear`].
    pub clear_value: ClearDepthStencil,
    pub depth_load_op: LoadOp,
    pub depth_store_op: StoreOp,
    /// The pass only reads the depth aspect.
    pub depth_read_only: bool,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    /// The pass only reads the stencil aspect.
    pub stencil_read_only: bool,
}

impl Default for DepthStencilAttachmentDesc {
    fn default() -> Self {
        Self {
            view: None,
            clear_value: ClearDepthStencil::default(),
            depth_load_op: LoadOp::Clear,
            depth_store_op: StoreOp::Store,
            depth_read_only: false,
            stencil_load_op: LoadOp::Clear,
            stencil_store_op: StoreOp::Store,
            stencil_read_only: false,
        }
    }
}

/// Static description of a raster pass, set during setup with
/// [`RasterPassBuilder::set_pass_desc`].
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""), Default(bound = ""))]
pub struct RasterPassDesc<B: Backend> {
    /// Pipeline the pass encoder is begun with. `None` leaves pipeline selection to the
    /// execute closure.
    pub pipeline: Option<B::RasterPipeline>,
    pub color_attachments: Vec<ColorAttachmentDesc>,
    pub depth_stencil_attachment: Option<DepthStencilAttachmentDesc>,
}

/// Resource interface handed to a copy pass's setup callable.
///
/// Reads and writes keep their declaration order. Declaring the same resource twice is
/// fine, the sets deduplicate.
#[derive(Debug)]
pub struct CopyPassBuilder<'a> {
    pub(crate) reads: &'a mut IndexSet<ResourceRef>,
    pub(crate) writes: &'a mut IndexSet<ResourceRef>,
}

impl CopyPassBuilder<'_> {
    /// Declare that the pass reads `resource`.
    pub fn read(&mut self, resource: impl Into<ResourceRef>) -> &mut Self {
        self.reads.insert(resource.into());
        self
    }

    /// Declare that the pass writes `resource`.
    pub fn write(&mut self, resource: impl Into<ResourceRef>) -> &mut Self {
        self.writes.insert(resource.into());
        self
    }
}

/// Resource and configuration interface handed to a compute pass's setup callable.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct ComputePassBuilder<'a, B: Backend> {
    pub(crate) reads: &'a mut IndexSet<ResourceRef>,
    pub(crate) writes: &'a mut IndexSet<ResourceRef>,
    pub(crate) desc: &'a mut ComputePassDesc<B>,
    pub(crate) is_async: &'a mut bool,
}

impl<B: Backend> ComputePassBuilder<'_, B> {
    /// Declare that the pass reads `resource`.
    pub fn read(&mut self, resource: impl Into<ResourceRef>) -> &mut Self {
        self.reads.insert(resource.into());
        self
    }

    /// Declare that the pass writes `resource`.
    pub fn write(&mut self, resource: impl Into<ResourceRef>) -> &mut Self {
        self.writes.insert(resource.into());
        self
    }

    /// Replace the pass description.
    pub fn set_pass_desc(&mut self, desc: ComputePassDesc<B>) -> &mut Self {
        *self.desc = desc;
        self
    }

    /// Submit this pass on the async compute stream instead of the main one. Passes on the
    /// same stream keep their registration order relative to each other.
    pub fn async_compute(&mut self, enabled: bool) -> &mut Self {
        *self.is_async = enabled;
        self
    }
}

/// Resource and configuration interface handed to a raster pass's setup callable.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct RasterPassBuilder<'a, B: Backend> {
    pub(crate) reads: &'a mut IndexSet<ResourceRef>,
    pub(crate) writes: &'a mut IndexSet<ResourceRef>,
    pub(crate) desc: &'a mut RasterPassDesc<B>,
}

impl<B: Backend> RasterPassBuilder<'_, B> {
    /// Declare that the pass reads `resource`.
    pub fn read(&mut self, resource: impl Into<ResourceRef>) -> &mut Self {
        self.reads.insert(resource.into());
        self
    }

    /// Declare that the pass writes `resource`.
    pub fn write(&mut self, resource: impl Into<ResourceRef>) -> &mut Self {
        self.writes.insert(resource.into());
        self
    }

    /// Replace the pass description.
    pub fn set_pass_desc(&mut self, desc: RasterPassDesc<B>) -> &mut Self {
        *self.desc = desc;
        self
    }
}

/// Lifecycle of a pass's user code. The setup callable is consumed when the graph is set
/// up and replaced by the execute closure it returns, which in turn is consumed when the
/// pass is recorded.
pub(crate) enum PassStage<S, E> {
    Pending(S),
    Ready(E),
    Executed,
}

impl<S, E> fmt::Debug for PassStage<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PassStage::Pending(_) => "Pending",
            PassStage::Ready(_) => "Ready",
            PassStage::Executed => "Executed",
        })
    }
}

/// Which of the three pass flavors a node is, without its payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum PassKind {
    Copy,
    Compute,
    Raster,
}

/// Kind-specific payload of a pass node.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub(crate) enum PassKindState<'cb, B: Backend> {
    Copy {
        stage: PassStage<BoxedCopySetup<'cb, B>, CopyPassExecuteFn<'cb, B>>,
    },
    Compute {
        desc: ComputePassDesc<B>,
        is_async: bool,
        stage: PassStage<BoxedComputeSetup<'cb, B>, ComputePassExecuteFn<'cb, B>>,
    },
    Raster {
        desc: RasterPassDesc<B>,
        stage: PassStage<BoxedRasterSetup<'cb, B>, RasterPassExecuteFn<'cb, B>>,
    },
}

/// One pass in the graph: its name, declared resource sets and kind payload.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub(crate) struct PassNode<'cb, B: Backend> {
    pub(crate) name: String,
    /// Resources read by this pass, in declaration order.
    pub(crate) reads: IndexSet<ResourceRef>,
    /// Resources written by this pass, in declaration order.
    pub(crate) writes: IndexSet<ResourceRef>,
    pub(crate) kind: PassKindState<'cb, B>,
}

impl<'cb, B: Backend> PassNode<'cb, B> {
    pub(crate) fn copy(name: String, setup: BoxedCopySetup<'cb, B>) -> Self {
        Self {
            name,
            reads: IndexSet::new(),
            writes: IndexSet::new(),
            kind: PassKindState::Copy {
                stage: PassStage::Pending(setup),
            },
        }
    }

    pub(crate) fn compute(name: String, setup: BoxedComputeSetup<'cb, B>) -> Self {
        Self {
            name,
            reads: IndexSet::new(),
            writes: IndexSet::new(),
            kind: PassKindState::Compute {
                desc: ComputePassDesc::default(),
                is_async: false,
                stage: PassStage::Pending(setup),
            },
        }
    }

    pub(crate) fn raster(name: String, setup: BoxedRasterSetup<'cb, B>) -> Self {
        Self {
            name,
            reads: IndexSet::new(),
            writes: IndexSet::new(),
            kind: PassKindState::Raster {
                desc: RasterPassDesc::default(),
                stage: PassStage::Pending(setup),
            },
        }
    }

    /// Kind of this pass, without its payload.
    pub(crate) fn kind(&self) -> PassKind {
        match &self.kind {
            PassKindState::Copy {
                ..
            } => PassKind::Copy,
            PassKindState::Compute {
                ..
            } => PassKind::Compute,
            PassKindState::Raster {
                ..
            } => PassKind::Raster,
        }
    }

    /// Whether this pass is submitted on the async compute stream.
    pub(crate) fn is_async_compute(&self) -> bool {
        matches!(
            self.kind,
            PassKindState::Compute {
                is_async: true,
                ..
            }
        )
    }

    /// Run the setup callable, filling the resource sets and storing the execute closure.
    pub(crate) fn run_setup(&mut self) {
        match &mut self.kind {
            PassKindState::Copy {
                stage,
            } => {
                let mut setup = match mem::replace(stage, PassStage::Executed) {
                    PassStage::Pending(setup) => setup,
                    _ => panic!("pass '{}' was set up twice", self.name),
                };
                let mut pass = CopyPassBuilder {
                    reads: &mut self.reads,
                    writes: &mut self.writes,
                };
                *stage = PassStage::Ready(setup.setup(&mut pass));
            }
            PassKindState::Compute {
                desc,
                is_async,
                stage,
            } => {
                let mut setup = match mem::replace(stage, PassStage::Executed) {
                    PassStage::Pending(setup) => setup,
                    _ => panic!("pass '{}' was set up twice", self.name),
                };
                let mut pass = ComputePassBuilder {
                    reads: &mut self.reads,
                    writes: &mut self.writes,
                    desc,
                    is_async,
                };
                *stage = PassStage::Ready(setup.setup(&mut pass));
            }
            PassKindState::Raster {
                desc,
                stage,
            } => {
                let mut setup = match mem::replace(stage, PassStage::Executed) {
                    PassStage::Pending(setup) => setup,
                    _ => panic!("pass '{}' was set up twice", self.name),
                };
                let mut pass = RasterPassBuilder {
                    reads: &mut self.reads,
                    writes: &mut self.writes,
                    desc,
                };
                *stage = PassStage::Ready(setup.setup(&mut pass));
            }
        }
    }
}
