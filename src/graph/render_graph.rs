//! The graph orchestrator: owns the resource arena and pass list for one frame's worth
//! of scheduling and drives the setup → compile → execute protocol over them.
//!
//! A [`RenderGraph`] is built fresh per frame (or equivalent unit of work) and driven
//! through its phases exactly once. Driving them out of order is a caller bug and panics;
//! after any failure out of [`RenderGraph::execute`] the graph must be discarded.

use std::collections::HashMap;

use anyhow::Result;

use crate::graph::pass::{
    ComputePassBuilder, ComputePassExecuteFn, CopyPassBuilder, CopyPassExecuteFn, PassNode,
    RasterPassBuilder, RasterPassExecuteFn,
};
use crate::graph::record;
use crate::graph::resource::{
    BufferRef, BufferViewRef, ResourceEntry, ResourcePayload, ResourceRef, ResourceStorage,
    TextureRef, TextureViewRef,
};
use crate::graph::transition::{cross_stream_resources, synthesize_transitions, ResourceTransition};
use crate::rhi::{Backend, BufferDesc, BufferViewDesc, TextureDesc, TextureViewDesc};

/// Where the graph is in its lifecycle. Advanced by [`RenderGraph::setup`],
/// [`RenderGraph::compile`] and [`RenderGraph::execute`], in that order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Phase {
    Building,
    SetupComplete,
    Compiled,
    Executed,
}

/// A frame's render graph: declared resources, declared passes, and the transition table
/// compile computed for them.
///
/// The graph owns every virtual resource it devirtualizes and releases the concrete
/// handles when dropped. External resources stay owned by the caller throughout.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct RenderGraph<'d, B: Backend> {
    #[derivative(Debug = "ignore")]
    device: &'d B::Device,
    resources: Vec<ResourceEntry<B>>,
    passes: Vec<PassNode<'d, B>>,
    transitions: HashMap<(ResourceRef, usize), ResourceTransition>,
    phase: Phase,
}

impl<'d, B: Backend> RenderGraph<'d, B> {
    /// Create an empty graph recording against `device`.
    pub fn new(device: &'d B::Device) -> Self {
        Self {
            device,
            resources: Vec::new(),
            passes: Vec::new(),
            transitions: HashMap::new(),
            phase: Phase::Building,
        }
    }

    fn expect_phase(&self, expected: Phase, operation: &str) {
        assert!(
            self.phase == expected,
            "cannot {} a graph in the {:?} phase; drive setup, compile and execute in order, once each",
            operation,
            self.phase
        );
    }

    /// Register a virtual buffer. The concrete buffer is allocated during execute, and
    /// only if the graph did not cull it.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn create_buffer(&mut self, name: impl Into<String>, desc: BufferDesc) -> BufferRef {
        self.expect_phase(Phase::Building, "register resources on");
        let index = self.resources.len() as u32;
        self.resources.push(ResourceEntry::new(
            name.into(),
            ResourcePayload::Buffer(ResourceStorage::Virtual {
                desc,
                handle: None,
            }),
        ));
        BufferRef(index)
    }

    /// Register a virtual texture.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn create_texture(&mut self, name: impl Into<String>, desc: TextureDesc) -> TextureRef {
        self.expect_phase(Phase::Building, "register resources on");
        let index = self.resources.len() as u32;
        self.resources.push(ResourceEntry::new(
            name.into(),
            ResourcePayload::Texture(ResourceStorage::Virtual {
                desc,
                handle: None,
            }),
        ));
        TextureRef(index)
    }

    /// Register a virtual view over `parent`. The view is devirtualized strictly after
    /// its parent.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn create_buffer_view(
        &mut self,
        name: impl Into<String>,
        parent: BufferRef,
        desc: BufferViewDesc,
    ) -> BufferViewRef {
        self.expect_phase(Phase::Building, "register resources on");
        let index = self.resources.len() as u32;
        self.resources.push(ResourceEntry::new(
            name.into(),
            ResourcePayload::BufferView {
                parent,
                storage: ResourceStorage::Virtual {
                    desc,
                    handle: None,
                },
            },
        ));
        BufferViewRef(index)
    }

    /// Register a virtual view over `parent`.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn create_texture_view(
        &mut self,
        name: impl Into<String>,
        parent: TextureRef,
        desc: TextureViewDesc,
    ) -> TextureViewRef {
        self.expect_phase(Phase::Building, "register resources on");
        let index = self.resources.len() as u32;
        self.resources.push(ResourceEntry::new(
            name.into(),
            ResourcePayload::TextureView {
                parent,
                storage: ResourceStorage::Virtual {
                    desc,
                    handle: None,
                },
            },
        ));
        TextureViewRef(index)
    }

    /// Wrap a caller-owned buffer as an external resource. The graph never allocates or
    /// releases its handle.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn import_buffer(&mut self, name: impl Into<String>, handle: B::Buffer) -> BufferRef {
        self.expect_phase(Phase::Building, "register resources on");
        let index = self.resources.len() as u32;
        self.resources.push(ResourceEntry::new(
            name.into(),
            ResourcePayload::Buffer(ResourceStorage::External {
                handle,
            }),
        ));
        BufferRef(index)
    }

    /// Wrap a caller-owned texture as an external resource.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn import_texture(&mut self, name: impl Into<String>, handle: B::Texture) -> TextureRef {
        self.expect_phase(Phase::Building, "register resources on");
        let index = self.resources.len() as u32;
        self.resources.push(ResourceEntry::new(
            name.into(),
            ResourcePayload::Texture(ResourceStorage::External {
                handle,
            }),
        ));
        TextureRef(index)
    }

    /// Wrap a caller-owned buffer view over `parent`. The graph tracks barrier state on
    /// the parent; the caller guarantees `handle` actually views it.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn import_buffer_view(
        &mut self,
        name: impl Into<String>,
        parent: BufferRef,
        handle: B::BufferView,
    ) -> BufferViewRef {
        self.expect_phase(Phase::Building, "register resources on");
        let index = self.resources.len() as u32;
        self.resources.push(ResourceEntry::new(
            name.into(),
            ResourcePayload::BufferView {
                parent,
                storage: ResourceStorage::External {
                    handle,
                },
            },
        ));
        BufferViewRef(index)
    }

    /// Wrap a caller-owned texture view over `parent`.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn import_texture_view(
        &mut self,
        name: impl Into<String>,
        parent: TextureRef,
        handle: B::TextureView,
    ) -> TextureViewRef {
        self.expect_phase(Phase::Building, "register resources on");
        let index = self.resources.len() as u32;
        self.resources.push(ResourceEntry::new(
            name.into(),
            ResourcePayload::TextureView {
                parent,
                storage: ResourceStorage::External {
                    handle,
                },
            },
        ));
        TextureViewRef(index)
    }

    /// Register a copy pass. `setup` runs during [`RenderGraph::setup`] and returns the
    /// closure that records the pass's transfer commands during execute.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn add_copy_pass<F>(&mut self, name: impl Into<String>, setup: F)
    where
        F: FnMut(&mut CopyPassBuilder<'_>) -> CopyPassExecuteFn<'d, B> + 'd,
    {
        self.expect_phase(Phase::Building, "register passes on");
        self.passes.push(PassNode::copy(name.into(), Box::new(setup)));
    }

    /// Register a compute pass. The pass records into its own compute pass encoder and
    /// may opt into the async compute stream from its setup.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn add_compute_pass<F>(&mut self, name: impl Into<String>, setup: F)
    where
        F: FnMut(&mut ComputePassBuilder<'_, B>) -> ComputePassExecuteFn<'d, B> + 'd,
    {
        self.expect_phase(Phase::Building, "register passes on");
        self.passes.push(PassNode::compute(name.into(), Box::new(setup)));
    }

    /// Register a raster pass. The pass records into its own graphics pass encoder,
    /// begun with the attachments its setup declared.
    ///
    /// # Panics
    /// Panics if the graph has left the building phase.
    pub fn add_raster_pass<F>(&mut self, name: impl Into<String>, setup: F)
    where
        F: FnMut(&mut RasterPassBuilder<'_, B>) -> RasterPassExecuteFn<'d, B> + 'd,
    {
        self.expect_phase(Phase::Building, "register passes on");
        self.passes.push(PassNode::raster(name.into(), Box::new(setup)));
    }

    /// Run every pass's setup callable in registration order. Resource sets and pass
    /// descriptions are final afterwards; no further registration is accepted.
    ///
    /// # Panics
    /// Panics unless the graph is in the building phase.
    pub fn setup(&mut self) {
        self.expect_phase(Phase::Building, "set up");
        for pass in &mut self.passes {
            pass.run_setup();
        }
        self.phase = Phase::SetupComplete;
    }

    /// Cull resources no pass reads, then synthesize the transition table over the pass
    /// list in registration order.
    ///
    /// Resources touched by both command streams are reported through a `warn!` log: the
    /// graph emits no cross-stream barrier, that ordering is the caller's burden.
    ///
    /// # Panics
    /// Panics unless [`RenderGraph::setup`] ran.
    pub fn compile(&mut self) {
        self.expect_phase(Phase::SetupComplete, "compile");

        // Reset transient state so compile always starts from a clean slate. Views were
        // registered after their parents and must release first.
        for entry in self.resources.iter_mut().rev() {
            entry.destroy(self.device);
            entry.culled = false;
        }
        self.transitions.clear();

        self.cull_unread_resources();
        self.transitions = synthesize_transitions(&self.resources, &self.passes);

        for index in cross_stream_resources(&self.resources, &self.passes) {
            warn!(
                "resource '{}' is touched by both command streams; no cross-stream barrier is emitted, ordering between the streams is up to the caller",
                self.resources[index].name
            );
        }

        self.phase = Phase::Compiled;
    }

    /// A resource is kept if and only if at least one pass reads it. Written-but-never-read
    /// resources are culled like any other unread resource.
    fn cull_unread_resources(&mut self) {
        let mut read = vec![false; self.resources.len()];
        for pass in &self.passes {
            for &resource in &pass.reads {
                read[resource.index()] = true;
            }
        }
        for (index, entry) in self.resources.iter_mut().enumerate() {
            if !read[index] {
                entry.culled = true;
                debug!("culled resource '{}', no pass reads it", entry.name);
            }
        }
    }

    /// Devirtualize every surviving resource, record both command streams with their
    /// precomputed barriers, and submit them.
    ///
    /// The main stream carries every copy and raster pass plus non-async compute passes
    /// and is submitted to graphics queue 0 with `main_fence`. The async stream carries
    /// compute passes flagged async and is submitted to compute queue 1 when the device
    /// exposes more than one compute queue, otherwise to the graphics queue, with
    /// `async_fence`.
    ///
    /// # Errors
    /// Fails when the device exposes no graphics queue or when backend allocation or
    /// submission fails. The graph must be discarded after a failure.
    ///
    /// # Panics
    /// Panics unless the graph was compiled, and on recording contract violations such as
    /// devirtualizing a view whose parent was culled.
    pub fn execute(
        &mut self,
        main_fence: Option<&B::Fence>,
        async_fence: Option<&B::Fence>,
    ) -> Result<()> {
        self.expect_phase(Phase::Compiled, "execute");
        self.phase = Phase::Executed;
        record::record_and_submit(
            self.device,
            &mut self.resources,
            &mut self.passes,
            &self.transitions,
            main_fence,
            async_fence,
        )
    }

    /// Whether compile culled `resource`.
    pub fn is_culled(&self, resource: impl Into<ResourceRef>) -> bool {
        self.entry(resource.into()).culled
    }

    /// Whether `resource` wraps a caller-supplied handle.
    pub fn is_external(&self, resource: impl Into<ResourceRef>) -> bool {
        self.entry(resource.into()).is_external()
    }

    /// Whether `resource`'s concrete handle is currently valid to resolve.
    pub fn can_access_rhi(&self, resource: impl Into<ResourceRef>) -> bool {
        self.entry(resource.into()).rhi_access
    }

    /// Parent of a view, `None` for any other resource.
    pub fn parent(&self, resource: impl Into<ResourceRef>) -> Option<ResourceRef> {
        self.entry(resource.into()).parent()
    }

    /// Diagnostic name `resource` was registered under.
    pub fn resource_name(&self, resource: impl Into<ResourceRef>) -> &str {
        &self.entry(resource.into()).name
    }

    fn entry(&self, resource: ResourceRef) -> &ResourceEntry<B> {
        &self.resources[resource.index()]
    }
}

impl<B: Backend> Drop for RenderGraph<'_, B> {
    fn drop(&mut self) {
        // Views were registered after their parents and must release first.
        for entry in self.resources.iter_mut().rev() {
            entry.destroy(self.device);
        }
    }
}
