//! The graph's resource model.
//!
//! Rendering code declares *virtual* resources: a name plus a descriptor, with no
//! GPU memory behind them until the graph devirtualizes the ones that survive
//! culling. Pre-existing GPU objects enter the graph as *external* resources
//! wrapping a caller-supplied handle the graph never owns.
//!
//! All resources live in an arena owned by their [`RenderGraph`](crate::graph::RenderGraph);
//! rendering code only ever holds small typed references ([`BufferRef`],
//! [`TextureRef`], [`BufferViewRef`], [`TextureViewRef`]) into that arena. Views
//! reference their parent resource the same way, which is what makes the
//! resources-before-views devirtualization order enforceable.

use crate::rhi::{Backend, BufferDesc, BufferViewDesc, Device, TextureDesc, TextureViewDesc};

/// Reference to a buffer owned by a render graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferRef(pub(crate) u32);

/// Reference to a texture owned by a render graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureRef(pub(crate) u32);

/// Reference to a buffer view owned by a render graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferViewRef(pub(crate) u32);

/// Reference to a texture view owned by a render graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureViewRef(pub(crate) u32);

/// Reference to any resource owned by a render graph. Pass read/write sets store
/// these; the typed references above convert into it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Buffer(BufferRef),
    Texture(TextureRef),
    BufferView(BufferViewRef),
    TextureView(TextureViewRef),
}

impl ResourceRef {
    /// Index of the referenced resource in the graph's arena.
    pub(crate) fn index(&self) -> usize {
        match self {
            ResourceRef::Buffer(r) => r.0 as usize,
            ResourceRef::Texture(r) => r.0 as usize,
            ResourceRef::BufferView(r) => r.0 as usize,
            ResourceRef::TextureView(r) => r.0 as usize,
        }
    }
}

impl From<BufferRef> for ResourceRef {
    fn from(value: BufferRef) -> Self {
        ResourceRef::Buffer(value)
    }
}

impl From<TextureRef> for ResourceRef {
    fn from(value: TextureRef) -> Self {
        ResourceRef::Texture(value)
    }
}

impl From<BufferViewRef> for ResourceRef {
    fn from(value: BufferViewRef) -> Self {
        ResourceRef::BufferView(value)
    }
}

impl From<TextureViewRef> for ResourceRef {
    fn from(value: TextureViewRef) -> Self {
        ResourceRef::TextureView(value)
    }
}

/// Where a resource's concrete handle comes from. Virtual resources carry a
/// descriptor and gain a handle at devirtualization; external resources carry a
/// caller-owned handle from construction on.
#[derive(Debug)]
pub(crate) enum ResourceStorage<D, H> {
    Virtual {
        desc: D,
        handle: Option<H>,
    },
    External {
        handle: H,
    },
}

impl<D, H> ResourceStorage<D, H> {
    pub(crate) fn is_external(&self) -> bool {
        matches!(self, ResourceStorage::External { .. })
    }

    pub(crate) fn handle(&self) -> Option<&H> {
        match self {
            ResourceStorage::Virtual {
                handle,
                ..
            } => handle.as_ref(),
            ResourceStorage::External {
                handle,
            } => Some(handle),
        }
    }
}

/// Kind-specific payload of a resource entry. Views store the reference to their parent
/// resource alongside their own storage; barrier state is tracked on the parent.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub(crate) enum ResourcePayload<B: Backend> {
    Buffer(ResourceStorage<BufferDesc, B::Buffer>),
    Texture(ResourceStorage<TextureDesc, B::Texture>),
    BufferView {
        parent: BufferRef,
        storage: ResourceStorage<BufferViewDesc, B::BufferView>,
    },
    TextureView {
        parent: TextureRef,
        storage: ResourceStorage<TextureViewDesc, B::TextureView>,
    },
}

/// One resource in the graph's arena: shared bookkeeping plus the kind payload.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub(crate) struct ResourceEntry<B: Backend> {
    pub(crate) name: String,
    /// Set by compile when no pass reads the resource.
    pub(crate) culled: bool,
    /// True only while the concrete handle is valid for the current execute cycle.
    pub(crate) rhi_access: bool,
    pub(crate) payload: ResourcePayload<B>,
}

impl<B: Backend> ResourceEntry<B> {
    pub(crate) fn new(name: String, payload: ResourcePayload<B>) -> Self {
        Self {
            name,
            culled: false,
            rhi_access: false,
            payload,
        }
    }

    pub(crate) fn is_external(&self) -> bool {
        match &self.payload {
            ResourcePayload::Buffer(storage) => storage.is_external(),
            ResourcePayload::Texture(storage) => storage.is_external(),
            ResourcePayload::BufferView {
                storage,
                ..
            } => storage.is_external(),
            ResourcePayload::TextureView {
                storage,
                ..
            } => storage.is_external(),
        }
    }

    pub(crate) fn is_view(&self) -> bool {
        matches!(
            self.payload,
            ResourcePayload::BufferView { .. } | ResourcePayload::TextureView { .. }
        )
    }

    /// Parent relation, set only for views.
    pub(crate) fn parent(&self) -> Option<ResourceRef> {
        match &self.payload {
            ResourcePayload::BufferView {
                parent,
                ..
            } => Some(ResourceRef::Buffer(*parent)),
            ResourcePayload::TextureView {
                parent,
                ..
            } => Some(ResourceRef::Texture(*parent)),
            _ => None,
        }
    }

    /// Whether a concrete handle exists, devirtualized or external.
    pub(crate) fn has_handle(&self) -> bool {
        match &self.payload {
            ResourcePayload::Buffer(storage) => storage.handle().is_some(),
            ResourcePayload::Texture(storage) => storage.handle().is_some(),
            ResourcePayload::BufferView {
                storage,
                ..
            } => storage.handle().is_some(),
            ResourcePayload::TextureView {
                storage,
                ..
            } => storage.handle().is_some(),
        }
    }

    /// Release an owned concrete handle back to the device. No-op for external
    /// resources and for resources that never got devirtualized.
    pub(crate) fn destroy(&mut self, device: &B::Device) {
        match &mut self.payload {
            ResourcePayload::Buffer(ResourceStorage::Virtual {
                handle,
                ..
            }) => {
                if let Some(handle) = handle.take() {
                    device.destroy_buffer(handle);
                }
            }
            ResourcePayload::Texture(ResourceStorage::Virtual {
                handle,
                ..
            }) => {
                if let Some(handle) = handle.take() {
                    device.destroy_texture(handle);
                }
            }
            ResourcePayload::BufferView {
                storage: ResourceStorage::Virtual {
                    handle,
                    ..
                },
                ..
            } => {
                if let Some(handle) = handle.take() {
                    device.destroy_buffer_view(handle);
                }
            }
            ResourcePayload::TextureView {
                storage: ResourceStorage::Virtual {
                    handle,
                    ..
                },
                ..
            } => {
                if let Some(handle) = handle.take() {
                    device.destroy_texture_view(handle);
                }
            }
            _ => {}
        }
    }

    fn assert_accessible(&self) {
        assert!(
            self.rhi_access,
            "resource '{}' is not RHI-accessible: concrete handles are only valid inside an \
             execute cycle and only for resources that survived culling",
            self.name
        );
    }

    /// Concrete buffer handle.
    ///
    /// # Panics
    /// Panics if the entry is not a buffer or not currently RHI-accessible.
    pub(crate) fn rhi_buffer(&self) -> &B::Buffer {
        self.assert_accessible();
        match &self.payload {
            ResourcePayload::Buffer(storage) => storage.handle().unwrap(),
            _ => panic!("resource '{}' is not a buffer", self.name),
        }
    }

    /// Concrete texture handle.
    ///
    /// # Panics
    /// Panics if the entry is not a texture or not currently RHI-accessible.
    pub(crate) fn rhi_texture(&self) -> &B::Texture {
        self.assert_accessible();
        match &self.payload {
            ResourcePayload::Texture(storage) => storage.handle().unwrap(),
            _ => panic!("resource '{}' is not a texture", self.name),
        }
    }

    /// Concrete buffer view handle.
    ///
    /// # Panics
    /// Panics if the entry is not a buffer view or not currently RHI-accessible.
    pub(crate) fn rhi_buffer_view(&self) -> &B::BufferView {
        self.assert_accessible();
        match &self.payload {
            ResourcePayload::BufferView {
                storage,
                ..
            } => storage.handle().unwrap(),
            _ => panic!("resource '{}' is not a buffer view", self.name),
        }
    }

    /// Concrete texture view handle.
    ///
    /// # Panics
    /// Panics if the entry is not a texture view or not currently RHI-accessible.
    pub(crate) fn rhi_texture_view(&self) -> &B::TextureView {
        self.assert_accessible();
        match &self.payload {
            ResourcePayload::TextureView {
                storage,
                ..
            } => storage.handle().unwrap(),
            _ => panic!("resource '{}' is not a texture view", self.name),
        }
    }
}

/// Resolve a reference to the resource whose state barriers actually transition:
/// views resolve to their parent, everything else to itself.
pub(crate) fn actual_resource<B: Backend>(
    resources: &[ResourceEntry<B>],
    resource: ResourceRef,
) -> ResourceRef {
    resources[resource.index()].parent().unwrap_or(resource)
}
