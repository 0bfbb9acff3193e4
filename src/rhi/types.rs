//! Plain data types shared between the graph and backend implementations:
//! resource descriptors, usage flags and the resource state vocabulary used
//! by barriers.

use bitflags::bitflags;

/// Size of a texture in texels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Extent3d {
    pub width: u32,
    pub height: u32,
    /// Depth for 3D textures, array layer count otherwise.
    pub depth: u32,
}

impl Extent3d {
    pub fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }
}

/// Pixel formats supported by the graph's texture descriptors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Rgba8Srgb,
    Bgra8Unorm,
    Bgra8Srgb,
    R16Float,
    Rgba16Float,
    R32Uint,
    R32Float,
    Rg32Float,
    Rgba32Float,
    Depth24PlusStencil8,
    Depth32Float,
}

/// Dimensionality of a texture resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    D1,
    D2,
    D3,
}

/// Dimensionality of a texture view.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    D1,
    D2,
    D2Array,
    Cube,
    D3,
}

/// Image aspect selected by a texture view.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureAspect {
    Color,
    Depth,
    Stencil,
    DepthStencil,
}

bitflags! {
    /// Usage flags a buffer is created with.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const MAP_READ = 1 << 0;
        const MAP_WRITE = 1 << 1;
        const COPY_SRC = 1 << 2;
        const COPY_DST = 1 << 3;
        const INDEX = 1 << 4;
        const VERTEX = 1 << 5;
        const UNIFORM = 1 << 6;
        const STORAGE = 1 << 7;
        const INDIRECT = 1 << 8;
    }
}

bitflags! {
    /// Usage flags a texture is created with.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        const COPY_SRC = 1 << 0;
        const COPY_DST = 1 << 1;
        const TEXTURE_BINDING = 1 << 2;
        const STORAGE_BINDING = 1 << 3;
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

/// Describes a buffer to be allocated by the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferDesc {
    /// Size of the buffer in bytes.
    pub size: u64,
    pub usage: BufferUsage,
}

/// Describes a texture to be allocated by the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureDesc {
    pub extent: Extent3d,
    pub mip_levels: u32,
    /// Sample count for multisampled textures, 1 otherwise.
    pub samples: u32,
    pub dimension: TextureDimension,
    pub format: PixelFormat,
    pub usage: TextureUsage,
}

/// Index element width for index buffer views.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    Uint16,
    Uint32,
}

/// How a buffer view interprets the bytes it spans.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferViewKind {
    Vertex {
        /// Stride of one vertex in bytes.
        stride: u64,
    },
    Index {
        format: IndexFormat,
    },
    Uniform,
    Storage,
}

/// Describes a view over a range of a buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BufferViewDesc {
    /// Offset into the parent buffer in bytes.
    pub offset: u64,
    /// Size of the viewed range in bytes.
    pub size: u64,
    pub kind: BufferViewKind,
}

/// Describes a view over a subresource range of a texture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureViewDesc {
    pub dimension: TextureViewDimension,
    pub aspect: TextureAspect,
    pub base_mip_level: u32,
    pub mip_level_count: u32,
    pub base_array_layer: u32,
    pub array_layer_count: u32,
}

/// A 2D color view of the first mip level and array layer.
impl Default for TextureViewDesc {
    fn default() -> Self {
        Self {
            dimension: TextureViewDimension::D2,
            aspect: TextureAspect::Color,
            base_mip_level: 0,
            mip_level_count: 1,
            base_array_layer: 0,
            array_layer_count: 1,
        }
    }
}

/// Usage state a buffer can be transitioned to. Barriers move a buffer from one
/// state to another.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferState {
    /// Initial state of every buffer, also the sentinel for an access the graph
    /// cannot classify.
    Undefined,
    CopySrc,
    CopyDst,
    ShaderReadOnly,
    Storage,
}

/// Usage state a texture can be transitioned to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TextureState {
    /// Initial state of every texture, also the sentinel for an access the graph
    /// cannot classify.
    Undefined,
    CopySrc,
    CopyDst,
    ShaderReadOnly,
    RenderTarget,
    Storage,
    DepthStencilRead,
    DepthStencilWrite,
    Present,
}

/// Color an attachment is cleared to when its load op is [`LoadOp::Clear`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for ClearColor {
    fn default() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 0.0,
        }
    }
}

/// Depth/stencil clear values.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClearDepthStencil {
    pub depth: f32,
    pub stencil: u32,
}

impl Default for ClearDepthStencil {
    fn default() -> Self {
        Self {
            depth: 1.0,
            stencil: 0,
        }
    }
}

/// What happens to an attachment's contents when a raster pass begins.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LoadOp {
    Load,
    Clear,
}

/// What happens to an attachment's contents when a raster pass ends.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Store,
    Discard,
}
