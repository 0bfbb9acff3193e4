use deimos::dummy::DummyDevice;
use deimos::{
    BufferDesc, BufferUsage, Extent3d, PixelFormat, TextureDesc, TextureDimension, TextureUsage,
};

/// Installs the test logger. Repeated calls are fine, only the first one takes.
pub fn setup_logging() {
    let _ = pretty_env_logger::try_init();
}

/// A dummy device with one graphics and one compute queue.
pub fn make_device() -> DummyDevice {
    setup_logging();
    DummyDevice::new()
}

/// A dummy device with the given number of graphics and compute queues.
pub fn make_device_with_queues(graphics: usize, compute: usize) -> DummyDevice {
    setup_logging();
    DummyDevice::with_queues(graphics, compute)
}

/// A small storage buffer that can also be copied into.
pub fn storage_buffer_desc() -> BufferDesc {
    BufferDesc {
        size: 1024,
        usage: BufferUsage::STORAGE | BufferUsage::COPY_DST,
    }
}

/// A small render target that can also be sampled.
pub fn color_target_desc() -> TextureDesc {
    TextureDesc {
        extent: Extent3d::new(64, 64, 1),
        mip_levels: 1,
        samples: 1,
        dimension: TextureDimension::D2,
        format: PixelFormat::Rgba8Unorm,
        usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
    }
}
