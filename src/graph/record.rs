//! The execution driver: devirtualizes surviving resources, records both command
//! streams with their precomputed barriers, and submits them.
//!
//! Recording walks the pass list in registration order. Every pass lands in the main
//! stream except compute passes flagged async, which land in the async-compute stream.
//! Barriers for the resources a pass touches are recorded immediately before the pass's
//! own commands, into the same stream.

use std::collections::HashMap;
use std::mem;

use anyhow::Result;

use crate::error::Error;
use crate::graph::pass::{PassKindState, PassNode, PassStage, RasterPassDesc};
use crate::graph::resource::{
    actual_resource, BufferRef, BufferViewRef, ResourceEntry, ResourcePayload, ResourceRef,
    ResourceStorage, TextureRef, TextureViewRef,
};
use crate::graph::transition::ResourceTransition;
use crate::rhi::{
    Backend, BufferViewDesc, ColorAttachment, CommandBuffer, CommandEncoder,
    ComputePassBeginInfo, ComputePassEncoder, DepthStencilAttachment, Device,
    GraphicsPassBeginInfo, GraphicsPassEncoder, Queue, QueueType, ResourceBarrier,
    TextureViewDesc,
};

/// Resolves graph references to the concrete backend handles behind them, for one pass's
/// execute closure.
///
/// Handles resolve only while the graph is inside its execute cycle and only for
/// resources that survived culling; anything else is a caller contract breach.
#[derive(Derivative)]
#[derivative(Debug(bound = ""))]
pub struct PassResources<'g, B: Backend> {
    entries: &'g [ResourceEntry<B>],
}

impl<'g, B: Backend> PassResources<'g, B> {
    /// Concrete handle behind `buffer`.
    ///
    /// # Panics
    /// Panics if the resource was culled or is not currently accessible.
    pub fn buffer(&self, buffer: BufferRef) -> &'g B::Buffer {
        self.entries[buffer.0 as usize].rhi_buffer()
    }

    /// Concrete handle behind `texture`.
    ///
    /// # Panics
    /// Panics if the resource was culled or is not currently accessible.
    pub fn texture(&self, texture: TextureRef) -> &'g B::Texture {
        self.entries[texture.0 as usize].rhi_texture()
    }

    /// Concrete handle behind `view`.
    ///
    /// # Panics
    /// Panics if the resource was culled or is not currently accessible.
    pub fn buffer_view(&self, view: BufferViewRef) -> &'g B::BufferView {
        self.entries[view.0 as usize].rhi_buffer_view()
    }

    /// Concrete handle behind `view`.
    ///
    /// # Panics
    /// Panics if the resource was culled or is not currently accessible.
    pub fn texture_view(&self, view: TextureViewRef) -> &'g B::TextureView {
        self.entries[view.0 as usize].rhi_texture_view()
    }
}

/// Record and submit one compiled graph. Called by
/// [`RenderGraph::execute`](crate::graph::RenderGraph::execute) once the phase checks
/// passed.
pub(crate) fn record_and_submit<B: Backend>(
    device: &B::Device,
    resources: &mut [ResourceEntry<B>],
    passes: &mut [PassNode<'_, B>],
    transitions: &HashMap<(ResourceRef, usize), ResourceTransition>,
    main_fence: Option<&B::Fence>,
    async_fence: Option<&B::Fence>,
) -> Result<()> {
    devirtualize(device, resources)?;

    let (graphics_queue, async_queue) = queues::<B>(device)?;

    let mut main_commands = device.create_command_buffer()?;
    let mut async_commands = device.create_command_buffer()?;
    let mut main_encoder = main_commands.begin();
    let mut async_encoder = async_commands.begin();

    let mut main_passes = 0usize;
    let mut async_passes = 0usize;

    for (pass_index, pass) in passes.iter_mut().enumerate() {
        let encoder = if pass.is_async_compute() {
            async_passes += 1;
            &mut async_encoder
        } else {
            main_passes += 1;
            &mut main_encoder
        };
        let entries: &[ResourceEntry<B>] = resources;

        emit_barriers(encoder, entries, transitions, pass, pass_index);

        let pass_resources = PassResources {
            entries,
        };
        match &mut pass.kind {
            PassKindState::Copy {
                stage,
            } => {
                trace!("recording copy pass '{}'", pass.name);
                let execute = take_ready(stage, &pass.name);
                execute(encoder, &pass_resources);
            }
            PassKindState::Compute {
                desc,
                stage,
                ..
            } => {
                trace!("recording compute pass '{}'", pass.name);
                let execute = take_ready(stage, &pass.name);
                let mut pass_encoder = encoder.begin_compute_pass(ComputePassBeginInfo {
                    pipeline: desc.pipeline.clone(),
                });
                execute(&mut pass_encoder, &pass_resources);
                pass_encoder.end_pass();
            }
            PassKindState::Raster {
                desc,
                stage,
            } => {
                trace!("recording raster pass '{}'", pass.name);
                let execute = take_ready(stage, &pass.name);
                let mut pass_encoder =
                    encoder.begin_graphics_pass(resolve_graphics_begin_info(desc, &pass_resources));
                execute(&mut pass_encoder, &pass_resources);
                pass_encoder.end_pass();
            }
        }
    }

    main_encoder.end();
    async_encoder.end();

    debug!(
        "submitting main stream ({} passes, fence: {}) and async stream ({} passes, fence: {})",
        main_passes,
        main_fence.is_some(),
        async_passes,
        async_fence.is_some()
    );
    graphics_queue.submit(&main_commands, main_fence)?;
    async_queue.submit(&async_commands, async_fence)?;

    // The execute cycle is over; handles stay alive until the graph is dropped but may
    // no longer be resolved.
    for entry in resources.iter_mut() {
        entry.rhi_access = false;
    }

    Ok(())
}

/// Allocate concrete handles for every non-culled resource and mark them accessible.
/// Buffers and textures are devirtualized strictly before any view, since views are
/// created against their parent's handle.
fn devirtualize<B: Backend>(device: &B::Device, resources: &mut [ResourceEntry<B>]) -> Result<()> {
    for entry in resources.iter_mut() {
        if entry.culled || entry.is_view() {
            continue;
        }
        match &mut entry.payload {
            ResourcePayload::Buffer(ResourceStorage::Virtual {
                desc,
                handle,
            }) => {
                if handle.is_none() {
                    trace!("devirtualizing buffer '{}'", entry.name);
                    *handle = Some(device.create_buffer(desc)?);
                }
            }
            ResourcePayload::Texture(ResourceStorage::Virtual {
                desc,
                handle,
            }) => {
                if handle.is_none() {
                    trace!("devirtualizing texture '{}'", entry.name);
                    *handle = Some(device.create_texture(desc)?);
                }
            }
            // External resources come with their handle.
            _ => {}
        }
        entry.rhi_access = true;
    }

    enum ViewRequest {
        Buffer(BufferRef, BufferViewDesc),
        Texture(TextureRef, TextureViewDesc),
    }

    for index in 0..resources.len() {
        let entry = &resources[index];
        if entry.culled || !entry.is_view() {
            continue;
        }
        let request = match &entry.payload {
            ResourcePayload::BufferView {
                parent,
                storage:
                    ResourceStorage::Virtual {
                        desc,
                        handle: None,
                    },
            } => Some(ViewRequest::Buffer(*parent, *desc)),
            ResourcePayload::TextureView {
                parent,
                storage:
                    ResourceStorage::Virtual {
                        desc,
                        handle: None,
                    },
            } => Some(ViewRequest::Texture(*parent, *desc)),
            // External views come with their handle; views already devirtualized keep it.
            _ => None,
        };
        match request {
            Some(ViewRequest::Buffer(parent, desc)) => {
                // The access-gated lookup makes a culled parent a caller bug, not a
                // dangling view.
                let parent_handle = resources[parent.0 as usize].rhi_buffer().clone();
                trace!("devirtualizing buffer view '{}'", resources[index].name);
                let view = device.create_buffer_view(&parent_handle, &desc)?;
                store_buffer_view(&mut resources[index], view);
            }
            Some(ViewRequest::Texture(parent, desc)) => {
                let parent_handle = resources[parent.0 as usize].rhi_texture().clone();
                trace!("devirtualizing texture view '{}'", resources[index].name);
                let view = device.create_texture_view(&parent_handle, &desc)?;
                store_texture_view(&mut resources[index], view);
            }
            None => {}
        }
        resources[index].rhi_access = true;
    }

    Ok(())
}

fn store_buffer_view<B: Backend>(entry: &mut ResourceEntry<B>, view: B::BufferView) {
    match &mut entry.payload {
        ResourcePayload::BufferView {
            storage: ResourceStorage::Virtual {
                handle,
                ..
            },
            ..
        } => *handle = Some(view),
        _ => unreachable!("devirtualization requests only name virtual buffer views"),
    }
}

fn store_texture_view<B: Backend>(entry: &mut ResourceEntry<B>, view: B::TextureView) {
    match &mut entry.payload {
        ResourcePayload::TextureView {
            storage: ResourceStorage::Virtual {
                handle,
                ..
            },
            ..
        } => *handle = Some(view),
        _ => unreachable!("devirtualization requests only name virtual texture views"),
    }
}

/// Pick the queues both streams submit to: the main stream always goes to graphics
/// queue 0; the async stream goes to compute queue 1 when the device exposes more than
/// one compute queue and falls back to the graphics queue otherwise.
fn queues<B: Backend>(device: &B::Device) -> Result<(&B::Queue, &B::Queue)> {
    let graphics = device
        .queue(QueueType::Graphics, 0)
        .ok_or(Error::NoCapableQueue(QueueType::Graphics))?;
    let asynchronous = if device.queue_count(QueueType::Compute) > 1 {
        device
            .queue(QueueType::Compute, 1)
            .ok_or(Error::NoCapableQueue(QueueType::Compute))?
    } else {
        graphics
    };
    Ok((graphics, asynchronous))
}

/// Record the precomputed transition for every non-culled resource `pass` touches, reads
/// before writes in declaration order, into the pass's own stream. A resource both read
/// and written is touched twice and gets its transition issued per touch.
fn emit_barriers<B: Backend>(
    encoder: &mut B::CommandEncoder,
    resources: &[ResourceEntry<B>],
    transitions: &HashMap<(ResourceRef, usize), ResourceTransition>,
    pass: &PassNode<'_, B>,
    pass_index: usize,
) {
    for &resource in pass.reads.iter().chain(pass.writes.iter()) {
        if resources[resource.index()].culled {
            continue;
        }
        let transition = transitions.get(&(resource, pass_index)).unwrap_or_else(|| {
            panic!(
                "no transition recorded for resource '{}' touched by pass '{}'",
                resources[resource.index()].name,
                pass.name
            )
        });
        let actual = &resources[actual_resource(resources, resource).index()];
        let barrier = match transition {
            ResourceTransition::Buffer {
                before,
                after,
            } => ResourceBarrier::buffer_transition(actual.rhi_buffer().clone(), *before, *after),
            ResourceTransition::Texture {
                before,
                after,
            } => ResourceBarrier::texture_transition(actual.rhi_texture().clone(), *before, *after),
        };
        encoder.resource_barrier(barrier);
    }
}

/// Take a pass's execute closure out of its stage slot.
fn take_ready<S, E>(stage: &mut PassStage<S, E>, name: &str) -> E {
    match mem::replace(stage, PassStage::Executed) {
        PassStage::Ready(execute) => execute,
        _ => panic!("pass '{}' has no pending execute closure", name),
    }
}

/// Resolve a raster pass's attachment references to concrete view handles.
///
/// # Panics
/// Panics if an attachment references a culled or inaccessible view.
fn resolve_graphics_begin_info<B: Backend>(
    desc: &RasterPassDesc<B>,
    resources: &PassResources<'_, B>,
) -> GraphicsPassBeginInfo<B> {
    GraphicsPassBeginInfo {
        pipeline: desc.pipeline.clone(),
        color_attachments: desc
            .color_attachments
            .iter()
            .map(|attachment| ColorAttachment {
                view: attachment.view.map(|view| resources.texture_view(view).clone()),
                resolve: attachment.resolve.map(|view| resources.texture_view(view).clone()),
                clear_value: attachment.clear_value,
                load_op: attachment.load_op,
                store_op: attachment.store_op,
            })
            .collect(),
        depth_stencil_attachment: desc.depth_stencil_attachment.as_ref().map(|attachment| {
            DepthStencilAttachment {
                view: attachment.view.map(|view| resources.texture_view(view).clone()),
                clear_value: attachment.clear_value,
                depth_load_op: attachment.depth_load_op,
                depth_store_op: attachment.depth_store_op,
                depth_read_only: attachment.depth_read_only,
                stencil_load_op: attachment.stencil_load_op,
                stencil_store_op: attachment.stencil_store_op,
                stencil_read_only: attachment.stencil_read_only,
            }
        }),
    }
}
