//! Barrier synthesis: a per-resource state-tracking sweep over the pass list.
//!
//! For every resource a pass touches, the synthesizer records the transition from the
//! resource's last known state to the state the touch requires. The sweep visits passes in
//! registration order, which is also the order commands are recorded in, so the "before"
//! state of every transition reflects the true predecessor access in program order.

use std::collections::HashMap;

use crate::graph::pass::{PassKind, PassNode};
use crate::graph::resource::{actual_resource, BufferRef, ResourceEntry, ResourceRef, TextureRef};
use crate::rhi::{Backend, BufferState, TextureState};

/// How a pass touches a resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum AccessKind {
    Read,
    Write,
}

/// A state transition one pass requires on one resource, recorded as a barrier
/// immediately before that pass's commands. No-op transitions (`before == after`)
/// are kept and issued like any other.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ResourceTransition {
    Buffer {
        before: BufferState,
        after: BufferState,
    },
    Texture {
        before: TextureState,
        after: TextureState,
    },
}

/// Target state of a buffer for one (pass kind, access kind) touch. The kind enums are
/// closed, so every combination maps to a definite state; [`BufferState::Undefined`] only
/// ever appears as the initial last-known state.
pub(crate) fn buffer_target_state(pass: PassKind, access: AccessKind) -> BufferState {
    match (pass, access) {
        (PassKind::Copy, AccessKind::Read) => BufferState::CopySrc,
        (PassKind::Copy, AccessKind::Write) => BufferState::CopyDst,
        (PassKind::Compute, AccessKind::Read) => BufferState::ShaderReadOnly,
        (PassKind::Compute, AccessKind::Write) => BufferState::Storage,
        (PassKind::Raster, AccessKind::Read) => BufferState::ShaderReadOnly,
        // Buffers have no render-target state; raster writes land in storage.
        (PassKind::Raster, AccessKind::Write) => BufferState::Storage,
    }
}

/// Target state of a texture for one (pass kind, access kind) touch.
pub(crate) fn texture_target_state(pass: PassKind, access: AccessKind) -> TextureState {
    match (pass, access) {
        (PassKind::Copy, AccessKind::Read) => TextureState::CopySrc,
        (PassKind::Copy, AccessKind::Write) => TextureState::CopyDst,
        (PassKind::Compute, AccessKind::Read) => TextureState::ShaderReadOnly,
        (PassKind::Compute, AccessKind::Write) => TextureState::Storage,
        (PassKind::Raster, AccessKind::Read) => TextureState::ShaderReadOnly,
        (PassKind::Raster, AccessKind::Write) => TextureState::RenderTarget,
    }
}

/// Sweep the pass list and compute the transition every (resource, pass) touch requires.
///
/// The table is keyed by the resource reference as the pass declared it; state is tracked
/// on the actual resource behind it, so touches through different views of one
/// buffer/texture chain correctly. Within a pass, reads are processed before writes, and a
/// resource both read and written keeps the write's transition chained after the read's.
/// Culled resources are skipped, they are never devirtualized so no barrier may reference
/// them.
pub(crate) fn synthesize_transitions<B: Backend>(
    resources: &[ResourceEntry<B>],
    passes: &[PassNode<'_, B>],
) -> HashMap<(ResourceRef, usize), ResourceTransition> {
    let mut buffer_states: HashMap<BufferRef, BufferState> = HashMap::new();
    let mut texture_states: HashMap<TextureRef, TextureState> = HashMap::new();
    let mut transitions = HashMap::new();

    for (pass_index, pass) in passes.iter().enumerate() {
        let kind = pass.kind();
        let touches = pass
            .reads
            .iter()
            .map(|&resource| (resource, AccessKind::Read))
            .chain(pass.writes.iter().map(|&resource| (resource, AccessKind::Write)));
        for (resource, access) in touches {
            if resources[resource.index()].culled {
                continue;
            }
            let transition = match actual_resource(resources, resource) {
                ResourceRef::Buffer(parent) => {
                    let after = buffer_target_state(kind, access);
                    let before = buffer_states
                        .insert(parent, after)
                        .unwrap_or(BufferState::Undefined);
                    ResourceTransition::Buffer {
                        before,
                        after,
                    }
                }
                ResourceRef::Texture(parent) => {
                    let after = texture_target_state(kind, access);
                    let before = texture_states
                        .insert(parent, after)
                        .unwrap_or(TextureState::Undefined);
                    ResourceTransition::Texture {
                        before,
                        after,
                    }
                }
                _ => unreachable!("actual resource is never a view"),
            };
            transitions.insert((resource, pass_index), transition);
        }
    }

    transitions
}

/// Indices of non-culled resources touched by both command streams. The graph emits no
/// cross-stream barrier for these; ordering between the streams is the caller's burden,
/// so compile reports them instead of silently patching the gap.
pub(crate) fn cross_stream_resources<B: Backend>(
    resources: &[ResourceEntry<B>],
    passes: &[PassNode<'_, B>],
) -> Vec<usize> {
    let mut on_main = vec![false; resources.len()];
    let mut on_async = vec![false; resources.len()];

    for pass in passes {
        let touched = if pass.is_async_compute() {
            &mut on_async
        } else {
            &mut on_main
        };
        for &resource in pass.reads.iter().chain(pass.writes.iter()) {
            if resources[resource.index()].culled {
                continue;
            }
            touched[actual_resource(resources, resource).index()] = true;
        }
    }

    (0..resources.len())
        .filter(|&index| on_main[index] && on_async[index])
        .collect()
}
