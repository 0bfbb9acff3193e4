use anyhow::Result;

use deimos::dummy::{Command, DummyBackend, DummyComputePipeline, DummyRasterPipeline};
use deimos::{
    BufferDesc, BufferState, BufferUsage, ColorAttachmentDesc, ComputePassDesc, Device, Fence,
    QueueType, RasterPassDesc, RenderGraph, TextureState, TextureViewDesc,
};

mod framework;

#[test]
pub fn upload_then_compute_emits_one_barrier_before_the_pass() -> Result<()> {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let data = graph.create_buffer("data", framework::storage_buffer_desc());
    graph.add_copy_pass("upload", move |pass| {
        pass.write(data);
        Box::new(move |cmd, _resources| {
            cmd.marker("upload");
        })
    });
    graph.add_compute_pass("integrate", move |pass| {
        pass.read(data).set_pass_desc(ComputePassDesc {
            pipeline: Some(DummyComputePipeline::new("integrate")),
        });
        Box::new(move |cmd, resources| {
            let _data = resources.buffer(data);
            cmd.dispatch(16, 1, 1);
        })
    });

    graph.setup();
    graph.compile();
    assert!(!graph.is_culled(data));
    graph.execute(None, None)?;

    let submissions = device.submissions();
    assert_eq!(submissions.len(), 2);

    let main = &submissions[0];
    assert_eq!(main.queue_type, QueueType::Graphics);
    assert_eq!(
        main.commands,
        vec![
            Command::BufferBarrier {
                buffer: 1,
                before: BufferState::Undefined,
                after: BufferState::CopyDst,
            },
            Command::Marker("upload".into()),
            Command::BufferBarrier {
                buffer: 1,
                before: BufferState::CopyDst,
                after: BufferState::ShaderReadOnly,
            },
            Command::BeginComputePass {
                pipeline: Some("integrate".into()),
            },
            Command::Dispatch { groups: [16, 1, 1] },
            Command::EndComputePass,
        ]
    );

    // No pass asked for async compute, but the stream still submits, empty, to graphics.
    assert_eq!(submissions[1].queue_type, QueueType::Graphics);
    assert!(submissions[1].commands.is_empty());
    Ok(())
}

#[test]
pub fn main_stream_records_passes_in_registration_order() -> Result<()> {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let staging = graph.create_buffer(
        "staging",
        BufferDesc {
            size: 1024,
            usage: BufferUsage::COPY_SRC,
        },
    );
    let data = graph.create_buffer("data", framework::storage_buffer_desc());

    graph.add_copy_pass("upload", move |pass| {
        pass.read(staging).write(data);
        Box::new(move |cmd, _resources| cmd.marker("copy"))
    });
    graph.add_raster_pass("draw", move |pass| {
        pass.read(data);
        Box::new(move |cmd, _resources| cmd.draw(3, 1))
    });
    graph.add_compute_pass("post", move |pass| {
        pass.read(data);
        Box::new(move |cmd, _resources| cmd.dispatch(4, 4, 1))
    });

    graph.setup();
    graph.compile();
    graph.execute(None, None)?;

    // Reads transition before writes within a pass, states chain across passes, and the
    // final read-after-read still records its barrier even though it does not change
    // the state.
    let submissions = device.submissions();
    let main = &submissions[0];
    assert_eq!(
        main.commands,
        vec![
            Command::BufferBarrier {
                buffer: 1,
                before: BufferState::Undefined,
                after: BufferState::CopySrc,
            },
            Command::BufferBarrier {
                buffer: 2,
                before: BufferState::Undefined,
                after: BufferState::CopyDst,
            },
            Command::Marker("copy".into()),
            Command::BufferBarrier {
                buffer: 2,
                before: BufferState::CopyDst,
                after: BufferState::ShaderReadOnly,
            },
            Command::BeginGraphicsPass {
                pipeline: None,
                color_attachments: 0,
                has_depth_stencil: false,
            },
            Command::Draw {
                vertices: 3,
                instances: 1,
            },
            Command::EndGraphicsPass,
            Command::BufferBarrier {
                buffer: 2,
                before: BufferState::ShaderReadOnly,
                after: BufferState::ShaderReadOnly,
            },
            Command::BeginComputePass { pipeline: None },
            Command::Dispatch { groups: [4, 4, 1] },
            Command::EndComputePass,
        ]
    );
    Ok(())
}

#[test]
pub fn async_compute_routes_to_the_second_compute_queue() -> Result<()> {
    let device = framework::make_device_with_queues(1, 2);
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let shared = graph.create_texture("shared", framework::color_target_desc());

    graph.add_raster_pass("sample_main", move |pass| {
        pass.read(shared);
        Box::new(move |cmd, _resources| cmd.draw(3, 1))
    });
    graph.add_compute_pass("sample_async", move |pass| {
        pass.read(shared).async_compute(true);
        Box::new(move |cmd, _resources| cmd.dispatch(8, 8, 1))
    });

    graph.setup();
    graph.compile();
    graph.execute(None, None)?;

    let submissions = device.submissions();
    assert_eq!(submissions.len(), 2);

    let main = &submissions[0];
    assert_eq!(main.queue_type, QueueType::Graphics);
    assert_eq!(main.queue_index, 0);
    assert_eq!(
        main.commands,
        vec![
            Command::TextureBarrier {
                texture: 1,
                before: TextureState::Undefined,
                after: TextureState::ShaderReadOnly,
            },
            Command::BeginGraphicsPass {
                pipeline: None,
                color_attachments: 0,
                has_depth_stencil: false,
            },
            Command::Draw {
                vertices: 3,
                instances: 1,
            },
            Command::EndGraphicsPass,
        ]
    );

    // Each stream records its own barrier for the shared texture; the graph never emits
    // a cross-stream barrier, so the async one sees the state the main stream left.
    let asynchronous = &submissions[1];
    assert_eq!(asynchronous.queue_type, QueueType::Compute);
    assert_eq!(asynchronous.queue_index, 1);
    assert_eq!(
        asynchronous.commands,
        vec![
            Command::TextureBarrier {
                texture: 1,
                before: TextureState::ShaderReadOnly,
                after: TextureState::ShaderReadOnly,
            },
            Command::BeginComputePass { pipeline: None },
            Command::Dispatch { groups: [8, 8, 1] },
            Command::EndComputePass,
        ]
    );
    Ok(())
}

#[test]
pub fn async_compute_falls_back_to_the_graphics_queue() -> Result<()> {
    // A single compute queue is reserved for the main stream, so async work falls back.
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let data = graph.create_buffer("data", framework::storage_buffer_desc());
    graph.add_compute_pass("integrate", move |pass| {
        pass.read(data).async_compute(true);
        Box::new(move |cmd, _resources| cmd.dispatch(1, 1, 1))
    });

    graph.setup();
    graph.compile();
    graph.execute(None, None)?;

    let submissions = device.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].queue_type, QueueType::Graphics);
    assert!(submissions[0].commands.is_empty());
    assert_eq!(submissions[1].queue_type, QueueType::Graphics);
    assert_eq!(submissions[1].queue_index, 0);
    assert!(submissions[1]
        .commands
        .iter()
        .any(|command| matches!(command, Command::Dispatch { .. })));
    Ok(())
}

#[test]
pub fn execute_signals_the_supplied_fences() -> Result<()> {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let data = graph.create_buffer("data", framework::storage_buffer_desc());
    graph.add_compute_pass("integrate", move |pass| {
        pass.read(data);
        Box::new(move |_cmd, _resources| {})
    });

    let main_fence = device.create_fence(false)?;
    let async_fence = device.create_fence(false)?;
    assert!(!main_fence.is_signaled());

    graph.setup();
    graph.compile();
    graph.execute(Some(&main_fence), Some(&async_fence))?;

    assert!(main_fence.is_signaled());
    assert!(async_fence.is_signaled());
    main_fence.wait();

    let submissions = device.submissions();
    assert!(submissions[0].fenced);
    assert!(submissions[1].fenced);

    main_fence.reset();
    assert!(!main_fence.is_signaled());
    Ok(())
}

#[test]
pub fn raster_attachments_resolve_to_concrete_views() -> Result<()> {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let color = graph.create_texture("color", framework::color_target_desc());
    let color_view = graph.create_texture_view("color_view", color, TextureViewDesc::default());

    graph.add_raster_pass("scene", move |pass| {
        pass.write(color_view).set_pass_desc(RasterPassDesc {
            pipeline: Some(DummyRasterPipeline::new("opaque")),
            color_attachments: vec![ColorAttachmentDesc {
                view: Some(color_view),
                ..Default::default()
            }],
            depth_stencil_attachment: None,
        });
        Box::new(move |cmd, _resources| cmd.draw(36, 1))
    });
    // Reading the view and its parent downstream keeps both alive through culling.
    graph.add_compute_pass("post", move |pass| {
        pass.read(color_view).read(color);
        Box::new(move |_cmd, _resources| {})
    });

    graph.setup();
    graph.compile();
    graph.execute(None, None)?;

    let submissions = device.submissions();
    let main = &submissions[0];
    assert!(main.commands.contains(&Command::BeginGraphicsPass {
        pipeline: Some("opaque".into()),
        color_attachments: 1,
        has_depth_stencil: false,
    }));
    Ok(())
}

#[test]
#[should_panic(expected = "cannot compile a graph in the Building phase")]
pub fn compile_before_setup_panics() {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
    graph.compile();
}

#[test]
#[should_panic(expected = "cannot execute a graph in the SetupComplete phase")]
pub fn execute_before_compile_panics() {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
    graph.setup();
    let _ = graph.execute(None, None);
}

#[test]
#[should_panic(expected = "cannot execute a graph in the Executed phase")]
pub fn double_execute_panics() {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
    graph.setup();
    graph.compile();
    graph.execute(None, None).unwrap();
    let _ = graph.execute(None, None);
}

#[test]
#[should_panic(expected = "cannot register resources on a graph in the SetupComplete phase")]
pub fn registration_after_setup_panics() {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
    graph.setup();
    graph.create_buffer("late", framework::storage_buffer_desc());
}
