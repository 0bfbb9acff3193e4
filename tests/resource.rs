use anyhow::Result;

use deimos::dummy::{Command, DummyBackend};
use deimos::{
    BufferDesc, BufferUsage, Device, RenderGraph, TextureState, TextureViewDesc,
};

mod framework;

#[test]
pub fn written_but_never_read_resources_are_culled() -> Result<()> {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let data = graph.create_buffer("data", framework::storage_buffer_desc());
    graph.add_copy_pass("upload", move |pass| {
        pass.write(data);
        Box::new(move |cmd, _resources| cmd.marker("upload"))
    });

    graph.setup();
    graph.compile();
    assert!(graph.is_culled(data));
    graph.execute(None, None)?;

    // Culled means never devirtualized: no allocation, no barrier, no handle access.
    assert_eq!(device.buffer_stats().created, 0);
    assert!(!graph.can_access_rhi(data));
    let submissions = device.submissions();
    let main = &submissions[0];
    assert_eq!(main.commands, vec![Command::Marker("upload".into())]);
    Ok(())
}

#[test]
pub fn live_resources_allocate_exactly_once() -> Result<()> {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let color = graph.create_texture("color", framework::color_target_desc());
    let color_view = graph.create_texture_view("color_view", color, TextureViewDesc::default());
    let data = graph.create_buffer("data", framework::storage_buffer_desc());

    graph.add_compute_pass("post", move |pass| {
        pass.read(color).read(color_view).read(data);
        Box::new(move |_cmd, resources| {
            // Views devirtualize strictly after their parents, and the device hands out
            // ids in creation order.
            assert!(resources.texture_view(color_view).id() > resources.texture(color).id());
            let _data = resources.buffer(data);
        })
    });

    graph.setup();
    graph.compile();
    assert!(!graph.is_culled(color));
    assert!(!graph.is_culled(color_view));
    assert_eq!(graph.resource_name(color), "color");
    assert_eq!(graph.parent(color_view), Some(color.into()));
    assert_eq!(graph.parent(color), None);

    assert!(!graph.can_access_rhi(color));
    graph.execute(None, None)?;
    assert!(!graph.can_access_rhi(color));

    assert_eq!(device.texture_stats().created, 1);
    assert_eq!(device.texture_view_stats().created, 1);
    assert_eq!(device.buffer_stats().created, 1);
    assert_eq!(device.buffer_view_stats().created, 0);
    Ok(())
}

#[test]
pub fn external_resources_are_never_allocated_or_destroyed() -> Result<()> {
    let device = framework::make_device();
    let staging = device.create_buffer(&BufferDesc {
        size: 1024,
        usage: BufferUsage::COPY_SRC,
    })?;
    let staging_id = staging.id();
    assert_eq!(device.buffer_stats().created, 1);

    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
    let imported = graph.import_buffer("staging", staging);
    assert!(graph.is_external(imported));

    graph.add_copy_pass("upload", move |pass| {
        pass.read(imported);
        Box::new(move |cmd, resources| {
            // Devirtualization binds the caller's handle instead of allocating.
            assert_eq!(resources.buffer(imported).id(), staging_id);
            cmd.marker("upload");
        })
    });

    graph.setup();
    graph.compile();
    assert!(!graph.is_culled(imported));
    graph.execute(None, None)?;
    assert_eq!(device.buffer_stats().created, 1);

    drop(graph);
    assert_eq!(device.buffer_stats().destroyed, 0);
    assert!(device.destroyed_buffers().is_empty());
    Ok(())
}

#[test]
pub fn imported_views_track_state_on_their_parent() -> Result<()> {
    let device = framework::make_device();
    let backbuffer_handle = device.create_texture(&framework::color_target_desc())?;
    let backbuffer_id = backbuffer_handle.id();
    let view_handle = device.create_texture_view(&backbuffer_handle, &TextureViewDesc::default())?;
    let view_id = view_handle.id();
    assert_eq!(device.texture_view_stats().created, 1);

    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
    let backbuffer = graph.import_texture("backbuffer", backbuffer_handle);
    let backbuffer_view = graph.import_texture_view("backbuffer_view", backbuffer, view_handle);

    graph.add_compute_pass("present_prep", move |pass| {
        pass.read(backbuffer_view).read(backbuffer);
        Box::new(move |cmd, resources| {
            assert_eq!(resources.texture_view(backbuffer_view).id(), view_id);
            cmd.dispatch(4, 4, 1);
        })
    });

    graph.setup();
    graph.compile();
    graph.execute(None, None)?;

    // Both touches barrier the parent texture; the view itself carries no state.
    let submissions = device.submissions();
    let main = &submissions[0];
    assert_eq!(
        main.commands,
        vec![
            Command::TextureBarrier {
                texture: backbuffer_id,
                before: TextureState::Undefined,
                after: TextureState::ShaderReadOnly,
            },
            Command::TextureBarrier {
                texture: backbuffer_id,
                before: TextureState::ShaderReadOnly,
                after: TextureState::ShaderReadOnly,
            },
            Command::BeginComputePass { pipeline: None },
            Command::Dispatch { groups: [4, 4, 1] },
            Command::EndComputePass,
        ]
    );
    assert_eq!(device.texture_view_stats().created, 1);

    drop(graph);
    assert!(device.destroyed_textures().is_empty());
    assert!(device.destroyed_texture_views().is_empty());
    Ok(())
}

#[test]
pub fn dropping_the_graph_releases_owned_handles() -> Result<()> {
    let device = framework::make_device();
    let external = device.create_texture(&framework::color_target_desc())?;
    let external_id = external.id();

    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
    let offscreen = graph.create_texture("offscreen", framework::color_target_desc());
    let offscreen_view =
        graph.create_texture_view("offscreen_view", offscreen, TextureViewDesc::default());
    let backbuffer = graph.import_texture("backbuffer", external);

    graph.add_compute_pass("post", move |pass| {
        pass.read(offscreen).read(offscreen_view).read(backbuffer);
        Box::new(move |_cmd, _resources| {})
    });

    graph.setup();
    graph.compile();
    graph.execute(None, None)?;
    drop(graph);

    assert_eq!(device.texture_stats().created, 2);
    assert_eq!(device.texture_stats().destroyed, 1);
    assert_eq!(device.texture_view_stats().destroyed, 1);
    assert!(!device.destroyed_textures().contains(&external_id));
    Ok(())
}

#[test]
#[should_panic(expected = "is not RHI-accessible")]
pub fn view_with_culled_parent_panics_at_execute() {
    let device = framework::make_device();
    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);

    let color = graph.create_texture("color", framework::color_target_desc());
    let color_view = graph.create_texture_view("color_view", color, TextureViewDesc::default());

    // Only the view is read; nothing keeps the parent texture itself alive, so the
    // view cannot be created against it.
    graph.add_compute_pass("post", move |pass| {
        pass.read(color_view);
        Box::new(move |_cmd, _resources| {})
    });

    graph.setup();
    graph.compile();
    let _ = graph.execute(None, None);
}

#[test]
#[should_panic(expected = "is not RHI-accessible")]
pub fn imported_view_over_unread_parent_panics_at_execute() {
    let device = framework::make_device();
    let backbuffer_handle = device
        .create_texture(&framework::color_target_desc())
        .expect("Can create an external texture.");
    let view_handle = device
        .create_texture_view(&backbuffer_handle, &TextureViewDesc::default())
        .expect("Can create an external texture view.");

    let mut graph: RenderGraph<DummyBackend> = RenderGraph::new(&device);
    let backbuffer = graph.import_texture("backbuffer", backbuffer_handle);
    let backbuffer_view = graph.import_texture_view("backbuffer_view", backbuffer, view_handle);

    // The parent is never read, so it is culled and its state cannot be tracked when
    // the view's barrier is recorded.
    graph.add_compute_pass("present_prep", move |pass| {
        pass.read(backbuffer_view);
        Box::new(move |_cmd, _resources| {})
    });

    graph.setup();
    graph.compile();
    let _ = graph.execute(None, None);
}
