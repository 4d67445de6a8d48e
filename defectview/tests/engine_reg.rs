//! Render engine regression test
//!
//! Drives the engine the way a viewer does: load, zoom, fit, reload while
//! tiers are still building.

use defectview::io::ImageFormat;
use defectview::pyramid::{
    DeferredQueue, TaskScheduler, TierKey, TierQuality, TierState, WorkerPool,
};
use defectview::resample::ResampleMethod;
use defectview::{
    FrameSurface, PixelBuffer, RenderEngine, RenderMode, RenderOptions, RgbaBitmap, color,
};
use defectview_test::{RegParams, fixtures};
use std::sync::Arc;
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn frame(engine: &RenderEngine<FrameSurface>) -> PixelBuffer {
    engine.surface().frame().cloned().expect("frame presented")
}

#[test]
fn engine_defect_reg() {
    init_logging();
    let mut rp = RegParams::new("engine_defect");

    // --- Test 1: 4000x4000 at 0.19 keeps a single red defect ---
    let options = RenderOptions::new().with_worker_threads(0);
    let mut engine = RenderEngine::new(options, FrameSurface::new()).expect("engine");
    let src = fixtures::defect_dot(4000, 4000, 1000, 3000).expect("defect_dot");
    engine.load_image(&src).expect("load");
    let applied = engine.set_scale(0.19);
    rp.compare_values(0.19, applied, 0.0);

    let info = engine.info();
    eprintln!("  info at 0.19: {:?}", info);
    rp.compare_values(760.0, f64::from(info.display_width), 0.0);
    rp.compare_values(760.0, f64::from(info.display_height), 0.0);
    rp.compare_values(19.0, f64::from(info.scale_percent), 0.0);
    rp.compare_values(1.0, flag(info.method == ResampleMethod::BlockDefect), 0.0);
    rp.compare_values(1.0, flag(info.mode == RenderMode::Enhanced), 0.0);
    rp.compare_values(1.0, flag(info.active_tier == TierKey::Full), 0.0);

    let out = frame(&engine);
    let red = out
        .data()
        .iter()
        .filter(|&&p| color::extract_rgb(p) == (255, 0, 0))
        .count();
    rp.compare_values(1.0, flag(red >= 1), 0.0);
    // 1000 * 0.19 = 190, 3000 * 0.19 = 570
    let near = (189..=191).any(|x| (569..=571).any(|y| out.get_rgb(x, y) == Some((255, 0, 0))));
    rp.compare_values(1.0, flag(near), 0.0);

    // --- Test 2: plain averaging dilutes the same defect ---
    let plain = RenderOptions::new()
        .with_worker_threads(0)
        .with_enhance_defects(false)
        .with_pyramid(false);
    let mut engine = RenderEngine::new(plain, FrameSurface::new()).expect("engine");
    engine.load_image(&src).expect("load");
    engine.set_scale(0.19);
    rp.compare_values(1.0, flag(engine.info().method == ResampleMethod::AreaAverage), 0.0);
    let out = frame(&engine);
    let red = out
        .data()
        .iter()
        .filter(|&&p| color::extract_rgb(p) == (255, 0, 0))
        .count();
    rp.compare_values(0.0, red as f64, 0.0);

    // --- Test 3: fit a chip map into a window and keep its frame ---
    let grid = fixtures::chip_grid(1200, 900, 60, 3).expect("chip_grid");
    let mut engine = RenderEngine::new(
        RenderOptions::new().with_worker_threads(0),
        FrameSurface::new(),
    )
    .expect("engine");
    engine.load_image(&grid).expect("load");
    let s = engine.fit(310, 250);
    rp.compare_values(0.2454, s, 0.0001);
    let info = engine.info();
    rp.compare_values(294.0, f64::from(info.display_width), 0.0);
    rp.compare_values(220.0, f64::from(info.display_height), 0.0);
    let out = frame(&engine);
    let marked = out
        .data()
        .iter()
        .filter(|&&p| color::extract_rgb(p) == (0, 255, 0))
        .count();
    rp.compare_values(1.0, flag(marked > 0), 0.0);
    if rp.display() {
        rp.write_pix_and_check(&out, ImageFormat::Png)
            .expect("write frame");
    }

    assert!(rp.cleanup(), "engine defect regression test failed");
}

#[test]
fn engine_version_reg() {
    init_logging();
    let mut rp = RegParams::new("engine_version");

    let queue = Arc::new(DeferredQueue::new());
    let options = RenderOptions::new()
        .with_enhance_defects(false)
        .with_placeholder_interval(Duration::ZERO);
    let mut engine =
        RenderEngine::with_scheduler(options, FrameSurface::new(), queue.clone()).expect("engine");

    // --- Test 1: load A, load B, then A's tier jobs complete ---
    let a = fixtures::uniform(400, 400, fixtures::DEFECT_RED).expect("a");
    let b = fixtures::uniform(300, 200, fixtures::BACKGROUND).expect("b");
    engine.load_image(&a).expect("load a");
    let va = engine.version();
    engine.load_image(&b).expect("load b");
    let vb = engine.version();
    rp.compare_values(1.0, flag(vb > va), 0.0);
    rp.compare_values(4.0, queue.pending() as f64, 0.0);
    rp.compare_values(4.0, queue.run_pending() as f64, 0.0);

    let stats = engine.stats();
    eprintln!("  stats: {:?}", stats);
    rp.compare_values(2.0, stats.stale_discarded as f64, 0.0);
    rp.compare_values(2.0, stats.tiers_built as f64, 0.0);

    let info = engine.info();
    rp.compare_values(vb as f64, info.version as f64, 0.0);
    rp.compare_values(300.0, f64::from(info.original_width), 0.0);
    rp.compare_values(200.0, f64::from(info.original_height), 0.0);

    // --- Test 2: zooming after the builds only ever shows image B ---
    for scale in [0.1, 0.2, 0.4, 0.6, 1.0] {
        engine.set_scale(scale);
        let info = engine.info();
        let out = frame(&engine);
        rp.compare_values(vb as f64, info.version as f64, 0.0);
        let leaked = out
            .data()
            .iter()
            .filter(|&&p| p == fixtures::DEFECT_RED)
            .count();
        rp.compare_values(0.0, leaked as f64, 0.0);
        if info.active_tier != TierKey::Full {
            rp.compare_values(1.0, flag(info.tier_quality == TierQuality::Final), 0.0);
        }
    }
    engine.set_scale(0.2);
    rp.compare_values(1.0, flag(engine.info().active_tier == TierKey::Fifth), 0.0);

    // --- Test 3: a placeholder serves the first frame of a new image ---
    let c = fixtures::gradient(500, 500).expect("c");
    engine.load_image(&c).expect("load c");
    engine.set_scale(0.4);
    let info = engine.info();
    rp.compare_values(1.0, flag(info.active_tier == TierKey::Half), 0.0);
    rp.compare_values(1.0, flag(info.tier_quality == TierQuality::Placeholder), 0.0);
    rp.compare_values(
        1.0,
        flag(engine.pyramid().state(TierKey::Half) == TierState::Generating),
        0.0,
    );
    queue.run_pending();
    let info = engine.render().expect("render");
    rp.compare_values(1.0, flag(info.tier_quality == TierQuality::Final), 0.0);
    rp.compare_values(200.0, f64::from(info.display_width), 0.0);

    // --- Test 4: a bad load changes nothing ---
    let vc = engine.version();
    let bytes = [0u8; 7];
    rp.compare_values(
        1.0,
        flag(engine.load_image(&RgbaBitmap::new(2, 2, &bytes)).is_err()),
        0.0,
    );
    rp.compare_values(vc as f64, engine.version() as f64, 0.0);
    rp.compare_values(vc as f64, engine.info().version as f64, 0.0);

    assert!(rp.cleanup(), "engine version regression test failed");
}

#[test]
fn engine_pool_reg() {
    init_logging();
    let mut rp = RegParams::new("engine_pool");

    let pool = Arc::new(WorkerPool::new(2));
    let mut engine = RenderEngine::with_scheduler(
        RenderOptions::new(),
        FrameSurface::new(),
        pool.clone(),
    )
    .expect("engine");

    // --- Test 1: rapid reloads settle on the last image ---
    for i in 0..3u32 {
        let src = fixtures::chip_grid(800 + 40 * i, 600, 50, 2).expect("chip_grid");
        engine.load_image(&src).expect("load");
    }
    let last = fixtures::chip_grid(920, 600, 50, 2).expect("chip_grid");
    engine.load_image(&last).expect("load");
    rp.compare_values(1.0, flag(pool.wait_idle(Duration::from_secs(30))), 0.0);
    rp.compare_values(
        1.0,
        flag(engine.pyramid().state(TierKey::Half) == TierState::Ready),
        0.0,
    );

    // --- Test 2: half tier frame matches a direct stretch of the tier ---
    engine.set_scale(0.5);
    let info = engine.info();
    rp.compare_values(1.0, flag(info.active_tier == TierKey::Half), 0.0);
    rp.compare_values(1.0, flag(info.method == ResampleMethod::Stretch), 0.0);
    let tier = engine.pyramid().entry(TierKey::Half).expect("half").buffer;
    rp.compare_pix(&tier, &frame(&engine));
    rp.compare_values(f64::from(last.width() / 2), f64::from(info.display_width), 0.0);

    // --- Test 3: scale 1.0 shows the source unchanged ---
    engine.set_scale(1.0);
    rp.compare_pix(&last, &frame(&engine));

    assert!(rp.cleanup(), "engine pool regression test failed");
}

fn flag(ok: bool) -> f64 {
    if ok { 1.0 } else { 0.0 }
}
