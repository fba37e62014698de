// Transform pipeline unit tests driven by the mock engine

use imgmark::imaging::{
    EngineCall, ImageData, ImageEngine, ImageType, Insets, MockEngine, MockOp, Orientation,
    PaddingOptions, ProcessingOptions, ResizingType,
};
use imgmark::pipeline::Pipeline;

fn png() -> ImageData {
    ImageData::new(vec![0u8; 8], ImageType::Png)
}

fn fit(width: u32, height: u32) -> ProcessingOptions {
    ProcessingOptions {
        width,
        height,
        resizing_type: ResizingType::Fit,
        enlarge: true,
        ..ProcessingOptions::default()
    }
}

#[test]
fn test_watermark_pipeline_stage_order() {
    let pipeline = Pipeline::<MockEngine>::watermark();
    assert_eq!(
        pipeline.stage_names(),
        vec![
            "prepare",
            "scale-on-load",
            "import-color-profile",
            "scale",
            "rotate-and-flip",
            "padding"
        ]
    );
}

#[test]
fn test_full_run_issues_operations_in_order() {
    let engine = MockEngine::new(100, 50);
    engine.set_source_orientation(Orientation::from_exif(3));
    let mut img = engine.load(&png(), 1, 1.0, 1).unwrap();
    let po = ProcessingOptions {
        padding: PaddingOptions {
            enabled: true,
            insets: Insets::new(2, 2, 2, 2),
        },
        ..fit(200, 200)
    };

    let ctx = Pipeline::watermark().run(&engine, &mut img, &po, &png()).unwrap();

    let ops: Vec<MockOp> = engine.calls().iter().map(EngineCall::op).collect();
    assert_eq!(
        ops,
        vec![
            MockOp::Load,
            MockOp::ImportColorProfile,
            MockOp::Resize,
            MockOp::RotateAndFlip,
            MockOp::Embed
        ]
    );
    assert_eq!((ctx.target_width, ctx.target_height), (200, 100));
    assert_eq!((img.width(), img.height()), (204, 104));
}

#[test]
fn test_import_color_profile_is_idempotent() {
    let engine = MockEngine::new(100, 50);
    let mut img = engine.load(&png(), 1, 1.0, 1).unwrap();
    let pipeline = Pipeline::watermark();

    pipeline.run(&engine, &mut img, &fit(0, 0), &png()).unwrap();
    pipeline.run(&engine, &mut img, &fit(0, 0), &png()).unwrap();

    assert_eq!(engine.calls_of(MockOp::ImportColorProfile).len(), 1);
    assert!(engine.color_profile_imported(&img));
}

#[test]
fn test_fail_fast_stops_later_stages() {
    let engine = MockEngine::new(100, 50);
    engine.fail_on(MockOp::ImportColorProfile);
    let mut img = engine.load(&png(), 1, 1.0, 1).unwrap();

    let err = Pipeline::watermark()
        .run(&engine, &mut img, &fit(300, 300), &png())
        .unwrap_err();

    assert_eq!(err.stage, "import-color-profile");
    assert!(engine.calls_of(MockOp::Resize).is_empty());
    assert_eq!((img.width(), img.height()), (100, 50));
}

#[test]
fn test_jpeg_shrink_on_load_replaces_image() {
    let engine = MockEngine::new(1600, 1200);
    let jpeg = ImageData::new(vec![0u8; 8], ImageType::Jpeg);
    let mut img = engine.load(&jpeg, 1, 1.0, 1).unwrap();

    let ctx = Pipeline::watermark()
        .run(&engine, &mut img, &fit(400, 400), &jpeg)
        .unwrap();

    assert_eq!(
        engine.calls_of(MockOp::Load)[1],
        EngineCall::Load {
            shrink: 4,
            scale: 0.25,
            pages: 1
        }
    );
    // 1600x1200 / 4 = 400x300, already the target size
    assert_eq!((ctx.target_width, ctx.target_height), (400, 300));
    assert!(engine.calls_of(MockOp::Resize).is_empty());
    assert_eq!(engine.live_images(), 1);
}

#[test]
fn test_requested_rotation_swaps_resize_axes() {
    let engine = MockEngine::new(100, 50);
    let mut img = engine.load(&png(), 1, 1.0, 1).unwrap();
    let po = ProcessingOptions {
        rotate: 90,
        ..fit(25, 0)
    };

    Pipeline::watermark().run(&engine, &mut img, &po, &png()).unwrap();

    assert!(engine.calls().contains(&EngineCall::Resize {
        image: img.id(),
        width: 50,
        height: 25
    }));
    assert_eq!((img.width(), img.height()), (25, 50));
}
