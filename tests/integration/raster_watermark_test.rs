// End-to-end watermarking with the raster engine and real encoded images

use std::io::Cursor;
use std::sync::Arc;

use image::codecs::gif::GifEncoder;
use image::{DynamicImage, Frame, ImageFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imgmark::imaging::{
    GravityOptions, GravityType, ImageData, ImageEngine, ImageError, ImageType, ProcessingOptions,
    RasterEngine, RasterImage,
};
use imgmark::watermark::{
    prepare_watermark, Compositor, WatermarkErrorKind, WatermarkOptions, Watermarker,
};

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)
        .expect("Failed to encode test image");
    buffer.into_inner()
}

fn solid_png(width: u32, height: u32, color: Rgba<u8>) -> ImageData {
    let img = RgbaImage::from_pixel(width, height, color);
    ImageData::new(encode(DynamicImage::ImageRgba8(img), ImageFormat::Png), ImageType::Png)
}

/// A watermark with varying colour and alpha so misaligned tiles show up
fn gradient_png(width: u32, height: u32) -> ImageData {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 37 % 256) as u8,
            (y * 53 % 256) as u8,
            ((x + y) * 19 % 256) as u8,
            (64 + (x * 7 + y * 11) % 192) as u8,
        ])
    });
    ImageData::new(encode(DynamicImage::ImageRgba8(img), ImageFormat::Png), ImageType::Png)
}

fn gradient_host(width: u32, height: u32) -> RasterImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3) as u8, (y * 2) as u8, 200, 255])
    });
    RasterImage::from_dynamic(DynamicImage::ImageRgba8(img))
}

fn white_rgb_host(width: u32, height: u32) -> RasterImage {
    RasterImage::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        width,
        height,
        Rgb([255, 255, 255]),
    )))
}

fn rgb_at(img: &RasterImage, x: u32, y: u32) -> [u8; 3] {
    let Rgba([r, g, b, _]) = img.as_dynamic().to_rgba8().get_pixel(x, y).to_owned();
    [r, g, b]
}

#[test]
fn test_png_watermark_centered_on_rgb_host() {
    let engine = RasterEngine::new();
    let data = solid_png(100, 50, Rgba([255, 0, 0, 255]));
    let mut host = white_rgb_host(800, 600);

    Compositor::new(&engine, 1.0)
        .apply(&mut host, &data, &WatermarkOptions::enabled(), 1.0, 1)
        .expect("Failed to apply watermark");

    // Placed at (350, 276)
    assert_eq!(rgb_at(&host, 350, 276), [255, 0, 0]);
    assert_eq!(rgb_at(&host, 449, 325), [255, 0, 0]);
    assert_eq!(rgb_at(&host, 349, 276), [255, 255, 255]);
    assert_eq!(rgb_at(&host, 450, 326), [255, 255, 255]);
    assert_eq!(rgb_at(&host, 0, 0), [255, 255, 255]);
}

#[test]
fn test_opacity_blends_with_host() {
    let engine = RasterEngine::new();
    let data = solid_png(10, 10, Rgba([0, 0, 0, 255]));
    let mut host = white_rgb_host(10, 10);
    let opts = WatermarkOptions {
        opacity: 0.5,
        ..WatermarkOptions::enabled()
    };

    Compositor::new(&engine, 1.0)
        .apply(&mut host, &data, &opts, 1.0, 1)
        .unwrap();

    let [r, g, b] = rgb_at(&host, 5, 5);
    assert_eq!((r, g, b), (128, 128, 128));
}

#[test]
fn test_jpeg_watermark_scaled_to_share_of_host() {
    let engine = RasterEngine::new();
    let jpeg = encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([10, 200, 10]))),
        ImageFormat::Jpeg,
    );
    let data = ImageData::from_bytes(jpeg).unwrap();
    assert_eq!(data.image_type(), ImageType::Jpeg);

    let opts = WatermarkOptions {
        scale: 0.1,
        ..WatermarkOptions::enabled()
    };
    let wm = prepare_watermark(&engine, &data, &opts, 800, 600, 1.0, 1).unwrap();

    // Target 80x60, fitted keeping the square aspect
    assert_eq!((engine.width(&wm), engine.height(&wm)), (60, 60));
    assert!(!wm.has_metadata());
}

#[test]
fn test_replicated_watermark_covers_frame() {
    let engine = RasterEngine::new();
    let data = solid_png(10, 10, Rgba([0, 0, 255, 255]));
    let opts = WatermarkOptions {
        replicate: true,
        gravity: GravityOptions::new(GravityType::Center, 10.0, 10.0),
        ..WatermarkOptions::enabled()
    };

    let wm = prepare_watermark(&engine, &data, &opts, 95, 45, 1.0, 1).unwrap();

    assert_eq!((engine.width(&wm), engine.height(&wm)), (95, 45));
    assert!(wm.is_in_memory());
    // 20x20 tiles: 5px gap, 10px watermark, 5px gap
    let pixels = wm.as_dynamic().to_rgba8();
    assert_eq!(pixels.get_pixel(0, 0)[3], 0);
    assert_eq!(*pixels.get_pixel(5, 5), Rgba([0, 0, 255, 255]));
    assert_eq!(*pixels.get_pixel(25, 25), Rgba([0, 0, 255, 255]));
    assert_eq!(pixels.get_pixel(15, 15)[3], 0);
}

#[test]
fn test_replicate_fast_path_matches_per_frame_blending() {
    let engine = RasterEngine::new();
    let data = gradient_png(7, 5);
    let opts = WatermarkOptions {
        opacity: 0.7,
        replicate: true,
        gravity: GravityOptions::new(GravityType::Center, 4.0, 2.0),
        ..WatermarkOptions::enabled()
    };
    let (width, frame_height, frames) = (61u32, 37u32, 3usize);

    let mut fast = gradient_host(width, frame_height * frames as u32);
    let mut per_frame = fast.clone();

    Compositor::new(&engine, 1.0)
        .apply(&mut fast, &data, &opts, 1.0, frames)
        .unwrap();

    let wm = prepare_watermark(&engine, &data, &opts, width, frame_height, 1.0, frames).unwrap();
    engine.import_color_profile(&mut per_frame).unwrap();
    engine.to_rgb_colorspace(&mut per_frame).unwrap();
    for k in 0..frames {
        engine
            .apply_watermark(&mut per_frame, &wm, 0, (k as u32 * frame_height) as i32, 0.7)
            .unwrap();
    }

    assert_eq!(
        fast.as_dynamic().as_bytes(),
        per_frame.as_dynamic().as_bytes()
    );
}

#[test]
fn test_animated_gif_host_frames() {
    let engine = RasterEngine::new();
    let mut gif = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut gif);
        let frames = (0..3).map(|i| {
            Frame::new(RgbaImage::from_pixel(
                30,
                20,
                Rgba([i * 80, 255, 255, 255]),
            ))
        });
        encoder.encode_frames(frames).unwrap();
    }
    let host_data = ImageData::from_bytes(gif).unwrap();

    let mut host = engine.load(&host_data, 1, 1.0, 3).unwrap();
    let frames = engine.pages(&host);
    assert_eq!(frames, 3);
    assert_eq!((engine.width(&host), engine.height(&host)), (30, 60));

    let wm = solid_png(4, 4, Rgba([0, 0, 0, 255]));
    let opts = WatermarkOptions {
        gravity: GravityOptions::new(GravityType::NorthWest, 0.0, 0.0),
        ..WatermarkOptions::enabled()
    };
    Compositor::new(&engine, 1.0)
        .apply(&mut host, &wm, &opts, 1.0, frames)
        .unwrap();

    for top in [0, 20, 40] {
        assert_eq!(rgb_at(&host, 1, top + 1), [0, 0, 0]);
        assert_ne!(rgb_at(&host, 10, top + 10), [0, 0, 0]);
    }
}

#[test]
fn test_grayscale_host_converted_to_rgb() {
    let engine = RasterEngine::new();
    let mut host = RasterImage::from_dynamic(DynamicImage::ImageLuma8(
        image::GrayImage::from_pixel(20, 20, Luma([200])),
    ));
    let data = solid_png(4, 4, Rgba([255, 0, 0, 255]));

    Compositor::new(&engine, 1.0)
        .apply(&mut host, &data, &WatermarkOptions::enabled(), 1.0, 1)
        .unwrap();

    assert!(matches!(host.as_dynamic(), DynamicImage::ImageRgb8(_)));
    assert_eq!(rgb_at(&host, 9, 9), [255, 0, 0]);
    assert_eq!(rgb_at(&host, 0, 0), [200, 200, 200]);
}

#[test]
fn test_undecodable_watermark_leaves_host_unmodified() {
    let engine = RasterEngine::new();
    let broken = Arc::new(ImageData::new(b"definitely not a png".to_vec(), ImageType::Png));
    let watermarker = Watermarker::new(engine, Some(broken), 1.0);
    let mut host = white_rgb_host(64, 64);
    let before = host.as_dynamic().as_bytes().to_vec();
    let po = ProcessingOptions {
        watermark: WatermarkOptions::enabled(),
        ..ProcessingOptions::default()
    };

    let err = watermarker.watermark(&mut host, &po, 1.0).unwrap_err();

    assert_eq!(err.kind(), WatermarkErrorKind::Load);
    assert!(matches!(
        err.image_error(),
        ImageError::DecodeFailed { .. } | ImageError::UnsupportedFormat { .. }
    ));
    assert_eq!(host.as_dynamic().as_bytes(), before.as_slice());
}

#[test]
fn test_sequential_watermark_cannot_be_read_twice() {
    let engine = RasterEngine::new();
    let wm = engine
        .load(&solid_png(4, 4, Rgba([0, 0, 0, 255])), 1, 1.0, 1)
        .unwrap();
    let mut host = white_rgb_host(16, 16);

    engine.apply_watermark(&mut host, &wm, 0, 0, 1.0).unwrap();
    assert_eq!(
        engine.apply_watermark(&mut host, &wm, 8, 8, 1.0),
        Err(ImageError::SequentialReread)
    );
}

#[test]
fn test_concurrent_watermarking() {
    let data = Arc::new(gradient_png(16, 16));
    let watermarker = Arc::new(Watermarker::new(RasterEngine::new(), Some(data), 0.8));
    let po = ProcessingOptions {
        watermark: WatermarkOptions {
            gravity: GravityOptions::new(GravityType::SouthEast, 0.05, 0.05),
            ..WatermarkOptions::enabled()
        },
        ..ProcessingOptions::default()
    };

    let results: Vec<Vec<u8>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let watermarker = Arc::clone(&watermarker);
                let po = po.clone();
                scope.spawn(move || {
                    let mut host = gradient_host(128, 96);
                    watermarker.watermark(&mut host, &po, 2.0).unwrap();
                    host.into_dynamic().into_bytes()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}
