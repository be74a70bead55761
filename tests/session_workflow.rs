use std::{io::Cursor, sync::Arc, sync::mpsc, time::Duration};

use crop_studio::{
    AspectRatio, CanvasSize, Corner, CropError, CropRect, CropSession, CropperSettings, HitResult,
    ImageSource, LoadOutcome, SessionPhase, SourceImage,
};
use eframe::egui::{pos2, vec2};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

fn gradient(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, ((x + 2 * y) % 256) as u8, 255])
    })
}

fn png_bytes(image: RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn open(w: u32, h: u32, aspect: AspectRatio) -> CropSession {
    CropSession::open(
        Arc::new(SourceImage::new(gradient(w, h))),
        aspect,
        CropperSettings::default(),
    )
    .expect("open session")
}

#[test]
fn resize_through_display_space_then_commit() {
    let mut session = open(400, 400, AspectRatio::Original);
    assert_eq!(session.crop_rect(), Some(CropRect::new(0.0, 0.0, 400.0, 400.0)));

    // canvas is 400x400, shown at half size
    let displayed = vec2(200.0, 200.0);
    assert_eq!(
        session.pointer_down(pos2(199.0, 199.0), displayed),
        HitResult::Corner(Corner::SouthEast)
    );
    assert!(session.pointer_move(pos2(75.0, 65.0), displayed));
    session.pointer_up();
    assert!(!session.is_dragging());
    assert_eq!(session.crop_rect(), Some(CropRect::new(0.0, 0.0, 150.0, 130.0)));

    let output = session.commit().expect("commit");
    assert_eq!((output.width, output.height), (150, 130));
    let decoded = image::load_from_memory(&output.png).unwrap().to_rgba8();
    let source = gradient(400, 400);
    assert_eq!(decoded.get_pixel(149, 129), source.get_pixel(149, 129));
    assert_eq!(decoded.get_pixel(0, 0), source.get_pixel(0, 0));
}

#[test]
fn move_inside_letterboxed_canvas() {
    let mut session = open(400, 400, AspectRatio::Square);
    session.change_aspect_ratio(AspectRatio::R16_9);
    let rect = session.crop_rect().unwrap();
    assert_eq!(rect.x, 0.0);
    assert!((rect.height - 225.0).abs() < 1e-3);

    // 800x400 canvas: image drawn at scale 1 with 200px side margins
    session.set_canvas_size(CanvasSize::new(800, 400));
    let displayed = vec2(800.0, 400.0);
    assert_eq!(session.pointer_down(pos2(400.0, 200.0), displayed), HitResult::Move);
    session.pointer_move(pos2(400.0, 600.0), displayed);
    session.pointer_up();

    let rect = session.crop_rect().unwrap();
    assert_eq!(rect.x, 0.0);
    assert!((rect.bottom() - 400.0).abs() < 1e-3);
    let canvas = session.render().expect("rendered canvas");
    assert_eq!(canvas.dimensions(), (800, 400));
}

#[test]
fn press_outside_region_does_nothing() {
    let mut session = open(400, 400, AspectRatio::R16_9);
    let before = session.crop_rect();
    let displayed = vec2(400.0, 400.0);
    assert_eq!(session.pointer_down(pos2(200.0, 10.0), displayed), HitResult::None);
    assert!(!session.pointer_move(pos2(300.0, 300.0), displayed));
    assert_eq!(session.crop_rect(), before);
}

#[test]
fn gesture_blocks_second_press_and_ratio_change() {
    let mut session = open(400, 400, AspectRatio::Original);
    let displayed = vec2(400.0, 400.0);
    assert_eq!(session.pointer_down(pos2(200.0, 200.0), displayed), HitResult::Move);
    assert_eq!(session.pointer_down(pos2(5.0, 5.0), displayed), HitResult::None);
    session.change_aspect_ratio(AspectRatio::Square);
    assert_eq!(session.aspect_ratio(), AspectRatio::Original);
    session.pointer_up();
    session.change_aspect_ratio(AspectRatio::Square);
    assert_eq!(session.aspect_ratio(), AspectRatio::Square);
}

#[test]
fn ratio_change_twice_is_stable() {
    let mut session = open(1024, 600, AspectRatio::Original);
    session.change_aspect_ratio(AspectRatio::R3_4);
    let first = session.crop_rect();
    session.change_aspect_ratio(AspectRatio::R3_4);
    assert_eq!(session.crop_rect(), first);
}

#[test]
fn latest_background_load_wins() {
    let mut session = CropSession::new(CropperSettings::default(), AspectRatio::Original);
    let (tx, rx) = mpsc::channel();
    let first = session.load(ImageSource::Bytes(png_bytes(gradient(300, 200))), tx.clone());
    let second = session.load(ImageSource::Bytes(png_bytes(gradient(120, 90))), tx);
    assert!(second > first);
    assert_eq!(session.phase(), &SessionPhase::Loading { generation: second });
    assert_eq!(session.commit().unwrap_err(), CropError::NotReady);

    let mut applied = 0;
    for _ in 0..2 {
        let message = rx.recv_timeout(Duration::from_secs(10)).expect("load message");
        let generation = message.generation;
        match session.finish_load(message) {
            LoadOutcome::Applied => {
                assert_eq!(generation, second);
                applied += 1;
            }
            LoadOutcome::Stale => assert_eq!(generation, first),
            LoadOutcome::Failed(err) => panic!("unexpected failure: {err}"),
        }
    }
    assert_eq!(applied, 1);
    assert_eq!(session.crop_rect(), Some(CropRect::new(0.0, 0.0, 120.0, 90.0)));
}

#[test]
fn corrupt_image_fails_the_session() {
    let mut session = CropSession::new(CropperSettings::default(), AspectRatio::Original);
    let (tx, rx) = mpsc::channel();
    session.load(ImageSource::Bytes(b"not an image".to_vec()), tx);
    let message = rx.recv_timeout(Duration::from_secs(10)).expect("load message");
    assert!(matches!(
        session.finish_load(message),
        LoadOutcome::Failed(CropError::ImageLoadFailure { .. })
    ));
    assert!(matches!(session.phase(), SessionPhase::Failed(_)));
    assert_eq!(
        session.pointer_down(pos2(1.0, 1.0), vec2(10.0, 10.0)),
        HitResult::None
    );
    assert!(session.commit().is_err());
}

#[test]
fn committed_data_uri_reopens() {
    let mut session = open(300, 300, AspectRatio::Square);
    let displayed = vec2(300.0, 300.0);
    session.pointer_down(pos2(299.0, 299.0), displayed);
    session.pointer_move(pos2(100.0, 100.0), displayed);
    session.pointer_up();
    let output = session.commit().expect("commit");
    assert_eq!((output.width, output.height), (100, 100));
    session.cancel();

    let reopened = ImageSource::DataUri(output.to_data_uri())
        .decode()
        .expect("decode data uri");
    assert_eq!(reopened.pixels(), &output.pixels);
}

#[test]
fn saved_result_is_a_png_file() {
    let session = open(120, 80, AspectRatio::Original);
    let output = session.commit().expect("commit");
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("crop.png");
    output.save(&path).expect("save");
    let reloaded = image::open(&path).expect("reopen").to_rgba8();
    assert_eq!(reloaded.dimensions(), (120, 80));
}

#[test]
fn failed_save_keeps_session_open_for_retry() {
    let mut session = open(200, 160, AspectRatio::Original);
    let temp = tempfile::tempdir().expect("tempdir");
    let output = session.commit().expect("commit");
    let err = output
        .save(&temp.path().join("no-such-dir").join("crop.png"))
        .unwrap_err();
    assert!(matches!(err, CropError::RasterizationFailure(_)));

    // still interactive after the failure
    assert!(session.is_ready());
    let displayed = vec2(200.0, 160.0);
    assert_eq!(
        session.pointer_down(pos2(199.0, 159.0), displayed),
        HitResult::Corner(Corner::SouthEast)
    );
    session.pointer_move(pos2(100.0, 80.0), displayed);
    session.pointer_up();
    let retry = session.commit().expect("second commit");
    assert_eq!((retry.width, retry.height), (100, 80));
    let path = temp.path().join("crop.png");
    retry.save(&path).expect("save on retry");
    assert!(path.exists());
}
