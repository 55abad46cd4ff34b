use std::path::PathBuf;

use zenraster::*;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("zenraster-{}-{name}", std::process::id()))
}

#[test]
fn extensions_map_case_insensitively() {
    for (ext, expected) in [
        ("jpg", ImageType::Jpeg),
        (".JPE", ImageType::Jpeg),
        ("jpeg", ImageType::Jpeg),
        ("JFIF", ImageType::Jpeg),
        ("gif", ImageType::Gif),
        (".Png", ImageType::Png),
        ("apng", ImageType::Apng),
        ("tif", ImageType::Tiff),
        ("TIFF", ImageType::Tiff),
        ("bmp", ImageType::Bmp),
        (".dib", ImageType::Bmp),
    ] {
        assert_eq!(ImageType::from_extension(ext), Some(expected), "{ext}");
    }
    assert_eq!(ImageType::from_extension("webp"), None);
    assert_eq!(ImageType::from_extension(""), None);
}

#[test]
fn paths_use_their_extension() {
    assert_eq!(ImageType::from_path("photos/cat.JPG"), Some(ImageType::Jpeg));
    assert_eq!(ImageType::from_path("anim.apng"), Some(ImageType::Apng));
    assert_eq!(ImageType::from_path("README"), None);
}

#[test]
fn mime_types_roundtrip() {
    for t in ImageType::ALL {
        assert_eq!(ImageType::from_mime(t.mime()), Some(t));
        assert_eq!(ImageType::from_extension(t.extension()), Some(t));
    }
    assert_eq!(ImageType::from_mime("IMAGE/PNG; charset=binary"), Some(ImageType::Png));
    assert_eq!(ImageType::Apng.mime(), "image/apng");
    assert_eq!(ImageType::from_mime("text/plain"), None);
}

#[test]
fn wildcards_list_every_extension() {
    assert_eq!(ImageType::Jpeg.wildcards(), "*.jpg;*.jpe;*.jpeg;*.jfif");
    assert_eq!(ImageType::Tiff.wildcards(), "*.tif;*.tiff");
    assert_eq!(ImageType::Bmp.wildcards(), "*.bmp;*.dib");
    assert_eq!(ImageType::Apng.wildcards(), "*.png;*.apng");
}

#[test]
fn magic_bytes_are_detected() {
    assert_eq!(ImageType::detect(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageType::Jpeg));
    assert_eq!(ImageType::detect(b"GIF87a...."), Some(ImageType::Gif));
    assert_eq!(ImageType::detect(b"GIF89a...."), Some(ImageType::Gif));
    assert_eq!(ImageType::detect(b"II*\0...."), Some(ImageType::Tiff));
    assert_eq!(ImageType::detect(b"MM\0*...."), Some(ImageType::Tiff));
    assert_eq!(ImageType::detect(b"BM......"), Some(ImageType::Bmp));
    assert_eq!(ImageType::detect(b"\x89PNG\r\n\x1a\n"), Some(ImageType::Png));
    assert_eq!(ImageType::detect(b"GIF8"), None);
    assert_eq!(ImageType::detect(&[]), None);
}

#[test]
fn still_png_is_not_apng() {
    let surface = Surface::checkerboard(4, 4, PixelFormat::Rgb24).unwrap();
    let png = EncodeRequest::png().encode(&surface).unwrap();
    assert_eq!(ImageType::detect(&png), Some(ImageType::Png));

    let apng = EncodeRequest::apng().encode(&surface).unwrap();
    assert_eq!(ImageType::detect(&apng), Some(ImageType::Apng));
}

#[test]
fn save_and_load_file() {
    let path = temp_path("save-load.bmp");
    let surface = Surface::checkerboard(20, 10, PixelFormat::Rgb24).unwrap();
    fs::save_image(&path, &surface, &EncodeRequest::bmp().with_dpi(96.0)).unwrap();

    let decoded = fs::load(&path).unwrap();
    let image = decoded.as_image().expect("still image");
    assert_eq!(image.surface(), &surface);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn load_with_configures_request() {
    let path = temp_path("load-with.gif");
    let palette = Palette::from_colors(vec![WHITE, BLACK]).unwrap();
    let mut seq = AnimationSequence::new(4, 4);
    seq.global_palette = Some(palette.clone());
    seq.push(AnimationFrame::new(Surface::solid_indexed(4, 4, palette.clone(), 0).unwrap()));
    seq.push(AnimationFrame::new(Surface::solid_indexed(2, 2, palette, 1).unwrap()).at(1, 1));
    let bytes = EncodeRequest::gif().encode_animation(&seq).unwrap();
    fs::save(&path, &bytes).unwrap();

    let decoded = fs::load_with(&path, |r| r.with_screens(true)).unwrap();
    let anim = decoded.into_animation().expect("animation");
    assert!(anim.has_screens());
    let last = anim.screens().last().unwrap();
    assert_eq!(last.pixel(0, 0), Some(WHITE));
    assert_eq!(last.pixel(2, 2), Some(BLACK));
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn failed_save_leaves_no_file() {
    let missing_dir = temp_path("no-such-dir");
    let path = missing_dir.join("out.bmp");
    assert!(fs::save(&path, b"BM").is_err());
    assert!(!path.exists());
}

#[test]
fn failed_encode_writes_nothing() {
    let path = temp_path("never-written.gif");

    // GIF dimensions stop at 65535.
    let wide = Surface::new(70_000, 1, PixelFormat::Indexed8, None).unwrap();
    assert!(fs::save_image(&path, &wide, &EncodeRequest::gif()).is_err());
    assert!(!path.exists());

    let small = Surface::solid(2, 2, PixelFormat::Rgb24, WHITE).unwrap();
    fs::save_image(&path, &small, &EncodeRequest::gif()).unwrap();
    assert!(path.exists());
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_file_is_io_error() {
    match fs::load(temp_path("does-not-exist.png")) {
        Err(RasterError::Io(_)) => {}
        other => panic!("expected Io, got {other:?}"),
    }
}
