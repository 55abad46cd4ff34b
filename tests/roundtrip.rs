use zenraster::*;

/// Deterministic noise so fixtures are stable across runs.
fn xorshift_pixels(len: usize, mut state: u32) -> Vec<u8> {
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

fn decode_image(data: &[u8]) -> Image {
    match DecodeRequest::new(data).decode().unwrap() {
        Decoded::Image(image) => image,
        Decoded::Animation(seq) => panic!("expected a still, got {} frames", seq.len()),
    }
}

fn assert_dpi(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.05,
        "dpi {actual} differs from {expected}"
    );
}

#[test]
fn bmp_roundtrip_rgb24() {
    let (w, h) = (5, 3); // odd width exercises row padding
    let pixels = xorshift_pixels(w * h * 3, 0x1234_5678);
    let surface =
        Surface::from_pixels(w as u32, h as u32, PixelFormat::Rgb24, pixels, None).unwrap();

    let encoded = EncodeRequest::bmp().with_dpi(96.0).encode(&surface).unwrap();
    assert_eq!(&encoded[0..2], b"BM");
    assert_eq!(ImageType::detect(&encoded), Some(ImageType::Bmp));

    let image = decode_image(&encoded);
    assert_eq!(image.surface(), &surface);
    assert_dpi(image.dpi(), 96.0);
}

#[test]
fn bmp_roundtrip_rgba32() {
    let pixels = vec![
        255, 0, 0, 255, 0, 255, 0, 128, // row 0
        0, 0, 255, 64, 128, 128, 128, 255, // row 1
    ];
    let surface = Surface::from_pixels(2, 2, PixelFormat::Rgba32, pixels, None).unwrap();

    let encoded = EncodeRequest::bmp().with_dpi(72.0).encode(&surface).unwrap();
    let image = decode_image(&encoded);
    assert_eq!(image.surface().format(), PixelFormat::Rgba32);
    assert_eq!(image.surface().pixels(), surface.pixels());
    assert_dpi(image.dpi(), 72.0);
}

#[test]
fn bmp_zero_alpha_reads_as_rgb() {
    let pixels = vec![10, 20, 30, 0, 40, 50, 60, 0];
    let surface = Surface::from_pixels(2, 1, PixelFormat::Rgba32, pixels, None).unwrap();
    let encoded = EncodeRequest::bmp().encode(&surface).unwrap();

    let image = decode_image(&encoded);
    assert_eq!(image.surface().format(), PixelFormat::Rgb24);
    assert_eq!(image.surface().pixels(), &[10, 20, 30, 40, 50, 60]);
    assert_eq!(image.dpi(), 0.0);
}

#[test]
fn bmp_roundtrip_indexed8() {
    let palette = Palette::from_colors(vec![
        Color8::new(255, 0, 0, 255),
        Color8::new(0, 255, 0, 255),
        Color8::new(0, 0, 255, 255),
    ])
    .unwrap();
    let indices = vec![0, 1, 2, 2, 1, 0, 1, 1, 1];
    let surface =
        Surface::from_pixels(3, 3, PixelFormat::Indexed8, indices.clone(), Some(palette)).unwrap();

    let encoded = EncodeRequest::bmp().encode(&surface).unwrap();
    let image = decode_image(&encoded);
    let decoded = image.surface();
    assert_eq!(decoded.format(), PixelFormat::Indexed8);
    assert_eq!(decoded.pixels(), &indices[..]);
    for (x, y) in [(0, 0), (1, 0), (2, 0)] {
        assert_eq!(decoded.pixel(x, y), surface.pixel(x, y));
    }
}

#[test]
fn png_roundtrip_rgb_and_rgba() {
    for format in [PixelFormat::Rgb24, PixelFormat::Rgba32] {
        let (w, h) = (7u32, 4u32);
        let pixels = xorshift_pixels((w * h) as usize * format.bytes_per_pixel(), 99);
        let surface = Surface::from_pixels(w, h, format, pixels, None).unwrap();

        let encoded = EncodeRequest::png().with_dpi(300.0).encode(&surface).unwrap();
        assert_eq!(ImageType::detect(&encoded), Some(ImageType::Png));

        let image = decode_image(&encoded);
        assert_eq!(image.surface(), &surface, "{format:?}");
        assert_dpi(image.dpi(), 300.0);
    }
}

#[test]
fn png_indexed_key_becomes_alpha() {
    let palette = Palette::from_colors(vec![
        Color8::new(0, 0, 0, 255),
        Color8::new(200, 100, 50, 255),
    ])
    .unwrap();
    let surface =
        Surface::from_pixels(2, 1, PixelFormat::Indexed8, vec![0, 1], Some(palette)).unwrap();

    let encoded = EncodeRequest::png()
        .with_transparent(Some(0))
        .encode(&surface)
        .unwrap();
    let image = decode_image(&encoded);
    assert_eq!(image.surface().format(), PixelFormat::Rgba32);
    assert_eq!(image.surface().pixels(), &[0, 0, 0, 0, 200, 100, 50, 255]);
}

#[cfg(feature = "tiff")]
#[test]
fn tiff_roundtrip_with_resolution() {
    for format in [PixelFormat::Rgb24, PixelFormat::Rgba32] {
        let pixels = xorshift_pixels(6 * 5 * format.bytes_per_pixel(), 7);
        let surface = Surface::from_pixels(6, 5, format, pixels, None).unwrap();

        let encoded = EncodeRequest::tiff().with_dpi(150.0).encode(&surface).unwrap();
        assert_eq!(ImageType::detect(&encoded), Some(ImageType::Tiff));

        let image = decode_image(&encoded);
        assert_eq!(image.surface(), &surface, "{format:?}");
        assert_dpi(image.dpi(), 150.0);
    }
}

#[cfg(feature = "jpeg")]
#[test]
fn jpeg_smoke() {
    let brick = Color8::new(200, 40, 40, 255);
    let surface = Surface::solid(16, 16, PixelFormat::Rgb24, brick).unwrap();
    let encoded = EncodeRequest::jpeg()
        .with_quality(90)
        .with_dpi(72.0)
        .encode(&surface)
        .unwrap();
    assert_eq!(ImageType::detect(&encoded), Some(ImageType::Jpeg));

    let image = decode_image(&encoded);
    let decoded = image.surface();
    assert_eq!((decoded.width(), decoded.height()), (16, 16));
    assert_eq!(decoded.format(), PixelFormat::Rgb24);
    let c = decoded.pixel(8, 8).unwrap();
    assert!(c.r.abs_diff(200) < 12 && c.g.abs_diff(40) < 12 && c.b.abs_diff(40) < 12, "{c:?}");
    assert_dpi(image.dpi(), 72.0);
}

#[cfg(feature = "jpeg")]
#[test]
fn jpeg_progressive_drops_alpha() {
    let surface = Surface::checkerboard(32, 24, PixelFormat::Rgba32).unwrap();
    let encoded = EncodeRequest::jpeg()
        .with_progressive(true)
        .encode(&surface)
        .unwrap();
    let image = decode_image(&encoded);
    assert_eq!(image.surface().format(), PixelFormat::Rgb24);
    assert_eq!(image.surface().width(), 32);
}

#[test]
fn gif_still_keeps_transparency_key() {
    let palette = Palette::from_colors(vec![
        Color8::new(10, 20, 30, 255),
        Color8::new(255, 255, 255, 255),
        Color8::new(0, 128, 0, 255),
        Color8::new(0, 0, 0, 255),
    ])
    .unwrap();
    let indices = vec![0, 1, 2, 3, 3, 2, 1, 0];
    let surface =
        Surface::from_pixels(4, 2, PixelFormat::Indexed8, indices.clone(), Some(palette.clone()))
            .unwrap();

    let encoded = EncodeRequest::gif()
        .with_transparent(Some(3))
        .encode(&surface)
        .unwrap();
    assert_eq!(ImageType::detect(&encoded), Some(ImageType::Gif));

    let image = decode_image(&encoded);
    assert_eq!(image.transparent(), Some(3));
    assert_eq!(image.surface().pixels(), &indices[..]);
    assert_eq!(image.surface().palette(), Some(&palette));

    let rgba = image.to_rgba32().unwrap();
    assert_eq!(rgba.pixel(3, 0).unwrap().a, 0);
    assert_eq!(rgba.pixel(0, 0).unwrap(), Color8::new(10, 20, 30, 255));
}

#[test]
fn gif_still_from_rgba_gets_transparent_slot() {
    let red = Color8::new(255, 0, 0, 255);
    let mut surface = Surface::solid(8, 8, PixelFormat::Rgba32, red).unwrap();
    surface.set_pixel(0, 0, TRANSPARENT);

    let encoded = EncodeRequest::gif().encode(&surface).unwrap();
    let image = decode_image(&encoded);
    let key = image.transparent().expect("a transparent slot");
    assert_eq!(image.surface().index(0, 0), Some(key));

    let rgba = image.to_rgba32().unwrap();
    assert_eq!(rgba.pixel(0, 0).unwrap().a, 0);
    assert_eq!(rgba.pixel(4, 4).unwrap(), Color8::new(255, 0, 0, 255));
}

#[test]
fn limits_reject_large() {
    let surface = Surface::solid(4, 4, PixelFormat::Rgb24, WHITE).unwrap();
    let limits = Limits {
        max_pixels: Some(8),
        ..Default::default()
    };

    for encoded in [
        EncodeRequest::bmp().encode(&surface).unwrap(),
        EncodeRequest::png().encode(&surface).unwrap(),
        EncodeRequest::gif().encode(&surface).unwrap(),
    ] {
        let result = DecodeRequest::new(&encoded).with_limits(&limits).decode();
        match result {
            Err(RasterError::LimitExceeded(_)) => {}
            other => panic!("expected LimitExceeded, got {other:?}"),
        }
    }
}

#[test]
fn limits_reject_memory() {
    let surface = Surface::solid(16, 16, PixelFormat::Rgb24, BLACK).unwrap();
    let encoded = EncodeRequest::bmp().encode(&surface).unwrap();
    let limits = Limits {
        max_memory_bytes: Some(100),
        ..Default::default()
    };
    match DecodeRequest::new(&encoded).with_limits(&limits).decode() {
        Err(RasterError::LimitExceeded(_)) => {}
        other => panic!("expected LimitExceeded, got {other:?}"),
    }
}

#[test]
fn unknown_bytes_are_unrecognized() {
    match DecodeRequest::new(b"not an image").decode() {
        Err(RasterError::UnrecognizedFormat) => {}
        other => panic!("expected UnrecognizedFormat, got {other:?}"),
    }
}

#[test]
fn truncated_bmp_fails() {
    let surface = Surface::solid(4, 4, PixelFormat::Rgb24, WHITE).unwrap();
    let encoded = EncodeRequest::bmp().encode(&surface).unwrap();
    assert!(DecodeRequest::new(&encoded[..40]).decode().is_err());
}
