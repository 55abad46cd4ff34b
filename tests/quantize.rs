use zenraster::*;

fn gradient(w: u32, h: u32) -> Surface {
    let mut s = Surface::new(w, h, PixelFormat::Rgb24, None).unwrap();
    for y in 0..h {
        for x in 0..w {
            let c = Color8::new(
                (x * 255 / w) as u8,
                (y * 255 / h) as u8,
                ((x + y) * 7 % 256) as u8,
                255,
            );
            s.set_pixel(x, y, c);
        }
    }
    s
}

#[test]
fn palette_is_deterministic_for_a_seed() {
    let surface = gradient(64, 48);
    let q = Quantizer::new(42);
    let a = q.palette_optimized(&surface, 16).unwrap();
    let b = q.palette_optimized(&surface, 16).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 16);

    let indexed_a = q.to_indexed(&surface, 16).unwrap();
    let indexed_b = q.to_indexed(&surface, 16).unwrap();
    assert_eq!(indexed_a, indexed_b);
}

#[test]
fn degenerate_populations_give_two_entries() {
    let q = Quantizer::default();

    let empty = q.palette_for_pixels(&[], 16);
    assert_eq!(empty.colors(), &[BLACK, WHITE]);

    let single = q.palette_for_pixels(&[Color8::new(255, 0, 0, 255)], 16);
    assert_eq!(single.colors(), &[Color8::new(255, 0, 0, 255), WHITE]);
}

#[test]
fn color_count_is_normalized() {
    let pixels: Vec<Color8> = (0..64u8).map(|i| Color8::new(i * 4, 255 - i * 4, i, 255)).collect();
    let q = Quantizer::default();
    assert_eq!(q.palette_for_pixels(&pixels, 0).len(), MAX_PALETTE_COLORS);
    assert_eq!(q.palette_for_pixels(&pixels, 1000).len(), MAX_PALETTE_COLORS);
    assert_eq!(q.palette_for_pixels(&pixels, 8).len(), 8);
}

#[test]
fn few_distinct_colors_are_reproduced_exactly() {
    let colors = [
        Color8::new(255, 0, 0, 255),
        Color8::new(0, 255, 0, 255),
        Color8::new(0, 0, 255, 255),
    ];
    let mut surface = Surface::new(30, 10, PixelFormat::Rgb24, None).unwrap();
    for y in 0..10 {
        for x in 0..30 {
            surface.set_pixel(x, y, colors[(x / 10) as usize]);
        }
    }

    let indexed = surface.to_indexed(256).unwrap();
    assert_eq!(indexed.format(), PixelFormat::Indexed8);
    assert_eq!(indexed.to_rgb24().unwrap(), surface);
}

#[test]
fn nearest_index_finds_exact_color() {
    let target = Color8::new(10, 20, 30, 255);
    let palette = Palette::from_colors(vec![
        Color8::new(12, 20, 30, 255),
        Color8::new(0, 0, 0, 255),
        target,
        Color8::new(10, 20, 31, 255),
    ])
    .unwrap();
    let i = palette.nearest_index(target);
    assert_eq!(i, 2);
    assert_eq!(color_distance(palette.get(usize::from(i)).unwrap(), target), 0);
}

#[test]
fn nearest_index_prefers_lowest_on_tie() {
    let palette = Palette::from_colors(vec![
        Color8::new(0, 0, 0, 255),
        Color8::new(20, 0, 0, 255),
    ])
    .unwrap();
    assert_eq!(palette.nearest_index(Color8::new(10, 0, 0, 255)), 0);
}

#[test]
fn shrink_is_idempotent() {
    let red = Color8::new(255, 0, 0, 255);
    let mut palette = Palette::from_colors(vec![WHITE, red, red, red]).unwrap();
    palette.shrink(None);
    assert_eq!(palette.colors(), &[WHITE, red]);

    let once = palette.clone();
    palette.shrink(None);
    assert_eq!(palette, once);
}

#[test]
fn shrink_stops_at_transparent_index() {
    let red = Color8::new(255, 0, 0, 255);
    let mut palette = Palette::from_colors(vec![WHITE, red, red, red]).unwrap();
    palette.shrink(Some(2));
    assert_eq!(palette.len(), 3);
}

#[test]
fn reduce_colors_keys_transparent_pixels() {
    let mut surface = Surface::solid(4, 4, PixelFormat::Rgba32, WHITE).unwrap();
    surface.set_pixel(1, 1, TRANSPARENT);
    let palette = Palette::from_colors(vec![WHITE, BLACK, Color8::new(0, 0, 0, 255)]).unwrap();

    let keyed = reduce_colors(&surface, &palette, Some(2)).unwrap();
    assert_eq!(keyed.index(1, 1), Some(2));
    assert_eq!(keyed.index(0, 0), Some(0));
    assert_eq!(keyed.palette(), Some(&palette));

    // Without a key the color channels decide.
    let unkeyed = reduce_colors(&surface, &palette, None).unwrap();
    assert_eq!(unkeyed.index(1, 1), Some(1));
}

#[test]
fn reduce_colors_rejects_empty_palette() {
    let surface = Surface::solid(2, 2, PixelFormat::Rgb24, WHITE).unwrap();
    match reduce_colors(&surface, &Palette::new(), None) {
        Err(RasterError::UnsupportedFormat(_)) => {}
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
}

#[test]
fn dithering_mixes_two_entries_for_midtones() {
    let gray = Color8::new(128, 128, 128, 255);
    let surface = Surface::solid(8, 8, PixelFormat::Rgb24, gray).unwrap();
    let palette = Palette::from_colors(vec![BLACK, WHITE]).unwrap();
    let reduced = reduce_colors(&surface, &palette, None).unwrap();
    let whites = reduced.pixels().iter().filter(|&&i| i == 1).count();
    assert!((24..=40).contains(&whites), "{whites} white pixels of 64");
}

#[test]
fn keyed_promotion_without_key_matches_plain() {
    let palette = Palette::from_colors(vec![BLACK, WHITE, Color8::new(1, 2, 3, 255)]).unwrap();
    let surface =
        Surface::from_pixels(3, 1, PixelFormat::Indexed8, vec![0, 1, 2], Some(palette)).unwrap();
    let plain = surface.to_rgba32().unwrap();
    let keyed = surface.to_rgba32_keyed(None).unwrap();
    assert_eq!(plain, keyed);
    assert!(keyed.is_opaque());
}

#[test]
fn to_indexed_keyed_reserves_last_slot() {
    let azure = Color8::new(0, 128, 255, 255);
    let mut surface = Surface::solid(6, 6, PixelFormat::Rgba32, azure).unwrap();
    surface.set_pixel(5, 5, TRANSPARENT);
    let (indexed, key) = Quantizer::default().to_indexed_keyed(&surface).unwrap();
    assert_eq!(usize::from(key), indexed.palette().unwrap().len() - 1);
    assert_eq!(indexed.index(5, 5), Some(key));
    assert_ne!(indexed.index(0, 0), Some(key));
}

#[test]
fn fixed_palettes() {
    assert_eq!(Palette::fixed(true).len(), 216);
    assert_eq!(Palette::fixed(false).len(), 256);
    assert_eq!(Palette::grayscale().get(77), Some(Color8::new(77, 77, 77, 255)));
}

#[test]
fn trim_keeps_top_five_bits() {
    assert_eq!(trim_color(Color8::new(0xFF, 0x07, 0x88, 0xFF)), Color8::new(0xF8, 0x00, 0x88, 0));
}

#[test]
fn opaque_pixels_never_take_the_key() {
    let palette = Palette::from_colors(vec![
        Color8::new(255, 0, 0, 255),
        BLACK,
        Color8::new(10, 10, 10, 255),
    ])
    .unwrap();
    let mut surface = Surface::solid(2, 1, PixelFormat::Rgba32, BLACK).unwrap();
    surface.set_pixel(1, 0, TRANSPARENT);

    let reduced = reduce_colors(&surface, &palette, Some(1)).unwrap();
    assert_eq!(reduced.index(0, 0), Some(2));
    assert_eq!(reduced.index(1, 0), Some(1));
}
