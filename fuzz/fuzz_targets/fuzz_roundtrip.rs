#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::*;

fuzz_target!(|data: &[u8]| {
    // Lossless stills must survive BMP and PNG re-encoding unchanged
    let limits = Limits {
        max_pixels: Some(1 << 20),
        ..Default::default()
    };
    let Ok(Decoded::Image(image)) = DecodeRequest::new(data).with_limits(&limits).decode() else {
        return;
    };
    let surface = image.surface();
    if surface.format() == PixelFormat::Indexed8 {
        return;
    }

    for request in [EncodeRequest::bmp(), EncodeRequest::png()] {
        let Ok(encoded) = request.encode(surface) else { return };
        let Ok(Decoded::Image(again)) = DecodeRequest::new(&encoded).decode() else {
            panic!("re-encoded {:?} failed to decode", request.format());
        };
        let again = again.surface();
        assert_eq!(surface.width(), again.width());
        assert_eq!(surface.height(), again.height());
        if surface.format() == again.format() {
            assert_eq!(surface.pixels(), again.pixels(), "roundtrip pixel mismatch");
        }
    }
});
