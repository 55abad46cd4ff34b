#![no_main]
use libfuzzer_sys::fuzz_target;
use zenraster::{DecodeRequest, ImageType, Limits};

fuzz_target!(|data: &[u8]| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        max_memory_bytes: Some(1 << 26),
        max_frames: Some(64),
        ..Default::default()
    };

    // Auto-detect with screen reconstruction: must never panic
    let _ = DecodeRequest::new(data)
        .with_limits(&limits)
        .with_screens(true)
        .decode();

    // Each container explicitly: must never panic
    for format in ImageType::ALL {
        let _ = DecodeRequest::new(data).with_limits(&limits).decode_as(format);
    }
});
