//! Re-encoding screens as frames, and GIF/APNG sequence conversion.

use crate::anim::{AnimationFrame, AnimationSequence, Blend, Disposal};
use crate::color::BLACK;
use crate::error::RasterError;
use crate::palette::{MAX_PALETTE_COLORS, Palette};
use crate::pixel::PixelFormat;
use crate::quantize::{Quantizer, reduce_colors};
use crate::surface::{Region, Surface};

/// Pooled palette of 255 colors plus a transparent slot at the end.
fn pooled_palette(
    sequence: &AnimationSequence,
    quantizer: &Quantizer,
) -> Result<(Palette, u8), RasterError> {
    let mut palette = quantizer.palette_for_animation(sequence, MAX_PALETTE_COLORS - 1)?;
    let key = palette.push(BLACK)?;
    log::debug!("pooled {} colors, transparent slot {key}", palette.len() - 1);
    Ok((palette, key))
}

fn has_clear_pixels(screen: &Surface) -> bool {
    screen
        .rgba_pixels()
        .is_some_and(|pixels| pixels.iter().any(|c| c.a == 0))
}

impl AnimationSequence {
    /// Frames ready for a GIF writer: every part indexed.
    ///
    /// When every frame has a screen, each screen becomes a full-canvas
    /// part with its own transparency and disposal. Without
    /// screens, indexed parts are kept and other parts are quantized
    /// against a pooled palette with a transparent slot, built when there
    /// is no global palette.
    pub fn to_gif_frames(&self, quantizer: &Quantizer) -> Result<AnimationSequence, RasterError> {
        self.validate()?;
        if self.has_screens() {
            return self.screens_to_gif_frames(quantizer);
        }
        let mut out = self.clone();

        let needs_pool = self.global_palette.is_none()
            && self.frames.iter().any(|f| !f.part.format().is_indexed());
        let mut pooled_key = None;
        if needs_pool {
            let (palette, key) = pooled_palette(self, quantizer)?;
            out.global_palette = Some(palette);
            pooled_key = Some(key);
        }

        for frame in &mut out.frames {
            if frame.part.format().is_indexed() {
                continue;
            }
            let (palette, transparent) = match (&frame.palette, &out.global_palette) {
                (Some(local), _) => (local, frame.transparent),
                (None, Some(global)) => (global, pooled_key.or(frame.transparent)),
                (None, None) => return Err(RasterError::Encode("frame has no palette".into())),
            };
            frame.part = reduce_colors(&frame.part, palette, transparent)?;
            frame.transparent = transparent;
        }
        Ok(out)
    }

    /// Screens quantized into full-canvas GIF frames.
    ///
    /// Each screen maps onto the frame's palette or the global one; a
    /// pooled palette is built when neither exists. A screen with clear
    /// pixels gets a transparent slot: the frame's key if it has one, else
    /// an entry appended to its palette, else a fresh 255-color palette
    /// pooled from that screen plus the slot. A frame disposes to the
    /// background exactly when the next screen (wrapping to the first) has
    /// clear pixels, so keyed pixels show cleared canvas.
    ///
    /// The background entry is moved to index 0 since that is the only
    /// background index the writer stores.
    fn screens_to_gif_frames(
        &self,
        quantizer: &Quantizer,
    ) -> Result<AnimationSequence, RasterError> {
        let mut out = self.clone();
        let mut pooled_key = None;
        if self.global_palette.is_none() && self.frames.iter().any(|f| f.palette.is_none()) {
            let (palette, key) = pooled_palette(self, quantizer)?;
            out.global_palette = Some(palette);
            pooled_key = Some(key);
        } else if let Some(bg) = self.background_index.filter(|&bg| bg != 0) {
            move_to_front(&mut out, bg);
        }

        let clear: Vec<bool> = self
            .frames
            .iter()
            .map(|f| f.screen.as_ref().is_some_and(has_clear_pixels))
            .collect();
        let full = Region::full(self.width, self.height);
        let count = out.frames.len();
        for (i, frame) in out.frames.iter_mut().enumerate() {
            let Some(screen) = frame.screen.as_ref() else {
                continue;
            };
            let (mut palette, mut transparent) = match (&frame.palette, &out.global_palette) {
                (Some(local), _) => (local.clone(), frame.transparent),
                (None, Some(global)) => (global.clone(), pooled_key.or(frame.transparent)),
                (None, None) => return Err(RasterError::Encode("frame has no palette".into())),
            };
            if transparent.is_none() && clear[i] {
                if palette.len() >= MAX_PALETTE_COLORS {
                    palette = quantizer.palette_optimized(screen, MAX_PALETTE_COLORS - 1)?;
                }
                let key = palette.push(BLACK)?;
                log::debug!("frame {i}: transparent slot {key} for cleared pixels");
                frame.palette = Some(palette.clone());
                transparent = Some(key);
            }

            frame.part = reduce_colors(screen, &palette, transparent)?;
            frame.region = full;
            frame.transparent = transparent;
            frame.blend = Blend::Over;
            frame.disposal = if clear[(i + 1) % count] {
                Disposal::Background
            } else {
                Disposal::None
            };
        }
        Ok(out)
    }
}

/// Swap palette entry `bg` with entry 0 in every palette of `seq`, along
/// with the keys that point at either.
fn move_to_front(seq: &mut AnimationSequence, bg: u8) {
    let swap = |i: u8| match i {
        0 => bg,
        i if i == bg => 0,
        i => i,
    };
    let mut swapped = false;
    if let Some(p) = seq.global_palette.as_mut() {
        swapped |= p.swap(0, bg);
    }
    for frame in &mut seq.frames {
        if let Some(p) = frame.palette.as_mut() {
            swapped |= p.swap(0, bg);
        }
        frame.transparent = frame.transparent.map(swap);
    }
    if swapped {
        seq.background_index = Some(0);
    }
}

/// APNG sequence from a GIF one.
///
/// Parts become RGBA with the transparency key applied and blend `Over`;
/// disposal, timing and screens carry over unchanged.
pub fn apng_from_gif(gif: &AnimationSequence) -> Result<AnimationSequence, RasterError> {
    let mut apng = AnimationSequence::new(gif.width, gif.height);
    apng.loop_count = gif.loop_count;
    for (i, frame) in gif.frames.iter().enumerate() {
        let part = gif.resolved_part(i)?.to_rgba32_keyed(frame.transparent)?;
        let mut converted = AnimationFrame::new(part)
            .at(frame.region.x, frame.region.y)
            .with_delay(frame.delay_ms)
            .with_disposal(frame.disposal)
            .with_blend(Blend::Over);
        converted.screen = frame.screen.clone();
        apng.push(converted);
    }
    Ok(apng)
}

/// GIF sequence from an APNG one.
///
/// Semitransparent pixels are made fully transparent on every screen and
/// part, a 255-color palette is pooled from them with a transparent slot
/// appended, and each part is quantized against it. Frames that carry a
/// screen get disposal `None`.
pub fn gif_from_apng(
    apng: &AnimationSequence,
    quantizer: &Quantizer,
) -> Result<AnimationSequence, RasterError> {
    let mut gif = AnimationSequence::new(apng.width, apng.height);
    gif.loop_count = apng.loop_count;
    for (i, frame) in apng.frames.iter().enumerate() {
        let source = apng.resolved_part(i)?;
        let mut part = match source.format() {
            PixelFormat::Indexed8 => source.to_rgba32_keyed(frame.transparent)?,
            _ => source.to_rgba32()?,
        };
        part.erase_semitransparent();
        let mut screen = frame.screen.clone();
        if let Some(s) = screen.as_mut() {
            s.erase_semitransparent();
        }
        let disposal = if screen.is_some() {
            Disposal::None
        } else {
            frame.disposal
        };
        let mut converted = AnimationFrame::new(part)
            .at(frame.region.x, frame.region.y)
            .with_delay(frame.delay_ms)
            .with_disposal(disposal);
        converted.screen = screen;
        gif.push(converted);
    }

    let (palette, key) = pooled_palette(&gif, quantizer)?;
    for frame in &mut gif.frames {
        frame.part = reduce_colors(&frame.part, &palette, Some(key))?;
        frame.transparent = Some(key);
    }
    gif.global_palette = Some(palette);
    Ok(gif)
}
