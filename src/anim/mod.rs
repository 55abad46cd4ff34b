//! Container-neutral animation model.
//!
//! An [`AnimationSequence`] is an ordered list of [`AnimationFrame`]s. Each
//! frame holds the raw delta it was stored with (its `part`) and, once
//! [`AnimationSequence::reconstruct_screens`] has run, the fully composited
//! canvas at that point of playback (its `screen`).
//!
//! The GIF and APNG adapters translate their per-frame metadata into this
//! shape and back; [`convert`] maps whole sequences between the two.

pub mod convert;

use alloc::borrow::Cow;
use alloc::vec::Vec;

use crate::color::{Color8, TRANSPARENT};
use crate::composite::{BlendBackend, Compositor};
use crate::error::RasterError;
use crate::palette::Palette;
use crate::surface::{Region, Surface};

/// What happens to a frame's region after it has been shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Disposal {
    /// Leave the canvas as composited.
    #[default]
    None,
    /// Clear the region to the background.
    Background,
    /// Return the canvas to the previous frame's screen.
    RestoreToPrevious,
}

impl Disposal {
    /// Decode a GIF disposal code. Codes 0 and 1 both mean `None`;
    /// reserved codes 4..=7 are treated as `None`.
    pub fn from_gif_code(code: u8) -> Self {
        match code {
            2 => Self::Background,
            3 => Self::RestoreToPrevious,
            _ => Self::None,
        }
    }

    /// GIF disposal code; `None` is always written as 1.
    pub fn gif_code(self) -> u8 {
        match self {
            Self::None => 1,
            Self::Background => 2,
            Self::RestoreToPrevious => 3,
        }
    }
}

/// How a frame's pixels combine with the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Blend {
    /// Replace the region.
    Source,
    /// Alpha-composite over the region.
    #[default]
    Over,
}

/// One frame of an animation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Placement of `part` on the canvas.
    pub region: Region,
    pub disposal: Disposal,
    pub blend: Blend,
    /// Display time in milliseconds.
    pub delay_ms: u32,
    /// Local color table (GIF).
    pub palette: Option<Palette>,
    /// Transparent index of an indexed `part`.
    pub transparent: Option<u8>,
    /// Raw frame content, sized like `region`.
    pub part: Surface,
    /// Composited canvas after this frame, before its disposal.
    pub screen: Option<Surface>,
}

impl AnimationFrame {
    /// Frame covering `part` at the canvas origin, shown for 100 ms.
    pub fn new(part: Surface) -> Self {
        Self {
            region: Region::full(part.width(), part.height()),
            disposal: Disposal::None,
            blend: Blend::Over,
            delay_ms: 100,
            palette: None,
            transparent: None,
            part,
            screen: None,
        }
    }

    /// Move the frame to `(x, y)` on the canvas.
    pub fn at(mut self, x: u32, y: u32) -> Self {
        self.region.x = x;
        self.region.y = y;
        self
    }

    pub fn with_delay(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_disposal(mut self, disposal: Disposal) -> Self {
        self.disposal = disposal;
        self
    }

    pub fn with_blend(mut self, blend: Blend) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_transparent(mut self, transparent: Option<u8>) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }
}

/// Options for [`AnimationSequence::reconstruct_screens`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconstructOptions {
    /// Fail with [`RasterError::MissingDependency`] when a frame restores
    /// to a previous screen that does not exist. Otherwise the canvas is
    /// left as composited and a warning is logged.
    pub strict_restore: bool,
}

/// An ordered animation on a fixed canvas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnimationSequence {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<AnimationFrame>,
    /// Number of plays; 0 loops forever.
    pub loop_count: u32,
    pub global_palette: Option<Palette>,
    /// Background index into the frame's (or global) palette.
    pub background_index: Option<u8>,
    /// APNG image shown by viewers without animation support.
    pub default_image: Option<Surface>,
}

impl AnimationSequence {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn push(&mut self, frame: AnimationFrame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Whether every frame carries a screen snapshot.
    pub fn has_screens(&self) -> bool {
        !self.frames.is_empty() && self.frames.iter().all(|f| f.screen.is_some())
    }

    /// Palette that frame `index` decodes with: its own, else the global one.
    pub fn frame_palette(&self, index: usize) -> Option<&Palette> {
        self.frames
            .get(index)
            .and_then(|f| f.palette.as_ref().or(f.part.palette()))
            .or(self.global_palette.as_ref())
    }

    /// Part of frame `index` carrying the palette from
    /// [`AnimationSequence::frame_palette`], so a local table set with
    /// [`AnimationFrame::with_palette`] wins over the part's own.
    pub(crate) fn resolved_part(&self, index: usize) -> Result<Cow<'_, Surface>, RasterError> {
        let Some(frame) = self.frames.get(index) else {
            return Err(RasterError::InvalidRegion(alloc::format!("no frame {index}")));
        };
        let palette = self.frame_palette(index);
        match palette {
            Some(p) if frame.part.format().is_indexed() && frame.part.palette() != Some(p) => {
                let mut part = frame.part.clone();
                part.set_palette(p.clone())?;
                Ok(Cow::Owned(part))
            }
            _ => Ok(Cow::Borrowed(&frame.part)),
        }
    }

    /// Check the structural invariants: at least one frame, every part
    /// sized like its region, every region inside the canvas.
    pub fn validate(&self) -> Result<(), RasterError> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.frames.is_empty() {
            return Err(RasterError::Decode("animation has no frames".into()));
        }
        for (i, frame) in self.frames.iter().enumerate() {
            let r = frame.region;
            if frame.part.width() != r.width || frame.part.height() != r.height {
                return Err(RasterError::InvalidRegion(alloc::format!(
                    "frame {i}: part is {}x{} but region is {}x{}",
                    frame.part.width(),
                    frame.part.height(),
                    r.width,
                    r.height
                )));
            }
            if !r.fits_within(self.width, self.height) {
                return Err(RasterError::InvalidRegion(alloc::format!(
                    "frame {i}: {r:?} outside {}x{} canvas",
                    self.width,
                    self.height
                )));
            }
        }
        Ok(())
    }

    /// Color a `Background` disposal clears frame `index` to.
    ///
    /// The background entry of the frame's palette keeps its color but
    /// loses coverage; without an entry the region becomes transparent.
    fn background_color(&self, index: usize) -> Color8 {
        let Some(bg) = self.background_index else {
            return TRANSPARENT;
        };
        match self.frame_palette(index).and_then(|p| p.get(usize::from(bg))) {
            Some(c) => Color8::new(c.r, c.g, c.b, 0),
            None => {
                log::warn!("background index {bg} outside palette, clearing to transparent");
                TRANSPARENT
            }
        }
    }

    /// Composite every frame onto a running canvas and store the result in
    /// each frame's `screen`.
    ///
    /// The canvas starts fully transparent. Per frame: composite the part
    /// by its blend mode, snapshot the canvas, then apply the disposal for
    /// the next frame.
    pub fn reconstruct_screens<B: BlendBackend>(
        &mut self,
        compositor: &Compositor<B>,
        options: &ReconstructOptions,
    ) -> Result<(), RasterError> {
        self.validate()?;
        let mut canvas = Surface::transparent(self.width, self.height)?;

        for i in 0..self.frames.len() {
            let background = self.background_color(i);
            {
                let part = self.resolved_part(i)?;
                let frame = &self.frames[i];
                let (x, y) = (frame.region.x as i32, frame.region.y as i32);
                let key = frame.transparent;
                match frame.blend {
                    Blend::Over => compositor.stamp(&mut canvas, x, y, &part, key, 255)?,
                    Blend::Source => compositor.copy(&mut canvas, x, y, &part, key)?,
                }
            }
            let frame = &self.frames[i];
            log::trace!(
                "frame {i}: {:?} {:?} {:?} {} ms",
                frame.region,
                frame.blend,
                frame.disposal,
                frame.delay_ms
            );

            let disposal = frame.disposal;
            let region = frame.region;
            self.frames[i].screen = Some(canvas.clone());

            match disposal {
                Disposal::None => {}
                Disposal::Background => compositor.fill(&mut canvas, region, background)?,
                Disposal::RestoreToPrevious => {
                    match i.checked_sub(1).and_then(|p| self.frames[p].screen.as_ref()) {
                        Some(previous) => canvas = previous.clone(),
                        None if options.strict_restore => {
                            return Err(RasterError::MissingDependency(alloc::format!(
                                "frame {i} restores to a previous screen that does not exist"
                            )));
                        }
                        None => {
                            log::warn!(
                                "frame {i} restores with no previous screen, keeping canvas"
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Drop every screen snapshot.
    pub fn clear_screens(&mut self) {
        for frame in &mut self.frames {
            frame.screen = None;
        }
    }

    /// Screen snapshots as RGBA surfaces, in playback order.
    pub fn screens(&self) -> impl Iterator<Item = &Surface> {
        self.frames.iter().filter_map(|f| f.screen.as_ref())
    }
}
