use std::sync::Arc;

use crate::captions::font::{CaptionFont, TextLayoutEngine};
use crate::captions::segment::CaptionSegment;
use crate::config::CaptionStyle;
use crate::foundation::core::{Affine, Fps, FrameIndex, FrameRange, Geometry, count_at_rate};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::unpremul_rgba8;

/// A caption line rasterized onto a transparent band, with its placement and time window.
#[derive(Clone)]
pub struct OverlayClip {
    /// Caption text.
    pub text: String,
    /// Seconds from narration start.
    pub start_sec: f64,
    /// Seconds on screen.
    pub duration_sec: f64,
    /// Left edge on the output frame.
    pub x: i32,
    /// Top edge on the output frame.
    pub y: i32,
    /// Band width in pixels.
    pub width: u32,
    /// Band height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 band pixels, row-major.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl std::fmt::Debug for OverlayClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayClip")
            .field("text", &self.text)
            .field("start_sec", &self.start_sec)
            .field("duration_sec", &self.duration_sec)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("size", &self.geometry())
            .finish()
    }
}

impl OverlayClip {
    /// Exclusive end time in seconds.
    pub fn end_sec(&self) -> f64 {
        self.start_sec + self.duration_sec
    }

    /// Band size.
    pub fn geometry(&self) -> Geometry {
        Geometry::new(self.width, self.height)
    }

    /// Output frames whose timestamps fall inside `[start_sec, end_sec)` at `fps`.
    pub fn frame_range(&self, fps: Fps) -> FrameRange {
        let rate = fps.as_f64();
        let start = count_at_rate(self.start_sec, rate);
        let end = count_at_rate(self.end_sec(), rate).max(start);
        FrameRange {
            start: FrameIndex(start),
            end: FrameIndex(end),
        }
    }

    /// Band pixels converted to straight alpha, as image files expect.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.rgba8_premul.len());
        for px in self.rgba8_premul.chunks_exact(4) {
            out.extend_from_slice(&unpremul_rgba8([px[0], px[1], px[2], px[3]]));
        }
        out
    }

    /// Return `true` when no pixel is visible.
    pub fn is_transparent(&self) -> bool {
        self.rgba8_premul.chunks_exact(4).all(|px| px[3] == 0)
    }
}

/// Rasterizes caption lines with an outlined glyph style.
///
/// The font is registered once; each call reuses the layout and render contexts.
pub struct CaptionRenderer {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
    style: CaptionStyle,
    frame: Geometry,
    band: Geometry,
    ctx: Option<vello_cpu::RenderContext>,
}

impl CaptionRenderer {
    /// Renderer for captions on frames of size `frame`.
    pub fn new(font: &CaptionFont, style: &CaptionStyle, frame: Geometry) -> ReelResult<Self> {
        let band = Geometry::new(frame.width, style.band_height);
        if band.is_empty() || band.height > frame.height {
            return Err(ReelError::validation(format!(
                "caption band {band} does not fit frame {frame}"
            )));
        }
        if u16::try_from(band.width).is_err() || u16::try_from(band.height).is_err() {
            return Err(ReelError::validation(format!(
                "caption band {band} exceeds the raster size limit"
            )));
        }
        Ok(Self {
            engine: TextLayoutEngine::new(font)?,
            font: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(font.bytes().as_ref().clone()),
                font.index(),
            ),
            style: style.clone(),
            frame,
            band,
            ctx: None,
        })
    }

    /// Rasterize `text` centered in the band. Empty text yields a fully transparent band.
    pub fn render_band(&mut self, text: &str) -> ReelResult<Vec<u8>> {
        let (w, h) = (self.band.width as u16, self.band.height as u16);
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        if text.trim().is_empty() {
            return Ok(pixmap.data_as_u8_slice().to_vec());
        }

        let layout = self.engine.layout_line(text, self.style.font_size_px)?;
        let x0 = ((f64::from(self.band.width) - f64::from(layout.width())) / 2.0).floor();
        let y0 = ((f64::from(self.band.height) - f64::from(layout.height())) / 2.0).floor();
        let transform = affine_to_cpu(Affine::translate((x0, y0)));

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        ctx.set_transform(transform);

        if self.style.stroke_width_px > 0.0 {
            let [r, g, b, a] = self.style.stroke_rgba;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            // Stroke is centered on the outline; the fill pass covers the inner half.
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(
                2.0 * f64::from(self.style.stroke_width_px),
            ));
            draw_glyphs(&mut ctx, &layout, &self.font, GlyphPass::Stroke);
        }
        let [r, g, b, a] = self.style.fill_rgba;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        draw_glyphs(&mut ctx, &layout, &self.font, GlyphPass::Fill);

        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);
        Ok(pixmap.data_as_u8_slice().to_vec())
    }

    /// Rasterize one segment and place its band centered on the frame.
    pub fn render_segment(&mut self, segment: &CaptionSegment) -> ReelResult<OverlayClip> {
        let pixels = self.render_band(&segment.text)?;
        Ok(OverlayClip {
            text: segment.text.clone(),
            start_sec: segment.start_sec,
            duration_sec: segment.duration_sec,
            x: ((self.frame.width - self.band.width) / 2) as i32,
            y: ((self.frame.height - self.band.height) / 2) as i32,
            width: self.band.width,
            height: self.band.height,
            rgba8_premul: Arc::new(pixels),
        })
    }

    /// Rasterize every segment in order.
    #[tracing::instrument(skip_all, fields(segments = segments.len()))]
    pub fn render_all(&mut self, segments: &[CaptionSegment]) -> ReelResult<Vec<OverlayClip>> {
        segments.iter().map(|s| self.render_segment(s)).collect()
    }
}

#[derive(Clone, Copy)]
enum GlyphPass {
    Stroke,
    Fill,
}

fn draw_glyphs(
    ctx: &mut vello_cpu::RenderContext,
    layout: &parley::Layout<[u8; 4]>,
    font: &vello_cpu::peniko::FontData,
    pass: GlyphPass,
) {
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            let builder = ctx.glyph_run(font).font_size(run.run().font_size());
            match pass {
                GlyphPass::Stroke => builder.stroke_glyphs(glyphs),
                GlyphPass::Fill => builder.fill_glyphs(glyphs),
            }
        }
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

#[cfg(test)]
#[path = "../../tests/unit/captions/render.rs"]
mod tests;
