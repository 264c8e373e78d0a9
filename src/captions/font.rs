use std::path::Path;
use std::sync::Arc;

use usvg::fontdb;

use crate::foundation::error::{ReelError, ReelResult};

/// Families tried, in order, when no caption font is configured.
const FALLBACK_FAMILIES: &[&str] = &[
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
    "Helvetica",
    "FreeSans",
];

/// Font bytes used for every caption in a run.
#[derive(Clone)]
pub struct CaptionFont {
    bytes: Arc<Vec<u8>>,
    index: u32,
    family: String,
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("family", &self.family)
            .field("index", &self.index)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

impl CaptionFont {
    /// Load the configured font, or the bold sans-serif system fallback when none is configured.
    ///
    /// A configured font that cannot be loaded is an error; it is never replaced by the fallback.
    pub fn resolve(configured: Option<&Path>) -> ReelResult<Self> {
        match configured {
            Some(path) => Self::from_path(path),
            None => Self::system_default(),
        }
    }

    /// Load a TrueType/OpenType font file.
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ReelError::font_unavailable(format!("failed to read font '{}': {e}", path.display()))
        })?;
        Self::from_bytes(bytes).map_err(|e| match e {
            ReelError::FontUnavailable(msg) => {
                ReelError::font_unavailable(format!("'{}': {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Parse font bytes, using the first face they contain.
    pub fn from_bytes(bytes: Vec<u8>) -> ReelResult<Self> {
        let mut db = fontdb::Database::new();
        db.load_font_data(bytes);
        let face = db
            .faces()
            .next()
            .ok_or_else(|| ReelError::font_unavailable("data is not a parsable font"))?;
        let family = primary_family(face);
        let id = face.id;
        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| ReelError::font_unavailable("font face data is unavailable"))?;
        Ok(Self {
            bytes: Arc::new(bytes),
            index,
            family,
        })
    }

    /// Find a bold sans-serif face among the installed system fonts.
    pub fn system_default() -> ReelResult<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let mut families = vec![fontdb::Family::SansSerif];
        families.extend(FALLBACK_FAMILIES.iter().map(|name| fontdb::Family::Name(name)));
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::BOLD,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };

        let id = db
            .query(&query)
            .or_else(|| {
                // Any upright face beats no captions at all.
                db.faces()
                    .find(|f| f.style == fontdb::Style::Normal)
                    .or_else(|| db.faces().next())
                    .map(|f| f.id)
            })
            .ok_or_else(|| ReelError::font_unavailable("no system fonts are installed"))?;
        let family = db
            .face(id)
            .map(primary_family)
            .unwrap_or_else(|| "sans-serif".to_string());
        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| {
                ReelError::font_unavailable(format!("failed to load system font '{family}'"))
            })?;
        tracing::debug!(%family, "using system caption font");

        Ok(Self {
            bytes: Arc::new(bytes),
            index,
            family,
        })
    }

    /// Raw font file bytes.
    pub fn bytes(&self) -> &Arc<Vec<u8>> {
        &self.bytes
    }

    /// Face index inside a font collection.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Primary family name.
    pub fn family(&self) -> &str {
        &self.family
    }
}

fn primary_family(face: &fontdb::FaceInfo) -> String {
    face.families
        .first()
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| face.post_script_name.clone())
}

/// Stateful helper for building Parley layouts from one registered font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<[u8; 4]>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font` with fresh Parley contexts.
    pub(crate) fn new(font: &CaptionFont) -> ReelResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx.collection.register_fonts(
            parley::fontique::Blob::from(font.bytes().as_ref().clone()),
            None,
        );
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            ReelError::font_unavailable(format!(
                "no font families registered from '{}'",
                font.family()
            ))
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::font_unavailable("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Shape one unwrapped line of text.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
    ) -> ReelResult<parley::Layout<[u8; 4]>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));

        let mut layout: parley::Layout<[u8; 4]> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}
