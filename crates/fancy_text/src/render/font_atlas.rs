//! Font atlas backed by `fontdue`
//!
//! Symbols are rasterized on demand, the first time text containing them is
//! registered, and packed into a single-channel coverage texture. The
//! texture has a fixed width and doubles its height whenever a glyph does
//! not fit, up to [`AtlasConfig::max_height`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use fontdue::{Font, FontSettings};

use super::glyphs::{symbols, FontError, FontFamily, FontId, FontResult, GlyphMetricsProvider, GlyphRect};
use crate::config::AtlasConfig;
use crate::foundation::math::Vec2;

/// Shelf packer for a fixed-width surface that grows downwards
///
/// Glyphs are placed left to right on horizontal shelves. A shelf is as tall
/// as the tallest glyph placed on it.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    max_height: u32,
    padding: u32,
    cursor_x: u32,
    cursor_y: u32,
    shelf_height: u32,
}

impl ShelfPacker {
    /// Create an empty packer
    pub fn new(width: u32, height: u32, max_height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            max_height,
            padding,
            cursor_x: 0,
            cursor_y: 0,
            shelf_height: 0,
        }
    }

    /// Reserve a `width` x `height` slot and return its top-left corner
    ///
    /// Doubles the surface height as many times as needed. Returns `None`
    /// when the slot cannot fit without exceeding the maximum height or is
    /// wider than the surface.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<(u32, u32)> {
        let padded_width = width + self.padding * 2;
        let padded_height = height + self.padding * 2;
        if padded_width > self.width {
            return None;
        }

        let (mut x, mut y, mut shelf) = (self.cursor_x, self.cursor_y, self.shelf_height);
        if x + padded_width > self.width {
            y += shelf;
            x = 0;
            shelf = 0;
        }

        let mut surface_height = self.height;
        while y + padded_height > surface_height {
            surface_height = surface_height.checked_mul(2)?;
            if surface_height > self.max_height {
                return None;
            }
        }

        if surface_height != self.height {
            log::info!("Glyph atlas grew from {}x{} to {}x{}", self.width, self.height, self.width, surface_height);
            self.height = surface_height;
        }

        self.cursor_x = x + padded_width;
        self.cursor_y = y;
        self.shelf_height = shelf.max(padded_height);
        Some((x + self.padding, y + self.padding))
    }

    /// Current surface size
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Pixel placement of a rasterized symbol
#[derive(Debug, Clone, Copy)]
struct AtlasEntry {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    advance: f32,
    bearing: Vec2,
}

/// Mutable atlas contents, guarded as a unit
struct AtlasState {
    packer: ShelfPacker,
    pixels: Vec<u8>,
    entries: HashMap<(String, FontId), AtlasEntry>,
}

/// Glyph atlas and metrics provider over `fontdue` faces
///
/// Each [`FontFamily`] has a regular face and optional bold, italic and
/// bold-italic faces. Missing styled faces fall back to the regular face.
///
/// # Example
///
/// ```no_run
/// use fancy_text::config::AtlasConfig;
/// use fancy_text::render::{FontdueAtlas, FontFamily};
///
/// let mut atlas = FontdueAtlas::new(AtlasConfig::default())?;
/// atlas.add_face_from_file(FontFamily::DEFAULT, false, false, "resources/fonts/default.ttf")?;
/// atlas.add_face_from_file(FontFamily::DEFAULT, true, false, "resources/fonts/default-bold.ttf")?;
/// # Ok::<(), fancy_text::render::FontError>(())
/// ```
pub struct FontdueAtlas {
    config: AtlasConfig,
    faces: HashMap<(FontFamily, bool, bool), Font>,
    state: RwLock<AtlasState>,
}

impl FontdueAtlas {
    /// Create an atlas with no faces loaded
    pub fn new(config: AtlasConfig) -> FontResult<Self> {
        config
            .validate()
            .map_err(|e| FontError::LoadError(format!("invalid atlas config: {}", e)))?;

        let state = AtlasState {
            packer: ShelfPacker::new(config.width, config.initial_height, config.max_height, config.padding),
            pixels: vec![0; config.width as usize * config.initial_height as usize],
            entries: HashMap::new(),
        };

        Ok(Self {
            config,
            faces: HashMap::new(),
            state: RwLock::new(state),
        })
    }

    /// Load a face from TrueType/OpenType bytes
    ///
    /// # Arguments
    ///
    /// * `family` - Family the face belongs to
    /// * `bold`, `italic` - Style slot the face fills
    /// * `data` - Raw font file bytes
    pub fn add_face(&mut self, family: FontFamily, bold: bool, italic: bool, data: &[u8]) -> FontResult<()> {
        let settings = FontSettings {
            scale: self.config.pixel_size,
            ..FontSettings::default()
        };
        let font = Font::from_bytes(data, settings)
            .map_err(|e| FontError::LoadError(format!("fontdue error: {}", e)))?;

        log::info!(
            "Loaded face for family {:?} (bold: {}, italic: {}) at {}px",
            family, bold, italic, self.config.pixel_size
        );
        self.faces.insert((family, bold, italic), font);
        Ok(())
    }

    /// Load a face from a font file
    pub fn add_face_from_file(&mut self, family: FontFamily, bold: bool, italic: bool, path: &str) -> FontResult<()> {
        let data = std::fs::read(path).map_err(|e| FontError::LoadError(format!("{}: {}", path, e)))?;
        self.add_face(family, bold, italic, &data)
    }

    /// Current atlas dimensions
    pub fn atlas_dimensions(&self) -> (u32, u32) {
        self.read_state().packer.dimensions()
    }

    /// Number of rasterized symbols
    pub fn glyph_count(&self) -> usize {
        self.read_state().entries.len()
    }

    /// Copy of the coverage texture (one byte per pixel, row-major)
    pub fn pixels(&self) -> Vec<u8> {
        self.read_state().pixels.clone()
    }

    /// Save the coverage texture as a grayscale PNG
    pub fn save_debug_image(&self, path: &str) -> FontResult<()> {
        let state = self.read_state();
        let (width, height) = state.packer.dimensions();
        let image = image::GrayImage::from_raw(width, height, state.pixels.clone())
            .ok_or_else(|| FontError::ExportError("atlas buffer does not match its dimensions".to_string()))?;

        image
            .save(path)
            .map_err(|e| FontError::ExportError(format!("{}: {}", path, e)))?;
        log::info!("Saved glyph atlas ({}x{}) to {}", width, height, path);
        Ok(())
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, AtlasState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn face(&self, font: FontId) -> FontResult<&Font> {
        self.faces
            .get(&(font.family, font.bold, font.italic))
            .or_else(|| self.faces.get(&(font.family, false, false)))
            .ok_or(FontError::UnknownFamily(font.family))
    }

    fn pixel_size(&self, font: FontId) -> f32 {
        self.config.pixel_size * font.scale()
    }

    fn ascent(&self, face: &Font, px: f32) -> f32 {
        face.horizontal_line_metrics(px).map_or(px, |metrics| metrics.ascent)
    }

    /// Rasterize every char of a symbol and composite them into one bitmap
    fn rasterize(&self, symbol: &str, font: FontId) -> FontResult<(Vec<u8>, u32, u32, f32, Vec2)> {
        let face = self.face(font)?;
        let px = self.pixel_size(font);

        let mut layers = Vec::new();
        let mut pen = 0.0f32;
        for c in symbol.chars() {
            let (metrics, bitmap) = face.rasterize(c, px);
            if bitmap.len() != metrics.width * metrics.height {
                return Err(FontError::RasterizeError(symbol.to_string(), "bitmap size mismatch".to_string()));
            }
            let left = pen.round() as i32 + metrics.xmin;
            let top = metrics.ymin + metrics.height as i32;
            layers.push((left, top, metrics.width as i32, metrics.height as i32, bitmap));
            pen += metrics.advance_width;
        }

        let visible = layers.iter().filter(|layer| layer.2 > 0 && layer.3 > 0);
        let left = visible.clone().map(|layer| layer.0).min().unwrap_or(0);
        let right = visible.clone().map(|layer| layer.0 + layer.2).max().unwrap_or(0);
        let top = visible.clone().map(|layer| layer.1).max().unwrap_or(0);
        let bottom = visible.map(|layer| layer.1 - layer.3).min().unwrap_or(0);

        let width = (right - left).max(0) as u32;
        let height = (top - bottom).max(0) as u32;
        let mut composite = vec![0u8; (width * height) as usize];

        for (layer_left, layer_top, layer_width, layer_height, bitmap) in &layers {
            for row in 0..*layer_height {
                for col in 0..*layer_width {
                    let dst_x = (layer_left - left + col) as u32;
                    let dst_y = (top - layer_top + row) as u32;
                    let dst = (dst_y * width + dst_x) as usize;
                    let src = (row * layer_width + col) as usize;
                    composite[dst] = composite[dst].max(bitmap[src]);
                }
            }
        }

        let bearing = Vec2::new(left as f32, self.ascent(face, px) - top as f32);
        Ok((composite, width, height, pen, bearing))
    }
}

impl GlyphMetricsProvider for FontdueAtlas {
    fn register_if_needed(&self, text: &str, font: FontId) -> FontResult<()> {
        self.face(font)?;

        let missing: Vec<&str> = {
            let state = self.read_state();
            symbols(text)
                .filter(|symbol| !state.entries.contains_key(&(symbol.to_string(), font)))
                .collect()
        };
        if missing.is_empty() {
            return Ok(());
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        for symbol in missing {
            let key = (symbol.to_string(), font);
            // Another thread may have placed it between the locks
            if state.entries.contains_key(&key) {
                continue;
            }

            let (bitmap, width, height, advance, bearing) = self.rasterize(symbol, font)?;
            let (x, y) = state.packer.allocate(width, height).ok_or_else(|| {
                let (atlas_width, atlas_height) = state.packer.dimensions();
                FontError::AtlasFull {
                    symbol: symbol.to_string(),
                    width: atlas_width,
                    height: atlas_height,
                }
            })?;

            let (atlas_width, atlas_height) = state.packer.dimensions();
            let needed = atlas_width as usize * atlas_height as usize;
            if state.pixels.len() < needed {
                state.pixels.resize(needed, 0);
            }

            for row in 0..height {
                let dst = (y + row) as usize * atlas_width as usize + x as usize;
                let src = (row * width) as usize;
                state.pixels[dst..dst + width as usize].copy_from_slice(&bitmap[src..src + width as usize]);
            }

            log::trace!("Placed {:?} at ({}, {}) size {}x{}", symbol, x, y, width, height);
            state.entries.insert(key, AtlasEntry { x, y, width, height, advance, bearing });
        }
        Ok(())
    }

    fn measure(&self, text: &str, font: FontId) -> FontResult<f32> {
        let face = self.face(font)?;
        let px = self.pixel_size(font);
        Ok(text.chars().map(|c| face.metrics(c, px).advance_width).sum())
    }

    fn line_height(&self, font: FontId) -> FontResult<f32> {
        let face = self.face(font)?;
        let px = self.pixel_size(font);
        Ok(face.horizontal_line_metrics(px).map_or(px * 1.2, |metrics| metrics.new_line_size))
    }

    fn glyph_rect(&self, symbol: &str, font: FontId) -> FontResult<GlyphRect> {
        let state = self.read_state();
        let entry = state
            .entries
            .get(&(symbol.to_string(), font))
            .ok_or_else(|| FontError::GlyphNotFound(symbol.to_string()))?;

        // UVs depend on the current height, which changes as the atlas grows
        let (atlas_width, atlas_height) = state.packer.dimensions();
        let (atlas_width, atlas_height) = (atlas_width as f32, atlas_height as f32);
        Ok(GlyphRect {
            uv_min: Vec2::new(entry.x as f32 / atlas_width, entry.y as f32 / atlas_height),
            uv_max: Vec2::new(
                (entry.x + entry.width) as f32 / atlas_width,
                (entry.y + entry.height) as f32 / atlas_height,
            ),
            size: Vec2::new(entry.width as f32, entry.height as f32),
            advance: entry.advance,
            bearing: entry.bearing,
        })
    }
}
