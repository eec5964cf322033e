//! Fancy text demo application
//!
//! Parses a set of markup samples, wraps them to a fixed width and renders
//! them into recorded draw data, logging what each stage produced.
//!
//! Usage: `text_demo [config.toml]` (defaults to `text_demo/demo.toml`).

use std::collections::HashMap;
use std::sync::Arc;

use fancy_text::config::{AtlasConfig, Config, ConfigError, FancyTextConfig};
use fancy_text::foundation::logging;
use fancy_text::foundation::math::Vec2;
use fancy_text::render::{
    FontError, FontFamily, FontdueAtlas, GlyphMetricsProvider, MonospaceMetrics, RenderData, TextRenderer,
};
use fancy_text::text::{FancyTextParser, LanguageLookup};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG: &str = "text_demo/demo.toml";

/// Demo errors
#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Font error: {0}")]
    Font(#[from] FontError),
}

/// Demo settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    /// TTF/OTF file; fixed-width metrics are used when unset
    font_path: Option<String>,
    /// PNG path the glyph atlas is written to after rendering
    atlas_dump: Option<String>,
    /// Wrap width in pixels
    wrap_width: f32,
    /// Markup to run through the pipeline
    samples: Vec<String>,
    /// `lang=` string table; `{1}`, `{2}`, ... are replaced by arguments
    strings: HashMap<String, String>,
    text: FancyTextConfig,
    atlas: AtlasConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            atlas_dump: None,
            wrap_width: 240.0,
            samples: vec!["^1Hello^r World".to_string()],
            strings: HashMap::new(),
            text: FancyTextConfig::default(),
            atlas: AtlasConfig::default(),
        }
    }
}

impl Config for DemoConfig {}

/// String table lookup with positional arguments
struct StringTable(HashMap<String, String>);

impl LanguageLookup for StringTable {
    fn lookup(&self, parts: &[&str]) -> String {
        let Some((key, args)) = parts.split_first() else {
            return String::new();
        };
        let Some(template) = self.0.get(*key) else {
            log::warn!("Missing string table entry '{}'", key);
            return (*key).to_string();
        };

        args.iter()
            .enumerate()
            .fold(template.clone(), |text, (index, arg)| text.replace(&format!("{{{}}}", index + 1), arg))
    }
}

fn load_config(path: &str) -> Result<DemoConfig, DemoError> {
    let config = match DemoConfig::load_from_file(path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) => {
            log::warn!("Could not read {} ({}), using defaults", path, e);
            DemoConfig::default()
        }
        Err(e) => return Err(e.into()),
    };
    config.text.validate()?;
    config.atlas.validate()?;
    Ok(config)
}

fn run() -> Result<(), DemoError> {
    let path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let config = load_config(&path)?;
    log::info!("Loaded demo configuration from {}", path);

    let atlas = match &config.font_path {
        Some(font_path) => {
            let mut atlas = FontdueAtlas::new(config.atlas.clone())?;
            atlas.add_face_from_file(FontFamily::DEFAULT, false, false, font_path)?;
            Some(Arc::new(atlas))
        }
        None => None,
    };
    let metrics: Arc<dyn GlyphMetricsProvider> = match &atlas {
        Some(atlas) => atlas.clone(),
        None => {
            log::info!("No font configured, using fixed-width metrics");
            Arc::new(MonospaceMetrics::new(8.0, 16.0).with_bold_extra(1.0))
        }
    };

    let parser = FancyTextParser::new(Arc::clone(&metrics))
        .with_config(config.text.clone())
        .with_lookup(Arc::new(StringTable(config.strings.clone())));
    let wrapper = parser.wrapper();
    let renderer = TextRenderer::new(Arc::clone(&metrics)).with_config(config.text.clone());

    let mut data = RenderData::empty();
    let mut pen = Vec2::new(16.0, 16.0);

    for sample in &config.samples {
        let document = parser.parse(sample)?;
        let wrapped = wrapper.wrap_with_skips(&document, config.wrap_width)?;

        data.clear();
        renderer.render(&wrapped.document, pen, 0.0, &mut data)?;

        log::info!("{:?}", sample);
        log::info!(
            "  {} runs, {:.0}x{:.0}px -> {} lines at {}px ({} chars dropped), {} quads, {} glyphs",
            document.runs().count(),
            document.width(),
            document.height(),
            wrapped.document.lines().len(),
            config.wrap_width,
            wrapped.skipped.len(),
            data.quads.len(),
            data.glyphs.len(),
        );
        for line in wrapped.document.lines() {
            log::info!("  | {}", line.text());
        }

        for run in wrapped.document.runs() {
            if let Some(target) = run.click_target() {
                log::info!("  link {:?} -> {}", run.text(), target);
            }
            if let Some(hover) = run.hover() {
                log::info!("  hover {:?} -> {:?}", run.text(), hover.to_plain_string());
            }
        }

        let probe = pen + Vec2::new(1.0, 1.0);
        if let Some(run) = renderer.hit_test(&wrapped.document, pen, probe) {
            log::debug!("  hit test at ({}, {}) -> {:?}", probe.x, probe.y, run.text());
        }

        pen.y += wrapped.document.height() + 8.0;
    }

    log::info!("Parse cache holds {} documents", parser.cache().len());

    if let (Some(atlas), Some(dump)) = (&atlas, &config.atlas_dump) {
        let (width, height) = atlas.atlas_dimensions();
        log::info!("Glyph atlas: {} symbols in {}x{}", atlas.glyph_count(), width, height);
        atlas.save_debug_image(dump)?;
    }

    Ok(())
}

fn main() {
    logging::init_with_level("info");
    log::info!("Starting fancy text demo");

    if let Err(e) = run() {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}
