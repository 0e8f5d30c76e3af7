//! End-to-end generation: font file in, `.fnt` and `.tex` out

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::builder::{AtlasBuilder, BuildOutput, BuildStats};
use crate::codepage::GbkMapper;
use crate::config::{AtlasConfig, check_texture_name};
use crate::raster::{FontFile, GlyphSource, TtfRasterizer};
use crate::{Result, tex};

/// Drives a full generation run
pub struct FontGenerator {
    config: AtlasConfig,
}

impl FontGenerator {
    pub fn new(config: AtlasConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Load `font_path`, build the atlas and write both output files.
    ///
    /// Every precondition (configuration, font, charmap) is checked before
    /// either output file is created.
    pub fn run(&self, font_path: &Path, fnt_path: &Path, tex_path: &Path) -> Result<BuildStats> {
        let config = self.resolved_config(tex_path)?;

        let font = FontFile::open(font_path)?;
        let rasterizer = TtfRasterizer::new(&font, config.cell_width)?;

        self.write_outputs(config, rasterizer, fnt_path, tex_path)
    }

    /// Same as [`FontGenerator::run`] with an already loaded glyph source
    pub fn run_with_source<G: GlyphSource>(
        &self,
        glyphs: G,
        fnt_path: &Path,
        tex_path: &Path,
    ) -> Result<BuildStats> {
        let config = self.resolved_config(tex_path)?;
        self.write_outputs(config, glyphs, fnt_path, tex_path)
    }

    /// Configuration with the texture name filled in from the output path
    fn resolved_config(&self, tex_path: &Path) -> Result<AtlasConfig> {
        let mut config = self.config.clone();
        if config.texture_name.is_none() {
            let name = tex_path.to_string_lossy().into_owned();
            check_texture_name(name.as_bytes())?;
            config.texture_name = Some(name);
        }
        config.validate()?;
        Ok(config)
    }

    fn write_outputs<G: GlyphSource>(
        &self,
        config: AtlasConfig,
        glyphs: G,
        fnt_path: &Path,
        tex_path: &Path,
    ) -> Result<BuildStats> {
        let row_order = config.row_order;
        let builder = AtlasBuilder::new(config, GbkMapper::new(), glyphs)?;
        let BuildOutput {
            grid,
            metadata,
            stats,
            ..
        } = builder.build();

        let mut fnt = BufWriter::new(File::create(fnt_path)?);
        metadata.write_to(&mut fnt)?;
        fnt.flush()?;
        tracing::info!(
            "Wrote {} ({} records)",
            fnt_path.display(),
            metadata.record_count()
        );

        let mut tex_out = BufWriter::new(File::create(tex_path)?);
        tex::write_texture(&mut tex_out, &grid, row_order)?;
        tex_out.flush()?;
        tracing::info!(
            "Wrote {} ({}x{}, {:?})",
            tex_path.display(),
            grid.width(),
            grid.height(),
            row_order
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FontGenError;

    #[test]
    fn test_missing_font_writes_nothing() {
        let dir = std::env::temp_dir().join(format!("mwf-gen-missing-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let fnt = dir.join("out.fnt");
        let tex = dir.join("out.tex");

        let result = FontGenerator::new(AtlasConfig::default()).run(&dir.join("none.ttf"), &fnt, &tex);
        assert!(matches!(result, Err(FontGenError::FontRead { .. })));
        assert!(!fnt.exists());
        assert!(!tex.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_font_writes_nothing() {
        let dir = std::env::temp_dir().join(format!("mwf-gen-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let font = dir.join("bad.ttf");
        std::fs::write(&font, b"not a font at all").unwrap();
        let fnt = dir.join("out.fnt");
        let tex = dir.join("out.tex");

        let result = FontGenerator::new(AtlasConfig::default()).run(&font, &fnt, &tex);
        assert!(matches!(result, Err(FontGenError::FontParsing(_))));
        assert!(!fnt.exists());
        assert!(!tex.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_texture_name_too_long() {
        let generator = FontGenerator::new(AtlasConfig::default());
        let long = std::path::PathBuf::from("t".repeat(300));
        assert!(matches!(
            generator.resolved_config(&long),
            Err(FontGenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_texture_name_defaults_to_path() {
        let generator = FontGenerator::new(AtlasConfig::default());
        let config = generator.resolved_config(Path::new("fonts/cn.tex")).unwrap();
        assert_eq!(config.texture_name.as_deref(), Some("fonts/cn.tex"));

        let generator = FontGenerator::new(AtlasConfig {
            texture_name: Some("custom".into()),
            ..Default::default()
        });
        let config = generator.resolved_config(Path::new("fonts/cn.tex")).unwrap();
        assert_eq!(config.texture_name.as_deref(), Some("custom"));
    }
}
