use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{DynamicImage, Rgba};
use imageproc::{drawing, rect::Rect};
use rusttype::{Font, Scale};
use tracing::{debug, warn};

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LprError, LprErrorKind};

pub const DEFAULT_FONT_NAME: &str = "arial.ttf";
pub const FONT_SIZE: f32 = 30.0;
/// top-left inset of the plate text
pub const TEXT_ORIGIN: (u32, u32) = (10, 10);
pub const TEXT_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

// font directories nest a few levels at most (family/style/file)
const MAX_SEARCH_DEPTH: usize = 4;

/// A font that can always draw.
pub enum PlateFont {
    Outline(Font<'static>),
    /// built-in 8x8 glyphs, scaled up to the requested size
    Bitmap,
}

impl PlateFont {

    pub fn is_builtin(&self) -> bool {
        matches!(self, PlateFont::Bitmap)
    }

    pub fn draw(&self, img: &mut DynamicImage, (x, y): (u32, u32), size: f32, color: Rgba<u8>, text: &str) {
        match self {
            PlateFont::Outline(font) => {
                let scale = Scale::uniform(size);
                drawing::draw_text_mut(img, color, x, y, scale, font, text);
            }
            PlateFont::Bitmap => draw_bitmap_text(img, (x, y), size, color, text),
        }
    }

    /// Width and height of the box `text` occupies with the bitmap font.
    pub fn bitmap_extent(size: f32, text: &str) -> (u32, u32) {
        let cell = bitmap_cell(size);
        (cell * 8 * text.chars().count() as u32, cell * 8)
    }
}

fn bitmap_cell(size: f32) -> u32 {
    ((size / 8.0).round() as u32).max(1)
}

fn draw_bitmap_text(img: &mut DynamicImage, (x, y): (u32, u32), size: f32, color: Rgba<u8>, text: &str) {
    let cell = bitmap_cell(size);
    for (index, c) in text.chars().enumerate() {
        // unknown characters leave a blank cell
        let glyph = match BASIC_FONTS.get(c) {
            Some(glyph) => glyph,
            None => continue,
        };
        let glyph_x = x + index as u32 * cell * 8;
        for (row_index, row) in glyph.iter().enumerate() {
            for bit in 0..8u32 {
                if *row & (1u8 << bit) == 0 {
                    continue;
                }
                let px = glyph_x + bit * cell;
                let py = y + row_index as u32 * cell;
                let rect = Rect::at(px as i32, py as i32).of_size(cell, cell);
                drawing::draw_filled_rect_mut(img, rect, color);
            }
        }
    }
}

/// Preferred font first, built-in font when that fails.
pub struct FontResolver {
    preferred: String,
    search_dirs: Vec<PathBuf>,
}

impl FontResolver {

    pub fn new(preferred: impl Into<String>) -> Self {
        FontResolver { preferred: preferred.into(), search_dirs: system_font_dirs() }
    }

    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    pub fn preferred(&self) -> &str {
        &self.preferred
    }

    pub fn load_preferred(&self) -> Result<Font<'static>, LprError> {
        let path = self.locate().ok_or_else(|| {
            LprErrorKind::FontError(format!("{} not found", self.preferred))
        })?;
        let data = fs::read(&path)?;
        let font = Font::try_from_vec(data).ok_or_else(|| {
            LprErrorKind::FontError(format!("{} is not a usable font", path.display()))
        })?;
        debug!("loaded font {}", path.display());
        Ok(font)
    }

    pub fn resolve(&self) -> PlateFont {
        match self.load_preferred() {
            Ok(font) => PlateFont::Outline(font),
            Err(e) => {
                warn!("custom font not found ({}), falling back to default font", e);
                PlateFont::Bitmap
            }
        }
    }

    fn locate(&self) -> Option<PathBuf> {
        let direct = Path::new(&self.preferred);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        let name = direct.file_name()?.to_str()?.to_lowercase();
        self.search_dirs.iter().find_map(|dir| find_file(dir, &name, MAX_SEARCH_DEPTH))
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_NAME)
    }
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];
    if let Some(home) = env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
    }
    for dir in &["/usr/share/fonts", "/usr/local/share/fonts", "/Library/Fonts",
                 "/System/Library/Fonts", "C:\\Windows\\Fonts"] {
        dirs.push(PathBuf::from(dir));
    }
    dirs
}

/// case-insensitive file name search, unreadable directories are ignored
fn find_file(dir: &Path, lower_name: &str, depth: usize) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut sub_dirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            sub_dirs.push(path);
        } else if entry.file_name().to_string_lossy().to_lowercase() == lower_name {
            return Some(path);
        }
    }
    if depth == 0 {
        return None;
    }
    sub_dirs.iter().find_map(|sub| find_file(sub, lower_name, depth - 1))
}

/// Writes the plate text into the top-left corner of a copy of the image.
pub struct Annotator {
    font: PlateFont,
}

impl Annotator {

    pub fn new(font: PlateFont) -> Self {
        Annotator { font }
    }

    pub fn from_resolver(resolver: &FontResolver) -> Self {
        Self::new(resolver.resolve())
    }

    pub fn font(&self) -> &PlateFont {
        &self.font
    }

    pub fn annotate(&self, img: &DynamicImage, text: &str) -> DynamicImage {
        let mut annotated = img.clone();
        self.font.draw(&mut annotated, TEXT_ORIGIN, FONT_SIZE, TEXT_COLOR, text);
        annotated
    }
}
