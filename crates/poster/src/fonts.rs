//! Font resolution for title text.

use fontdb::{Database, Family, Query, Source};
use rusttype::Font;

/// System font database, loaded once and queried per render.
pub struct FontStore {
    db: Database,
}

impl FontStore {
    pub fn new() -> Self {
        let mut db = Database::new();
        db.load_system_fonts();
        Self { db }
    }

    /// Resolve a family name to a rasterizable font, falling back to the
    /// generic sans-serif family when the requested one is not installed.
    /// None when no usable font exists on the system at all.
    pub fn resolve(&self, family: &str) -> Option<Font<'static>> {
        let query = Query {
            families: &[Family::Name(family), Family::SansSerif],
            weight: fontdb::Weight::NORMAL,
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        };
        let id = self.db.query(&query)?;
        let (source, index) = self.db.face_source(id)?;
        let data = match source {
            Source::Binary(data) => data.as_ref().as_ref().to_vec(),
            Source::File(path) => std::fs::read(path).ok()?,
            Source::SharedFile(path, _) => std::fs::read(path).ok()?,
        };
        Font::try_from_vec_and_index(data, index)
    }
}

impl Default for FontStore {
    fn default() -> Self {
        Self::new()
    }
}
