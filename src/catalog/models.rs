//! Wire shapes returned by the catalog and their conversion into [`Game`]s.

use serde::Deserialize;
use std::collections::HashSet;

use crate::grid::models::Game;

#[derive(Debug, Clone, Deserialize)]
pub struct RawImage {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGame {
    pub id: u64,
    pub name: String,
    pub cover: Option<RawImage>,
    #[serde(default)]
    pub screenshots: Vec<RawImage>,
    pub first_release_date: Option<i64>,
    pub total_rating_count: Option<u64>,
}

/// Rendition sizes understood by the image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    CoverSmall,
    CoverBig,
    ScreenshotBig,
}

impl ImageSize {
    fn token(self) -> &'static str {
        match self {
            Self::CoverSmall => "t_cover_small",
            Self::CoverBig => "t_cover_big",
            Self::ScreenshotBig => "t_screenshot_big",
        }
    }
}

/// Make a catalog image reference absolute and point it at `size`.
///
/// References arrive protocol-relative with the thumbnail rendition, e.g.
/// `//images.igdb.com/igdb/image/upload/t_thumb/co1r7f.jpg`.
pub fn image_url(raw: &str, size: ImageSize) -> String {
    let absolute = if raw.starts_with("//") {
        format!("https:{raw}")
    } else {
        raw.to_string()
    };
    absolute.replacen("/t_thumb/", &format!("/{}/", size.token()), 1)
}

impl RawGame {
    fn cover_url(&self, size: ImageSize) -> Option<String> {
        self.cover
            .as_ref()
            .and_then(|c| c.url.as_deref())
            .map(|url| image_url(url, size))
    }

    /// A grid candidate with cover and screenshots at display size.
    pub fn into_candidate(self) -> Game {
        let cover = self.cover_url(ImageSize::CoverBig);
        let screenshots = self
            .screenshots
            .iter()
            .filter_map(|s| s.url.as_deref())
            .map(|url| image_url(url, ImageSize::ScreenshotBig))
            .collect();
        Game {
            id: self.id,
            name: self.name,
            cover,
            screenshots,
            first_release_date: self.first_release_date,
        }
    }

    /// A search hit: name, id, release date and a small cover only.
    pub fn into_search_hit(self) -> Game {
        Game {
            cover: self.cover_url(ImageSize::CoverSmall),
            id: self.id,
            name: self.name,
            screenshots: Vec::new(),
            first_release_date: self.first_release_date,
        }
    }
}

/// Order candidates reproducibly and keep the first entry for each name.
///
/// Sorted by rating count descending with the catalog id as tie-breaker, so
/// equal-popularity games cannot swap places between fetches.
pub fn build_pool(mut raw: Vec<RawGame>) -> Vec<Game> {
    raw.sort_by(|a, b| {
        b.total_rating_count
            .unwrap_or(0)
            .cmp(&a.total_rating_count.unwrap_or(0))
            .then(a.id.cmp(&b.id))
    });

    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|g| seen.insert(g.name.clone()))
        .map(RawGame::into_candidate)
        .collect()
}
