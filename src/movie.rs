//! Sibling movie lookup: `IMG_1.jpg` pairs with `IMG_1.mp4` in the same directory.

use crate::imaging::MOVIE_EXTENSION;
use crate::index::IndexRegistry;
use crate::locator::Locator;
use crate::resolve::{self, ResolveError};
use std::path::PathBuf;

/// The movie that would accompany the image at `image`.
pub fn movie_locator(image: &Locator) -> Locator {
    image.with_extension(MOVIE_EXTENSION)
}

/// Resolved path of the sibling movie, if it exists as a regular file.
pub fn movie_path(registry: &IndexRegistry, image: &Locator) -> Result<PathBuf, ResolveError> {
    let locator = movie_locator(image);
    let path = resolve::resolve(registry, &locator)?;
    if path.is_file() {
        Ok(path)
    } else {
        Err(ResolveError::NotFound(locator))
    }
}

pub fn has_movie(registry: &IndexRegistry, image: &Locator) -> bool {
    movie_path(registry, image).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use std::fs;
    use tempfile::TempDir;

    fn registry(tmp: &TempDir) -> IndexRegistry {
        let root = tmp.path().join("root");
        fs::create_dir_all(root.join("trip")).unwrap();
        fs::write(root.join("trip/live.jpg"), b"i").unwrap();
        fs::write(root.join("trip/live.mp4"), b"m").unwrap();
        fs::write(root.join("trip/still.jpg"), b"i").unwrap();
        fs::create_dir_all(root.join("trip/odd.mp4")).unwrap();
        fs::write(root.join("trip/odd.png"), b"i").unwrap();
        IndexRegistry::from_config(&[IndexConfig {
            name: "Root".into(),
            path: root,
        }])
        .unwrap()
    }

    #[test]
    fn locator_swaps_extension() {
        assert_eq!(
            movie_locator(&Locator::new(3, "trip/live.jpg")),
            Locator::new(3, "trip/live.mp4")
        );
    }

    #[test]
    fn detects_sibling_movie() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);

        assert!(has_movie(&registry, &Locator::new(0, "trip/live.jpg")));
        assert!(!has_movie(&registry, &Locator::new(0, "trip/still.jpg")));
    }

    #[test]
    fn directory_named_like_a_movie_does_not_count() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);

        assert!(!has_movie(&registry, &Locator::new(0, "trip/odd.png")));
        assert!(matches!(
            movie_path(&registry, &Locator::new(0, "trip/odd.png")),
            Err(ResolveError::NotFound(_))
        ));
    }

    #[test]
    fn movie_path_is_inside_root() {
        let tmp = TempDir::new().unwrap();
        let registry = registry(&tmp);

        let path = movie_path(&registry, &Locator::new(0, "trip/live.jpg")).unwrap();
        assert!(path.starts_with(&registry.get(0).unwrap().root));
        assert!(path.ends_with("trip/live.mp4"));
    }
}
