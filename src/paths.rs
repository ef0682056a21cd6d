//! Naming conventions linking source images, masks and outputs
//!
//! A source image `IMG_0001.JPG` pairs with the mask `IMG_0001.JPG.mask.png` and
//! produces `IMG_0001_black_background.png`. Suffix matching is exact and
//! case-sensitive.

use std::path::{Path, PathBuf};

/// Suffix a file name must carry to be picked up as a source image
pub const IMAGE_SUFFIX: &str = ".JPG";

/// Suffix appended to the full image file name to form the mask file name
pub const MASK_SUFFIX: &str = ".mask.png";

/// Suffix appended to the image base name to form the output file name
pub const OUTPUT_SUFFIX: &str = "_black_background.png";

/// Whether `file_name` qualifies as a source image
#[must_use]
pub fn is_source_image(file_name: &str) -> bool {
    file_name.ends_with(IMAGE_SUFFIX)
}

/// Mask file name for an image file name (`foo.JPG` -> `foo.JPG.mask.png`)
#[must_use]
pub fn mask_file_name(image_name: &str) -> String {
    format!("{image_name}{MASK_SUFFIX}")
}

/// Full mask path for an image file name inside `mask_dir`
///
/// Whether the file exists is not checked here; a missing mask shows up as a
/// load failure.
#[must_use]
pub fn mask_path_for(image_name: &str, mask_dir: &Path) -> PathBuf {
    mask_dir.join(mask_file_name(image_name))
}

/// Output file name for an image file name, with the last extension stripped
#[must_use]
pub fn output_file_name(image_name: &str) -> String {
    let base = Path::new(image_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(image_name);
    format!("{base}{OUTPUT_SUFFIX}")
}

/// Full output path for an image file name inside `output_dir`
#[must_use]
pub fn output_path_for(image_name: &str, output_dir: &Path) -> PathBuf {
    output_dir.join(output_file_name(image_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_image_suffix_is_case_sensitive() {
        assert!(is_source_image("a.JPG"));
        assert!(is_source_image("holiday.photo.JPG"));
        assert!(!is_source_image("a.jpg"));
        assert!(!is_source_image("a.Jpg"));
        assert!(!is_source_image("b.txt"));
        assert!(!is_source_image("a.JPG.mask.png"));
    }

    #[test]
    fn test_mask_path_appends_suffix_to_full_name() {
        let mask_dir = Path::new("/data/masks");
        assert_eq!(
            mask_path_for("foo.JPG", mask_dir),
            mask_dir.join("foo.JPG.mask.png")
        );
        assert_eq!(mask_file_name("IMG_0001.JPG"), "IMG_0001.JPG.mask.png");
    }

    #[test]
    fn test_output_name_strips_last_extension() {
        assert_eq!(output_file_name("a.JPG"), "a_black_background.png");
        assert_eq!(
            output_file_name("holiday.photo.JPG"),
            "holiday.photo_black_background.png"
        );
        assert_eq!(
            output_path_for("a.JPG", Path::new("out")),
            Path::new("out").join("a_black_background.png")
        );
    }
}
