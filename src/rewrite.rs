//! Note content rewriting: media references and layout cleanup.
//!
//! Exported note bodies reference attachments with `en-media` markers and
//! sometimes carry markup from web clippers that covers or hides the page
//! once rendered standalone. [`rewrite_content`] runs five passes, in order:
//!
//! 1. `en-media` markers with a known hash become `<img>` (image MIME types)
//!    or `<a>` links into `media/`. Unknown hashes are left untouched.
//! 2. Absolutely positioned, full-width `div`s with a `z-index` are removed.
//! 3. Highslide lightbox containers are removed.
//! 4. `z-index` values of four or more digits are clamped to `1`.
//! 5. Elements styled `top: -9999px` are removed.
//!
//! All passes are regex substitutions over the raw markup, case-insensitive
//! and spanning newlines. This is targeted cleanup, not an HTML sanitizer:
//! the input is never parsed into a tree. Passes 2–5 are idempotent.

use crate::naming::link_target;
use crate::types::ResourceMap;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Value extreme `z-index` declarations are clamped to.
pub const CLAMPED_Z_INDEX: &str = "z-index: 1";

static MEDIA_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<en-media[^>]*\shash\s*=\s*"([^"]*)"[^>]*?/?>(?:\s*</en-media>)?"#)
        .expect("media tag pattern is valid")
});

static FULL_WIDTH_OVERLAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<div[^>]*position\s*:\s*absolute[^>]*width\s*:\s*100%[^>]*z-index\s*:\s*\d+[^>]*>.*?</div>",
    )
    .expect("overlay pattern is valid")
});

static HIGHSLIDE_CONTAINER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<div[^>]*highslide[^>]*>.*?</div>").expect("highslide pattern is valid")
});

static EXTREME_Z_INDEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)z-index\s*:\s*\d{4,}").expect("z-index pattern is valid")
});

static OFF_SCREEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<[^>]*style\s*=\s*["'][^"']*top\s*:\s*-9999px[^"']*["'][^>]*>.*?</[^>]+>"#,
    )
    .expect("off-screen pattern is valid")
});

/// Rewrite a note body against its archive's resources.
pub fn rewrite_content(content: &str, resources: &ResourceMap) -> String {
    if content.is_empty() {
        return String::new();
    }
    let content = resolve_media(content, resources);
    clean_layout(&content)
}

/// Pass 1: replace `en-media` markers whose hash is in `resources`.
pub fn resolve_media(content: &str, resources: &ResourceMap) -> String {
    MEDIA_TAG
        .replace_all(content, |caps: &Captures| {
            let Some(resource) = resources.get(&caps[1]) else {
                return caps[0].to_string();
            };
            let target = link_target(&resource.filename);
            if resource.is_image() {
                format!(r#"<img src="media/{target}" alt="Image" style="max-width: 100%;" />"#)
            } else {
                format!(
                    r#"<a href="media/{target}" target="_blank">{}</a>"#,
                    resource.filename
                )
            }
        })
        .into_owned()
}

/// Passes 2–5: strip or neutralize layout-breaking markup.
pub fn clean_layout(content: &str) -> String {
    let content = FULL_WIDTH_OVERLAY.replace_all(content, "");
    let content = HIGHSLIDE_CONTAINER.replace_all(&content, "");
    let content = EXTREME_Z_INDEX.replace_all(&content, CLAMPED_Z_INDEX);
    let content = OFF_SCREEN.replace_all(&content, "");
    content.into_owned()
}
