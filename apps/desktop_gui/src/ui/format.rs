//! Text shaping for post cards and the pager.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use client_core::{PageWindow, PendingImage};

pub const PREVIEW_CHARS: usize = 150;

/// First 150 characters of a post body, with "..." when cut.
pub fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub fn local_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerModel {
    pub prev_enabled: bool,
    pub next_enabled: bool,
    /// Page number and whether it is the current one.
    pub pages: Vec<(u64, bool)>,
}

pub fn pager(window: &PageWindow) -> PagerModel {
    PagerModel {
        prev_enabled: window.can_prev(),
        next_enabled: window.can_next(),
        pages: window
            .page_numbers()
            .map(|page| (page, page == window.page()))
            .collect(),
    }
}

pub fn page_summary(window: &PageWindow) -> String {
    match window.total() {
        0 => "No posts yet".to_string(),
        1 => "1 post".to_string(),
        total => format!(
            "{total} posts, page {} of {}",
            window.page(),
            window.total_pages()
        ),
    }
}

/// Reads a picked file into an attachment candidate.
pub fn load_pending_image(path: &Path) -> Result<PendingImage, String> {
    let bytes = std::fs::read(path)
        .map_err(|err| format!("Could not read {}: {err}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    Ok(PendingImage::new(file_name, bytes, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_characters() {
        let short = "v1 is live";
        assert_eq!(preview(short), short);

        let exact = "a".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&exact), exact);

        let long = "é".repeat(PREVIEW_CHARS + 1);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn pager_disables_edges() {
        let mut window = PageWindow::default();
        let empty = pager(&window);
        assert!(!empty.prev_enabled);
        assert!(!empty.next_enabled);
        assert!(empty.pages.is_empty());

        window.set_total(17);
        window.go_to(2).expect("page 2");
        let model = pager(&window);
        assert!(model.prev_enabled);
        assert!(model.next_enabled);
        assert_eq!(model.pages, vec![(1, false), (2, true), (3, false)]);

        window.go_to(3).expect("page 3");
        assert!(!pager(&window).next_enabled);
    }

    #[test]
    fn page_summary_counts_posts() {
        let mut window = PageWindow::default();
        assert_eq!(page_summary(&window), "No posts yet");
        window.set_total(1);
        assert_eq!(page_summary(&window), "1 post");
        window.set_total(9);
        assert_eq!(page_summary(&window), "9 posts, page 1 of 2");
    }

    #[test]
    fn missing_file_is_reported_not_panicked() {
        let err = load_pending_image(Path::new("/definitely/not/here.png")).expect_err("missing");
        assert!(err.starts_with("Could not read"));
    }
}
