//! Directory listing module
//!
//! Generates the HTML index page for directories without an index file.

use std::fmt::Write;
use std::io;
use std::path::Path;
use tokio::fs;

use super::upload::is_partial_upload;
use crate::http::path::{html_escape, percent_encode_segment};

/// One row of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

impl ListingEntry {
    fn href(&self) -> String {
        let mut href = percent_encode_segment(&self.name);
        if self.is_dir {
            href.push('/');
        }
        href
    }

    fn display_name(&self) -> String {
        let mut display = self.name.clone();
        if self.is_dir {
            display.push('/');
        }
        if self.is_symlink {
            display.push('@');
        }
        display
    }
}

/// Read a directory, sorted case-insensitively, without in-flight uploads
pub async fn read_entries(dir: &Path) -> io::Result<Vec<ListingEntry>> {
    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;

    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_partial_upload(&name) {
            continue;
        }
        let is_symlink = entry.file_type().await.is_ok_and(|t| t.is_symlink());
        // Follows symlinks, like the link target a browser will reach
        let is_dir = fs::metadata(entry.path()).await.is_ok_and(|m| m.is_dir());
        entries.push(ListingEntry {
            name,
            is_dir,
            is_symlink,
        });
    }

    entries.sort_by_cached_key(|e| e.name.to_lowercase());
    Ok(entries)
}

/// Render the listing page for `url_path` (already percent-decoded)
pub fn render_listing(url_path: &str, entries: &[ListingEntry]) -> String {
    let title = format!("Directory listing for {}", html_escape(url_path));
    let mut html = String::with_capacity(256 + entries.len() * 64);

    html.push_str("<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    // Writing into a String cannot fail
    let _ = write!(
        html,
        "<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for entry in entries {
        let _ = writeln!(
            html,
            "<li><a href=\"{}\">{}</a></li>",
            html_escape(&entry.href()),
            html_escape(&entry.display_name())
        );
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entries_sorted_and_filtered() {
        let dir = temp_dir::TempDir::new().unwrap();
        std::fs::write(dir.child("b.txt"), b"b").unwrap();
        std::fs::write(dir.child("A.txt"), b"a").unwrap();
        std::fs::create_dir(dir.child("music")).unwrap();
        std::fs::write(dir.child(".filedrop-1-0.part"), b"partial").unwrap();

        let entries = read_entries(dir.path()).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["A.txt", "b.txt", "music"]);
        assert!(entries[2].is_dir);
        assert!(!entries[0].is_dir);
    }

    #[test]
    fn test_render_escapes_and_encodes() {
        let entries = vec![
            ListingEntry {
                name: "my <notes>.txt".to_string(),
                is_dir: false,
                is_symlink: false,
            },
            ListingEntry {
                name: "songs".to_string(),
                is_dir: true,
                is_symlink: true,
            },
        ];
        let html = render_listing("/drop/", &entries);
        assert!(html.contains("<title>Directory listing for /drop/</title>"));
        assert!(html.contains("<li><a href=\"my%20%3Cnotes%3E.txt\">my &lt;notes&gt;.txt</a></li>"));
        assert!(html.contains("<li><a href=\"songs/\">songs/@</a></li>"));
    }
}
