//! Maps request targets onto files below the mount point.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::response::escape_html;

/// Index documents tried, in order, when a directory is requested.
pub const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Outcome of mapping a request target onto the mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    File(PathBuf),
    /// A directory without an index document. `url_path` is the decoded path
    /// used for the listing's title.
    Listing { dir: PathBuf, url_path: String },
    /// A directory requested without its trailing slash.
    Redirect(String),
    NotFound,
}

/// Resolves `target` (path plus optional query/fragment) below `root`.
///
/// `..` segments are never followed, and the canonical result must stay
/// inside the canonical root, so neither dot-segments nor symlinks can reach
/// files outside it.
pub fn resolve(root: &Path, target: &str) -> Resolved {
    let (path_part, query) = split_target(target);
    let decoded = percent_decode(path_part);

    let mut fs_path = root.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Resolved::NotFound,
            s if s.contains(['\\', '\0']) => return Resolved::NotFound,
            s => fs_path.push(s),
        }
    }

    let (Ok(root), Ok(path)) = (fs::canonicalize(root), fs::canonicalize(&fs_path)) else {
        return Resolved::NotFound;
    };
    if !path.starts_with(&root) {
        #[cfg(feature = "log")]
        log::warn!("refusing {} outside of {}", path.display(), root.display());
        return Resolved::NotFound;
    }

    if path.is_dir() {
        if !path_part.ends_with('/') {
            // A leading `//` would make `Location` protocol-relative.
            let trimmed = path_part.trim_start_matches('/');
            return Resolved::Redirect(format!("/{trimmed}/{query}"));
        }
        let index = INDEX_FILES.iter().map(|i| path.join(i)).find(|p| p.is_file());
        return match index {
            Some(index) => Resolved::File(index),
            None => Resolved::Listing {
                dir: path,
                url_path: decoded,
            },
        };
    }

    if path_part.ends_with('/') || !path.is_file() {
        return Resolved::NotFound;
    }
    Resolved::File(path)
}

/// Splits a request target into its path and the `?query` suffix (kept with
/// its `?` so it can be re-appended on redirects). Fragments are dropped.
fn split_target(target: &str) -> (&str, &str) {
    let target = target.split('#').next().unwrap_or_default();
    match target.find('?') {
        Some(i) => target.split_at(i),
        None => (target, ""),
    }
}

pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

pub fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char)
            }
            b => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Generated HTML index of `dir`.
pub fn list_directory(dir: &Path, url_path: &str) -> io::Result<String> {
    let mut entries: Vec<(String, String, String)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_link = entry.file_type()?.is_symlink();

        let (mut display, mut link) = (name.clone(), name.clone());
        if entry.path().is_dir() {
            display.push('/');
            link.push('/');
        }
        if is_link {
            display = format!("{name}@");
        }
        entries.push((name.to_lowercase(), display, link));
    }
    entries.sort();

    let title = format!("Directory listing for {}", escape_html(url_path));
    let mut page = format!(
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<hr>\n<ul>\n"
    );
    for (_, display, link) in entries {
        page.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            percent_encode(&link),
            escape_html(&display)
        ));
    }
    page.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    Ok(page)
}
