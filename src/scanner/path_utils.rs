//! Path identity and display helpers.
//!
//! Every indexed node is addressed by a 32-bit checksum of its absolute
//! path. The path string is NFC-normalized before hashing so that the same
//! visual name yields the same id on macOS (which stores NFD) and on other
//! platforms.
//!
//! # Example
//!
//! ```
//! use jomics::scanner::path_utils::{entry_id, title_from_path};
//! use std::path::Path;
//!
//! let path = Path::new("/comics/Foo_Bar.cbz");
//! assert_eq!(entry_id(path), entry_id(path));
//! assert_eq!(title_from_path(path, false), "Foo Bar");
//! ```

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

/// Normalize a path string to NFC (Composed) form.
///
/// Borrows the input when it is already NFC.
#[must_use]
pub fn normalize_path_str(s: &str) -> Cow<'_, str> {
    if unicode_normalization::is_nfc(s) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.nfc().collect())
    }
}

/// Checksum id of a path: CRC-32 (IEEE) of its NFC-normalized string.
///
/// Paths that are not valid UTF-8 are hashed in their lossy form.
///
/// Ids are 32 bits, so distinct paths can collide. Normalization adds one
/// more source: on filesystems that store names byte for byte, two files
/// whose names differ only in Unicode normalization form (`é` composed or
/// as `e` plus a combining accent) get the same id, and the index keeps
/// whichever comes first in walk order.
#[must_use]
pub fn entry_id(path: &Path) -> u32 {
    let lossy = path.to_string_lossy();
    crc32fast::hash(normalize_path_str(&lossy).as_bytes())
}

/// Make `root` absolute and drop redundant separators and `.` components.
///
/// Symlinks are not resolved, so ids stay tied to the path the user
/// configured.
///
/// # Errors
///
/// Returns an error if the current directory is needed and cannot be read.
pub fn normalize_root(root: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(root)?;
    Ok(absolute
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

/// Display title derived from a file or directory name.
///
/// Archive extensions are stripped, underscores become spaces and every
/// word is capitalized. Directory names keep any dots they contain.
#[must_use]
pub fn title_from_path(path: &Path, is_dir: bool) -> String {
    let name = if is_dir {
        path.file_name()
    } else {
        path.file_stem()
    };
    let name = name.map(|n| n.to_string_lossy()).unwrap_or_default();
    title_case(&normalize_path_str(&name).replace('_', " "))
}

/// Upper-case the first letter of each word, leaving the rest untouched.
///
/// A word starts after any character that is not alphanumeric.
#[must_use]
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}
