//! Embedded `ComicInfo.xml` descriptor parsing.
//!
//! Many comic archives carry a `ComicInfo.xml` document describing the
//! series, issue number, year and the role of individual pages. This module
//! turns that document into a display title. Metadata is enrichment only:
//! any failure to find or parse the descriptor yields `None` and the caller
//! falls back to a filename-derived title.

use serde::Deserialize;

use crate::archive::Archive;

/// Name of the descriptor entry inside an archive.
pub const COMIC_INFO_ENTRY: &str = "ComicInfo.xml";

/// Page type marking the intended front cover.
pub const FRONT_COVER: &str = "FrontCover";

/// Parsed `ComicInfo.xml` fields used by the collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComicInfo {
    /// Issue title
    #[serde(rename = "Title")]
    pub title: String,
    /// Series name
    #[serde(rename = "Series")]
    pub series: String,
    /// Issue number (free text, e.g. "12" or "12.5")
    #[serde(rename = "Number")]
    pub number: String,
    /// Volume
    #[serde(rename = "Volume")]
    pub volume: String,
    /// Publication year
    #[serde(rename = "Year")]
    pub year: String,
    /// Publisher
    #[serde(rename = "Publisher")]
    pub publisher: String,
    /// Summary text
    #[serde(rename = "Summary")]
    pub summary: String,
    /// Writer
    #[serde(rename = "Writer")]
    pub writer: String,
    /// Declared page count
    #[serde(rename = "PageCount")]
    pub page_count: String,
    /// Per-page annotations
    #[serde(rename = "Pages")]
    pub pages: Pages,
}

/// The `<Pages>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Pages {
    /// Individual `<Page>` elements
    #[serde(rename = "Page")]
    pub page: Vec<PageInfo>,
}

/// One `<Page Image=".." Type=".."/>` annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PageInfo {
    /// Zero-based image index the annotation refers to
    #[serde(rename = "@Image")]
    pub image: String,
    /// Page role, e.g. `FrontCover`, `Story`, `BackCover`
    #[serde(rename = "@Type")]
    pub kind: String,
}

impl ComicInfo {
    /// Parse a descriptor document.
    ///
    /// A leading UTF-8 byte order mark is ignored.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error if the document is not valid XML for
    /// the expected shape.
    pub fn parse(xml: &str) -> Result<Self, quick_xml::de::DeError> {
        quick_xml::de::from_str(xml.trim_start_matches('\u{feff}'))
    }

    /// Build the display title.
    ///
    /// Non-empty fields are joined with single spaces in the order series,
    /// title, number, and the year wrapped in parentheses. Returns `None` if
    /// every field is empty.
    #[must_use]
    pub fn display_title(&self) -> Option<String> {
        let year = self.year.trim();
        let year = (!year.is_empty()).then(|| format!("({year})"));

        let parts: Vec<&str> = [
            self.series.trim(),
            self.title.trim(),
            self.number.trim(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .chain(year.as_deref())
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }

    /// Index of the image marked as front cover, if any.
    ///
    /// Cover generation always uses page 0; this is exposed for callers that
    /// want to know when an archive declares a different cover.
    #[must_use]
    pub fn front_cover_page(&self) -> Option<usize> {
        self.pages
            .page
            .iter()
            .find(|p| p.kind.eq_ignore_ascii_case(FRONT_COVER))
            .and_then(|p| p.image.trim().parse().ok())
    }
}

/// Look up and parse the descriptor of an open archive.
///
/// Returns `None` when the archive has no descriptor or it cannot be read
/// or parsed.
pub fn extract(archive: &mut Archive) -> Option<ComicInfo> {
    let name = archive.find_entry(COMIC_INFO_ENTRY)?.to_string();

    let data = match archive.extract(&name) {
        Ok(data) => data,
        Err(e) => {
            log::debug!("Failed to read {}: {}", name, e);
            return None;
        }
    };

    match ComicInfo::parse(&String::from_utf8_lossy(&data)) {
        Ok(info) => {
            if let Some(cover) = info.front_cover_page().filter(|&p| p != 0) {
                log::debug!(
                    "{} declares page {} as front cover; using page 0",
                    archive.path().display(),
                    cover
                );
            }
            Some(info)
        }
        Err(e) => {
            log::debug!(
                "Ignoring unparseable {} in {}: {}",
                name,
                archive.path().display(),
                e
            );
            None
        }
    }
}
