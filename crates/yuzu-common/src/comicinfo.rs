//! The normalized chapter record and its field-level merge.
//!
//! [`ComicInfoChapter`] mirrors the ComicInfo.xml schema used by comic
//! readers (<https://anansi-project.github.io>). Every field is either empty
//! (its zero value) or set, and [`merge`] folds several records into one by
//! keeping, per field, the first non-empty value in call order.
//!
//! The field list is spelled out once in the `chapter_fields!` invocation
//! below; the struct, the merge, the projection parser, and the XML writer are
//! all generated from that list, so a new field takes part in merging only when
//! it is added there.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::xml::XmlWriter;

/// Elements always written, even when empty.
const REQUIRED_ELEMENTS: &[&str] = &["Title", "Series", "Number"];

/// A scalar field value with an "empty" zero value.
pub trait FieldValue: Clone {
    /// Whether the value is the zero value.
    fn is_unset(&self) -> bool;

    /// Parse a projected string. Blank input yields the zero value.
    fn parse_field(raw: &str) -> std::result::Result<Self, String>;

    /// Text content for XML output.
    fn render(&self) -> String;
}

impl FieldValue for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn parse_field(raw: &str) -> std::result::Result<Self, String> {
        Ok(raw.to_string())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl FieldValue for i32 {
    fn is_unset(&self) -> bool {
        *self == 0
    }

    fn parse_field(raw: &str) -> std::result::Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(0);
        }
        // Upstreams frequently report counts as floats ("12.0").
        raw.parse::<i32>()
            .or_else(|_| match raw.parse::<f64>() {
                Ok(f) if f.fract() == 0.0 && f.abs() <= f64::from(i32::MAX) => Ok(f as i32),
                _ => Err(()),
            })
            .map_err(|_| format!("expected an integer, got {raw:?}"))
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl FieldValue for f64 {
    fn is_unset(&self) -> bool {
        *self == 0.0
    }

    fn parse_field(raw: &str) -> std::result::Result<Self, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(0.0);
        }
        raw.parse::<f64>()
            .map_err(|_| format!("expected a number, got {raw:?}"))
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

macro_rules! chapter_fields {
    ($( $(#[$meta:meta])* $field:ident : $ty:ty => $element:literal ),* $(,)?) => {
        /// A ComicInfo chapter record.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct ComicInfoChapter {
            $(
                $(#[$meta])*
                #[serde(rename = $element, default)]
                pub $field: $ty,
            )*
        }

        impl ComicInfoChapter {
            /// Element names of every field, in schema order.
            pub const FIELDS: &'static [&'static str] = &[$($element),*];

            /// Fill every empty field of `self` from `other`. Fields already
            /// set are never overwritten.
            pub fn fill_from(&mut self, other: &Self) {
                $(
                    if self.$field.is_unset() {
                        self.$field = other.$field.clone();
                    }
                )*
            }

            /// Set one field from its projected string, addressed by element
            /// name (case-insensitive). Returns `Ok(false)` for unknown names.
            pub fn set_field(&mut self, name: &str, raw: &str) -> Result<bool> {
                $(
                    if name.eq_ignore_ascii_case($element) {
                        self.$field = <$ty as FieldValue>::parse_field(raw)
                            .map_err(|e| Error::Validation(format!("{}: {e}", $element)))?;
                        return Ok(true);
                    }
                )*
                Ok(false)
            }

            /// Number of fields that are set.
            pub fn set_count(&self) -> usize {
                let mut n = 0;
                $(
                    if !self.$field.is_unset() {
                        n += 1;
                    }
                )*
                n
            }

            fn write_fields(&self, w: &mut XmlWriter) -> Result<()> {
                $(
                    if !self.$field.is_unset() || REQUIRED_ELEMENTS.contains(&$element) {
                        w.text_element($element, &self.$field.render())?;
                    }
                )*
                Ok(())
            }
        }
    };
}

chapter_fields! {
    /// Chapter title.
    title: String => "Title",
    /// Series name.
    series: String => "Series",
    /// Issue/chapter number; kept as text ("10.5" is common).
    number: String => "Number",
    /// Total number of issues in the series.
    count: i32 => "Count",
    volume: i32 => "Volume",
    alternate_series: String => "AlternateSeries",
    alternate_number: String => "AlternateNumber",
    alternate_count: i32 => "AlternateCount",
    summary: String => "Summary",
    notes: String => "Notes",
    year: i32 => "Year",
    month: i32 => "Month",
    day: i32 => "Day",
    writer: String => "Writer",
    penciller: String => "Penciller",
    inker: String => "Inker",
    colorist: String => "Colorist",
    letterer: String => "Letterer",
    cover_artist: String => "CoverArtist",
    editor: String => "Editor",
    translator: String => "Translator",
    publisher: String => "Publisher",
    imprint: String => "Imprint",
    genre: String => "Genre",
    tags: String => "Tags",
    web: String => "Web",
    page_count: i32 => "PageCount",
    /// ISO-639-1 language code.
    language_iso: String => "LanguageISO",
    format: String => "Format",
    black_and_white: String => "BlackAndWhite",
    /// "Yes", "No", or "YesAndRightToLeft".
    manga: String => "Manga",
    characters: String => "Characters",
    teams: String => "Teams",
    locations: String => "Locations",
    scan_information: String => "ScanInformation",
    story_arc: String => "StoryArc",
    story_arc_number: String => "StoryArcNumber",
    series_group: String => "SeriesGroup",
    age_rating: String => "AgeRating",
    /// Community rating, 0.0 - 5.0.
    community_rating: f64 => "CommunityRating",
    main_character_or_team: String => "MainCharacterOrTeam",
    review: String => "Review",
    gtin: String => "GTIN",
}

impl ComicInfoChapter {
    /// Build a record from a provider projection keyed by element name.
    ///
    /// Unknown keys are returned alongside the record so callers can log them.
    pub fn from_projection(projection: &BTreeMap<String, String>) -> Result<(Self, Vec<String>)> {
        let mut record = Self::default();
        let mut unknown = Vec::new();
        for (name, raw) in projection {
            if !record.set_field(name, raw)? {
                unknown.push(name.clone());
            }
        }
        Ok((record, unknown))
    }

    /// Render as an indented `<ComicInfo>` document. Optional fields are
    /// omitted when empty.
    pub fn to_xml(&self) -> Result<String> {
        let mut w = XmlWriter::pretty("  ");
        w.start("ComicInfo")?;
        self.write_fields(&mut w)?;
        w.end("ComicInfo");
        Ok(w.finish())
    }
}

/// Merge records by field-level precedence.
///
/// Iterates `records` in order and, for each field independently, keeps the
/// first non-empty value. Fields empty in every record stay empty.
pub fn merge(records: &[ComicInfoChapter]) -> ComicInfoChapter {
    records
        .iter()
        .fold(ComicInfoChapter::default(), |mut acc, record| {
            acc.fill_from(record);
            acc
        })
}
