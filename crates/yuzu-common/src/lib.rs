//! Yuzu-Common: Shared types and utilities.
//!
//! This crate provides functionality used across yuzu:
//!
//! - **Error Handling**: The unified [`Error`] type and [`Result`] alias
//! - **ComicInfo**: The normalized chapter record and its field-level merge
//! - **XML**: A minimal element writer used by the output renderers
//! - **Path Utilities**: Provider definition file detection by extension
//!
//! # Examples
//!
//! ```
//! use yuzu_common::{merge, ComicInfoChapter};
//! use yuzu_common::paths::is_provider_file;
//! use std::path::Path;
//!
//! let a = ComicInfoChapter { title: "Romance Dawn".into(), ..Default::default() };
//! let b = ComicInfoChapter { series: "One Piece".into(), ..Default::default() };
//! let merged = merge(&[a, b]);
//! assert_eq!(merged.title, "Romance Dawn");
//! assert_eq!(merged.series, "One Piece");
//!
//! assert!(is_provider_file(Path::new("kitsu.json"), &["json".to_string()]));
//! ```

pub mod comicinfo;
pub mod error;
pub mod paths;
pub mod xml;

pub use comicinfo::{merge, ComicInfoChapter};
pub use error::{Error, Result};
