//! # Audio Formats
//!
//! Target formats supported by the converter, the ffmpeg arguments used to
//! produce them and the tag fields each destination container can carry.
//!
//! Tag filtering is static: every format has a fixed list of [`TagField`]s,
//! so a field is copied only if it appears in that list.

use clap::ValueEnum;
use lofty::tag::ItemKey;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::args;

/// Source extension matched during discovery
pub const SOURCE_EXTENSION: &str = "flac";

/// Output format for a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// MPEG-1 Layer III (libmp3lame), ID3v2 tags
    Mp3,
    /// Raw ADTS AAC, ID3v2 tags
    Aac,
    /// Apple Lossless in an MP4 container, iTunes-style tags
    Alac,
    /// Ogg Vorbis, Vorbis comments
    Ogg,
    /// Ogg Opus, Vorbis comments
    Opus,
}

impl AudioFormat {
    /// File extension written on converted files
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Alac => "m4a",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
        }
    }

    /// ffmpeg muxer passed with `-f`
    pub fn muxer(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Aac => "adts",
            Self::Alac => "ipod",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
        }
    }

    /// Lossless formats ignore the configured bitrate
    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Alac)
    }

    /// Encoder arguments for ffmpeg
    pub fn encoder_args(&self, bitrate: &str) -> Vec<String> {
        match self {
            Self::Mp3 => args!["-c:a", "libmp3lame", "-b:a", bitrate],
            Self::Aac => args!["-c:a", "aac", "-b:a", bitrate],
            Self::Alac => args!["-c:a", "alac"],
            Self::Ogg => args!["-c:a", "libvorbis", "-b:a", bitrate],
            // libopus only accepts 48 kHz and lower, FLAC sources are often 44.1/96 kHz
            Self::Opus => args!["-c:a", "libopus", "-b:a", bitrate, "-ar", "48000"],
        }
    }

    /// Fields the destination tag container knows how to store
    pub fn tag_fields(&self) -> &'static [TagField] {
        match self {
            Self::Mp3 | Self::Aac => ID3V2_FIELDS,
            // MP4 freeform atoms and Vorbis comments both take every field
            Self::Alac | Self::Ogg | Self::Opus => TagField::ALL,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mp3 => "mp3",
            Self::Aac => "aac",
            Self::Alac => "alac",
            Self::Ogg => "ogg",
            Self::Opus => "opus",
        };
        f.write_str(name)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::Mp3
    }
}

/// Tag fields the converter copies between containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagField {
    Title,
    Artist,
    Album,
    AlbumArtist,
    TrackNumber,
    TrackTotal,
    DiscNumber,
    DiscTotal,
    Genre,
    Date,
    Composer,
    Comment,
    Lyricist,
    Conductor,
    Copyright,
    Isrc,
    Label,
}

impl TagField {
    /// Every field the converter knows about
    pub const ALL: &'static [TagField] = &[
        TagField::Title,
        TagField::Artist,
        TagField::Album,
        TagField::AlbumArtist,
        TagField::TrackNumber,
        TagField::TrackTotal,
        TagField::DiscNumber,
        TagField::DiscTotal,
        TagField::Genre,
        TagField::Date,
        TagField::Composer,
        TagField::Comment,
        TagField::Lyricist,
        TagField::Conductor,
        TagField::Copyright,
        TagField::Isrc,
        TagField::Label,
    ];

    /// Generic lofty key for this field
    pub fn item_key(&self) -> ItemKey {
        match self {
            Self::Title => ItemKey::TrackTitle,
            Self::Artist => ItemKey::TrackArtist,
            Self::Album => ItemKey::AlbumTitle,
            Self::AlbumArtist => ItemKey::AlbumArtist,
            Self::TrackNumber => ItemKey::TrackNumber,
            Self::TrackTotal => ItemKey::TrackTotal,
            Self::DiscNumber => ItemKey::DiscNumber,
            Self::DiscTotal => ItemKey::DiscTotal,
            Self::Genre => ItemKey::Genre,
            Self::Date => ItemKey::RecordingDate,
            Self::Composer => ItemKey::Composer,
            Self::Comment => ItemKey::Comment,
            Self::Lyricist => ItemKey::Lyricist,
            Self::Conductor => ItemKey::Conductor,
            Self::Copyright => ItemKey::CopyrightMessage,
            Self::Isrc => ItemKey::Isrc,
            Self::Label => ItemKey::Label,
        }
    }
}

// Same vocabulary as the "easy" ID3 interface: plain text frames only.
const ID3V2_FIELDS: &[TagField] = &[
    TagField::Title,
    TagField::Artist,
    TagField::Album,
    TagField::AlbumArtist,
    TagField::TrackNumber,
    TagField::TrackTotal,
    TagField::DiscNumber,
    TagField::DiscTotal,
    TagField::Genre,
    TagField::Date,
    TagField::Composer,
    TagField::Lyricist,
    TagField::Conductor,
    TagField::Copyright,
    TagField::Isrc,
    TagField::Label,
];
