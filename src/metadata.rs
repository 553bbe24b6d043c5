//! # Tag and Cover Art Copy
//!
//! Copies tags from a FLAC source into a freshly encoded file using `lofty`.
//!
//! Only the fields listed by [`AudioFormat::tag_fields`] are copied; the
//! first embedded source picture becomes the destination's front cover when
//! cover art is requested.

use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::ConvertError;
use crate::format::{AudioFormat, TagField};

/// Description stored on copied cover pictures
pub const COVER_DESCRIPTION: &str = "Cover";

/// Outcome of a tag copy
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopiedTags {
    pub fields: usize,
    pub cover: bool,
}

/// Copy recognized tags (and optionally the cover) from `source` into `destination`
pub fn copy_tags(
    source: &Path,
    destination: &Path,
    format: AudioFormat,
    include_cover_art: bool,
) -> Result<CopiedTags, ConvertError> {
    let source_file = Probe::open(source)?.read()?;
    let Some(source_tag) = source_file.primary_tag().or_else(|| source_file.first_tag()) else {
        debug!("No tags in {}, nothing to copy", source.display());
        return Ok(CopiedTags::default());
    };

    let mut destination_file = Probe::open(destination)?.read()?;
    let destination_tag = writable_tag(&mut destination_file).ok_or_else(|| {
        ConvertError::conversion(destination, "destination format has no writable tag")
    })?;

    let mut copied = CopiedTags::default();
    for field in format.tag_fields() {
        let key = field.item_key();
        let Some(value) = source_tag.get_string(&key) else {
            continue;
        };
        if destination_tag.insert_text(key, value.to_string()) {
            copied.fields += 1;
        } else {
            debug!("{:?} not stored by {:?} tags", field, destination_tag.tag_type());
        }
    }

    if include_cover_art {
        if let Some(picture) = source_tag.pictures().first() {
            destination_tag.push_picture(front_cover(picture));
            copied.cover = true;
        }
    }

    destination_file.save_to_path(destination, WriteOptions::default())?;
    debug!(
        "Copied {} tag fields (cover: {}) from {} to {}",
        copied.fields,
        copied.cover,
        source.display(),
        destination.display()
    );

    Ok(copied)
}

/// Primary tag of `file`, created empty if the encoder wrote none
fn writable_tag(file: &mut TaggedFile) -> Option<&mut Tag> {
    if file.primary_tag().is_none() {
        let tag_type = file.primary_tag_type();
        file.insert_tag(Tag::new(tag_type));
    }
    file.primary_tag_mut()
}

/// Rebuild `picture` as a front cover, guessing the MIME type if the source had none
fn front_cover(picture: &Picture) -> Picture {
    let mime_type = picture
        .mime_type()
        .cloned()
        .or_else(|| guess_mime_type(picture.data()));

    Picture::new_unchecked(
        PictureType::CoverFront,
        mime_type,
        Some(COVER_DESCRIPTION.to_string()),
        picture.data().to_vec(),
    )
}

fn guess_mime_type(data: &[u8]) -> Option<MimeType> {
    match image::guess_format(data).ok()? {
        image::ImageFormat::Png => Some(MimeType::Png),
        image::ImageFormat::Jpeg => Some(MimeType::Jpeg),
        image::ImageFormat::Gif => Some(MimeType::Gif),
        image::ImageFormat::Bmp => Some(MimeType::Bmp),
        image::ImageFormat::Tiff => Some(MimeType::Tiff),
        _ => None,
    }
}

/// Read every known field from the primary tag of `path`
pub fn read_tags(path: &Path) -> Result<BTreeMap<TagField, String>, ConvertError> {
    let file = Probe::open(path)?.read()?;
    let mut tags = BTreeMap::new();

    if let Some(tag) = file.primary_tag().or_else(|| file.first_tag()) {
        for field in TagField::ALL {
            if let Some(value) = tag.get_string(&field.item_key()) {
                tags.insert(*field, value.to_string());
            }
        }
    }

    Ok(tags)
}

/// Number of embedded pictures across all tags of `path`
pub fn picture_count(path: &Path) -> Result<usize, ConvertError> {
    let file = Probe::open(path)?.read()?;
    Ok(file.tags().iter().map(|tag| tag.pictures().len()).sum())
}

/// Whether `path` carries at least one embedded picture
pub fn has_cover(path: &Path) -> Result<bool, ConvertError> {
    Ok(picture_count(path)? > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::fixtures::{ffmpeg_with_encoder, tag_file, write_flac, write_minimal_flac, TINY_PNG};
    use std::process::Command;
    use tempfile::TempDir;

    const TAGS: &[(TagField, &str)] = &[
        (TagField::Title, "T"),
        (TagField::Artist, "A"),
        (TagField::Album, "B"),
    ];

    fn expected_tags() -> BTreeMap<TagField, String> {
        TAGS.iter().map(|(f, v)| (*f, v.to_string())).collect()
    }

    fn encode_mp3(ffmpeg: &Path, source: &Path, output: &Path) {
        let status = Command::new(ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-y", "-i"])
            .arg(source)
            .args(["-map", "0:a", "-map_metadata", "-1", "-c:a", "libmp3lame", "-f", "mp3"])
            .arg(output)
            .status()
            .unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type(TINY_PNG), Some(MimeType::Png));
        assert_eq!(guess_mime_type(b"not an image"), None);
    }

    #[test]
    fn test_front_cover_rebuilds_picture() {
        let original = Picture::new_unchecked(PictureType::Other, None, None, TINY_PNG.to_vec());
        let cover = front_cover(&original);

        assert_eq!(cover.pic_type(), PictureType::CoverFront);
        assert_eq!(cover.mime_type(), Some(&MimeType::Png));
        assert_eq!(cover.description(), Some(COVER_DESCRIPTION));
        assert_eq!(cover.data(), TINY_PNG);
    }

    #[test]
    fn test_copy_from_non_audio_fails() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("broken.flac");
        let destination = temp_dir.path().join("broken.mp3");
        std::fs::write(&source, b"definitely not flac").unwrap();
        std::fs::write(&destination, b"definitely not mp3").unwrap();

        assert!(copy_tags(&source, &destination, AudioFormat::Mp3, true).is_err());
    }

    #[test]
    fn test_copy_tags_between_header_only_files() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("song.flac");
        write_minimal_flac(&source);
        tag_file(
            &source,
            &[(TagField::Title, "T"), (TagField::Artist, "A"), (TagField::Comment, "liner notes")],
            true,
        );

        let vorbis = temp_dir.path().join("vorbis.flac");
        write_minimal_flac(&vorbis);
        let copied = copy_tags(&source, &vorbis, AudioFormat::Ogg, true).unwrap();
        assert_eq!(copied, CopiedTags { fields: 3, cover: true });
        let tags = read_tags(&vorbis).unwrap();
        assert_eq!(tags.get(&TagField::Comment).map(String::as_str), Some("liner notes"));
        assert_eq!(picture_count(&vorbis).unwrap(), 1);

        // ID3v2 targets leave the comment out, and the cover when not requested
        let id3 = temp_dir.path().join("id3.flac");
        write_minimal_flac(&id3);
        let copied = copy_tags(&source, &id3, AudioFormat::Mp3, false).unwrap();
        assert_eq!(copied, CopiedTags { fields: 2, cover: false });
        let tags = read_tags(&id3).unwrap();
        assert_eq!(tags.get(&TagField::Title).map(String::as_str), Some("T"));
        assert_eq!(tags.get(&TagField::Artist).map(String::as_str), Some("A"));
        assert!(!tags.contains_key(&TagField::Comment));
        assert!(!has_cover(&id3).unwrap());
    }

    #[test]
    fn test_untagged_source_copies_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("plain.flac");
        let destination = temp_dir.path().join("plain-out.flac");
        write_minimal_flac(&source);
        write_minimal_flac(&destination);

        let copied = copy_tags(&source, &destination, AudioFormat::Opus, true).unwrap();

        assert_eq!(copied, CopiedTags::default());
        assert!(read_tags(&destination).unwrap().is_empty());
    }

    #[test]
    fn test_copy_tags_without_cover() {
        let Some(ffmpeg) = ffmpeg_with_encoder("libmp3lame") else {
            eprintln!("ffmpeg with libmp3lame not available, skipping");
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("song.flac");
        let destination = temp_dir.path().join("song.mp3");
        write_flac(&ffmpeg, &source, TAGS, true);
        encode_mp3(&ffmpeg, &source, &destination);

        let copied = copy_tags(&source, &destination, AudioFormat::Mp3, false).unwrap();

        assert_eq!(copied, CopiedTags { fields: 3, cover: false });
        assert_eq!(read_tags(&destination).unwrap(), expected_tags());
        assert!(!has_cover(&destination).unwrap());
    }

    #[test]
    fn test_copy_tags_with_cover() {
        let Some(ffmpeg) = ffmpeg_with_encoder("libmp3lame") else {
            eprintln!("ffmpeg with libmp3lame not available, skipping");
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("song.flac");
        let destination = temp_dir.path().join("song.mp3");
        write_flac(&ffmpeg, &source, TAGS, true);
        encode_mp3(&ffmpeg, &source, &destination);

        let copied = copy_tags(&source, &destination, AudioFormat::Mp3, true).unwrap();

        assert!(copied.cover);
        assert_eq!(read_tags(&destination).unwrap(), expected_tags());
        assert_eq!(picture_count(&destination).unwrap(), 1);
    }

    #[test]
    fn test_cover_requested_but_source_has_none() {
        let Some(ffmpeg) = ffmpeg_with_encoder("libmp3lame") else {
            eprintln!("ffmpeg with libmp3lame not available, skipping");
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("song.flac");
        let destination = temp_dir.path().join("song.mp3");
        write_flac(&ffmpeg, &source, TAGS, false);
        encode_mp3(&ffmpeg, &source, &destination);

        let copied = copy_tags(&source, &destination, AudioFormat::Mp3, true).unwrap();

        assert!(!copied.cover);
        assert!(!has_cover(&destination).unwrap());
    }
}
