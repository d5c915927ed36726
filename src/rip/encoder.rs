//! The closed encoder set and its tag mapping.
//!
//! Each format maps a [`TrackTags`] set onto the flags of its external
//! encoder. WAV has no encoder; the ripper writes it natively.

use std::path::Path;

use clap::ValueEnum;

/// Output format, resolved once at session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Flac,
    Wav,
    Mp3,
    Ogg,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Flac => "FLAC",
            Self::Wav => "WAV",
            Self::Mp3 => "MP3",
            Self::Ogg => "OGG",
        }
    }

    /// Encoder binary, or `None` when the ripper writes the file itself.
    pub fn tool(&self) -> Option<&'static str> {
        match self {
            Self::Flac => Some("flac"),
            Self::Wav => None,
            Self::Mp3 => Some("lame"),
            Self::Ogg => Some("oggenc"),
        }
    }

    pub fn is_lossless(&self) -> bool {
        matches!(self, Self::Flac | Self::Wav)
    }

    /// Only FLAC embeds cover art in this pipeline.
    pub fn supports_cover_art(&self) -> bool {
        matches!(self, Self::Flac)
    }

    /// Format used for the hidden pre-gap track: always lossless.
    pub fn hidden_track_format(&self) -> Format {
        if self.is_lossless() { *self } else { Format::Flac }
    }
}

/// Tags embedded into one encoded track.
#[derive(Debug, Clone)]
pub struct TrackTags<'a> {
    pub artist: &'a str,
    pub album: &'a str,
    pub title: &'a str,
    pub track_number: u32,
    pub year: &'a str,
    pub genre: &'a str,
    pub composer: Option<&'a str>,
}

/// Build the encoder invocation for a track: `(binary, args)`. The
/// encoder reads PCM on stdin and writes `output`. Returns `None` for
/// WAV, which needs no transcoding step.
pub fn encoder_args(
    format: Format,
    tags: &TrackTags,
    cover_art: Option<&Path>,
    output: &Path,
) -> Option<(&'static str, Vec<String>)> {
    let tool = format.tool()?;
    let out = output.to_string_lossy().to_string();

    let args = match format {
        Format::Wav => unreachable!("WAV has no encoder"),
        Format::Flac => {
            let mut args = vec![
                "-s".to_string(),
                "--best".to_string(),
                "--verify".to_string(),
            ];
            if let Some(cover) = cover_art {
                args.push(format!("--picture={}", cover.display()));
            }
            let mut tag = |k: &str, v: &str| {
                args.push("-T".to_string());
                args.push(format!("{k}={v}"));
            };
            tag("ARTIST", tags.artist);
            tag("ALBUM", tags.album);
            tag("TITLE", tags.title);
            tag("TRACKNUMBER", &tags.track_number.to_string());
            if !tags.year.is_empty() {
                tag("DATE", tags.year);
            }
            if !tags.genre.is_empty() {
                tag("GENRE", tags.genre);
            }
            if let Some(composer) = tags.composer {
                tag("COMPOSER", composer);
            }
            args.extend(["-".to_string(), "-o".to_string(), out]);
            args
        }
        Format::Mp3 => {
            let mut args = vec![
                "-S".to_string(),
                "-b".to_string(),
                "320".to_string(),
                "--add-id3v2".to_string(),
                "--tt".to_string(),
                tags.title.to_string(),
                "--ta".to_string(),
                tags.artist.to_string(),
                "--tl".to_string(),
                tags.album.to_string(),
                "--tn".to_string(),
                tags.track_number.to_string(),
            ];
            if !tags.year.is_empty() {
                args.extend(["--ty".to_string(), tags.year.to_string()]);
            }
            if !tags.genre.is_empty() {
                args.extend(["--tg".to_string(), tags.genre.to_string()]);
            }
            if let Some(composer) = tags.composer {
                args.extend(["--tv".to_string(), format!("TCOM={composer}")]);
            }
            args.extend(["-".to_string(), out]);
            args
        }
        Format::Ogg => {
            let mut args = vec![
                "-Q".to_string(),
                "-q".to_string(),
                "10".to_string(),
                "-a".to_string(),
                tags.artist.to_string(),
                "-l".to_string(),
                tags.album.to_string(),
                "-t".to_string(),
                tags.title.to_string(),
                "-N".to_string(),
                tags.track_number.to_string(),
            ];
            if !tags.year.is_empty() {
                args.extend(["-d".to_string(), tags.year.to_string()]);
            }
            if !tags.genre.is_empty() {
                args.extend(["-G".to_string(), tags.genre.to_string()]);
            }
            if let Some(composer) = tags.composer {
                args.extend(["-c".to_string(), format!("COMPOSER={composer}")]);
            }
            args.extend(["-o".to_string(), out, "-".to_string()]);
            args
        }
    };

    Some((tool, args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tags() -> TrackTags<'static> {
        TrackTags {
            artist: "Talk Talk",
            album: "Laughing Stock",
            title: "After the Flood",
            track_number: 2,
            year: "1991",
            genre: "post-rock",
            composer: Some("Mark Hollis"),
        }
    }

    #[test]
    fn test_wav_has_no_encoder() {
        assert!(encoder_args(Format::Wav, &tags(), None, Path::new("out.wav")).is_none());
        assert!(Format::Wav.tool().is_none());
    }

    #[test]
    fn test_flac_args() {
        let cover = PathBuf::from("/tmp/cover.jpg");
        let (tool, args) =
            encoder_args(Format::Flac, &tags(), Some(&cover), Path::new("02. After the Flood.flac"))
                .unwrap();
        assert_eq!(tool, "flac");
        assert!(args.contains(&"--verify".to_string()));
        assert!(args.contains(&"--picture=/tmp/cover.jpg".to_string()));
        assert!(args.contains(&"ARTIST=Talk Talk".to_string()));
        assert!(args.contains(&"TRACKNUMBER=2".to_string()));
        assert!(args.contains(&"COMPOSER=Mark Hollis".to_string()));
        // Reads stdin, writes the output path
        assert!(args.contains(&"-".to_string()));
        assert_eq!(args.last().unwrap(), "02. After the Flood.flac");
    }

    #[test]
    fn test_mp3_args() {
        let (tool, args) = encoder_args(Format::Mp3, &tags(), None, Path::new("out.mp3")).unwrap();
        assert_eq!(tool, "lame");
        assert!(args.contains(&"--add-id3v2".to_string()));
        assert!(args.contains(&"320".to_string()));
        assert!(args.contains(&"TCOM=Mark Hollis".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp3");
    }

    #[test]
    fn test_ogg_args() {
        let (tool, args) = encoder_args(Format::Ogg, &tags(), None, Path::new("out.ogg")).unwrap();
        assert_eq!(tool, "oggenc");
        assert!(args.contains(&"COMPOSER=Mark Hollis".to_string()));
        // oggenc takes the output before the trailing stdin marker
        assert_eq!(args.last().unwrap(), "-");
    }

    #[test]
    fn test_empty_optional_tags_are_omitted() {
        let sparse = TrackTags {
            artist: "A",
            album: "B",
            title: "T",
            track_number: 1,
            year: "",
            genre: "",
            composer: None,
        };
        let (_, args) = encoder_args(Format::Flac, &sparse, None, Path::new("o.flac")).unwrap();
        assert!(!args.iter().any(|a| a.starts_with("DATE=")));
        assert!(!args.iter().any(|a| a.starts_with("GENRE=")));
        assert!(!args.iter().any(|a| a.starts_with("COMPOSER=")));
        assert!(!args.iter().any(|a| a.starts_with("--picture")));

        let (_, args) = encoder_args(Format::Mp3, &sparse, None, Path::new("o.mp3")).unwrap();
        assert!(!args.contains(&"--ty".to_string()));
        assert!(!args.contains(&"--tg".to_string()));
    }

    #[test]
    fn test_cover_art_only_embedded_for_flac() {
        let cover = PathBuf::from("cover.jpg");
        assert!(Format::Flac.supports_cover_art());
        assert!(!Format::Mp3.supports_cover_art());
        let (_, args) = encoder_args(Format::Mp3, &tags(), Some(&cover), Path::new("o.mp3")).unwrap();
        assert!(!args.iter().any(|a| a.contains("cover.jpg")));
    }

    #[test]
    fn test_hidden_track_format_is_lossless() {
        assert_eq!(Format::Mp3.hidden_track_format(), Format::Flac);
        assert_eq!(Format::Ogg.hidden_track_format(), Format::Flac);
        assert_eq!(Format::Flac.hidden_track_format(), Format::Flac);
        assert_eq!(Format::Wav.hidden_track_format(), Format::Wav);
    }
}
