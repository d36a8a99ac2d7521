use crate::audio::OutputFormat;
use crate::planner::{Segment, TrackMetadata};
use crate::split::error::{SplitError, SplitResult};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashSet;

pub const DEFAULT_TEMPLATE: &str = "{track} - {title}";

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{(?P<name>[a-z_]+)(?::(?P<width>\d+))?\}").unwrap();
    static ref UNSAFE_CHARS: Regex = Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).unwrap();
}

const PLACEHOLDERS: [&str; 4] = ["album", "track", "title", "performer"];

/// Turns track metadata into output file names. Placeholders are `{album}`,
/// `{track}` (zero padded, `{track:3}` for a custom width), `{title}` and
/// `{performer}`. A `/` in the template itself creates sub directories.
#[derive(Debug, Clone)]
pub struct OutputNamer {
    template: String,
    extension: &'static str,
}

impl OutputNamer {
    pub fn new(template: impl Into<String>, format: OutputFormat) -> SplitResult<Self> {
        let template = template.into();

        if let Some(unknown) = PLACEHOLDER
            .captures_iter(&template)
            .map(|c| c["name"].to_string())
            .find(|name| !PLACEHOLDERS.contains(&name.as_str()))
        {
            return Err(SplitError::InvalidTemplate {
                template,
                placeholder: unknown,
            });
        }

        Ok(Self {
            template,
            extension: format.extension(),
        })
    }

    /// File name for one track, without collision handling.
    pub fn render(&self, metadata: &TrackMetadata) -> String {
        let stem = PLACEHOLDER.replace_all(&self.template, |caps: &Captures| {
            let width = caps
                .name("width")
                .and_then(|w| w.as_str().parse::<usize>().ok())
                .unwrap_or(2);

            match &caps["name"] {
                "track" => format!("{:0width$}", metadata.number),
                "album" => sanitize(metadata.album.as_deref().unwrap_or("Unknown Album")),
                "performer" => {
                    sanitize(metadata.performer.as_deref().unwrap_or("Unknown Artist"))
                }
                _ => match metadata.title.as_deref().map(sanitize) {
                    Some(title) if !title.is_empty() => title,
                    _ => format!("Track {:02}", metadata.number),
                },
            }
        });

        let stem = stem
            .split('/')
            .map(|part| part.trim().trim_end_matches('.'))
            .filter(|part| !part.is_empty() && *part != "..")
            .collect::<Vec<_>>()
            .join("/");

        let stem = if stem.is_empty() {
            format!("Track {:02}", metadata.number)
        } else {
            stem
        };

        format!("{stem}.{}", self.extension)
    }

    /// Names for every segment, in order, made unique by appending ` (n)`.
    pub fn names(&self, segments: &[Segment]) -> Vec<String> {
        let mut taken = HashSet::new();

        segments
            .iter()
            .map(|segment| {
                let name = self.render(&segment.metadata);
                let (stem, ext) = name
                    .rsplit_once('.')
                    .map(|(s, e)| (s.to_string(), e.to_string()))
                    .unwrap_or((name.clone(), String::new()));

                let mut candidate = name;
                let mut n = 2;
                // case-insensitive filesystems would still collide
                while !taken.insert(candidate.to_lowercase()) {
                    candidate = format!("{stem} ({n}).{ext}");
                    n += 1;
                }
                candidate
            })
            .collect()
    }
}

fn sanitize(value: &str) -> String {
    UNSAFE_CHARS.replace_all(value.trim(), "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(number: u8, title: Option<&str>) -> Segment {
        Segment {
            track: number,
            start: 0,
            end: 1,
            metadata: TrackMetadata {
                number,
                title: title.map(str::to_string),
                album: Some("Album: Deluxe".to_string()),
                performer: Some("AC/DC".to_string()),
                ..Default::default()
            },
        }
    }

    #[test]
    fn renders_default_template() {
        let namer = OutputNamer::new(DEFAULT_TEMPLATE, OutputFormat::Flac).unwrap();
        assert_eq!(
            namer.render(&segment(3, Some("Track, One")).metadata),
            "03 - Track, One.flac"
        );
    }

    #[test]
    fn sanitizes_values_but_keeps_template_directories() {
        let namer =
            OutputNamer::new("{performer}/{album}/{track:3} {title}", OutputFormat::Wav).unwrap();
        assert_eq!(
            namer.render(&segment(7, Some("What?")).metadata),
            "AC_DC/Album_ Deluxe/007 What_.wav"
        );
    }

    #[test]
    fn missing_title_falls_back_to_track_number() {
        let namer = OutputNamer::new("{title}", OutputFormat::Flac).unwrap();
        assert_eq!(namer.render(&segment(4, None).metadata), "Track 04.flac");
        assert_eq!(namer.render(&segment(5, Some("  ")).metadata), "Track 05.flac");
    }

    #[test]
    fn rejects_unknown_placeholders() {
        assert!(matches!(
            OutputNamer::new("{year} {title}", OutputFormat::Flac),
            Err(SplitError::InvalidTemplate { placeholder, .. }) if placeholder == "year"
        ));
    }

    #[test]
    fn duplicate_names_get_a_suffix() {
        let namer = OutputNamer::new("{title}", OutputFormat::Flac).unwrap();
        let names = namer.names(&[
            segment(1, Some("Intro")),
            segment(2, Some("intro")),
            segment(3, Some("Intro")),
            segment(4, Some("Outro")),
        ]);
        assert_eq!(
            names,
            vec!["Intro.flac", "intro (2).flac", "Intro (3).flac", "Outro.flac"]
        );
    }
}
