use crate::cue::error::{CueError, CueResult};
use crate::cue::models::{FileType, Timecode, TrackType};
use crate::cue::tokenizer::DirectiveRecord;

/// Typed form of a CUE directive. Commands this crate does not know about end
/// up in [`Directive::Unknown`] and are ignored by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Rem { key: Option<String>, value: String },
    Title(String),
    Performer(String),
    Songwriter(String),
    Catalog(String),
    CdTextFile(String),
    File { name: String, file_type: FileType },
    Track { number: u8, track_type: TrackType },
    Index { number: u8, timecode: Timecode },
    Pregap(Timecode),
    Postgap(Timecode),
    Isrc(String),
    Flags(Vec<String>),
    Unknown { command: String, args: Vec<String> },
}

impl Directive {
    pub fn from_record(record: DirectiveRecord) -> CueResult<Self> {
        let DirectiveRecord {
            line,
            command,
            mut args,
        } = record;

        let directive = match command.as_str() {
            "REM" => {
                if args.is_empty() {
                    Directive::Rem {
                        key: None,
                        value: String::new(),
                    }
                } else {
                    let key = args.remove(0);
                    Directive::Rem {
                        key: Some(key),
                        value: args.join(" "),
                    }
                }
            }
            "TITLE" => Directive::Title(joined(line, "TITLE", args)?),
            "PERFORMER" => Directive::Performer(joined(line, "PERFORMER", args)?),
            "SONGWRITER" => Directive::Songwriter(joined(line, "SONGWRITER", args)?),
            "CATALOG" => Directive::Catalog(first(line, "CATALOG", args)?),
            "CDTEXTFILE" => Directive::CdTextFile(first(line, "CDTEXTFILE", args)?),
            "ISRC" => Directive::Isrc(first(line, "ISRC", args)?),
            "FILE" => {
                if args.len() < 2 {
                    return Err(CueError::MissingArgument {
                        line,
                        directive: "FILE",
                    });
                }
                let type_str = args.pop().unwrap_or_default();
                let file_type =
                    FileType::from_keyword(&type_str).ok_or(CueError::InvalidArgument {
                        line,
                        directive: "FILE",
                        value: type_str,
                    })?;
                Directive::File {
                    name: args.join(" "),
                    file_type,
                }
            }
            "TRACK" => {
                let [number, kind] = two(line, "TRACK", args)?;
                let number = parse_number(line, "TRACK", number)?;
                let track_type =
                    TrackType::from_keyword(&kind).ok_or(CueError::InvalidArgument {
                        line,
                        directive: "TRACK",
                        value: kind,
                    })?;
                Directive::Track { number, track_type }
            }
            "INDEX" => {
                let [number, timecode] = two(line, "INDEX", args)?;
                Directive::Index {
                    number: parse_number(line, "INDEX", number)?,
                    timecode: parse_timecode(line, timecode)?,
                }
            }
            "PREGAP" => Directive::Pregap(parse_timecode(line, first(line, "PREGAP", args)?)?),
            "POSTGAP" => Directive::Postgap(parse_timecode(line, first(line, "POSTGAP", args)?)?),
            "FLAGS" => Directive::Flags(args.into_iter().map(|f| f.to_ascii_uppercase()).collect()),
            _ => Directive::Unknown { command, args },
        };

        Ok(directive)
    }
}

fn first(line: usize, directive: &'static str, args: Vec<String>) -> CueResult<String> {
    args.into_iter()
        .next()
        .ok_or(CueError::MissingArgument { line, directive })
}

fn two(line: usize, directive: &'static str, args: Vec<String>) -> CueResult<[String; 2]> {
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(a), Some(b)) => Ok([a, b]),
        _ => Err(CueError::MissingArgument { line, directive }),
    }
}

// Unquoted titles with spaces show up in hand-written sheets.
fn joined(line: usize, directive: &'static str, args: Vec<String>) -> CueResult<String> {
    if args.is_empty() {
        return Err(CueError::MissingArgument { line, directive });
    }
    Ok(args.join(" "))
}

fn parse_number(line: usize, directive: &'static str, value: String) -> CueResult<u8> {
    match value.parse::<u8>() {
        Ok(n) if n <= 99 => Ok(n),
        _ => Err(CueError::InvalidArgument {
            line,
            directive,
            value,
        }),
    }
}

fn parse_timecode(line: usize, value: String) -> CueResult<Timecode> {
    value
        .parse()
        .map_err(|_| CueError::InvalidTimecode { line, value })
}
