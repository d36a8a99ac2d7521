use crate::cue::builder::CueSheetBuilder;
use crate::cue::error::CueResult;
use crate::cue::models::CueSheet;
use crate::cue::tokenizer::tokenize;
use log::debug;
use std::path::{Path, PathBuf};

pub mod builder;
pub mod directive;
pub mod error;
pub mod models;
pub mod tokenizer;

pub struct CueParser {
    cue_path: PathBuf,
}

impl CueParser {
    pub fn new(cue_path: impl AsRef<Path>) -> Self {
        Self {
            cue_path: cue_path.as_ref().to_path_buf(),
        }
    }

    pub async fn parse(&self) -> CueResult<CueSheet> {
        let data = tokio::fs::read(&self.cue_path).await?;
        let text = String::from_utf8(data)?;

        let sheet = parse_str(&text)?;
        debug!(
            "Parsed {:?}: {} track(s) referencing {:?}",
            self.cue_path,
            sheet.tracks.len(),
            sheet.file.filename
        );

        Ok(sheet)
    }
}

pub fn parse_str(text: &str) -> CueResult<CueSheet> {
    CueSheetBuilder::build(tokenize(text))
}
