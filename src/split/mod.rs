use crate::audio;
use crate::audio::{MediaInfo, OutputFormat, SourceFormat};
use crate::cue::CueParser;
use crate::cue::models::{CueFile, CueSheet};
use crate::planner::timebase::Timebase;
use crate::planner::{PlanOptions, SplitPlan, TrackPlanner};
use crate::split::error::{SplitError, SplitResult};
use crate::split::extractor::{ExtractRequest, Extractor, PcmExtractor};
use crate::split::naming::OutputNamer;
use crate::util::fs::find_cue_files;
use futures::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{fs, task};

pub mod error;
pub mod extractor;
pub mod naming;

const SOURCE_EXTENSIONS: [&str; 4] = ["flac", "wav", "wave", "bin"];

#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Defaults to the directory of the CUE sheet.
    pub output_dir: Option<PathBuf>,
    pub template: String,
    pub format: OutputFormat,
    pub plan: PlanOptions,
    pub jobs: usize,
    pub force: bool,
    pub dry_run: bool,
}

pub struct SplitExecutor<E: Extractor> {
    extractor: Arc<E>,
    namer: OutputNamer,
    output_dir: PathBuf,
    output: OutputFormat,
    jobs: usize,
    force: bool,
    progress: MultiProgress,
}

impl<E: Extractor> SplitExecutor<E> {
    pub fn new(
        extractor: E,
        namer: OutputNamer,
        output_dir: impl Into<PathBuf>,
        output: OutputFormat,
        progress: MultiProgress,
    ) -> Self {
        Self {
            extractor: Arc::new(extractor),
            namer,
            output_dir: output_dir.into(),
            output,
            jobs: 1,
            force: false,
            progress,
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn destinations(&self, plan: &SplitPlan) -> Vec<PathBuf> {
        self.namer
            .names(plan.segments())
            .into_iter()
            .map(|name| self.output_dir.join(name))
            .collect()
    }

    /// Extracts every segment of `plan` from `source`. All started extractions
    /// are awaited before the first failure is returned.
    pub async fn execute(
        &self,
        plan: &SplitPlan,
        source: &Path,
        format: SourceFormat,
        media: &MediaInfo,
    ) -> SplitResult<Vec<PathBuf>> {
        let destinations = self.destinations(plan);

        if !self.force {
            for destination in &destinations {
                if fs::try_exists(destination).await? {
                    return Err(SplitError::OutputExists(destination.clone()));
                }
            }
        }

        let samples = Timebase::samples(media.spec.sample_rate);
        let requests: Vec<ExtractRequest> = plan
            .segments()
            .iter()
            .zip(&destinations)
            .map(|(segment, destination)| ExtractRequest {
                source: source.to_path_buf(),
                format,
                start: plan.timebase().convert(segment.start, samples),
                end: plan.timebase().convert(segment.end, samples),
                destination: destination.clone(),
                output: self.output,
                metadata: segment.metadata.clone(),
            })
            .collect();

        let bar = self.progress.add(ProgressBar::new(requests.len() as u64));
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        // Segments are decoded one at a time in track order so the source is
        // read front to back once. Up to `jobs` encodes run alongside.
        let results: Vec<SplitResult<PathBuf>> = futures::stream::iter(requests)
            .then(|request| {
                let extractor = self.extractor.clone();
                let bar = bar.clone();
                async move {
                    bar.set_message(format!("track {:02}", request.metadata.number));
                    let decoded = task::spawn_blocking(move || {
                        let pcm = extractor.decode(&request);
                        (request, pcm)
                    })
                    .await?;
                    Ok::<_, SplitError>(decoded)
                }
            })
            .map(|decoded| {
                let extractor = self.extractor.clone();
                let bar = bar.clone();
                async move {
                    let (request, pcm) = decoded?;
                    let track = request.metadata.number;
                    let destination = request.destination.clone();

                    let result = match pcm {
                        Ok((spec, samples)) => {
                            task::spawn_blocking(move || extractor.encode(&request, spec, samples))
                                .await?
                        }
                        Err(err) => Err(err),
                    };
                    bar.inc(1);

                    result.map_err(|source| SplitError::ExtractionFailed {
                        track,
                        destination: destination.clone(),
                        source,
                    })?;
                    debug!("Wrote track {track:02} to {destination:?}");
                    Ok::<_, SplitError>(destination)
                }
            })
            .buffered(self.jobs)
            .collect()
            .await;

        let outputs = results.into_iter().collect::<SplitResult<Vec<_>>>();
        match &outputs {
            Ok(_) => bar.finish_with_message("done"),
            Err(_) => bar.abandon_with_message("failed"),
        }
        self.progress.remove(&bar);

        outputs
    }
}

/// Finds the audio file a CUE sheet points at. Falls back to the bare file
/// name and then to the same stem with another audio extension, since sheets
/// are often kept after the image was moved or transcoded.
pub async fn resolve_source(cue_path: &Path, file: &CueFile) -> SplitResult<PathBuf> {
    let cue_dir = cue_path.parent().unwrap_or(Path::new("."));
    let direct = cue_dir.join(&file.filename);
    if fs::try_exists(&direct).await? {
        return Ok(direct);
    }

    let bare = file
        .filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(&file.filename);
    let candidate = cue_dir.join(bare);
    if fs::try_exists(&candidate).await? {
        return Ok(candidate);
    }

    for extension in SOURCE_EXTENSIONS {
        let alternative = candidate.with_extension(extension);
        if fs::try_exists(&alternative).await? {
            warn!(
                "{:?} not found, using {:?} instead",
                file.filename, alternative
            );
            return Ok(alternative);
        }
    }

    Err(SplitError::SourceNotFound(direct))
}

/// Parses, plans and splits a single CUE sheet.
pub async fn split_cue_file(
    pb: MultiProgress,
    cue_path: &Path,
    options: &SplitOptions,
) -> SplitResult<Vec<PathBuf>> {
    debug!("Parsing CUE file: {:?}", cue_path);
    let sheet = CueParser::new(cue_path).parse().await?;

    let source = resolve_source(cue_path, &sheet.file).await?;
    let format = SourceFormat::detect(&source, sheet.file.file_type)?;

    let extractor = PcmExtractor::default();
    let probe_path = source.clone();
    let media = task::spawn_blocking(move || audio::probe(&probe_path, format)).await??;
    debug!(
        "Source {:?}: {} Hz, {} channel(s), {} bit, {} samples",
        source,
        media.spec.sample_rate,
        media.spec.channels,
        media.spec.bits_per_sample,
        media.total_samples
    );

    let plan = TrackPlanner::new(options.plan).plan(&sheet, media.duration())?;

    let output_dir = match &options.output_dir {
        Some(dir) => dir.clone(),
        None => cue_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
    };
    let namer = OutputNamer::new(options.template.clone(), options.format)?;
    let executor = SplitExecutor::new(extractor, namer, output_dir, options.format, pb)
        .with_jobs(options.jobs)
        .with_force(options.force);

    if options.dry_run {
        let destinations = executor.destinations(&plan);
        println!("{}", describe_plan(&sheet, &plan, &destinations));
        return Ok(destinations);
    }

    info!(
        "Splitting {:?} into {} track(s)",
        source,
        plan.segments().len()
    );
    let outputs = executor.execute(&plan, &source, format, &media).await?;
    info!("Wrote {} track(s) from {:?}", outputs.len(), cue_path);

    Ok(outputs)
}

/// Splits a CUE sheet, or every CUE sheet below a directory. In directory mode
/// a failing sheet is logged and the remaining ones are still processed.
pub async fn split_input(
    pb: MultiProgress,
    input: &Path,
    options: &SplitOptions,
) -> SplitResult<Vec<PathBuf>> {
    if !fs::metadata(input).await?.is_dir() {
        return split_cue_file(pb, input, options).await;
    }

    let cue_files = find_cue_files(input).await?;
    if cue_files.is_empty() {
        return Err(SplitError::NoCueSheets(input.to_path_buf()));
    }

    let mut outputs = Vec::new();
    let mut failed = 0;
    for cue_path in &cue_files {
        match split_cue_file(pb.clone(), cue_path, options).await {
            Ok(mut written) => outputs.append(&mut written),
            Err(err) => {
                error!("{cue_path:?}: {err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(SplitError::BatchFailed {
            failed,
            total: cue_files.len(),
        });
    }

    Ok(outputs)
}

/// Human readable listing of a plan, one line per track.
pub fn describe_plan(sheet: &CueSheet, plan: &SplitPlan, destinations: &[PathBuf]) -> String {
    let timebase = plan.timebase();
    let mut lines = vec![format!(
        "{} - {} ({} track(s), pre-gap {})",
        sheet.performer.as_deref().unwrap_or("Unknown Artist"),
        sheet.title.as_deref().unwrap_or("Unknown Album"),
        plan.segments().len(),
        if plan.include_pregap() {
            "included"
        } else {
            "attached to previous track"
        }
    )];

    for (idx, segment) in plan.segments().iter().enumerate() {
        let destination = destinations
            .get(idx)
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        let line = format!(
            "  {:02}  {} - {}  {:>9.3}s  {}",
            segment.track,
            timebase.to_timecode(segment.start),
            timebase.to_timecode(segment.end),
            timebase.to_seconds(segment.len()),
            destination
        );
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

pub fn describe_sheet(sheet: &CueSheet) -> String {
    let mut lines = vec![format!(
        "FILE {:?} {:?}",
        sheet.file.filename, sheet.file.file_type
    )];

    let disc = [
        ("TITLE", &sheet.title),
        ("PERFORMER", &sheet.performer),
        ("SONGWRITER", &sheet.songwriter),
        ("CATALOG", &sheet.catalog),
        ("CDTEXTFILE", &sheet.cd_text_file),
    ];
    for (name, value) in disc {
        if let Some(value) = value {
            lines.push(format!("{name} {value:?}"));
        }
    }
    for entry in &sheet.rem {
        lines.push(format!("REM {:?} {:?}", entry.key, entry.value));
    }

    for track in &sheet.tracks {
        lines.push(format!(
            "  TRACK {:02} {:?} {:?}",
            track.number,
            track.track_type,
            track.title.as_deref().unwrap_or("")
        ));
        if let Some(performer) = &track.performer {
            lines.push(format!("    PERFORMER {performer:?}"));
        }
        if let Some(isrc) = &track.isrc {
            lines.push(format!("    ISRC {isrc}"));
        }
        if let Some(pregap) = track.pregap {
            lines.push(format!("    PREGAP {pregap}"));
        }
        for index in &track.indices {
            lines.push(format!("    INDEX {:02} {}", index.number, index.position));
        }
        if let Some(postgap) = track.postgap {
            lines.push(format!("    POSTGAP {postgap}"));
        }
    }

    lines.join("\n")
}

/// Parsed sheet followed by its plan. Without a readable source the plan is
/// shown in CUE frames with the last track left open.
pub async fn show_cue_file(cue_path: &Path, plan_options: PlanOptions) -> SplitResult<String> {
    let sheet = CueParser::new(cue_path).parse().await?;
    let planner = TrackPlanner::new(plan_options);
    let mut out = describe_sheet(&sheet);
    out.push('\n');

    let source = match resolve_source(cue_path, &sheet.file).await {
        Ok(source) => source,
        Err(SplitError::SourceNotFound(path)) => {
            warn!("Source {:?} not found, track ends are unknown", path);

            let timebase = Timebase::CD_FRAMES;
            for draft in planner.draft(&sheet, timebase)? {
                let end = draft
                    .end
                    .map(|end| timebase.to_timecode(end).to_string())
                    .unwrap_or_else(|| "end of media".to_string());
                out.push_str(&format!(
                    "\n  {:02}  {} - {}",
                    draft.track,
                    timebase.to_timecode(draft.start),
                    end
                ));
            }
            return Ok(out);
        }
        Err(err) => return Err(err),
    };

    let format = SourceFormat::detect(&source, sheet.file.file_type)?;
    let media = task::spawn_blocking(move || audio::probe(&source, format)).await??;
    let plan = planner.plan(&sheet, media.duration())?;
    out.push('\n');
    out.push_str(&describe_plan(&sheet, &plan, &[]));

    Ok(out)
}
