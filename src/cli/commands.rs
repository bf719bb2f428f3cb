use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::candidate::{ThumbnailCandidate, VideoId};
use crate::config::messages::{Localizer, MessageCatalog};
use crate::reconcile::{validate_thumbnail, JsonSubmitSink, Reconciler};
use crate::sources::{BrandingFile, StaticPageTitle};
use crate::storage::{DraftCache, DraftDatabase, DraftStore};

const TILE_WIDTH: usize = 48;

#[derive(Args, Debug, Clone)]
pub struct VideoArgs {
    /// Video identifier
    pub video_id: String,
    /// JSON file with ranked titles and thumbnails, keyed by video id
    #[arg(long)]
    pub branding: Option<PathBuf>,
    /// Title currently shown on the page (falls back to a placeholder)
    #[arg(long)]
    pub page_title: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub video: VideoArgs,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    #[command(flatten)]
    pub video: VideoArgs,
    /// Title to record as a draft
    #[arg(long)]
    pub title: Option<String>,
    /// Existing draft title that the new title replaces
    #[arg(long, requires = "title")]
    pub replace_title: Option<String>,
    /// Thumbnail timestamp in seconds to record as a draft
    #[arg(long)]
    pub thumbnail: Option<f64>,
    /// Existing draft timestamp that the new thumbnail replaces
    #[arg(long, requires = "thumbnail")]
    pub replace_thumbnail: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub video: VideoArgs,
    /// Title tile to submit (defaults to the pre-selected tile)
    #[arg(long)]
    pub title_index: Option<usize>,
    /// Thumbnail tile to submit (defaults to the pre-selected tile)
    #[arg(long)]
    pub thumbnail_index: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct DraftsArgs {
    /// Only show drafts for this video
    pub video_id: Option<String>,
}

pub fn show(cache: &DraftCache, catalog: MessageCatalog, args: ShowArgs) -> Result<()> {
    let reconciler = open_session(cache, catalog, &args.video)?;
    print!("{}", render_session(&reconciler, TILE_WIDTH)?);
    Ok(())
}

pub fn edit(cache: &DraftCache, catalog: MessageCatalog, args: EditArgs) -> Result<()> {
    // nothing is written unless every argument is usable
    let thumbnail = args.thumbnail.map(ThumbnailCandidate::at);
    if let Some(thumbnail) = &thumbnail {
        validate_thumbnail(thumbnail).context("rejecting --thumbnail")?;
    }

    let mut reconciler = open_session(cache, catalog, &args.video)?;
    if let Some(title) = args.title.as_deref() {
        reconciler
            .select_or_update_title(title, args.replace_title.as_deref())
            .context("recording title draft")?;
    }
    if let Some(thumbnail) = thumbnail {
        reconciler
            .select_or_update_thumbnail(thumbnail, args.replace_thumbnail)
            .context("recording thumbnail draft")?;
    }
    print!("{}", render_session(&reconciler, TILE_WIDTH)?);
    Ok(())
}

pub fn submit(cache: &DraftCache, catalog: MessageCatalog, args: SubmitArgs) -> Result<()> {
    let mut reconciler = open_session(cache, catalog, &args.video)?;
    if let Some(index) = args.title_index {
        reconciler.select_title(index)?;
    }
    if let Some(index) = args.thumbnail_index {
        reconciler.select_thumbnail(index)?;
    }
    let mut sink = JsonSubmitSink::new(io::stdout().lock());
    reconciler.submit(&mut sink)?;
    let _stdout = sink.finish().context("writing submission")?;
    Ok(())
}

pub fn list_drafts(database: &DraftDatabase, cache: &DraftCache, args: DraftsArgs) -> Result<()> {
    let output = match args.video_id {
        Some(video_id) => format_draft(cache, &VideoId::from(video_id)),
        None => format_summaries(database)?,
    };
    print!("{output}");
    Ok(())
}

fn open_session(
    cache: &DraftCache,
    catalog: MessageCatalog,
    args: &VideoArgs,
) -> Result<Reconciler<DraftCache>> {
    let ranking = match &args.branding {
        Some(path) => BrandingFile::open(path)?,
        None => BrandingFile::default(),
    };
    let page = StaticPageTitle(args.page_title.clone());
    let mut reconciler = Reconciler::new(cache.clone(), catalog);
    reconciler
        .load_from(VideoId::from(args.video_id.as_str()), &ranking, &page)
        .with_context(|| format!("loading candidates for {}", args.video_id))?;
    Ok(reconciler)
}

pub fn render_session<S: DraftStore, L: Localizer>(
    reconciler: &Reconciler<S, L>,
    width: usize,
) -> Result<String> {
    let prompt = reconciler.prompt();
    let mut out = String::new();
    writeln!(&mut out, "{}", prompt.instructions)?;
    writeln!(&mut out, "Titles")?;
    for tile in reconciler.title_tiles()? {
        let marker = if tile.selected { '>' } else { ' ' };
        writeln!(
            &mut out,
            "{marker} {:>2}  {}  [{}]",
            tile.index,
            fit_width(&tile.candidate.text, width),
            tile.origin
        )?;
    }
    writeln!(&mut out, "Thumbnails")?;
    for tile in reconciler.thumbnail_tiles()? {
        let marker = if tile.selected { '>' } else { ' ' };
        writeln!(
            &mut out,
            "{marker} {:>2}  {}  [{}]",
            tile.index,
            fit_width(&tile.candidate.to_string(), width),
            tile.origin
        )?;
    }
    writeln!(&mut out, "[{}]", prompt.vote_label)?;
    Ok(out)
}

fn format_draft(cache: &DraftCache, video_id: &VideoId) -> String {
    let Some(draft) = cache.get(video_id) else {
        return format!("No drafts for {video_id}.\n");
    };
    let mut out = String::new();
    let _ = writeln!(&mut out, "{video_id}");
    for title in &draft.titles {
        let _ = writeln!(&mut out, "    title      {}", title.text);
    }
    for thumbnail in &draft.thumbnails {
        let _ = writeln!(&mut out, "    thumbnail  {thumbnail}");
    }
    out
}

fn format_summaries(database: &DraftDatabase) -> Result<String> {
    let summaries = database.list_drafts().context("listing drafts")?;
    if summaries.is_empty() {
        return Ok("No drafts stored.\n".to_string());
    }
    let mut out = String::new();
    for summary in summaries {
        let _ = writeln!(
            &mut out,
            "{}  {} title(s), {} thumbnail(s), updated {}",
            summary.video_id,
            summary.titles,
            summary.thumbnails,
            format_timestamp(summary.updated_at)
        );
    }
    Ok(out)
}

fn format_timestamp(ts: i64) -> String {
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| ts.to_string())
}

/// Pads or truncates `text` to exactly `width` terminal columns, cutting on
/// grapheme boundaries.
fn fit_width(text: &str, width: usize) -> String {
    let mut out = String::new();
    if text.width() <= width {
        out.push_str(text);
    } else {
        let mut used = 0;
        for grapheme in text.graphemes(true) {
            let w = grapheme.width();
            if used + w + 1 > width {
                break;
            }
            out.push_str(grapheme);
            used += w;
        }
        out.push('…');
    }
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat(' ').take(pad));
    out
}
