use std::io::{self, Write};

use serde::Serialize;

use crate::candidate::{ThumbnailCandidate, VideoId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmittedTitle {
    pub text: String,
    pub is_original: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub video_id: VideoId,
    pub title: SubmittedTitle,
    pub thumbnail: ThumbnailCandidate,
}

/// Receives the final title and thumbnail when the user submits.
pub trait SubmitSink {
    fn submit(&mut self, title: &SubmittedTitle, thumbnail: &ThumbnailCandidate);
}

impl<F> SubmitSink for F
where
    F: FnMut(&SubmittedTitle, &ThumbnailCandidate),
{
    fn submit(&mut self, title: &SubmittedTitle, thumbnail: &ThumbnailCandidate) {
        self(title, thumbnail)
    }
}

#[derive(Serialize)]
struct SubmissionLine<'a> {
    title: &'a SubmittedTitle,
    thumbnail: &'a ThumbnailCandidate,
}

/// Writes each submission as one JSON line.
pub struct JsonSubmitSink<W> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> JsonSubmitSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    /// Returns the writer, or the first error hit while submitting.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> SubmitSink for JsonSubmitSink<W> {
    fn submit(&mut self, title: &SubmittedTitle, thumbnail: &ThumbnailCandidate) {
        if self.error.is_some() {
            return;
        }
        let line = SubmissionLine { title, thumbnail };
        let result = serde_json::to_writer(&mut self.writer, &line)
            .map_err(io::Error::from)
            .and_then(|()| self.writer.write_all(b"\n"));
        if let Err(err) = result {
            self.error = Some(err);
        }
    }
}
