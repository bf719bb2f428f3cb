pub mod candidate;
pub mod cli;
pub mod config;
pub mod reconcile;
pub mod sources;
pub mod storage;

pub use candidate::{BrandingResult, Ranked, ThumbnailCandidate, TitleCandidate, VideoId};
pub use config::{AppConfig, ConfigLoader, ConfigPaths, PathOverrides};
pub use reconcile::{Reconciler, ReconcileError, SessionPhase, Submission, SubmitSink};
pub use storage::{DraftCache, DraftStore, VideoDraft};
