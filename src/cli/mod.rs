//! CLI module for ytrag.

mod output;
pub mod preflight;
pub mod serve;

pub use output::Output;

use crate::error::{RagError, Result};
use crate::orchestrator::ClearTarget;
use clap::Parser;

/// ytrag - ask questions about a YouTube video
///
/// Answers a question using only the video's transcript as context.
/// Transcripts and indexes are cached in memory for the life of the process.
#[derive(Parser, Debug)]
#[command(name = "ytrag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "YTRAG_CONFIG")]
    pub config: Option<String>,

    /// The question to ask
    #[arg(allow_hyphen_values = true)]
    pub query: Option<String>,

    /// YouTube video ID or URL (IDs may start with '-')
    #[arg(allow_hyphen_values = true)]
    pub video_id: Option<String>,

    /// Clear cached data for a video ID, or everything with --all
    #[arg(long, value_name = "VIDEO_ID", num_args = 0..=1, allow_hyphen_values = true)]
    pub clear_cache: Option<Option<String>>,

    /// Clear every cached video (with --clear-cache)
    #[arg(long, requires = "clear_cache")]
    pub all: bool,

    /// Start an HTTP server that shares one cache across requests
    #[arg(long, conflicts_with = "clear_cache")]
    pub serve: bool,

    /// Host to bind to (with --serve)
    #[arg(long, requires = "serve")]
    pub host: Option<String>,

    /// Port to listen on (with --serve)
    #[arg(long, requires = "serve")]
    pub port: Option<u16>,
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Ask { query: String, video_id: String },
    ClearCache(ClearTarget),
    Serve {
        host: Option<String>,
        port: Option<u16>,
    },
}

impl Invocation {
    /// The stdout text for a failure before the pipeline could run.
    ///
    /// Asking always answers with a string, so the error is rendered as
    /// `Error: ...`; other invocations report failures on stderr instead.
    pub fn failure_output(&self, err: &RagError) -> Option<String> {
        match self {
            Invocation::Ask { .. } => Some(err.to_output()),
            Invocation::ClearCache(_) | Invocation::Serve { .. } => None,
        }
    }
}

impl Cli {
    /// Resolve parsed flags into a single invocation.
    pub fn invocation(&self) -> Result<Invocation> {
        let has_positionals = self.query.is_some() || self.video_id.is_some();

        if self.serve {
            if has_positionals {
                return Err(RagError::InvalidInvocation(
                    "--serve does not take a query or video ID".to_string(),
                ));
            }
            return Ok(Invocation::Serve {
                host: self.host.clone(),
                port: self.port,
            });
        }

        if let Some(target) = &self.clear_cache {
            if has_positionals {
                return Err(RagError::InvalidInvocation(
                    "--clear-cache does not take a query".to_string(),
                ));
            }
            // A hyphen-tolerant value swallows a directly following `--all`.
            let (target, all) = match target.as_deref() {
                Some("--all") => (None, true),
                other => (other, self.all),
            };
            return match (target, all) {
                (None, true) => Ok(Invocation::ClearCache(ClearTarget::All)),
                (Some(id), false) if !id.trim().is_empty() => {
                    Ok(Invocation::ClearCache(ClearTarget::Video(id.to_string())))
                }
                (Some(_), true) => Err(RagError::InvalidInvocation(
                    "use either --all or a video ID with --clear-cache, not both".to_string(),
                )),
                _ => Err(RagError::InvalidInvocation(
                    "--clear-cache requires a video ID or --all".to_string(),
                )),
            };
        }

        match (&self.query, &self.video_id) {
            (Some(query), Some(video_id))
                if !query.trim().is_empty() && !video_id.trim().is_empty() =>
            {
                Ok(Invocation::Ask {
                    query: query.clone(),
                    video_id: video_id.clone(),
                })
            }
            _ => Err(RagError::InvalidInvocation(
                "a query and a video ID are required".to_string(),
            )),
        }
    }
}
