//! YouTube caption provider.
//!
//! Resolves the caption track list through the innertube player endpoint and
//! downloads the chosen track in `json3` format.

use super::{TranscriptFragment, TranscriptProvider};
use crate::config::{ProviderSettings, TranscriptSettings};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

fn bare_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("Invalid regex"))
}

fn api_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("Invalid regex")
    })
}

/// Extract an 11-character video ID from a YouTube URL or a bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if bare_id_regex().is_match(input) {
        return Some(input.to_string());
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };
    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.trim_start_matches("www.").trim_start_matches("m.");

    let candidate = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "music.youtube.com" | "youtube-nocookie.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned()),
                Some("embed") | Some("shorts") | Some("live") | Some("v") => {
                    segments.next().map(str::to_string)
                }
                _ => None,
            }
        }
        _ => None,
    }?;

    bare_id_regex()
        .is_match(&candidate)
        .then_some(candidate)
}

/// A caption track advertised by the player response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    /// `"asr"` for auto-generated tracks.
    #[serde(default)]
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }

    fn matches_language(&self, language: &str) -> bool {
        let code = self.language_code.to_lowercase();
        let wanted = language.to_lowercase();
        code == wanted || code.split('-').next() == Some(wanted.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Json3Event {
    #[serde(default)]
    t_start_ms: u64,
    #[serde(default)]
    d_duration_ms: u64,
    #[serde(default)]
    segs: Option<Vec<Json3Seg>>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Transcript provider for YouTube videos.
pub struct YoutubeTranscriptProvider {
    client: reqwest::Client,
    base_url: String,
    languages: Vec<String>,
    prefer_manual: bool,
}

impl YoutubeTranscriptProvider {
    /// Create a provider from settings.
    pub fn new(provider: &ProviderSettings, settings: &TranscriptSettings) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if provider.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(provider.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: YOUTUBE_BASE_URL.to_string(),
            languages: settings.languages.clone(),
            prefer_manual: settings.prefer_manual,
        })
    }

    /// Point the provider at a different host.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await
            .map_err(|e| RagError::AcquisitionFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RagError::AcquisitionFailed(
                "YouTube is rate limiting requests (HTTP 429)".to_string(),
            ));
        }

        response
            .error_for_status()
            .map_err(|e| RagError::AcquisitionFailed(e.to_string()))?
            .text()
            .await
            .map_err(|e| RagError::AcquisitionFailed(e.to_string()))
    }

    async fn fetch_player_response(&self, video_id: &str, api_key: &str) -> Result<serde_json::Value> {
        let url = format!("{}/youtubei/v1/player?key={}", self.base_url, api_key);
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::AcquisitionFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| RagError::AcquisitionFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| RagError::AcquisitionFailed(format!("Invalid player response: {}", e)))
    }
}

#[async_trait]
impl TranscriptProvider for YoutubeTranscriptProvider {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptFragment>> {
        let id = extract_video_id(video_id).ok_or_else(|| {
            warn!("Not a YouTube video ID or URL: {}", video_id);
            RagError::VideoUnavailable
        })?;

        let watch_html = self
            .get_text(&format!("{}/watch?v={}", self.base_url, id))
            .await?;
        let api_key = extract_api_key(&watch_html)?;

        let player = self.fetch_player_response(&id, &api_key).await?;
        let track = select_track(&player, &self.languages, self.prefer_manual)?;
        info!(
            "Using {} captions ({})",
            track.language_code,
            if track.is_generated() { "auto-generated" } else { "manual" }
        );

        let body = self.get_text(&json3_url(&track.base_url)?).await?;
        let fragments = parse_json3(&body)?;
        debug!("Parsed {} caption fragments", fragments.len());
        Ok(fragments)
    }
}

/// Pull the innertube API key out of the watch page.
fn extract_api_key(html: &str) -> Result<String> {
    if html.contains("class=\"g-recaptcha\"") {
        return Err(RagError::AcquisitionFailed(
            "YouTube is blocking requests from this IP (captcha)".to_string(),
        ));
    }

    if let Some(caps) = api_key_regex().captures(html) {
        return Ok(caps[1].to_string());
    }

    if html.contains("action=\"https://consent.youtube.com/s\"") {
        return Err(RagError::AcquisitionFailed(
            "YouTube requires cookie consent for this request".to_string(),
        ));
    }

    Err(RagError::AcquisitionFailed(
        "Could not find the player API key on the watch page".to_string(),
    ))
}

/// Check playability and choose a caption track from a player response.
fn select_track(
    player: &serde_json::Value,
    languages: &[String],
    prefer_manual: bool,
) -> Result<CaptionTrack> {
    let status = player["playabilityStatus"]["status"].as_str().unwrap_or("ERROR");
    if status != "OK" {
        let reason = player["playabilityStatus"]["reason"].as_str().unwrap_or_default();
        if reason.contains("not a bot") {
            return Err(RagError::AcquisitionFailed(
                "YouTube is blocking requests from this IP (bot check)".to_string(),
            ));
        }
        warn!("Video not playable: {} {}", status, reason);
        return Err(RagError::VideoUnavailable);
    }

    let tracks: Vec<CaptionTrack> =
        match player["captions"]["playerCaptionsTracklistRenderer"].get("captionTracks") {
            Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
                RagError::AcquisitionFailed(format!("Invalid caption track list: {}", e))
            })?,
            None => return Err(RagError::TranscriptsDisabled),
        };
    if tracks.is_empty() {
        return Err(RagError::TranscriptsDisabled);
    }

    for language in languages {
        let mut matching: Vec<&CaptionTrack> =
            tracks.iter().filter(|t| t.matches_language(language)).collect();
        // Stable sort keeps the provider's order within each group.
        matching.sort_by_key(|t| t.is_generated() == prefer_manual);
        if let Some(track) = matching.first() {
            return Ok((*track).clone());
        }
    }

    let available: Vec<&str> = tracks.iter().map(|t| t.language_code.as_str()).collect();
    debug!("No caption track for {:?}; available: {:?}", languages, available);
    Err(RagError::NoTranscriptFound)
}

/// Rewrite a track URL to request the `json3` format.
fn json3_url(base_url: &str) -> Result<String> {
    let mut url = Url::parse(base_url)
        .map_err(|e| RagError::AcquisitionFailed(format!("Invalid caption URL: {}", e)))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");

    Ok(url.to_string())
}

/// Parse a `json3` caption document into fragments.
fn parse_json3(body: &str) -> Result<Vec<TranscriptFragment>> {
    let doc: Json3Transcript = serde_json::from_str(body)
        .map_err(|e| RagError::AcquisitionFailed(format!("Invalid caption data: {}", e)))?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs?.into_iter().map(|s| s.utf8).collect();
            if text.trim().is_empty() {
                return None;
            }
            Some(TranscriptFragment::new(
                text,
                event.t_start_ms as f64 / 1000.0,
                event.d_duration_ms as f64 / 1000.0,
            ))
        })
        .collect())
}
