//! YouTube caption source.
//!
//! Resolves caption tracks through the innertube `player` endpoint and
//! downloads the timed-text XML of the selected track.

use super::{language_matches, FetchedTranscript, TranscriptSnippet, TranscriptSource};
use crate::error::{Result, VidqaError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, instrument};

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

static VIDEO_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // Matches various YouTube URL formats and bare video IDs
    Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.|m\.)?
            (?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/)
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
    ",
    )
    .expect("Invalid regex")
});

static API_KEY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("Invalid regex")
});

static CAPTION_TEXT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<text\s+start="([\d.]+)"(?:\s+dur="([\d.]+)")?[^>]*>(.*?)</text>"#)
        .expect("Invalid regex")
});

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Invalid regex"));

static NUMERIC_ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("Invalid regex"));

/// Extract an 11-character video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    // watch URLs may carry `v` anywhere in the query string
    if let Ok(url) = url::Url::parse(input) {
        if url.host_str().is_some_and(|h| h.ends_with("youtube.com")) {
            if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
                if VIDEO_ID_REGEX.is_match(&v) {
                    return Some(v.into_owned());
                }
            }
        }
    }

    let caps = VIDEO_ID_REGEX.captures(input)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Captions {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
    kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

/// YouTube transcript source.
pub struct YoutubeTranscriptSource {
    client: reqwest::Client,
}

impl YoutubeTranscriptSource {
    /// Create a source whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VidqaError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Fetch the watch page and pull the innertube API key out of it.
    async fn fetch_api_key(&self, video_id: &str) -> Result<String> {
        let html = self
            .client
            .get(WATCH_URL)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US")
            .header("Cookie", "CONSENT=YES+cb")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if html.contains("class=\"g-recaptcha\"") {
            return Err(VidqaError::TranscriptSource(
                "YouTube is rate limiting requests from this IP".to_string(),
            ));
        }

        API_KEY_REGEX
            .captures(&html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                VidqaError::TranscriptSource(format!(
                    "Could not find innertube API key on watch page for {}",
                    video_id
                ))
            })
    }

    async fn fetch_player(&self, video_id: &str, api_key: &str) -> Result<PlayerResponse> {
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<PlayerResponse>()
            .await?;

        Ok(response)
    }

    async fn fetch_track(&self, track: &CaptionTrack) -> Result<Vec<TranscriptSnippet>> {
        let url = track.base_url.replace("&fmt=srv3", "");
        let xml = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_caption_xml(&xml))
    }
}

/// Check playability and return the caption tracks of a player response.
fn caption_tracks(video_id: &str, player: PlayerResponse) -> Result<Vec<CaptionTrack>> {
    if let Some(status) = &player.playability_status {
        let state = status.status.as_deref().unwrap_or("OK");
        if state != "OK" {
            let reason = status.reason.clone().unwrap_or_else(|| state.to_string());
            return Err(VidqaError::VideoUnavailable(format!("{}: {}", video_id, reason)));
        }
    }

    let tracks = player
        .captions
        .and_then(|c| c.player_captions_tracklist_renderer)
        .map(|r| r.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(VidqaError::TranscriptsDisabled(video_id.to_string()));
    }
    Ok(tracks)
}

/// Pick a track: manually created before generated, in listing order.
fn select_track<'a>(tracks: &'a [CaptionTrack], language: Option<&str>) -> Option<&'a CaptionTrack> {
    let wanted = |t: &&CaptionTrack| match language {
        Some(lang) => language_matches(&t.language_code, lang),
        None => true,
    };

    tracks
        .iter()
        .filter(|t| !t.is_generated())
        .find(wanted)
        .or_else(|| tracks.iter().filter(|t| t.is_generated()).find(wanted))
}

/// Parse timed-text XML into snippets, dropping empty lines.
pub(crate) fn parse_caption_xml(xml: &str) -> Vec<TranscriptSnippet> {
    CAPTION_TEXT_REGEX
        .captures_iter(xml)
        .filter_map(|caps| {
            let start = caps.get(1)?.as_str().parse::<f64>().ok()?;
            let duration = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0);

            // entities are escaped once by XML and once more by the caption HTML
            let raw = unescape_entities(&unescape_entities(caps.get(3)?.as_str()));
            let text = TAG_REGEX.replace_all(&raw, "");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

            if text.is_empty() {
                None
            } else {
                Some(TranscriptSnippet::new(text, start, duration))
            }
        })
        .collect()
}

fn unescape_entities(s: &str) -> String {
    let numeric = NUMERIC_ENTITY_REGEX.replace_all(s, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(|c| c.to_string())
            .unwrap_or_else(|| caps[0].to_string())
    });

    numeric
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str, language: Option<&str>) -> Result<FetchedTranscript> {
        let api_key = self.fetch_api_key(video_id).await?;
        let player = self.fetch_player(video_id, &api_key).await?;
        let tracks = caption_tracks(video_id, player)?;

        let track = select_track(&tracks, language).ok_or_else(|| VidqaError::NoTranscriptFound {
            video_id: video_id.to_string(),
            requested: language.unwrap_or("any language").to_string(),
            available: tracks
                .iter()
                .map(|t| t.language_code.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })?;

        debug!(
            "Using {} track '{}' for {}",
            if track.is_generated() { "generated" } else { "manual" },
            track.language_code,
            video_id
        );

        let snippets = self.fetch_track(track).await?;

        Ok(FetchedTranscript {
            language_code: track.language_code.clone(),
            is_generated: track.is_generated(),
            snippets,
        })
    }
}
