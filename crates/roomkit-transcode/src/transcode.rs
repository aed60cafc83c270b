use roomkit_store::{Capabilities, Content};

use crate::error::{Result, TranscodeError};

const MAX_COMPOSITE_DEPTH: usize = 5;

/// Whether `content` can be delivered to a target with `caps` in its native
/// shape — no downgrade needed.
fn natively_supported(content: &Content, caps: &Capabilities) -> bool {
    match content {
        Content::Text { .. } => caps.supports_text,
        Content::Rich { .. } => caps.supports_rich,
        Content::Media { .. } => caps.supports_media,
        Content::Location { .. } => caps.supports_location,
        Content::Audio { .. } => caps.supports_audio,
        Content::Video { .. } => caps.supports_video,
        Content::Template { .. } => caps.supports_template,
        // A composite is never itself a deliverable shape; it is always
        // flattened to text for a target that can't compose (rule 7).
        Content::Composite { .. } => false,
        // Structural, not rendered — always considered deliverable.
        Content::System { .. } => true,
    }
}

/// Degrades `content` to its plain-text rendering, per rules 2-8. Callers
/// only reach this once [`natively_supported`] has already said no.
fn to_text(content: &Content) -> String {
    match content {
        Content::Text { body } => body.clone(),
        Content::Rich { fallback, html, .. } => fallback.clone().unwrap_or_else(|| html.clone()),
        Content::Media { caption, url, .. } => match caption {
            Some(caption) => format!("{caption} {url}"),
            None => url.clone(),
        },
        Content::Location { lat, lon, label } => match label {
            Some(label) => format!("[Location: {label} ({lat}, {lon})]"),
            None => format!("[Location: ({lat}, {lon})]"),
        },
        Content::Audio { transcript, .. } => {
            transcript.clone().unwrap_or_else(|| "[Voice message]".to_string())
        }
        Content::Video { url, .. } => format!("[Video: {url}]"),
        Content::Composite { parts } => parts
            .iter()
            .map(to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        Content::System { code, .. } => format!("[System: {code}]"),
        Content::Template { id, fallback, .. } => {
            fallback.clone().unwrap_or_else(|| format!("[Template: {id}]"))
        }
    }
}

/// Produces a value `caps` can render, or [`TranscodeError::NotTranscodable`]
/// when even the text fallback is unavailable. A pure total function over
/// `(content, target_capabilities)` — no I/O, no state.
pub fn transcode(content: &Content, caps: &Capabilities) -> Result<Content> {
    if content.max_nesting_depth() > MAX_COMPOSITE_DEPTH {
        return Err(TranscodeError::NotTranscodable);
    }
    if natively_supported(content, caps) {
        return Ok(content.clone());
    }
    if !caps.supports_text {
        return Err(TranscodeError::NotTranscodable);
    }
    Ok(Content::text(to_text(content)))
}
