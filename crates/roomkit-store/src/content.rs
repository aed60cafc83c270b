use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The canonical, channel-agnostic content of a [`crate::event::RoomEvent`].
///
/// Each variant carries enough to losslessly render on any channel that
/// advertises the matching capability; transcoding down to a poorer target
/// lives in `roomkit-transcode`, which operates purely on this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Content {
    Text { body: String },
    Rich {
        html: String,
        fallback: Option<String>,
        buttons: Vec<Button>,
        cards: Vec<Card>,
        quick_replies: Vec<String>,
    },
    Media {
        url: String,
        mime_type: String,
        caption: Option<String>,
    },
    Location {
        lat: f64,
        lon: f64,
        label: Option<String>,
    },
    Audio {
        url: String,
        transcript: Option<String>,
    },
    Video {
        url: String,
        thumbnail: Option<String>,
    },
    Composite { parts: Vec<Content> },
    System { code: String, data: Option<Value> },
    Template {
        id: String,
        params: Option<Value>,
        /// Pre-rendered plain-text body — template rendering itself is a
        /// host concern; this is what the transcoder falls back to.
        fallback: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
}

impl Content {
    pub fn text(body: impl Into<String>) -> Self {
        Content::Text { body: body.into() }
    }

    /// `true` for a composite whose parts themselves contain a composite —
    /// callers constructing content directly (not via transcoding) must
    /// reject this; the data model's depth-5 cap is enforced by the builder
    /// that assembles events, not by this type itself.
    pub fn max_nesting_depth(&self) -> usize {
        match self {
            Content::Composite { parts } => {
                1 + parts.iter().map(Content::max_nesting_depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_content_has_zero_nesting_depth() {
        assert_eq!(Content::text("hi").max_nesting_depth(), 0);
    }

    #[test]
    fn nested_composite_depth_is_counted() {
        let c = Content::Composite {
            parts: vec![Content::Composite {
                parts: vec![Content::text("leaf")],
            }],
        };
        assert_eq!(c.max_nesting_depth(), 2);
    }
}
