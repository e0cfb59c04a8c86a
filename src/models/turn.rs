use serde::{Deserialize, Serialize};

/// Who is speaking in a chat transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The human participant
    Human,
    /// The assistant (any non-human speaker)
    Assistant,
}

/// Speaker state while walking a transcript; `None` until the first marker
pub type SpeakerState = Option<Speaker>;

/// Classification of a single transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// A turn marker handing the floor to the human
    HumanMarker,
    /// A turn marker handing the floor to the assistant
    AssistantMarker,
    /// Ordinary text belonging to whoever currently holds the turn
    Content,
}

impl LineClass {
    pub fn is_marker(self) -> bool {
        !matches!(self, LineClass::Content)
    }
}

/// Advance the speaker state over one classified line
pub fn next_state(state: SpeakerState, class: LineClass) -> SpeakerState {
    match class {
        LineClass::HumanMarker => Some(Speaker::Human),
        LineClass::AssistantMarker => Some(Speaker::Assistant),
        LineClass::Content => state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markers_set_state() {
        assert_eq!(next_state(None, LineClass::HumanMarker), Some(Speaker::Human));
        assert_eq!(
            next_state(Some(Speaker::Human), LineClass::AssistantMarker),
            Some(Speaker::Assistant)
        );
    }

    #[test]
    fn test_content_keeps_state() {
        assert_eq!(next_state(None, LineClass::Content), None);
        assert_eq!(
            next_state(Some(Speaker::Assistant), LineClass::Content),
            Some(Speaker::Assistant)
        );
        assert!(!LineClass::Content.is_marker());
        assert!(LineClass::HumanMarker.is_marker());
    }
}
