//! # Status Taxonomy
//!
//! Display metadata for objective and key-result status labels.
//!
//! - Six canonical labels (`Not Started`, `In Progress`, `At Risk`, `Behind`,
//!   `Completed`, `Cancelled`) plus arbitrary free-text labels
//! - Every label renders: unknown labels get the neutral `Unknown` tone
//! - Status is independent of progress: nothing here looks at percentages,
//!   and there is no transition table (any label may follow any other)

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// CANONICAL LABELS
// =============================================================================

/// One of the six canonical status labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusLabel {
    NotStarted,
    InProgress,
    AtRisk,
    Behind,
    Completed,
    Cancelled,
}

impl StatusLabel {
    /// All canonical labels in picker order.
    pub const ALL: [StatusLabel; 6] = [
        StatusLabel::NotStarted,
        StatusLabel::InProgress,
        StatusLabel::AtRisk,
        StatusLabel::Behind,
        StatusLabel::Completed,
        StatusLabel::Cancelled,
    ];

    /// Human label as shown in pickers and badges.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::NotStarted => "Not Started",
            StatusLabel::InProgress => "In Progress",
            StatusLabel::AtRisk => "At Risk",
            StatusLabel::Behind => "Behind",
            StatusLabel::Completed => "Completed",
            StatusLabel::Cancelled => "Cancelled",
        }
    }

    /// Parse a label leniently.
    ///
    /// Case, whitespace, underscores and hyphens are ignored, so `"At Risk"`,
    /// `"at_risk"` and `"AT-RISK"` all parse. Returns `None` for anything
    /// that is not one of the six canonical labels.
    #[must_use]
    pub fn parse(label: &str) -> Option<StatusLabel> {
        let key: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "notstarted" => Some(StatusLabel::NotStarted),
            "inprogress" => Some(StatusLabel::InProgress),
            "atrisk" => Some(StatusLabel::AtRisk),
            "behind" => Some(StatusLabel::Behind),
            "completed" => Some(StatusLabel::Completed),
            "cancelled" | "canceled" => Some(StatusLabel::Cancelled),
            _ => None,
        }
    }

    /// Display metadata for this label.
    #[must_use]
    pub fn display(&self) -> StatusDisplay {
        let (tone, icon, description) = match self {
            StatusLabel::NotStarted => (Tone::Neutral, "circle", "Work has not started yet"),
            StatusLabel::InProgress => (Tone::Info, "clock", "Work is underway"),
            StatusLabel::AtRisk => (
                Tone::Warning,
                "alert-triangle",
                "Progress is at risk of missing the target",
            ),
            StatusLabel::Behind => (Tone::Danger, "trending-down", "Progress is behind schedule"),
            StatusLabel::Completed => (Tone::Success, "check-circle", "Target has been reached"),
            StatusLabel::Cancelled => (Tone::Muted, "x-circle", "No longer being pursued"),
        };
        StatusDisplay {
            label: self.as_str().to_string(),
            tone,
            icon: icon.to_string(),
            description: description.to_string(),
        }
    }
}

impl std::fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// STATUS (canonical or free text)
// =============================================================================

/// A status as stored on a record: a canonical label or free text.
///
/// Serialized as a plain string. Deserialization never fails on an unknown
/// label; it is kept verbatim as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    Known(StatusLabel),
    Custom(String),
}

impl Status {
    /// Build a status from any string, recognising canonical labels.
    pub fn from_label(label: impl AsRef<str>) -> Self {
        let label = label.as_ref();
        match StatusLabel::parse(label) {
            Some(known) => Status::Known(known),
            None => Status::Custom(label.trim().to_string()),
        }
    }

    /// The canonical label, if any.
    #[must_use]
    pub fn known(&self) -> Option<StatusLabel> {
        match self {
            Status::Known(label) => Some(*label),
            Status::Custom(_) => None,
        }
    }

    /// Check for a specific canonical label.
    #[must_use]
    pub fn is(&self, label: StatusLabel) -> bool {
        self.known() == Some(label)
    }

    /// The label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Status::Known(label) => label.as_str(),
            Status::Custom(text) => text,
        }
    }

    /// Display metadata; free-text labels fall back to `Unknown`.
    #[must_use]
    pub fn display(&self) -> StatusDisplay {
        match self {
            Status::Known(label) => label.display(),
            Status::Custom(text) => StatusDisplay::unknown(text),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Known(StatusLabel::NotStarted)
    }
}

impl From<StatusLabel> for Status {
    fn from(label: StatusLabel) -> Self {
        Status::Known(label)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Status::from_label(raw))
    }
}

// =============================================================================
// DISPLAY METADATA
// =============================================================================

/// Semantic colour family of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Info,
    Warning,
    Danger,
    Success,
    Muted,
    Unknown,
}

/// Everything a badge, card or tooltip needs to render a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDisplay {
    /// The label as given (canonical spelling for known labels).
    pub label: String,
    pub tone: Tone,
    /// Icon glyph name.
    pub icon: String,
    /// Tooltip text.
    pub description: String,
}

impl StatusDisplay {
    /// Fallback metadata for an unrecognised label.
    #[must_use]
    pub fn unknown(label: &str) -> Self {
        Self {
            label: label.to_string(),
            tone: Tone::Unknown,
            icon: "help-circle".to_string(),
            description: "Status unknown".to_string(),
        }
    }
}

/// Display metadata for an arbitrary label string. Never fails.
#[must_use]
pub fn status_display(label: &str) -> StatusDisplay {
    Status::from_label(label).display()
}

// =============================================================================
// PICKER OPTIONS
// =============================================================================

/// One entry of a status picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOption {
    pub value: String,
    pub display: StatusDisplay,
}

/// Canonical labels for a picker, optionally restricted by an allow-list.
///
/// The result always follows canonical order, whatever the order of the
/// allow-list. An empty allow-list yields an empty picker.
#[must_use]
pub fn selectable_statuses(allow: Option<&[StatusLabel]>) -> Vec<StatusOption> {
    StatusLabel::ALL
        .iter()
        .filter(|label| allow.is_none_or(|allowed| allowed.contains(label)))
        .map(|label| StatusOption {
            value: label.as_str().to_string(),
            display: label.display(),
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
