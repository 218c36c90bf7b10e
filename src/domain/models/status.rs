use serde::{Deserialize, Deserializer, Serialize};

/// Processing state reported by the service. Read-only on the client.
///
/// Decoding matches names case-insensitively, like [`str::parse`], and maps
/// anything unrecognised to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Pending,
    Processing,
    Processed,
    Completed,
    Failed,
    Unknown,
}

impl ImageStatus {
    pub const ALL: [ImageStatus; 5] = [
        ImageStatus::Pending,
        ImageStatus::Processing,
        ImageStatus::Processed,
        ImageStatus::Completed,
        ImageStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Pending => "pending",
            ImageStatus::Processing => "processing",
            ImageStatus::Processed => "processed",
            ImageStatus::Completed => "completed",
            ImageStatus::Failed => "failed",
            ImageStatus::Unknown => "unknown",
        }
    }

    /// `processed` and `completed` are synonyms for a finished image
    pub fn is_done(&self) -> bool {
        matches!(self, ImageStatus::Processed | ImageStatus::Completed)
    }

    /// No further transitions expected
    pub fn is_terminal(&self) -> bool {
        self.is_done() || *self == ImageStatus::Failed
    }

    /// Badge colour used by the views
    pub fn indicator(&self) -> &'static str {
        match self {
            ImageStatus::Processed | ImageStatus::Completed => "emerald",
            ImageStatus::Processing => "amber",
            ImageStatus::Pending => "blue",
            ImageStatus::Failed => "red",
            ImageStatus::Unknown => "gray",
        }
    }
}

impl std::fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImageStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or(ImageStatus::Unknown))
    }
}

impl std::str::FromStr for ImageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ImageStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Unknown status: {}", s))
    }
}

/// Gallery status filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ImageStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ImageStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(expected) => *expected == status,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}
