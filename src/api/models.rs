/// Wire data types for the generation API
///
/// These mirror the server's JSON responses field for field. Timestamps
/// stay as the raw strings the server sent (the backend emits naive
/// ISO-8601); `created_label` parses them lazily for display.
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A generated 360° panorama, as returned by the API
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    /// Server-assigned opaque id
    pub id: String,
    /// The full prompt the image was generated from
    pub prompt: String,
    /// Where to download the equirectangular image
    pub image_url: String,
    /// Server-side creation timestamp (raw string)
    pub created_at: String,
    /// Scenario the prompt was built from (free-form on the wire)
    pub scenario: String,
}

/// A 3D world mesh derived from a panorama
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct World3D {
    pub id: String,
    /// Id of the panorama this world was generated from
    pub image_id: String,
    /// Where to download the GLB mesh
    pub world_url: String,
    pub created_at: String,
    pub scenario: String,
}

impl GeneratedImage {
    /// Human-readable creation time for the gallery and info card
    pub fn created_label(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

impl World3D {
    pub fn created_label(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

/// Parse a server timestamp for display, falling back to the raw string
///
/// The backend sends naive `datetime.utcnow().isoformat()` values, but a
/// proxy in front of it may well send RFC 3339, so try both.
pub fn format_timestamp(raw: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

/// Lifecycle states a server-side job can report
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Completed,
    Failed,
}

/// One snapshot of a job, as returned by GET /api/jobs/{id}
///
/// `T` is the result payload: `GeneratedImage` for panorama jobs,
/// `World3D` for 3D jobs.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct JobSnapshot<T> {
    pub status: JobState,
    pub result: Option<T>,
    pub error: Option<String>,
}

/// Reply to a generation POST
///
/// Async deployments answer with a job handle to poll; simpler sync
/// deployments answer with the finished result directly. The untagged
/// parse tries the handle shape first (it is the only one with `job_id`).
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum GenerateReply<T> {
    Queued { job_id: String },
    Ready(T),
}

/// The closed set of survival scenarios the user can request
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Random,
    Beach,
    Jungle,
    Mountain,
    Cave,
    Ruins,
    Storm,
    Sunset,
    Night,
}

impl Scenario {
    /// Every scenario, in menu order
    pub const ALL: [Scenario; 9] = [
        Scenario::Random,
        Scenario::Beach,
        Scenario::Jungle,
        Scenario::Mountain,
        Scenario::Cave,
        Scenario::Ruins,
        Scenario::Storm,
        Scenario::Sunset,
        Scenario::Night,
    ];

    /// The lowercase id sent over the wire
    pub fn id(&self) -> &'static str {
        match self {
            Scenario::Random => "random",
            Scenario::Beach => "beach",
            Scenario::Jungle => "jungle",
            Scenario::Mountain => "mountain",
            Scenario::Cave => "cave",
            Scenario::Ruins => "ruins",
            Scenario::Storm => "storm",
            Scenario::Sunset => "sunset",
            Scenario::Night => "night",
        }
    }

    /// Display name shown in the selector
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Random => "Random",
            Scenario::Beach => "Beach Landing",
            Scenario::Jungle => "Dense Jungle",
            Scenario::Mountain => "Mountain Peak",
            Scenario::Cave => "Dark Cave",
            Scenario::Ruins => "Ancient Ruins",
            Scenario::Storm => "Stormy Weather",
            Scenario::Sunset => "Sunset View",
            Scenario::Night => "Night Sky",
        }
    }

    /// Emoji icon shown next to the name
    pub fn icon(&self) -> &'static str {
        match self {
            Scenario::Random => "🎲",
            Scenario::Beach => "🏖️",
            Scenario::Jungle => "🌴",
            Scenario::Mountain => "⛰️",
            Scenario::Cave => "🕳️",
            Scenario::Ruins => "🏛️",
            Scenario::Storm => "⛈️",
            Scenario::Sunset => "🌅",
            Scenario::Night => "🌙",
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario::Random
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.icon(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generated_image() {
        let json = r#"{
            "id": "1722440532",
            "prompt": "360 degree equirectangular panorama of a tropical beach",
            "image_url": "/images/1722440532.png",
            "created_at": "2024-07-31T15:42:12.123456",
            "scenario": "beach"
        }"#;

        let image: GeneratedImage = serde_json::from_str(json).unwrap();
        assert_eq!(image.id, "1722440532");
        assert_eq!(image.scenario, "beach");
        assert_eq!(image.created_label(), "2024-07-31 15:42");
    }

    #[test]
    fn test_timestamp_falls_back_to_raw() {
        assert_eq!(format_timestamp("yesterday-ish"), "yesterday-ish");
    }

    #[test]
    fn test_timestamp_accepts_rfc3339() {
        assert_eq!(
            format_timestamp("2024-07-31T15:42:12+00:00"),
            "2024-07-31 15:42"
        );
    }

    #[test]
    fn test_generate_reply_queued() {
        let reply: GenerateReply<GeneratedImage> =
            serde_json::from_str(r#"{"job_id": "job-42"}"#).unwrap();

        assert_eq!(reply, GenerateReply::Queued { job_id: "job-42".to_string() });
    }

    #[test]
    fn test_generate_reply_ready() {
        let json = r#"{
            "id": "1",
            "prompt": "p",
            "image_url": "u",
            "created_at": "t",
            "scenario": "random"
        }"#;

        let reply: GenerateReply<GeneratedImage> = serde_json::from_str(json).unwrap();
        match reply {
            GenerateReply::Ready(image) => assert_eq!(image.id, "1"),
            GenerateReply::Queued { .. } => panic!("parsed a full image as a job handle"),
        }
    }

    #[test]
    fn test_job_snapshot_pending_has_no_result() {
        let snapshot: JobSnapshot<GeneratedImage> =
            serde_json::from_str(r#"{"status": "pending"}"#).unwrap();

        assert_eq!(snapshot.status, JobState::Pending);
        assert!(snapshot.result.is_none());
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_job_snapshot_failed_carries_error() {
        let snapshot: JobSnapshot<World3D> =
            serde_json::from_str(r#"{"status": "failed", "error": "CUDA out of memory"}"#)
                .unwrap();

        assert_eq!(snapshot.status, JobState::Failed);
        assert_eq!(snapshot.error.as_deref(), Some("CUDA out of memory"));
    }

    #[test]
    fn test_scenario_wire_ids() {
        assert_eq!(serde_json::to_string(&Scenario::Beach).unwrap(), r#""beach""#);

        let parsed: Scenario = serde_json::from_str(r#""night""#).unwrap();
        assert_eq!(parsed, Scenario::Night);

        for scenario in Scenario::ALL {
            let wire = serde_json::to_string(&scenario).unwrap();
            assert_eq!(wire, format!("\"{}\"", scenario.id()));
        }
    }
}
