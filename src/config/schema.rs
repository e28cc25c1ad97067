use super::ConfigTree;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Every key the client recognizes, with its default value.
///
/// `null` leaves mean "unset". Group order here is the order written to disk.
#[must_use]
pub fn default_schema() -> ConfigTree {
    let schema = json!({
        "SYSTEM_OPTIONS": {
            "CLIENT_ID": null,
            "DEVICE_ID": null,
            "AUTO_START_CONVERSATION": true,
            "NETWORK": {
                "OTA_VERSION_URL": "https://api.tenclass.net/xiaozhi/ota/",
                "WEBSOCKET_URL": null,
                "WEBSOCKET_ACCESS_TOKEN": null,
                "MQTT_INFO": null,
                // v1 or v2
                "ACTIVATION_VERSION": "v2",
                "AUTHORIZATION_URL": "https://xiaozhi.me/"
            }
        },
        "WAKE_WORD_OPTIONS": {
            "USE_WAKE_WORD": true,
            "MODEL_PATH": "models",
            "NUM_THREADS": 4,
            "PROVIDER": "cpu",
            "MAX_ACTIVE_PATHS": 2,
            "KEYWORDS_SCORE": 1.8,
            "KEYWORDS_THRESHOLD": 0.2,
            "NUM_TRAILING_BLANKS": 1,
            "PLAY_BEEP_ON_WAKE": true,
            "USE_MP3_SOUND": true,
            "MP3_FILENAME": "wake_up.mp3",
            "BEEP_FREQUENCY": 800.0,
            "BEEP_DURATION": 0.5,
            "BEEP_VOLUME": 0.3,
            "USE_DOUBLE_BEEP": true
        },
        "CAMERA": {
            "camera_index": 0,
            "frame_width": 640,
            "frame_height": 480,
            "fps": 30,
            "Local_VL_url": "https://open.bigmodel.cn/api/paas/v4/",
            "VLapi_key": "",
            "models": "glm-4v-plus"
        },
        "SHORTCUTS": {
            "ENABLED": true,
            "MANUAL_PRESS": { "modifier": "ctrl", "key": "j", "description": "Hold to talk" },
            "AUTO_TOGGLE": { "modifier": "ctrl", "key": "k", "description": "Auto conversation" },
            "ABORT": { "modifier": "ctrl", "key": "q", "description": "Abort conversation" },
            "MODE_TOGGLE": { "modifier": "ctrl", "key": "m", "description": "Switch mode" },
            "WINDOW_TOGGLE": { "modifier": "ctrl", "key": "w", "description": "Show/hide window" }
        },
        "AEC_OPTIONS": {
            "ENABLED": false,
            "BUFFER_MAX_LENGTH": 200,
            "FRAME_DELAY": 3,
            "FILTER_LENGTH_RATIO": 0.4,
            "ENABLE_PREPROCESS": true
        },
        "AUDIO_DEVICES": {
            "input_device_id": null,
            "input_device_name": null,
            "output_device_id": null,
            "output_device_name": null,
            "input_sample_rate": null,
            "output_sample_rate": null
        }
    });

    match schema {
        Value::Object(map) => map,
        _ => unreachable!("default schema literal is an object"),
    }
}

/// Typed view of `SYSTEM_OPTIONS`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct SystemOptions {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default = "default_true")]
    pub auto_start_conversation: bool,
    #[serde(default)]
    pub network: NetworkOptions,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NetworkOptions {
    #[serde(default = "default_ota_version_url")]
    pub ota_version_url: String,
    #[serde(default)]
    pub websocket_url: Option<String>,
    #[serde(default)]
    pub websocket_access_token: Option<String>,
    #[serde(default)]
    pub mqtt_info: Option<Value>,
    #[serde(default = "default_activation_version")]
    pub activation_version: String,
    #[serde(default = "default_authorization_url")]
    pub authorization_url: String,
}

/// Typed view of `WAKE_WORD_OPTIONS`, including the wake chime settings
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct WakeWordOptions {
    #[serde(default = "default_true")]
    pub use_wake_word: bool,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_num_threads")]
    pub num_threads: u32,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_max_active_paths")]
    pub max_active_paths: u32,
    #[serde(default = "default_keywords_score")]
    pub keywords_score: f64,
    #[serde(default = "default_keywords_threshold")]
    pub keywords_threshold: f64,
    #[serde(default = "default_num_trailing_blanks")]
    pub num_trailing_blanks: u32,
    #[serde(default = "default_true")]
    pub play_beep_on_wake: bool,
    #[serde(default = "default_true")]
    pub use_mp3_sound: bool,
    #[serde(default = "default_mp3_filename")]
    pub mp3_filename: String,
    #[serde(default = "default_beep_frequency")]
    pub beep_frequency: f64,
    #[serde(default = "default_beep_duration")]
    pub beep_duration: f64,
    #[serde(default = "default_beep_volume")]
    pub beep_volume: f64,
    #[serde(default = "default_true")]
    pub use_double_beep: bool,
}

/// How the wake chime should be produced
#[derive(Clone, Debug, PartialEq)]
pub enum WakeChime {
    Silent,
    File(String),
    Tone {
        frequency: f64,
        duration: f64,
        volume: f64,
        double: bool,
    },
}

impl WakeWordOptions {
    /// Resolve the chime flags into the one behavior a player needs
    #[must_use]
    pub fn chime(&self) -> WakeChime {
        if !self.play_beep_on_wake {
            WakeChime::Silent
        } else if self.use_mp3_sound {
            WakeChime::File(self.mp3_filename.clone())
        } else {
            WakeChime::Tone {
                frequency: self.beep_frequency,
                duration: self.beep_duration,
                volume: self.beep_volume,
                double: self.use_double_beep,
            }
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_ota_version_url() -> String {
    "https://api.tenclass.net/xiaozhi/ota/".to_string()
}
fn default_activation_version() -> String {
    "v2".to_string()
}
fn default_authorization_url() -> String {
    "https://xiaozhi.me/".to_string()
}
fn default_model_path() -> String {
    "models".to_string()
}
const fn default_num_threads() -> u32 {
    4
}
fn default_provider() -> String {
    "cpu".to_string()
}
const fn default_max_active_paths() -> u32 {
    2
}
const fn default_keywords_score() -> f64 {
    1.8
}
const fn default_keywords_threshold() -> f64 {
    0.2
}
const fn default_num_trailing_blanks() -> u32 {
    1
}
fn default_mp3_filename() -> String {
    "wake_up.mp3".to_string()
}
const fn default_beep_frequency() -> f64 {
    800.0
}
const fn default_beep_duration() -> f64 {
    0.5
}
const fn default_beep_volume() -> f64 {
    0.3
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            ota_version_url: default_ota_version_url(),
            websocket_url: None,
            websocket_access_token: None,
            mqtt_info: None,
            activation_version: default_activation_version(),
            authorization_url: default_authorization_url(),
        }
    }
}

impl Default for SystemOptions {
    fn default() -> Self {
        Self {
            client_id: None,
            device_id: None,
            auto_start_conversation: default_true(),
            network: NetworkOptions::default(),
        }
    }
}

impl Default for WakeWordOptions {
    fn default() -> Self {
        Self {
            use_wake_word: default_true(),
            model_path: default_model_path(),
            num_threads: default_num_threads(),
            provider: default_provider(),
            max_active_paths: default_max_active_paths(),
            keywords_score: default_keywords_score(),
            keywords_threshold: default_keywords_threshold(),
            num_trailing_blanks: default_num_trailing_blanks(),
            play_beep_on_wake: default_true(),
            use_mp3_sound: default_true(),
            mp3_filename: default_mp3_filename(),
            beep_frequency: default_beep_frequency(),
            beep_duration: default_beep_duration(),
            beep_volume: default_beep_volume(),
            use_double_beep: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_groups_in_order() {
        let schema = default_schema();
        let groups: Vec<&str> = schema.keys().map(String::as_str).collect();
        assert_eq!(
            groups,
            vec![
                "SYSTEM_OPTIONS",
                "WAKE_WORD_OPTIONS",
                "CAMERA",
                "SHORTCUTS",
                "AEC_OPTIONS",
                "AUDIO_DEVICES"
            ]
        );
    }

    #[test]
    fn test_typed_views_match_schema_defaults() {
        let schema = default_schema();

        let wake: WakeWordOptions =
            serde_json::from_value(schema["WAKE_WORD_OPTIONS"].clone()).unwrap();
        assert_eq!(wake, WakeWordOptions::default());

        let system: SystemOptions =
            serde_json::from_value(schema["SYSTEM_OPTIONS"].clone()).unwrap();
        assert_eq!(system, SystemOptions::default());
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let wake: WakeWordOptions =
            serde_json::from_value(json!({ "USE_WAKE_WORD": false, "BEEP_VOLUME": 0.9 })).unwrap();
        assert!(!wake.use_wake_word);
        assert!((wake.beep_volume - 0.9).abs() < f64::EPSILON);
        assert_eq!(wake.mp3_filename, "wake_up.mp3");
    }

    #[test]
    fn test_chime_resolution() {
        let mut wake = WakeWordOptions::default();
        assert_eq!(wake.chime(), WakeChime::File("wake_up.mp3".to_string()));

        wake.use_mp3_sound = false;
        assert_eq!(
            wake.chime(),
            WakeChime::Tone {
                frequency: 800.0,
                duration: 0.5,
                volume: 0.3,
                double: true,
            }
        );

        wake.play_beep_on_wake = false;
        assert_eq!(wake.chime(), WakeChime::Silent);
    }
}
