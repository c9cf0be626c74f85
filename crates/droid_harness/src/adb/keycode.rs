//! Android physical key codes

use phf::phf_map;

use crate::error::{HarnessError, Result};

/// Physical keys that can be sent with `input keyevent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Home,
    Back,
    Dialing,
    HangUp,
    SoundUp,
    SoundLow,
    Power,
    Camera,
    OpenBrowser,
    Menu,
    Playback,
    NextPlay,
    LatestPlay,
    MoveCursorTop,
    MoveCursorBottom,
    ResumePlay,
    StopPlay,
    Silence,
    SystemSetting,
    SwitchApk,
    Contact,
    Calendar,
    Music,
    Calculate,
    ReduceScreenBrightness,
    IncreaseScreenBrightness,
    SystemSleep,
    LightUpScreen,
    VoiceAssistant,
    IfNotWakeLockSystemSleep,
}

static KEY_NAMES: phf::Map<&'static str, KeyCode> = phf_map! {
    "HOME" => KeyCode::Home,
    "BACK" => KeyCode::Back,
    "DIALING" => KeyCode::Dialing,
    "HANG_UP" => KeyCode::HangUp,
    "SOUND_UP" => KeyCode::SoundUp,
    "SOUND_LOW" => KeyCode::SoundLow,
    "POWER" => KeyCode::Power,
    "CAMERA" => KeyCode::Camera,
    "OPEN_BROWSER" => KeyCode::OpenBrowser,
    "MENU" => KeyCode::Menu,
    "PLAYBACK" => KeyCode::Playback,
    "NEXT_PLAY" => KeyCode::NextPlay,
    "LATEST_PLAY" => KeyCode::LatestPlay,
    "MOVE_CURSOR_TOP" => KeyCode::MoveCursorTop,
    "MOVE_CURSOR_BOTTOM" => KeyCode::MoveCursorBottom,
    "RESUME_PLAY" => KeyCode::ResumePlay,
    "STOP_PLAY" => KeyCode::StopPlay,
    "SILENCE" => KeyCode::Silence,
    "SYSTEM_SETTING" => KeyCode::SystemSetting,
    "SWITCH_APK" => KeyCode::SwitchApk,
    "CONTACT" => KeyCode::Contact,
    "CALENDAR" => KeyCode::Calendar,
    "MUSIC" => KeyCode::Music,
    "CALCULATE" => KeyCode::Calculate,
    "REDUCE_SCREEN_BRIGHTNESS" => KeyCode::ReduceScreenBrightness,
    "INCREASE_SCREEN_BRIGHTNESS" => KeyCode::IncreaseScreenBrightness,
    "SYSTEM_SLEEP" => KeyCode::SystemSleep,
    "LIGHT_UP_SCREEN" => KeyCode::LightUpScreen,
    "VOICE_ASSISTANT" => KeyCode::VoiceAssistant,
    "IF_NOT_WAKE_LOCK_SYSTEM_SLEEP" => KeyCode::IfNotWakeLockSystemSleep,
};

impl KeyCode {
    /// Numeric code understood by `input keyevent`
    pub fn code(self) -> u32 {
        match self {
            KeyCode::Home => 3,
            KeyCode::Back => 4,
            KeyCode::Dialing => 5,
            KeyCode::HangUp => 6,
            KeyCode::SoundUp => 24,
            KeyCode::SoundLow => 25,
            KeyCode::Power => 26,
            KeyCode::Camera => 27,
            KeyCode::OpenBrowser => 64,
            KeyCode::Menu => 82,
            KeyCode::Playback => 86,
            KeyCode::NextPlay => 87,
            KeyCode::LatestPlay => 88,
            KeyCode::MoveCursorTop => 122,
            KeyCode::MoveCursorBottom => 123,
            KeyCode::ResumePlay => 126,
            KeyCode::StopPlay => 127,
            KeyCode::Silence => 164,
            KeyCode::SystemSetting => 176,
            KeyCode::SwitchApk => 187,
            KeyCode::Contact => 207,
            KeyCode::Calendar => 208,
            KeyCode::Music => 209,
            KeyCode::Calculate => 210,
            KeyCode::ReduceScreenBrightness => 220,
            KeyCode::IncreaseScreenBrightness => 221,
            KeyCode::SystemSleep => 223,
            KeyCode::LightUpScreen => 224,
            KeyCode::VoiceAssistant => 231,
            KeyCode::IfNotWakeLockSystemSleep => 276,
        }
    }

    /// Look up a key by its upper-case name, e.g. `"HOME"`
    pub fn from_name(name: &str) -> Result<Self> {
        KEY_NAMES
            .get(name.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| HarnessError::UnknownKey(name.to_string()))
    }
}
