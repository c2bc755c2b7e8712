use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Jewel,
    RitualEasy,
    RitualHard,
}

impl GameMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "jewel" => Some(Self::Jewel),
            "ritual_easy" => Some(Self::RitualEasy),
            "ritual_hard" => Some(Self::RitualHard),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jewel => "jewel",
            Self::RitualEasy => "ritual_easy",
            Self::RitualHard => "ritual_hard",
        }
    }

    pub fn is_ritual(self) -> bool {
        matches!(self, Self::RitualEasy | Self::RitualHard)
    }

    pub fn goal(self) -> &'static str {
        match self {
            Self::Jewel => "找出 T6 结束后珠宝在谁手中！",
            Self::RitualEasy | Self::RitualHard => "推出 T6 时所有巫舞者的位置！",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InitialClue {
    pub actor: String,
    pub location: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JewelEvent {
    NotFound,
    Found,
    Solo,
    Swap { to: String },
    Crowded,
}

impl JewelEvent {
    pub fn description(&self) -> String {
        match self {
            Self::NotFound => "无人独处，珠宝未现身".to_string(),
            Self::Found => "✨ 发现珠宝！".to_string(),
            Self::Solo => "独处(保留)".to_string(),
            Self::Swap { to } => format!("交换 -> {to}"),
            Self::Crowded => "人多(保留)".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JewelRecord {
    pub time: u8,
    pub holder: Option<String>,
    pub location: String,
    pub event: JewelEvent,
}

impl JewelRecord {
    pub fn holder_label(&self) -> &str {
        self.holder.as_deref().unwrap_or("无")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Truth {
    pub time: u8,
    pub location: String,
    pub actor: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Normal,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub time: String,
    pub player: String,
    pub description: String,
    #[serde(rename = "publicText")]
    pub public_text: String,
    #[serde(rename = "privateText")]
    pub private_text: String,
    pub owner: String,
    pub kind: LogKind,
}

/// Text produced for one investigation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QueryResolution {
    pub description: String,
    #[serde(rename = "publicText")]
    pub public_text: String,
    #[serde(rename = "privateText")]
    pub private_text: String,
    pub known: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoardRow {
    pub actor: String,
    pub locations: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaceRow {
    pub actor: String,
    #[serde(rename = "startLocation")]
    pub start_location: String,
    pub pattern: Vec<u8>,
    #[serde(rename = "startOffset")]
    pub start_offset: usize,
    pub executed: Vec<u8>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerSheet {
    pub mode: GameMode,
    pub seed: u32,
    #[serde(rename = "finalAnswer")]
    pub final_answer: String,
    pub board: Vec<BoardRow>,
    #[serde(rename = "jewelTrace", skip_serializing_if = "Vec::is_empty")]
    pub jewel_trace: Vec<JewelRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truth: Option<Truth>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paces: Vec<PaceRow>,
}
