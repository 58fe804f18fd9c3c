//! Message types for the simulator's text protocol.
//!
//! Inbound, the server sends sensor reports (`see`, `hear`, `sense_body`)
//! and a handful of control messages. Outbound, the client sends the
//! commands in [`OutboundCommand`]. Everything here is plain data: the
//! decoding and encoding rules live in [`codec`](crate::codec).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which half of the field a team defends. On the wire: `l` or `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Parses the single-letter wire form.
    pub fn from_wire(token: &str) -> Option<Self> {
        match token {
            "l" => Some(Self::Left),
            "r" => Some(Self::Right),
            _ => None,
        }
    }

    /// The other team's side.
    pub fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "l",
            Self::Right => "r",
        })
    }
}

// ---------------------------------------------------------------------------
// GameInit
// ---------------------------------------------------------------------------

/// The server's answer to `(init ...)`: who we are in this match.
///
/// `number` is nominally 1–99 but is passed through unchecked, as is
/// `play_mode` (e.g. `before_kick_off`, `play_on`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameInit {
    pub side: Side,
    pub number: u8,
    pub play_mode: String,
}

// ---------------------------------------------------------------------------
// Auditory
// ---------------------------------------------------------------------------

/// Who said something the player heard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Sender {
    /// The referee announcing play modes, goals, fouls.
    Referee,
    /// Our own `say`, echoed back.
    Myself,
    /// A player identified by side and uniform number (`l7`, `r10`).
    OtherPlayer { side: Side, number: u8 },
    /// The trainer (`coach`) or a team's online coach.
    Coach { side: Option<Side> },
    /// A player heard from a relative direction, without identity.
    Direction { degrees: f64 },
}

impl Sender {
    /// Parses a sender token from a `hear` message.
    pub fn from_wire(token: &str) -> Option<Self> {
        match token {
            "referee" => return Some(Self::Referee),
            "self" => return Some(Self::Myself),
            "coach" => return Some(Self::Coach { side: None }),
            "online_coach_left" => {
                return Some(Self::Coach {
                    side: Some(Side::Left),
                });
            }
            "online_coach_right" => {
                return Some(Self::Coach {
                    side: Some(Side::Right),
                });
            }
            _ => {}
        }

        let (head, digits) = token.split_at_checked(1)?;
        if let Some(side) = Side::from_wire(head) {
            if (1..=2).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()) {
                return digits
                    .parse()
                    .ok()
                    .map(|number| Self::OtherPlayer { side, number });
            }
            return None;
        }

        let numeric_start = token
            .bytes()
            .next()
            .is_some_and(|b| b.is_ascii_digit() || b == b'-' || b == b'+');
        if numeric_start {
            if let Ok(degrees) = token.parse::<f64>() {
                if degrees.is_finite() {
                    return Some(Self::Direction { degrees });
                }
            }
        }
        None
    }
}

/// Something heard during one simulation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditoryEvent {
    /// Simulation cycle.
    pub time: u32,
    pub sender: Sender,
    /// The utterance, verbatim.
    pub text: String,
}

// ---------------------------------------------------------------------------
// Visual
// ---------------------------------------------------------------------------

/// What kind of object a `see` entry describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectKind {
    Ball,
    /// Team and number are omitted by the server for distant players.
    Player {
        team: Option<String>,
        number: Option<u8>,
        goalie: bool,
    },
    Goal {
        side: Option<Side>,
    },
    /// A landmark flag; `name` is the rest of the object name, e.g. `r t`
    /// or `p l c`.
    Flag {
        name: String,
    },
    /// A field boundary line: `l`, `r`, `t` or `b`.
    Line {
        name: String,
    },
    Unknown {
        name: String,
    },
}

/// One object in a visual report.
///
/// The server sends between one and six numbers per object depending on
/// how close it is; fields that were not sent are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenObject {
    pub kind: ObjectKind,
    /// `false` for objects sensed behind the player (upper-case names):
    /// close enough to notice, outside the view cone.
    pub in_view: bool,
    pub distance: Option<f64>,
    pub direction: Option<f64>,
    pub dist_change: Option<f64>,
    pub dir_change: Option<f64>,
    pub body_facing_dir: Option<f64>,
    pub head_facing_dir: Option<f64>,
}

/// A decoded `see` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualEvent {
    pub time: u32,
    pub objects: Vec<SeenObject>,
}

impl VisualEvent {
    /// The first visible object matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&ObjectKind) -> bool) -> Option<&SeenObject> {
        self.objects
            .iter()
            .find(|object| object.in_view && predicate(&object.kind))
    }

    /// The ball, if it is in view.
    pub fn ball(&self) -> Option<&SeenObject> {
        self.find(|kind| matches!(kind, ObjectKind::Ball))
    }

    /// The goal on `side`, if it is in view.
    pub fn goal(&self, side: Side) -> Option<&SeenObject> {
        self.find(|kind| matches!(kind, ObjectKind::Goal { side: Some(s) } if *s == side))
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// View cone width, as used by `change_view` and reported by `sense_body`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewWidth {
    Narrow,
    Normal,
    Wide,
}

impl fmt::Display for ViewWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Narrow => "narrow",
            Self::Normal => "normal",
            Self::Wide => "wide",
        })
    }
}

impl FromStr for ViewWidth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "narrow" => Ok(Self::Narrow),
            "normal" => Ok(Self::Normal),
            "wide" => Ok(Self::Wide),
            other => Err(format!("unknown view width `{other}`")),
        }
    }
}

/// Visual information quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewQuality {
    High,
    Low,
}

impl fmt::Display for ViewQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Low => "low",
        })
    }
}

impl FromStr for ViewQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown view quality `{other}`")),
        }
    }
}

/// The current view settings, as last set by `change_view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewMode {
    pub quality: ViewQuality,
    pub width: ViewWidth,
}

/// Remaining stamina and the effort factor scaling dash power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stamina {
    pub stamina: f64,
    pub effort: f64,
}

/// The player's own speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub amount: f64,
    /// Only sent by newer protocol versions.
    pub direction: Option<f64>,
}

/// A decoded `sense_body` message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyEvent {
    pub time: u32,
    pub view_mode: Option<ViewMode>,
    pub stamina: Option<Stamina>,
    pub speed: Option<Speed>,
    pub head_angle: Option<f64>,
    /// How many times each command has been executed so far
    /// (`kick`, `dash`, `turn`, `say`, ...).
    pub counters: BTreeMap<String, u32>,
}

// ---------------------------------------------------------------------------
// SensorEvent
// ---------------------------------------------------------------------------

/// A decoded sensor report, handed to decision logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sensor", content = "event", rename_all = "snake_case")]
pub enum SensorEvent {
    Visual(VisualEvent),
    Auditory(AuditoryEvent),
    Body(BodyEvent),
}

impl SensorEvent {
    /// The simulation cycle the report belongs to.
    pub fn time(&self) -> u32 {
        match self {
            Self::Visual(event) => event.time,
            Self::Auditory(event) => event.time,
            Self::Body(event) => event.time,
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound classification
// ---------------------------------------------------------------------------

/// The leading token of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Init,
    See,
    Hear,
    SenseBody,
    Error,
    Warning,
    Ok,
    Score,
    ServerParam,
    PlayerParam,
    PlayerType,
    ChangePlayerType,
}

/// A fully decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Handshake acknowledgment.
    Init(GameInit),
    Sensor(SensorEvent),
    /// `(error <reason>)`: the server rejected something we sent.
    ServerError(String),
    /// `(warning <reason>)`.
    ServerWarning(String),
    /// A recognized message this client has no use for.
    Ignored(MessageKind),
}

// ---------------------------------------------------------------------------
// OutboundCommand
// ---------------------------------------------------------------------------

/// A command sent to the server. No reply is expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundCommand {
    /// Handshake: join `team` speaking protocol `version`.
    Init { team: String, version: u32 },
    /// Teleport to `(x, y)`; only allowed before kick-off and after goals.
    Move { x: f64, y: f64 },
    Turn { moment: f64 },
    TurnNeck { moment: f64 },
    Dash { power: f64 },
    Kick { power: f64, direction: f64 },
    /// Broadcast `text` to players within hearing distance.
    Say { text: String },
    ChangeView { width: ViewWidth, quality: ViewQuality },
    /// Goalie only.
    Catch { direction: f64 },
    /// Ask for an immediate `sense_body` report.
    SenseBody,
    /// Leave the match.
    Bye,
}

impl OutboundCommand {
    /// `false` if any numeric argument is NaN or infinite. The server can't
    /// parse those, so such a command must not be sent.
    pub fn is_finite(&self) -> bool {
        match self {
            Self::Move { x, y } => x.is_finite() && y.is_finite(),
            Self::Turn { moment } | Self::TurnNeck { moment } => moment.is_finite(),
            Self::Dash { power } => power.is_finite(),
            Self::Kick { power, direction } => power.is_finite() && direction.is_finite(),
            Self::Catch { direction } => direction.is_finite(),
            Self::Init { .. }
            | Self::Say { .. }
            | Self::ChangeView { .. }
            | Self::SenseBody
            | Self::Bye => true,
        }
    }

    /// The command's leading token, e.g. `turn_neck`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init { .. } => "init",
            Self::Move { .. } => "move",
            Self::Turn { .. } => "turn",
            Self::TurnNeck { .. } => "turn_neck",
            Self::Dash { .. } => "dash",
            Self::Kick { .. } => "kick",
            Self::Say { .. } => "say",
            Self::ChangeView { .. } => "change_view",
            Self::Catch { .. } => "catch",
            Self::SenseBody => "sense_body",
            Self::Bye => "bye",
        }
    }
}

/// Renders a float the way the server's parser expects it: shortest
/// round-tripping form, always with a fractional part (`100.0`, not `100`).
struct Num(f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::Init { team, version } => {
                write!(f, "({name} {team} (version {version}))")
            }
            Self::Move { x, y } => write!(f, "({name} {} {})", Num(*x), Num(*y)),
            Self::Turn { moment } | Self::TurnNeck { moment } => {
                write!(f, "({name} {})", Num(*moment))
            }
            Self::Dash { power } => write!(f, "({name} {})", Num(*power)),
            Self::Kick { power, direction } => {
                write!(f, "({name} {} {})", Num(*power), Num(*direction))
            }
            Self::Say { text } => write!(f, "({name} {text})"),
            Self::ChangeView { width, quality } => {
                write!(f, "({name} {width} {quality})")
            }
            Self::Catch { direction } => write!(f, "({name} {})", Num(*direction)),
            Self::SenseBody | Self::Bye => write!(f, "({name})"),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
