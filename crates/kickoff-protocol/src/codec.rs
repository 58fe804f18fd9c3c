//! Decoding server messages and encoding commands.
//!
//! Decoding is a two-step dispatch. [`decode_message_kind`] reads the
//! leading token and looks it up in `MESSAGE_TABLE`; the table entry
//! names the decoder for that kind. Supporting a new message kind means
//! adding a row and a decoder, without touching the existing ones.
//!
//! All functions here are pure: text in, typed value out.

use kickoff_transport::Datagram;

use crate::sexp::{self, SExpr};
use crate::types::{
    AuditoryEvent, BodyEvent, GameInit, Inbound, MessageKind, ObjectKind, OutboundCommand,
    SeenObject, Sender, SensorEvent, Side, Speed, Stamina, ViewMode, VisualEvent,
};
use crate::ParseError;

type Decoder = fn(MessageKind, &str) -> Result<Inbound, ParseError>;

/// Leading token → kind → decoder.
const MESSAGE_TABLE: &[(&str, MessageKind, Decoder)] = &[
    ("see", MessageKind::See, see),
    ("hear", MessageKind::Hear, hear),
    ("sense_body", MessageKind::SenseBody, sense_body),
    ("init", MessageKind::Init, init),
    ("error", MessageKind::Error, server_error),
    ("warning", MessageKind::Warning, server_warning),
    ("ok", MessageKind::Ok, ignored),
    ("score", MessageKind::Score, ignored),
    ("server_param", MessageKind::ServerParam, ignored),
    ("player_param", MessageKind::PlayerParam, ignored),
    ("player_type", MessageKind::PlayerType, ignored),
    ("change_player_type", MessageKind::ChangePlayerType, ignored),
];

fn see(_: MessageKind, raw: &str) -> Result<Inbound, ParseError> {
    decode_visual(raw).map(|event| Inbound::Sensor(SensorEvent::Visual(event)))
}

fn hear(_: MessageKind, raw: &str) -> Result<Inbound, ParseError> {
    decode_hear(raw).map(|event| Inbound::Sensor(SensorEvent::Auditory(event)))
}

fn sense_body(_: MessageKind, raw: &str) -> Result<Inbound, ParseError> {
    decode_body(raw).map(|event| Inbound::Sensor(SensorEvent::Body(event)))
}

fn init(_: MessageKind, raw: &str) -> Result<Inbound, ParseError> {
    decode_init(raw).map(Inbound::Init)
}

fn server_error(_: MessageKind, raw: &str) -> Result<Inbound, ParseError> {
    Ok(Inbound::ServerError(envelope_text(raw, "error")))
}

fn server_warning(_: MessageKind, raw: &str) -> Result<Inbound, ParseError> {
    Ok(Inbound::ServerWarning(envelope_text(raw, "warning")))
}

fn ignored(kind: MessageKind, _: &str) -> Result<Inbound, ParseError> {
    Ok(Inbound::Ignored(kind))
}

/// How much of an offending message is quoted in a [`ParseError`].
const SNIPPET_LEN: usize = 96;

fn snippet(raw: &str) -> String {
    let raw = raw.trim();
    match raw.char_indices().nth(SNIPPET_LEN) {
        Some((cut, _)) => format!("{}...", &raw[..cut]),
        None => raw.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The `<word>` of a `(<word> ...)` envelope.
fn leading_token(raw: &str) -> Option<&str> {
    let rest = raw.trim_start().strip_prefix('(')?;
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (token, after) = rest.split_at(end);
    let terminated = after
        .chars()
        .next()
        .is_some_and(|c| c.is_whitespace() || c == ')');
    (!token.is_empty() && terminated).then_some(token)
}

fn lookup(raw: &str) -> Result<&'static (&'static str, MessageKind, Decoder), ParseError> {
    let token =
        leading_token(raw).ok_or_else(|| ParseError::UnrecognizedFormat(snippet(raw)))?;
    MESSAGE_TABLE
        .iter()
        .find(|(name, _, _)| *name == token)
        .ok_or_else(|| ParseError::UnrecognizedFormat(snippet(raw)))
}

/// Classifies a message by its leading token.
///
/// # Errors
/// [`ParseError::UnrecognizedFormat`] if `raw` is not a `(<word> ...)`
/// envelope or `<word>` is not a known message kind.
pub fn decode_message_kind(raw: &str) -> Result<MessageKind, ParseError> {
    lookup(raw).map(|(_, kind, _)| *kind)
}

/// Classifies and fully decodes a message.
pub fn decode(raw: &str) -> Result<Inbound, ParseError> {
    let (_, kind, decoder) = lookup(raw)?;
    decoder(*kind, raw)
}

/// The text between the leading token and the parenthesis balancing the
/// opening one, or `None` if the envelope is not `(<token> ...)`.
fn envelope_body<'a>(raw: &'a str, token: &str) -> Option<&'a str> {
    let raw = raw.trim_start();
    let close = sexp::closing_paren(raw)?;
    let body = raw[..close].strip_prefix('(')?.strip_prefix(token)?;
    body.starts_with(char::is_whitespace).then_some(body)
}

fn envelope_text(raw: &str, token: &str) -> String {
    envelope_body(raw, token)
        .map(|body| body.trim().to_string())
        .unwrap_or_else(|| snippet(raw))
}

/// Splits off the first whitespace-delimited token.
fn split_token(text: &str) -> Option<(&str, &str)> {
    let text = text.trim_start();
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    let (token, rest) = text.split_at(end);
    (!token.is_empty()).then_some((token, rest))
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

/// Decodes `(init <side> <number> <play-mode>)`.
///
/// `side` must be `l` or `r`, `number` one or two digits (not range
/// checked), `play-mode` a non-empty word of letters, digits and `_`.
/// Bytes after the closing parenthesis are ignored.
///
/// # Errors
/// [`ParseError::MalformedInit`] on any deviation, including a missing `)`.
pub fn decode_init(raw: &str) -> Result<GameInit, ParseError> {
    let malformed = || ParseError::MalformedInit(snippet(raw));

    let rest = raw.trim_start().strip_prefix("(init").ok_or_else(malformed)?;
    let close = rest.find(')').ok_or_else(malformed)?;
    let fields = &rest[..close];
    if !fields.starts_with(char::is_whitespace) {
        return Err(malformed());
    }

    let [side, number, play_mode]: [&str; 3] = fields
        .split_whitespace()
        .collect::<Vec<_>>()
        .try_into()
        .map_err(|_| malformed())?;

    let side = Side::from_wire(side).ok_or_else(malformed)?;
    if !(1..=2).contains(&number.len()) || !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let number = number.parse().map_err(|_| malformed())?;
    if !play_mode
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_')
    {
        return Err(malformed());
    }

    Ok(GameInit {
        side,
        number,
        play_mode: play_mode.to_string(),
    })
}

// ---------------------------------------------------------------------------
// hear
// ---------------------------------------------------------------------------

/// Decodes `(hear <time> <sender> <text>)`.
///
/// `<text>` is everything up to the parenthesis that closes the message,
/// so it may contain balanced parentheses of its own.
///
/// # Errors
/// [`ParseError::MalformedHear`] for a non-numeric time, an unknown sender,
/// empty text, or unbalanced parentheses.
pub fn decode_hear(raw: &str) -> Result<AuditoryEvent, ParseError> {
    let malformed = || ParseError::MalformedHear(snippet(raw));

    let body = envelope_body(raw, "hear").ok_or_else(malformed)?;
    let (time, rest) = split_token(body).ok_or_else(malformed)?;
    let (sender, text) = split_token(rest).ok_or_else(malformed)?;

    let time = time.parse().map_err(|_| malformed())?;
    let sender = Sender::from_wire(sender).ok_or_else(malformed)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(malformed());
    }

    Ok(AuditoryEvent {
        time,
        sender,
        text: text.to_string(),
    })
}

// ---------------------------------------------------------------------------
// see
// ---------------------------------------------------------------------------

/// Reads `(<token> <time> <items>...)` into the time and the items.
fn timed_message<'a>(expr: &'a SExpr, token: &str) -> Result<(u32, &'a [SExpr]), String> {
    let items = expr.as_list().ok_or("expected a list")?;
    match items {
        [head, time, rest @ ..] if head.as_atom() == Some(token) => {
            let time = time.as_u32().ok_or_else(|| format!("bad time `{time}`"))?;
            Ok((time, rest))
        }
        _ => Err(format!("expected `({token} <time> ...)`")),
    }
}

/// Decodes `(see <time> (<name> <values>...)...)`.
///
/// Each object carries 1 to 6 numbers, depending on distance: direction;
/// distance and direction; plus distance/direction change; plus body and
/// head facing directions (players only). Extra trailing values sent by
/// newer protocol versions are ignored.
///
/// # Errors
/// [`ParseError::MalformedVisual`] if the structure does not match.
pub fn decode_visual(raw: &str) -> Result<VisualEvent, ParseError> {
    let malformed = |reason: String| ParseError::MalformedVisual(format!("{reason}: {}", snippet(raw)));

    let expr = sexp::parse(raw).map_err(malformed)?;
    let (time, items) = timed_message(&expr, "see").map_err(malformed)?;
    let objects = items
        .iter()
        .map(seen_object)
        .collect::<Result<Vec<_>, _>>()
        .map_err(malformed)?;

    Ok(VisualEvent { time, objects })
}

fn seen_object(item: &SExpr) -> Result<SeenObject, String> {
    let [name, values @ ..] = item.as_list().ok_or_else(|| format!("`{item}` is not an object"))? else {
        return Err("empty object".to_string());
    };
    let name = name
        .as_list()
        .ok_or_else(|| format!("object name `{name}` is not a list"))?;
    let (kind, in_view) = object_kind(name)?;

    let numbers: Vec<f64> = values.iter().map_while(SExpr::as_f64).collect();
    let at = |i: usize| numbers.get(i).copied();
    let (distance, direction) = match numbers.len() {
        0 => return Err(format!("object `{item}` has no values")),
        1 => (None, at(0)),
        _ => (at(0), at(1)),
    };

    // Change and facing values only come in pairs.
    let pair = |i: usize| match (at(i), at(i + 1)) {
        (Some(a), Some(b)) => (Some(a), Some(b)),
        _ => (None, None),
    };
    let (dist_change, dir_change) = pair(2);
    let (body_facing_dir, head_facing_dir) = pair(4);

    Ok(SeenObject {
        kind,
        in_view,
        distance,
        direction,
        dist_change,
        dir_change,
        body_facing_dir,
        head_facing_dir,
    })
}

fn object_kind(name: &[SExpr]) -> Result<(ObjectKind, bool), String> {
    let atoms: Vec<&str> = name.iter().filter_map(SExpr::as_atom).collect();
    let Some((&head, rest)) = atoms.split_first() else {
        return Err("empty object name".to_string());
    };
    let in_view = head.chars().all(|c| c.is_ascii_lowercase());
    let joined = || rest.join(" ");

    let kind = match head.to_ascii_lowercase().as_str() {
        "b" => ObjectKind::Ball,
        "p" => ObjectKind::Player {
            team: rest.first().map(|team| team.to_string()),
            number: rest.get(1).and_then(|n| n.parse().ok()),
            goalie: rest.get(2) == Some(&"goalie"),
        },
        "g" => ObjectKind::Goal {
            side: rest.first().and_then(|s| Side::from_wire(s)),
        },
        "f" => ObjectKind::Flag { name: joined() },
        "l" => ObjectKind::Line { name: joined() },
        _ => ObjectKind::Unknown {
            name: atoms.join(" "),
        },
    };
    Ok((kind, in_view))
}

// ---------------------------------------------------------------------------
// sense_body
// ---------------------------------------------------------------------------

/// Decodes `(sense_body <time> (<field> <values>...)...)`.
///
/// Recognized fields: `view_mode`, `stamina`, `speed`, `head_angle`; any
/// other field with a single integer value is a command counter. Fields
/// this client does not understand (arm, focus, tackle, ...) are skipped.
///
/// # Errors
/// [`ParseError::MalformedBody`] if the structure or a recognized field
/// does not match.
pub fn decode_body(raw: &str) -> Result<BodyEvent, ParseError> {
    let malformed = |reason: String| ParseError::MalformedBody(format!("{reason}: {}", snippet(raw)));

    let expr = sexp::parse(raw).map_err(malformed)?;
    let (time, items) = timed_message(&expr, "sense_body").map_err(malformed)?;

    let mut event = BodyEvent {
        time,
        ..BodyEvent::default()
    };
    for item in items {
        body_field(&mut event, item).map_err(malformed)?;
    }
    Ok(event)
}

fn body_field(event: &mut BodyEvent, item: &SExpr) -> Result<(), String> {
    let bad = || format!("bad field `{item}`");
    let [name, values @ ..] = item.as_list().ok_or_else(bad)? else {
        return Err(bad());
    };
    let name = name.as_atom().ok_or_else(bad)?;
    let number = |i: usize| values.get(i).and_then(SExpr::as_f64).ok_or_else(bad);

    match name {
        "view_mode" => {
            let word = |i: usize| values.get(i).and_then(SExpr::as_atom).ok_or_else(bad);
            event.view_mode = Some(ViewMode {
                quality: word(0)?.parse()?,
                width: word(1)?.parse()?,
            });
        }
        "stamina" => {
            event.stamina = Some(Stamina {
                stamina: number(0)?,
                effort: number(1)?,
            });
        }
        "speed" => {
            event.speed = Some(Speed {
                amount: number(0)?,
                direction: number(1).ok(),
            });
        }
        "head_angle" => event.head_angle = Some(number(0)?),
        _ => {
            if let [count] = values {
                if let Some(count) = count.as_u32() {
                    event.counters.insert(name.to_string(), count);
                }
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Encodes a command into a full-size, NUL-padded datagram.
pub fn encode(command: &OutboundCommand) -> Datagram {
    Datagram::from_text(&command.to_string())
}

/// Parses command text back into an [`OutboundCommand`].
///
/// The client never receives commands; this exists for tools and test
/// servers that need to read what a client sent.
///
/// # Errors
/// [`ParseError::UnrecognizedFormat`] if the text is not a known command.
pub fn decode_command(raw: &str) -> Result<OutboundCommand, ParseError> {
    let unrecognized = || ParseError::UnrecognizedFormat(snippet(raw));

    let expr = sexp::parse(raw).map_err(|_| unrecognized())?;
    let items = expr.as_list().ok_or_else(unrecognized)?;
    let (head, args) = items.split_first().ok_or_else(unrecognized)?;
    let num = |i: usize| args.get(i).and_then(SExpr::as_f64).ok_or_else(unrecognized);
    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(unrecognized())
        }
    };

    let command = match head.as_atom().ok_or_else(unrecognized)? {
        "init" => {
            arity(2)?;
            let team = args[0].as_atom().ok_or_else(unrecognized)?.to_string();
            let version = match args[1].as_list() {
                Some([tag, version]) if tag.as_atom() == Some("version") => {
                    version.as_u32().ok_or_else(unrecognized)?
                }
                _ => return Err(unrecognized()),
            };
            OutboundCommand::Init { team, version }
        }
        "move" => {
            arity(2)?;
            OutboundCommand::Move {
                x: num(0)?,
                y: num(1)?,
            }
        }
        "turn" => {
            arity(1)?;
            OutboundCommand::Turn { moment: num(0)? }
        }
        "turn_neck" => {
            arity(1)?;
            OutboundCommand::TurnNeck { moment: num(0)? }
        }
        "dash" => {
            arity(1)?;
            OutboundCommand::Dash { power: num(0)? }
        }
        "kick" => {
            arity(2)?;
            OutboundCommand::Kick {
                power: num(0)?,
                direction: num(1)?,
            }
        }
        "say" => OutboundCommand::Say {
            text: envelope_body(raw, "say")
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .ok_or_else(unrecognized)?
                .to_string(),
        },
        "change_view" => {
            arity(2)?;
            let word = |i: usize| args[i].as_atom().ok_or_else(unrecognized);
            OutboundCommand::ChangeView {
                width: word(0)?.parse().map_err(|_| unrecognized())?,
                quality: word(1)?.parse().map_err(|_| unrecognized())?,
            }
        }
        "catch" => {
            arity(1)?;
            OutboundCommand::Catch { direction: num(0)? }
        }
        "sense_body" => {
            arity(0)?;
            OutboundCommand::SenseBody
        }
        "bye" => {
            arity(0)?;
            OutboundCommand::Bye
        }
        _ => return Err(unrecognized()),
    };
    Ok(command)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ViewQuality, ViewWidth};

    // =====================================================================
    // decode_message_kind()
    // =====================================================================

    #[test]
    fn test_decode_message_kind_known_tokens() {
        assert_eq!(decode_message_kind("(see 0)"), Ok(MessageKind::See));
        assert_eq!(
            decode_message_kind("(hear 1 self x)"),
            Ok(MessageKind::Hear)
        );
        assert_eq!(
            decode_message_kind("(sense_body 0 (stamina 1 1))"),
            Ok(MessageKind::SenseBody)
        );
        assert_eq!(
            decode_message_kind("(init l 1 play_on)"),
            Ok(MessageKind::Init)
        );
        assert_eq!(
            decode_message_kind("(server_param (goal_width 14.02))"),
            Ok(MessageKind::ServerParam)
        );
    }

    #[test]
    fn test_decode_message_kind_unknown_token_is_unrecognized() {
        assert!(matches!(
            decode_message_kind("(foobar 1 2)"),
            Err(ParseError::UnrecognizedFormat(_))
        ));
    }

    #[test]
    fn test_decode_message_kind_rejects_non_envelopes() {
        for raw in ["", "see 1 2", "()", "( see 1)", "(see-1 2)", "(see"] {
            assert!(
                matches!(
                    decode_message_kind(raw),
                    Err(ParseError::UnrecognizedFormat(_))
                ),
                "{raw:?}"
            );
        }
    }

    // =====================================================================
    // decode_init()
    // =====================================================================

    #[test]
    fn test_decode_init_fields() {
        let init = decode_init("(init r 11 before_kick_off)").unwrap();
        assert_eq!(init.side, Side::Right);
        assert_eq!(init.number, 11);
        assert_eq!(init.play_mode, "before_kick_off");
    }

    #[test]
    fn test_decode_init_round_trips_all_sides_and_numbers() {
        for side in ["l", "r"] {
            for number in ["1", "7", "09", "99"] {
                let raw = format!("(init {side} {number} play_on)");
                let init = decode_init(&raw).unwrap();
                assert_eq!(init.side.to_string(), side);
                assert_eq!(init.number, number.parse::<u8>().unwrap());
                assert_eq!(init.play_mode, "play_on");
            }
        }
    }

    #[test]
    fn test_decode_init_missing_close_paren_is_malformed() {
        assert!(matches!(
            decode_init("(init l 1 before_kick_off"),
            Err(ParseError::MalformedInit(_))
        ));
    }

    #[test]
    fn test_decode_init_ignores_trailing_bytes() {
        let init = decode_init("(init l 2 play_on)\n junk").unwrap();
        assert_eq!(init.number, 2);
    }

    #[test]
    fn test_decode_init_does_not_range_check_number() {
        let init = decode_init("(init l 0 play_on)").unwrap();
        assert_eq!(init.number, 0);
    }

    #[test]
    fn test_decode_init_rejects_deviations() {
        for raw in [
            "(init l 1)",
            "(init l 1 play_on extra)",
            "(init x 1 play_on)",
            "(init l 100 play_on)",
            "(init l one play_on)",
            "(init l 1 play-on)",
            "(initl 1 play_on)",
            "(hear 1 self x)",
        ] {
            assert!(
                matches!(decode_init(raw), Err(ParseError::MalformedInit(_))),
                "{raw}"
            );
        }
    }

    // =====================================================================
    // decode_hear()
    // =====================================================================

    #[test]
    fn test_decode_hear_self() {
        let event = decode_hear("(hear 150 self I_am_open)").unwrap();
        assert_eq!(
            event,
            AuditoryEvent {
                time: 150,
                sender: Sender::Myself,
                text: "I_am_open".into(),
            }
        );
    }

    #[test]
    fn test_decode_hear_referee() {
        let event = decode_hear("(hear 12 referee kick_off_l)").unwrap();
        assert_eq!(event.time, 12);
        assert_eq!(event.sender, Sender::Referee);
        assert_eq!(event.text, "kick_off_l");
    }

    #[test]
    fn test_decode_hear_other_player() {
        let event = decode_hear("(hear 30 r9 pass)").unwrap();
        assert_eq!(
            event.sender,
            Sender::OtherPlayer {
                side: Side::Right,
                number: 9
            }
        );
    }

    #[test]
    fn test_decode_hear_keeps_nested_parentheses() {
        let event = decode_hear("(hear 3 l4 (pos 10 (x y)) go)").unwrap();
        assert_eq!(event.text, "(pos 10 (x y)) go");
    }

    #[test]
    fn test_decode_hear_stops_at_balancing_paren() {
        let event = decode_hear("(hear 3 self hi) (hear 4 self there)").unwrap();
        assert_eq!(event.text, "hi");
    }

    #[test]
    fn test_decode_hear_coach_without_side() {
        let event = decode_hear("(hear 50 coach (formation 433))").unwrap();
        assert_eq!(event.sender, Sender::Coach { side: None });
        assert_eq!(event.text, "(formation 433)");
    }

    #[test]
    fn test_decode_hear_lone_quote_inside_word_is_text() {
        let event = decode_hear(r#"(hear 10 l7 it"s ok)"#).unwrap();
        assert_eq!(event.text, r#"it"s ok"#);
    }

    #[test]
    fn test_decode_hear_rejects_malformed() {
        for raw in [
            "(hear abc self hi)",
            "(hear 1 nobody hi)",
            "(hear 1 self)",
            "(hear 1 self   )",
            "(hear 1 self (open",
            "(hear)",
        ] {
            assert!(
                matches!(decode_hear(raw), Err(ParseError::MalformedHear(_))),
                "{raw}"
            );
        }
    }

    // =====================================================================
    // decode_visual()
    // =====================================================================

    #[test]
    fn test_decode_visual_objects() {
        let raw = r#"(see 42 ((f r t) 55.7 3) ((g r) 42.5 0) ((b) 10 -5 0.5 1) ((p "Krislet" 7 goalie) 20 10 0 0 45 -30) ((l r) -90) ((B) 1.5 170))"#;
        let event = decode_visual(raw).unwrap();
        assert_eq!(event.time, 42);
        assert_eq!(event.objects.len(), 6);

        let flag = &event.objects[0];
        assert_eq!(flag.kind, ObjectKind::Flag { name: "r t".into() });
        assert_eq!(flag.distance, Some(55.7));
        assert_eq!(flag.direction, Some(3.0));
        assert_eq!(flag.dist_change, None);

        assert_eq!(
            event.objects[1].kind,
            ObjectKind::Goal {
                side: Some(Side::Right)
            }
        );

        let ball = &event.objects[2];
        assert_eq!(ball.kind, ObjectKind::Ball);
        assert_eq!(ball.dist_change, Some(0.5));
        assert_eq!(ball.dir_change, Some(1.0));
        assert_eq!(ball.body_facing_dir, None);

        let player = &event.objects[3];
        assert_eq!(
            player.kind,
            ObjectKind::Player {
                team: Some("Krislet".into()),
                number: Some(7),
                goalie: true,
            }
        );
        assert_eq!(player.body_facing_dir, Some(45.0));
        assert_eq!(player.head_facing_dir, Some(-30.0));

        let line = &event.objects[4];
        assert_eq!(line.kind, ObjectKind::Line { name: "r".into() });
        assert_eq!(line.distance, None);
        assert_eq!(line.direction, Some(-90.0));

        let behind = &event.objects[5];
        assert_eq!(behind.kind, ObjectKind::Ball);
        assert!(!behind.in_view);
        assert!(event.ball().is_some_and(|b| b.distance == Some(10.0)));
    }

    #[test]
    fn test_decode_visual_empty_report() {
        let event = decode_visual("(see 0)").unwrap();
        assert!(event.objects.is_empty());
    }

    #[test]
    fn test_decode_visual_rejects_malformed() {
        for raw in [
            "(see x ((b) 1 2))",
            "(see 1 ((b) 1 2)",
            "(see 1 (b 1 2))",
            "(see 1 ((b)))",
            "(hear 1 ((b) 1 2))",
        ] {
            assert!(
                matches!(decode_visual(raw), Err(ParseError::MalformedVisual(_))),
                "{raw}"
            );
        }
    }

    // =====================================================================
    // decode_body()
    // =====================================================================

    #[test]
    fn test_decode_body_fields() {
        let raw = "(sense_body 88 (view_mode high normal) (stamina 3500.5 1) (speed 0.3 -12) (head_angle 20) (kick 3) (dash 40) (turn 7) (arm (movable 0) (expires 0)))";
        let event = decode_body(raw).unwrap();
        assert_eq!(event.time, 88);
        assert_eq!(
            event.view_mode,
            Some(ViewMode {
                quality: ViewQuality::High,
                width: ViewWidth::Normal,
            })
        );
        assert_eq!(
            event.stamina,
            Some(Stamina {
                stamina: 3500.5,
                effort: 1.0,
            })
        );
        assert_eq!(event.speed.map(|s| s.direction), Some(Some(-12.0)));
        assert_eq!(event.head_angle, Some(20.0));
        assert_eq!(event.counters.get("dash"), Some(&40));
        assert_eq!(event.counters.len(), 3);
    }

    #[test]
    fn test_decode_body_rejects_bad_view_mode() {
        assert!(matches!(
            decode_body("(sense_body 1 (view_mode ultra normal))"),
            Err(ParseError::MalformedBody(_))
        ));
    }

    // =====================================================================
    // decode()
    // =====================================================================

    #[test]
    fn test_decode_routes_by_kind() {
        assert!(matches!(
            decode("(hear 1 referee play_on)"),
            Ok(Inbound::Sensor(SensorEvent::Auditory(_)))
        ));
        assert!(matches!(
            decode("(see 1 ((b) 1 2))"),
            Ok(Inbound::Sensor(SensorEvent::Visual(_)))
        ));
        assert!(matches!(
            decode("(sense_body 1 (kick 0))"),
            Ok(Inbound::Sensor(SensorEvent::Body(_)))
        ));
        assert!(matches!(decode("(init l 1 play_on)"), Ok(Inbound::Init(_))));
        assert_eq!(
            decode("(player_type (id 0))"),
            Ok(Inbound::Ignored(MessageKind::PlayerType))
        );
    }

    #[test]
    fn test_decode_server_error_carries_reason() {
        assert_eq!(
            decode("(error no_more_team_or_player_or_goalie)"),
            Ok(Inbound::ServerError(
                "no_more_team_or_player_or_goalie".into()
            ))
        );
    }

    #[test]
    fn test_decode_server_warning_carries_reason() {
        assert_eq!(
            decode("(warning no_such_team_or_already_have_coach)"),
            Ok(Inbound::ServerWarning(
                "no_such_team_or_already_have_coach".into()
            ))
        );
    }

    #[test]
    fn test_decode_propagates_kind_specific_errors() {
        assert!(matches!(
            decode("(hear x self hi)"),
            Err(ParseError::MalformedHear(_))
        ));
    }

    #[test]
    fn test_snippet_truncates_long_text() {
        let long = format!("(see 1 {})", "((b) 1 2) ".repeat(50));
        assert!(snippet(&long).len() <= SNIPPET_LEN + 3);
        assert!(snippet(&long).ends_with("..."));
    }

    // =====================================================================
    // encode() / decode_command()
    // =====================================================================

    #[test]
    fn test_encode_kick_exact_text() {
        let datagram = encode(&OutboundCommand::Kick {
            power: 100.0,
            direction: 45.0,
        });
        assert_eq!(datagram.payload(), b"(kick 100.0 45.0)");
        assert_eq!(
            datagram.as_bytes().len(),
            kickoff_transport::DATAGRAM_CAPACITY
        );
    }

    #[test]
    fn test_numeric_commands_round_trip() {
        let commands = [
            OutboundCommand::Move {
                x: -52.5,
                y: 33.999999,
            },
            OutboundCommand::Turn { moment: 1e-7 },
            OutboundCommand::TurnNeck { moment: -180.0 },
            OutboundCommand::Dash { power: 0.1 + 0.2 },
            OutboundCommand::Kick {
                power: 100.0,
                direction: -45.25,
            },
            OutboundCommand::Catch { direction: 1e16 },
        ];
        for command in commands {
            let decoded = decode_command(&encode(&command).text()).unwrap();
            assert_eq!(decoded, command);
        }
    }

    #[test]
    fn test_non_numeric_commands_round_trip() {
        let commands = [
            OutboundCommand::Init {
                team: "Krislet".into(),
                version: 9,
            },
            OutboundCommand::Say {
                text: "(meet at (10 20))".into(),
            },
            OutboundCommand::ChangeView {
                width: ViewWidth::Narrow,
                quality: ViewQuality::High,
            },
            OutboundCommand::SenseBody,
            OutboundCommand::Bye,
        ];
        for command in commands {
            let decoded = decode_command(&command.to_string()).unwrap();
            assert_eq!(decoded, command);
        }
    }

    #[test]
    fn test_decode_command_rejects_wrong_arity() {
        assert!(decode_command("(kick 100.0)").is_err());
        assert!(decode_command("(bye now)").is_err());
        assert!(decode_command("(fly 1.0)").is_err());
    }
}
