use std::time::Duration;

use clap::Parser;
use kickoff::prelude::*;
use rand::Rng;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// One simulation step.
const CYCLE: Duration = Duration::from_millis(100);

/// Field half-length and half-width, in metres.
const HALF_LENGTH: f64 = 52.5;
const HALF_WIDTH: f64 = 34.0;

/// Closer than this the ball is kickable.
const KICKABLE_DISTANCE: f64 = 1.0;

#[derive(Parser, Debug)]
#[command(about = "A reactive player: find the ball, run to it, kick it at the goal")]
struct Opts {
    /// Simulator host.
    #[arg(long, default_value = "localhost")]
    host: String,
    #[arg(long, default_value_t = 6000)]
    port: u16,
    #[arg(long, default_value = "Krislet")]
    team: String,
    /// Give up if the server doesn't answer the handshake in this many seconds.
    #[arg(long)]
    handshake_timeout: Option<u64>,
    /// Print every sensor event as a JSON line on stdout.
    #[arg(long)]
    json: bool,
}

// ---------------------------------------------------------------------------
// Decision logic
// ---------------------------------------------------------------------------

/// Picks a kick-off position in our own half. Move coordinates are always
/// relative to the player's own side, so own half is negative x.
fn random_start(rng: &mut impl Rng) -> (f64, f64) {
    (
        -rng.random_range(0.0..HALF_LENGTH),
        rng.random_range(-HALF_WIDTH..HALF_WIDTH),
    )
}

/// What to do given one visual report.
fn decide(seen: &VisualEvent, side: Side) -> OutboundCommand {
    let Some(ball) = seen.ball() else {
        return OutboundCommand::Turn { moment: 40.0 };
    };
    let direction = ball.direction.unwrap_or(0.0);
    let distance = ball.distance.unwrap_or(f64::INFINITY);

    if distance > KICKABLE_DISTANCE {
        if direction.abs() > 1.0 {
            OutboundCommand::Turn { moment: direction }
        } else {
            OutboundCommand::Dash {
                power: (10.0 * distance).min(100.0),
            }
        }
    } else {
        match seen.goal(side.opposite()) {
            Some(goal) => OutboundCommand::Kick {
                power: 100.0,
                direction: goal.direction.unwrap_or(0.0),
            },
            None => OutboundCommand::Turn { moment: 40.0 },
        }
    }
}

struct Brain {
    side: Side,
    start: (f64, f64),
    /// The newest visual report not yet acted on.
    fresh: Option<VisualEvent>,
}

impl Brain {
    fn new(side: Side, start: (f64, f64)) -> Self {
        Self {
            side,
            start,
            fresh: None,
        }
    }

    /// Takes in one event. Returns a command to send right away, if any.
    fn observe(&mut self, event: SensorEvent) -> Option<OutboundCommand> {
        match event {
            SensorEvent::Visual(seen) => {
                self.fresh = Some(seen);
                None
            }
            SensorEvent::Auditory(heard)
                if heard.sender == Sender::Referee && heard.text.starts_with("goal_") =>
            {
                tracing::info!(play_mode = %heard.text, "goal scored, back to start");
                let (x, y) = self.start;
                Some(OutboundCommand::Move { x, y })
            }
            _ => None,
        }
    }

    /// Acts once per visual report; a cycle without one does nothing, so
    /// stale directions are never applied twice.
    fn act(&mut self) -> Option<OutboundCommand> {
        self.fresh.take().map(|seen| decide(&seen, self.side))
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let opts = Opts::parse();

    let mut builder = Client::builder()
        .host(opts.host.as_str())
        .port(opts.port)
        .team(opts.team.as_str());
    if let Some(secs) = opts.handshake_timeout {
        builder = builder.handshake_timeout(Duration::from_secs(secs));
    }
    let client = builder.connect().await?;
    let init = client.game_init().clone();
    let commands = client.commands();

    let start = random_start(&mut rand::rng());
    commands.move_to(start.0, start.1);
    tracing::info!(side = %init.side, number = init.number, ?start, "in position");

    let (tx, mut events) = mpsc::unbounded_channel();
    let handle = client.spawn(tx);
    let mut brain = Brain::new(init.side, start);
    let mut cycle = tokio::time::interval(CYCLE);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if opts.json {
                    println!("{}", serde_json::to_string(&event)?);
                }
                if let Some(command) = brain.observe(event) {
                    commands.send(command);
                }
            }
            _ = cycle.tick() => {
                if let Some(command) = brain.act() {
                    commands.send(command);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, leaving the game");
                commands.bye();
            }
        }
    }

    handle.join().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(kind: ObjectKind, distance: f64, direction: f64) -> SeenObject {
        SeenObject {
            kind,
            in_view: true,
            distance: Some(distance),
            direction: Some(direction),
            dist_change: None,
            dir_change: None,
            body_facing_dir: None,
            head_facing_dir: None,
        }
    }

    fn seeing(objects: Vec<SeenObject>) -> VisualEvent {
        VisualEvent { time: 1, objects }
    }

    fn goal(side: Side, direction: f64) -> SeenObject {
        object(ObjectKind::Goal { side: Some(side) }, 30.0, direction)
    }

    // =====================================================================
    // decide
    // =====================================================================

    #[test]
    fn test_decide_turns_when_ball_not_seen() {
        let seen = seeing(vec![goal(Side::Right, 0.0)]);
        assert_eq!(decide(&seen, Side::Left), OutboundCommand::Turn { moment: 40.0 });
    }

    #[test]
    fn test_decide_ignores_ball_outside_view_cone() {
        let mut ball = object(ObjectKind::Ball, 0.5, 0.0);
        ball.in_view = false;
        assert_eq!(
            decide(&seeing(vec![ball]), Side::Left),
            OutboundCommand::Turn { moment: 40.0 }
        );
    }

    #[test]
    fn test_decide_turns_towards_far_ball() {
        let seen = seeing(vec![object(ObjectKind::Ball, 12.0, -25.0)]);
        assert_eq!(decide(&seen, Side::Left), OutboundCommand::Turn { moment: -25.0 });
    }

    #[test]
    fn test_decide_dashes_at_ball_straight_ahead() {
        let seen = seeing(vec![object(ObjectKind::Ball, 4.0, 0.5)]);
        assert_eq!(decide(&seen, Side::Left), OutboundCommand::Dash { power: 40.0 });
    }

    #[test]
    fn test_decide_caps_dash_power() {
        let seen = seeing(vec![object(ObjectKind::Ball, 30.0, 0.0)]);
        assert_eq!(decide(&seen, Side::Left), OutboundCommand::Dash { power: 100.0 });
    }

    #[test]
    fn test_decide_kicks_at_opponent_goal() {
        let seen = seeing(vec![
            object(ObjectKind::Ball, 0.6, 10.0),
            goal(Side::Left, 170.0),
            goal(Side::Right, 12.0),
        ]);
        assert_eq!(
            decide(&seen, Side::Left),
            OutboundCommand::Kick {
                power: 100.0,
                direction: 12.0
            }
        );
        assert_eq!(
            decide(&seen, Side::Right),
            OutboundCommand::Kick {
                power: 100.0,
                direction: 170.0
            }
        );
    }

    #[test]
    fn test_decide_turns_with_ball_when_goal_not_visible() {
        let seen = seeing(vec![object(ObjectKind::Ball, 0.6, 10.0), goal(Side::Left, 0.0)]);
        assert_eq!(decide(&seen, Side::Left), OutboundCommand::Turn { moment: 40.0 });
    }

    // =====================================================================
    // Brain
    // =====================================================================

    #[test]
    fn test_brain_acts_once_per_visual_report() {
        let mut brain = Brain::new(Side::Left, (-10.0, 0.0));
        assert_eq!(brain.act(), None);

        assert_eq!(brain.observe(SensorEvent::Visual(seeing(Vec::new()))), None);
        assert_eq!(brain.act(), Some(OutboundCommand::Turn { moment: 40.0 }));
        assert_eq!(brain.act(), None);
    }

    #[test]
    fn test_brain_returns_to_start_after_goal() {
        let mut brain = Brain::new(Side::Right, (-20.0, 5.0));
        let heard = |sender: Sender, text: &str| {
            SensorEvent::Auditory(AuditoryEvent {
                time: 300,
                sender,
                text: text.into(),
            })
        };

        assert_eq!(
            brain.observe(heard(Sender::Referee, "goal_l_1")),
            Some(OutboundCommand::Move { x: -20.0, y: 5.0 })
        );
        assert_eq!(brain.observe(heard(Sender::Referee, "play_on")), None);
        assert_eq!(brain.observe(heard(Sender::Myself, "goal_l_1")), None);
    }

    #[test]
    fn test_random_start_is_in_own_half() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let (x, y) = random_start(&mut rng);
            assert!((-HALF_LENGTH..=0.0).contains(&x), "x = {x}");
            assert!((-HALF_WIDTH..HALF_WIDTH).contains(&y), "y = {y}");
        }
    }
}
