#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure control system that translates sampled input frames into player
//! commands and follow-camera scroll advancement.

use gridfire_core::{Command, Event, InputFrame, PlayerView, Posture, ScrollOffset, Thrust};

/// Distance in world units between the view top and the line the player may
/// not push past without dragging the view along.
const DEFAULT_FOLLOW_MARGIN: f32 = 80.0;

/// Configuration parameters required to construct the control system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    follow_margin: f32,
}

impl Config {
    /// Creates a new configuration using the provided follow margin.
    #[must_use]
    pub const fn new(follow_margin: f32) -> Self {
        Self { follow_margin }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            follow_margin: DEFAULT_FOLLOW_MARGIN,
        }
    }
}

/// Control system that feeds sampled input into the world each frame.
///
/// Steering, aim, and posture commands are emitted only on change; the world
/// keeps the last applied value until told otherwise. The trigger is forwarded
/// every frame it is held, leaving rate limiting to the world's fire
/// cooldown. Scroll advancement follows the player: whenever a tick leaves
/// the player above the follow margin, the view is pulled up level with it.
#[derive(Debug)]
pub struct Control {
    follow_margin: f32,
    held: InputFrame,
}

impl Control {
    /// Creates a new control system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            follow_margin: config.follow_margin,
            held: InputFrame::default(),
        }
    }

    /// Consumes world events and the frame's input sample to emit commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        frame: InputFrame,
        player: &PlayerView,
        scroll: ScrollOffset,
        out: &mut Vec<Command>,
    ) {
        if frame.horizontal != self.held.horizontal || frame.vertical != self.held.vertical {
            out.push(Command::SteerPlayer {
                x: frame.horizontal,
                y: frame.vertical,
            });
        }

        if frame.aim != self.held.aim {
            out.push(Command::SetPlayerAiming { aiming: frame.aim });
        }

        if frame.crouch != self.held.crouch {
            out.push(Command::SetPlayerPosture {
                posture: posture_for(frame.crouch),
            });
        }

        if frame.trigger {
            out.push(Command::TriggerPlayerFire);
        }

        self.held = frame;

        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        let overshoot = scroll.get() + self.follow_margin - player.position.y();
        if overshoot > 0.0 {
            out.push(Command::AdvanceScroll {
                distance: overshoot,
            });
        }
    }
}

const fn posture_for(crouch: bool) -> Posture {
    if crouch {
        Posture::Crouching
    } else {
        Posture::Standing
    }
}

/// Neutral frame used when no input device reported this frame.
#[must_use]
pub fn released_frame() -> InputFrame {
    InputFrame {
        horizontal: Thrust::Neutral,
        vertical: Thrust::Neutral,
        aim: false,
        crouch: false,
        trigger: false,
    }
}
