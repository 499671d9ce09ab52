//! Demo session driver
//!
//! Wires a small scene: a clock service node, a scoreboard, and a wave of
//! grunts under a director group, then drives it through the full stage
//! sequence while an observer narrates the notifications.
//!
//! Run with `RUST_LOG=info cargo run -p session_app` to see the narration.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::rc::Rc;

use game_elements::prelude::*;

/// Capability exposed by the clock service node.
trait TimeSource {
    /// Seconds since the session epoch.
    fn elapsed(&self) -> u64;
}

/// Fixed-step clock registered as a service node.
struct MatchClock {
    ticks: u64,
}

impl TimeSource for MatchClock {
    fn elapsed(&self) -> u64 {
        self.ticks
    }
}

impl Castable for MatchClock {
    fn cast(cell: &SharedCell<Self>, target: TypeId) -> Option<Box<dyn Any>> {
        if target == TypeId::of::<dyn TimeSource>() {
            let view: Rc<RefCell<dyn TimeSource>> = cell.clone();
            return Some(Box::new(view));
        }
        None
    }
}

impl Node for MatchClock {}

/// Tracks points; resets when the session starts.
struct Scoreboard {
    lifecycle: Lifecycle,
    points: u32,
}

impl Scoreboard {
    fn new() -> SharedCell<Self> {
        Rc::new(RefCell::new(Self {
            lifecycle: Lifecycle::new(),
            points: 0,
        }))
    }
}

impl Castable for Scoreboard {}

impl Element for Scoreboard {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_start(&mut self, sender: Sender) {
        log::info!("scoreboard reset by {sender}");
        self.points = 0;
    }

    fn on_finish(&mut self, _sender: Sender) {
        log::info!("final score: {}", self.points);
    }
}

/// One enemy in the wave. Checks in with the clock service when it spawns.
struct Grunt {
    lifecycle: Lifecycle,
    id: u8,
}

impl Grunt {
    fn new(id: u8) -> SharedCell<Self> {
        Rc::new(RefCell::new(Self {
            lifecycle: Lifecycle::new(),
            id,
        }))
    }
}

impl Castable for Grunt {}

impl Element for Grunt {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    fn on_start(&mut self, _sender: Sender) {
        let spawned_at = self
            .lifecycle
            .system()
            .and_then(|system| system.try_node::<dyn TimeSource>())
            .map_or(0, |clock| clock.borrow().elapsed());
        log::info!("grunt {} entered at t={spawned_at}", self.id);
    }

    fn on_destroy(&mut self, _sender: Sender) {
        log::debug!("grunt {} released", self.id);
    }
}

/// Director behavior composed onto the wave group.
struct WaveDirector;

impl GroupHooks for WaveDirector {
    fn on_prepare(&mut self, _sender: Sender) {
        log::info!("wave director staging the first wave");
    }

    fn on_destroy(&mut self, _sender: Sender) {
        log::info!("wave director shutting down");
    }
}

/// Pretend asset step run during prepare.
struct ManifestLoad;

impl SceneLoader for ManifestLoad {
    fn load(&mut self, sender: Sender, _system: &GameSystem) -> Result<(), SceneError> {
        log::info!("loading asset manifest (requested by {sender})");
        Ok(())
    }
}

fn load_config() -> ContextConfig {
    match ContextConfig::load_from_file("session.toml") {
        Ok(config) => config,
        Err(err) => {
            log::warn!("falling back to default config: {err}");
            ContextConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    game_elements::foundation::logging::init();

    let config = load_config();
    let mut context = SceneContext::new(config);

    context.observe(
        EventMask::ALL,
        Box::new(|event: &GameEvent| {
            log::info!("session event: {event:?}");
        }),
    );

    context.register_node(Rc::new(RefCell::new(MatchClock { ticks: 128 })))?;
    context.system().register_loader(Box::new(ManifestLoad));

    let scoreboard = Scoreboard::new();
    context.add_element(Rc::clone(&scoreboard));

    let wave = ElementGroup::with_hooks(WaveDirector);
    {
        let mut director = wave.borrow_mut();
        for id in 0..3 {
            director.add_element(Grunt::new(id));
        }
    }
    context.add_element(Rc::clone(&wave));

    context.prepare(Sender::Driver)?;
    context.ready(Sender::Driver);
    context.start(Sender::Driver);

    // Score a few points mid-session.
    scoreboard.borrow_mut().points += 42;

    context.pause(Sender::Named("menu"));
    context.resume(Sender::Named("menu"));

    // A straggler joining mid-play catches up on its own.
    let late_grunt = Grunt::new(9);
    let handle: ElementRc = late_grunt.clone();
    wave.borrow_mut().add_element(late_grunt);
    log::info!(
        "late grunt joined at stage `{}`",
        handle.borrow().stage()
    );

    context.finish(Sender::Driver);
    context.destroy(Sender::Driver);

    Ok(())
}
