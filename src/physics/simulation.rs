//! The animation loop state and its control surface.
//!
//! `Simulation` owns every animated entity. Input collaborators never touch
//! it directly: they push [`Command`]s through a [`SimulationHandle`], and the
//! queue is drained at the top of each frame.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::mpsc::{self, Receiver, Sender};

use super::blink::{BlinkState, Blinker};
use super::bottle::BottleGeometry;
use super::bubbles::Bubble;
use super::droplets::Droplet;
use super::fill::FillController;
use super::hearts::Heart;
use super::waves::WaveRing;
use super::StepContext;
use crate::config::AnimationConfig;
use crate::timing::FrameTick;

/// Discrete control requests applied at the start of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Pause,
    Resume,
    Reset,
}

/// Cloneable sender side of the command queue.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    sender: Sender<Command>,
}

impl SimulationHandle {
    pub fn send(&self, command: Command) {
        // The simulation outliving its handles is the only way this fails,
        // and then there is nobody left to act on the command.
        if self.sender.send(command).is_err() {
            log::debug!("Dropped {:?}: simulation is gone", command);
        }
    }

    pub fn toggle_pause(&self) {
        self.send(Command::TogglePause);
    }

    pub fn reset(&self) {
        self.send(Command::Reset);
    }
}

/// Complete animation state.
pub struct Simulation {
    config: AnimationConfig,
    bottle: BottleGeometry,
    fill: FillController,
    bubbles: Vec<Bubble>,
    hearts: Vec<Heart>,
    droplets: Vec<Droplet>,
    waves: WaveRing,
    blinker: Blinker,
    paused: bool,
    time: f32,
    rng: StdRng,
    commands: Receiver<Command>,
    sender: Sender<Command>,
}

impl Simulation {
    /// Build the scene entities from a configuration.
    ///
    /// A configured seed makes every spawn position reproducible.
    pub fn new(config: AnimationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let bottle = BottleGeometry::new(&config.bottle);
        let fill = FillController::new(
            config.bottle.body_height,
            config.bottle.neck_height,
            config.fill.fill_speed,
        );
        let (sender, commands) = mpsc::channel();

        let mut simulation = Self {
            waves: WaveRing::new(&config.waves),
            blinker: Blinker::new(config.blink.clone()),
            bubbles: Vec::with_capacity(config.bubbles.count),
            hearts: Vec::with_capacity(config.hearts.count),
            droplets: Vec::with_capacity(config.droplets.count),
            config,
            bottle,
            fill,
            paused: false,
            time: 0.0,
            rng,
            commands,
            sender,
        };
        simulation.spawn_entities();
        simulation
    }

    /// A handle input callbacks can use to queue commands.
    pub fn handle(&self) -> SimulationHandle {
        SimulationHandle {
            sender: self.sender.clone(),
        }
    }

    /// Run one frame: apply queued commands, advance every entity unless
    /// paused, then refresh the wave ring.
    pub fn step(&mut self, tick: FrameTick) {
        self.apply_pending_commands();
        self.time = tick.elapsed;

        if !self.paused {
            self.advance(tick.dt);
        }

        self.waves.update(&self.bottle, self.fill.level(), self.time);
    }

    /// Apply a command immediately.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::TogglePause => self.set_paused(!self.paused),
            Command::Pause => self.set_paused(true),
            Command::Resume => self.set_paused(false),
            Command::Reset => self.reset(),
        }
    }

    /// Empty the bottle and respawn every decoration.
    pub fn reset(&mut self) {
        self.fill.reset();
        self.paused = false;
        self.blinker.reset();
        self.spawn_entities();
        self.waves.update(&self.bottle, self.fill.level(), self.time);
        log::info!("Animation reset");
    }

    fn apply_pending_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            log::debug!("Applying {:?}", command);
            self.apply(command);
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            self.paused = paused;
            log::info!("Animation {}", if paused { "paused" } else { "resumed" });
        }
    }

    fn advance(&mut self, dt: f32) {
        if self.fill.advance(dt) {
            log::info!("Bottle is full at level {:.2}", self.fill.level());
        }

        let ctx = StepContext {
            dt,
            time: self.time,
            body_surface: self.bottle.body_surface_height(self.fill.level()),
        };

        for bubble in &mut self.bubbles {
            bubble.step(&ctx, &self.bottle, &self.config.bubbles, &mut self.rng);
        }

        for heart in &mut self.hearts {
            heart.step(&ctx, &self.bottle, &self.config.hearts, &mut self.rng);
        }

        for droplet in &mut self.droplets {
            droplet.step(&ctx, &self.bottle, &self.config.droplets, &mut self.rng);
        }

        self.blinker.update(dt);
    }

    fn spawn_entities(&mut self) {
        self.bubbles = (0..self.config.bubbles.count)
            .map(|_| Bubble::spawn(&mut self.rng, &self.bottle, &self.config.bubbles))
            .collect();
        self.hearts = (0..self.config.hearts.count)
            .map(|_| Heart::spawn(&mut self.rng, &self.bottle, &self.config.hearts))
            .collect();
        self.droplets = (0..self.config.droplets.count)
            .map(|index| Droplet::spawn(&mut self.rng, &self.bottle, &self.config.droplets, index))
            .collect();
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn bottle(&self) -> &BottleGeometry {
        &self.bottle
    }

    pub fn fill(&self) -> &FillController {
        &self.fill
    }

    pub fn level(&self) -> f32 {
        self.fill.level()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Elapsed animation clock time of the last frame.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn hearts(&self) -> &[Heart] {
        &self.hearts
    }

    pub fn droplets(&self) -> &[Droplet] {
        &self.droplets
    }

    pub fn waves(&self) -> &WaveRing {
        &self.waves
    }

    pub fn blinker(&self) -> &Blinker {
        &self.blinker
    }

    pub fn blink_state(&self) -> BlinkState {
        self.blinker.state()
    }

    pub fn eye_scale(&self) -> f32 {
        self.blinker.eye_scale()
    }
}
