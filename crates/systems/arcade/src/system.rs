//! Board-level system: slice scheduler, interrupt forwarding and frame output

use crate::bus::{Board, LaneBus};
use crate::lane::Lane;
use crate::profile::{self, GameProfile};
use crate::video::{FrameRenderer, FrameStats, GraphicsSet};
use emu_core::logging::{log, LogCategory, LogLevel};
use emu_core::renderer::Renderer;
use emu_core::types::Frame;
use emu_core::{MountPointInfo, System};
use serde_json::{json, Value};
use thiserror::Error;

/// Arcade board errors. None of these can happen mid-frame.
#[derive(Debug, Error)]
pub enum ArcadeError {
    #[error("Unknown title: {0}")]
    UnknownTitle(String),
    #[error("Invalid mount point: {0}")]
    InvalidMountPoint(String),
    #[error("ROM for {lane} is {size} bytes but the window holds {capacity}")]
    RomTooLarge {
        lane: Lane,
        size: usize,
        capacity: usize,
    },
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
    #[error("Profile JSON: {0}")]
    ProfileJson(#[from] serde_json::Error),
}

/// CPU instruction execution, supplied from outside the board.
pub trait LaneExecutor {
    /// Power-on reset of one lane's CPU.
    fn reset(&mut self, lane: Lane);

    /// Run about `budget` cycles on `lane` against `bus`; return the cycles
    /// actually consumed (may overshoot the budget).
    fn execute_slice(&mut self, lane: Lane, budget: u32, bus: &mut LaneBus<'_>) -> u32;

    /// Edge-triggered non-maskable interrupt.
    fn nmi(&mut self, lane: Lane);

    /// One maskable interrupt pulse (vblank).
    fn irq(&mut self, lane: Lane);

    /// Level of the maskable interrupt line.
    fn set_irq_line(&mut self, lane: Lane, asserted: bool);
}

/// Executor that burns its budget without touching the bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleExecutor;

impl LaneExecutor for IdleExecutor {
    fn reset(&mut self, _lane: Lane) {}

    fn execute_slice(&mut self, _lane: Lane, budget: u32, _bus: &mut LaneBus<'_>) -> u32 {
        budget
    }

    fn nmi(&mut self, _lane: Lane) {}

    fn irq(&mut self, _lane: Lane) {}

    fn set_irq_line(&mut self, _lane: Lane, _asserted: bool) {}
}

/// Twin-lane arcade board.
pub struct ArcadeSystem {
    board: Board,
    renderer: FrameRenderer,
    graphics: GraphicsSet,
    executor: Box<dyn LaneExecutor>,

    // Cycles each lane ran past its last budget
    overrun: [u32; 3],
    sound_irq: bool,
    frame_count: u64,
    last_stats: FrameStats,
}

impl ArcadeSystem {
    pub fn new(profile: GameProfile) -> Result<Self, ArcadeError> {
        profile.validate()?;
        log(LogCategory::Lane, LogLevel::Info, || {
            format!("board configured for {}", profile.name)
        });
        Ok(Self {
            renderer: FrameRenderer::new(&profile),
            graphics: GraphicsSet::blank(&profile),
            board: Board::new(profile),
            executor: Box::new(IdleExecutor),
            overrun: [0; 3],
            sound_irq: false,
            frame_count: 0,
            last_stats: FrameStats::default(),
        })
    }

    /// Board with a built-in title profile.
    pub fn for_title(name: &str) -> Result<Self, ArcadeError> {
        let profile = profile::by_name(name).ok_or_else(|| ArcadeError::UnknownTitle(name.to_string()))?;
        Self::new(profile)
    }

    pub fn with_executor(mut self, executor: Box<dyn LaneExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Swap in a board built with [`Board::with_chips`]; it must carry the
    /// same profile.
    pub fn with_board(mut self, board: Board) -> Self {
        self.board = board;
        self
    }

    pub fn install_graphics(&mut self, graphics: GraphicsSet) {
        self.graphics = graphics;
        self.renderer.invalidate();
    }

    pub fn set_input_port(&mut self, port: usize, value: u8) {
        self.board.inputs_mut().set_port(port, value);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    pub fn profile(&self) -> &GameProfile {
        self.board.profile()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Board time covered by the frames run so far.
    pub fn emulated_seconds(&self) -> f64 {
        self.frame_count as f64 / self.board.profile().timing.frame_rate_hz
    }

    /// Render statistics of the last frame.
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    fn cycles_per_frame(&self, lane: Lane) -> u64 {
        let timing = &self.board.profile().timing;
        if lane.is_main() {
            timing.main_cycles_per_frame as u64
        } else {
            timing.sound_cycles_per_frame as u64
        }
    }

    /// Run one slice on `lane` and forward any interrupt it caused.
    fn run_slice(&mut self, lane: Lane, slice: u64, slices: u64) {
        let per_frame = self.cycles_per_frame(lane);
        let share = (per_frame * (slice + 1) / slices - per_frame * slice / slices) as u32;
        let i = lane.index();

        let debt = self.overrun[i];
        if debt >= share {
            self.overrun[i] = debt - share;
            return;
        }
        let budget = share - debt;
        let used = {
            let mut bus = self.board.bus(lane);
            self.executor.execute_slice(lane, budget, &mut bus)
        };
        self.overrun[i] = used.saturating_sub(budget);

        if lane == Lane::Sound {
            self.board.advance_chips(used);
        }
        self.forward_interrupts();
    }

    fn forward_interrupts(&mut self) {
        for lane in [Lane::A, Lane::B] {
            for _ in 0..self.board.latch_mut().take_interrupts(lane) {
                self.executor.nmi(lane);
            }
        }
        let asserted = self.board.sound().irq_asserted();
        if asserted != self.sound_irq {
            self.sound_irq = asserted;
            self.executor.set_irq_line(Lane::Sound, asserted);
            log(LogCategory::Sound, LogLevel::Trace, || {
                format!("sound IRQ line {}", if asserted { "asserted" } else { "released" })
            });
        }
    }

    /// Run all slices of one frame, then render it.
    pub fn run_frame(&mut self) -> FrameStats {
        let slices = self.board.profile().timing.slices_per_frame.max(1) as u64;
        for slice in 0..slices {
            for lane in Lane::ALL {
                self.run_slice(lane, slice, slices);
            }
        }

        self.executor.irq(Lane::A);
        self.executor.irq(Lane::B);

        self.last_stats = self.renderer.render(self.board.arena(), &self.graphics);
        self.frame_count += 1;
        self.last_stats
    }
}

impl System for ArcadeSystem {
    type Error = ArcadeError;

    fn reset(&mut self) {
        self.board.reset();
        self.renderer.reset();
        for lane in Lane::ALL {
            self.executor.reset(lane);
        }
        self.overrun = [0; 3];
        self.sound_irq = false;
        self.frame_count = 0;
        self.last_stats = FrameStats::default();
    }

    fn step_frame(&mut self) -> Result<Frame, Self::Error> {
        self.run_frame();
        Ok(self.renderer.get_frame().clone())
    }

    fn debug_state(&self) -> Value {
        let latch = self.board.latch();
        let sound = self.board.sound();
        let inputs = self.board.inputs();
        json!({
            "system": "arcade",
            "title": self.profile().name,
            "frame": self.frame_count,
            "emulated_seconds": self.emulated_seconds(),
            "doorbell": {
                "lane_a": latch.state(Lane::A).bits(),
                "lane_b": latch.state(Lane::B).bits(),
            },
            "sound": {
                "register": sound.read_register(),
                "mailbox": sound.mailbox(),
                "irq": sound.irq_asserted(),
            },
            "dials": [
                inputs.dial(0).map(|d| d.position()),
                inputs.dial(1).map(|d| d.position()),
            ],
            "overrun": self.overrun,
            "shadows_visible": self.renderer.context().shadows_visible,
            "background": {
                "redrawn": self.last_stats.background.redrawn,
                "skipped": self.last_stats.background.skipped,
            },
        })
    }

    fn mount_points(&self) -> Vec<MountPointInfo> {
        let rom = |id: &str, name: &str| MountPointInfo {
            id: id.to_string(),
            name: name.to_string(),
            extensions: vec!["bin".to_string(), "rom".to_string()],
            required: true,
        };
        vec![
            rom("lane_a", "Lane A program ROM"),
            rom("lane_b", "Lane B program ROM"),
            rom("sound", "Sound program ROM"),
        ]
    }

    fn mount(&mut self, mount_point_id: &str, data: &[u8]) -> Result<(), Self::Error> {
        let lane = mount_lane(mount_point_id)?;
        self.board.load_rom(lane, data)
    }

    fn unmount(&mut self, mount_point_id: &str) -> Result<(), Self::Error> {
        let lane = mount_lane(mount_point_id)?;
        self.board.unload_rom(lane);
        Ok(())
    }

    fn is_mounted(&self, mount_point_id: &str) -> bool {
        mount_lane(mount_point_id)
            .map(|lane| self.board.rom_loaded(lane))
            .unwrap_or(false)
    }
}

fn mount_lane(id: &str) -> Result<Lane, ArcadeError> {
    match id {
        "lane_a" => Ok(Lane::A),
        "lane_b" => Ok(Lane::B),
        "sound" => Ok(Lane::Sound),
        other => Err(ArcadeError::InvalidMountPoint(other.to_string())),
    }
}
