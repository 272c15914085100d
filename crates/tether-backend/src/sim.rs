use glam::Vec3;

use tether::wire::InputCommand;
use tether::{EntityView, LightView, WorldView};

// Scripted stand-in for the real simulation, deterministic per tick.
pub struct SyntheticWorld {
    tick: u64,
    tick_rate: u32,
    entity_count: usize,
    map_name: String,
    paused: bool,
    view_override: Option<Vec3>,
    forward_offset: f32,
}

impl SyntheticWorld {
    pub fn new(tick_rate: u32, entity_count: usize) -> Self {
        Self {
            tick: 0,
            tick_rate: tick_rate.max(1),
            entity_count,
            map_name: "arena".to_string(),
            paused: false,
            view_override: None,
            forward_offset: 0.0,
        }
    }

    pub fn advance(&mut self) {
        if !self.paused {
            self.tick += 1;
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn change_map(&mut self, name: &str) {
        self.map_name = name.to_string();
        self.tick = 0;
        self.forward_offset = 0.0;
    }

    pub fn apply_input(&mut self, command: &InputCommand) {
        self.view_override = Some(Vec3::from(command.view_angles));
        let dt = 1.0 / self.tick_rate as f32;
        self.forward_offset += command.forward_move * dt;
    }

    pub fn view(&self) -> WorldView {
        let t = self.tick as f64 / self.tick_rate as f64;
        let frame = self.tick as f32;

        let mut view = WorldView::new(t);
        view.view_origin = Vec3::new(100.0 + frame * 0.1 + self.forward_offset, 200.0, 50.0);
        view.view_angles = self
            .view_override
            .unwrap_or_else(|| Vec3::new(0.0, (frame * 0.5) % 360.0, 0.0));

        view.player.health = 100 - (self.tick % 10) as i16;
        view.player.armor = 50 + (self.tick % 20) as i16;
        view.player.weapon = ((self.tick / 10) % 8) as u8;
        view.player.ammo = 100 - (self.tick % 50) as u16;

        view.game.paused = self.paused;
        view.game.in_game = true;
        view.game.map_name = self.map_name.clone();
        view.game.time = t;

        let center = Vec3::new(0.0, 0.0, 32.0);
        for i in 0..self.entity_count {
            let phase = i as f32 / self.entity_count.max(1) as f32 * std::f32::consts::TAU;
            let angle = t as f32 * 0.8 + phase;

            let mut entity = EntityView::new((i + 1) as u16);
            entity.origin = center + Vec3::new(angle.cos(), angle.sin(), 0.0) * 80.0;
            entity.angles = Vec3::new(0.0, angle.to_degrees() % 360.0, 0.0);
            entity.frame = ((self.tick / 6) % 8) as u16;
            view.entities.push(entity);
        }

        view.lights.push(LightView {
            key: 1,
            origin: center,
            radius: 200.0 + (t as f32 * 2.0).sin() * 50.0,
            color: Vec3::new(1.0, 0.9, 0.6),
        });

        view
    }
}
