use tether::wire::{InputButtons, InputCommand};

// Scripted stand-in for a local input source; the frontend session stamps
// the sequence numbers.
pub struct ScriptedInput {
    tick: u64,
    tick_rate: u32,
}

impl ScriptedInput {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick: 0,
            tick_rate: tick_rate.max(1),
        }
    }

    pub fn next_command(&mut self) -> InputCommand {
        self.tick += 1;
        let t = self.tick as f64 / self.tick_rate as f64;

        let mut command = InputCommand::new(0, t);
        command.forward_move = 200.0;
        command.side_move = (t.sin() * 100.0) as f32;
        command.view_angles = [0.0, ((t * 30.0) % 360.0) as f32, 0.0];

        if self.tick % 120 == 0 {
            command.set_buttons(InputButtons::ATTACK);
        }
        if self.tick % 600 == 0 {
            command.console = Some("status".to_string());
        }

        command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_text_appears_periodically() {
        let mut input = ScriptedInput::new(60);

        let mut with_console = 0;
        for _ in 0..600 {
            if input.next_command().console.is_some() {
                with_console += 1;
            }
        }
        assert_eq!(with_console, 1);
    }

    #[test]
    fn movement_is_always_populated() {
        let mut input = ScriptedInput::new(60);
        let command = input.next_command();

        assert_eq!(command.forward_move, 200.0);
        assert_eq!(command.view_angles[0], 0.0);
    }
}
