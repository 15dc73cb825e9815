//! Keyboard to sandbox. Movement reads held keys every tick through
//! `device_query`; everything else arrives as termion key events.

use device_query::Keycode;
use strum_macros::{Display, EnumIter};
use termion::event::Key;

use crate::input::InputFrame;
use crate::playgrounds::Playground;
use crate::profile::Character;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Jump,
    Run,
    Dash,
}

impl Action {
    pub fn keys(&self) -> &'static [Keycode] {
        match self {
            Action::MoveLeft => &[Keycode::Left, Keycode::A],
            Action::MoveRight => &[Keycode::Right, Keycode::D],
            Action::Jump => &[Keycode::Space, Keycode::W, Keycode::Up],
            Action::Run => &[Keycode::LShift, Keycode::RShift],
            Action::Dash => &[Keycode::X, Keycode::C],
        }
    }

    pub fn is_held(&self, held: &[Keycode]) -> bool {
        self.keys().iter().any(|key| held.contains(key))
    }
}

/// Turns successive held-key snapshots into `InputFrame`s, deriving press edges.
#[derive(Debug, Default)]
pub struct InputSampler {
    jump_was_held: bool,
    dash_was_held: bool,
}

impl InputSampler {
    pub fn sample(&mut self, held: &[Keycode]) -> InputFrame {
        let left = Action::MoveLeft.is_held(held);
        let right = Action::MoveRight.is_held(held);
        let jump = Action::Jump.is_held(held);
        let dash = Action::Dash.is_held(held);

        let move_axis = match (left, right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        };
        let frame = InputFrame {
            move_axis,
            jump_held: jump,
            jump_pressed: jump && !self.jump_was_held,
            run_held: Action::Run.is_held(held),
            dash_pressed: dash && !self.dash_was_held,
        };
        self.jump_was_held = jump;
        self.dash_was_held = dash;
        frame
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Quit,
    SelectCharacter(Character),
    NextCharacter,
    LoadLevel(Playground),
    NextLevel,
    PreviousLevel,
    Randomize,
    ResetPlayer,
    NextParam,
    PreviousParam,
    Tune(i32),
    ResetProfile,
}

pub fn command_for(key: Key) -> Option<Command> {
    let command = match key {
        Key::Char('q') | Key::Esc | Key::Ctrl('c') => Command::Quit,
        Key::Char('y') => Command::SelectCharacter(Character::Mario),
        Key::Char('u') => Command::SelectCharacter(Character::MeatBoy),
        Key::Char('i') => Command::SelectCharacter(Character::Link),
        Key::Char('o') => Command::SelectCharacter(Character::Madeline),
        Key::Char('p') => Command::SelectCharacter(Character::Ninja),
        Key::Char('\t') => Command::NextCharacter,
        Key::Char(digit @ '1'..='6') => {
            let index = digit as usize - '1' as usize;
            Command::LoadLevel(Playground::from_index(index)?)
        }
        Key::Char('n') => Command::NextLevel,
        Key::Char('b') => Command::PreviousLevel,
        Key::Char('7') => Command::Randomize,
        Key::Char('r') => Command::ResetPlayer,
        Key::Char(']') => Command::NextParam,
        Key::Char('[') => Command::PreviousParam,
        Key::Char('=') | Key::Char('+') => Command::Tune(1),
        Key::Char('-') => Command::Tune(-1),
        Key::Char('0') => Command::ResetProfile,
        _ => return None,
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn test_press_edges_fire_once() {
        let mut sampler = InputSampler::default();
        let first = sampler.sample(&[Keycode::Space, Keycode::X]);
        assert!(first.jump_pressed && first.jump_held);
        assert!(first.dash_pressed);
        let second = sampler.sample(&[Keycode::Space, Keycode::X]);
        assert!(!second.jump_pressed && second.jump_held);
        assert!(!second.dash_pressed);
        sampler.sample(&[]);
        assert!(sampler.sample(&[Keycode::W]).jump_pressed);
    }

    #[test]
    fn test_opposing_directions_cancel() {
        let mut sampler = InputSampler::default();
        assert!(sampler.sample(&[Keycode::A]).move_axis == -1.0);
        assert!(sampler.sample(&[Keycode::Right, Keycode::LShift]).move_axis == 1.0);
        assert!(sampler.sample(&[Keycode::Right, Keycode::LShift]).run_held);
        assert!(sampler.sample(&[Keycode::A, Keycode::D]).move_axis == 0.0);
    }

    #[test]
    fn test_command_keys() {
        assert!(command_for(Key::Char('q')) == Some(Command::Quit));
        assert!(command_for(Key::Char('u')) == Some(Command::SelectCharacter(Character::MeatBoy)));
        assert!(command_for(Key::Char('\t')) == Some(Command::NextCharacter));
        assert!(command_for(Key::Char('1')) == Some(Command::LoadLevel(Playground::FlatRun)));
        assert!(command_for(Key::Char('6')) == Some(Command::LoadLevel(Playground::TheShaft)));
        assert!(command_for(Key::Char('7')) == Some(Command::Randomize));
        assert!(command_for(Key::Char('n')) == Some(Command::NextLevel));
        assert!(command_for(Key::Char('-')) == Some(Command::Tune(-1)));
        assert!(command_for(Key::Char('a')) == None);
        assert!(command_for(Key::Char(' ')) == None);
    }
}
