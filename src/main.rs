extern crate line_drawing;
extern crate termion;

mod body;
mod config;
mod controls;
mod input;
mod level;
mod movement;
mod playgrounds;
mod profile;
mod render;
mod sandbox;
mod signature;
mod utility;

use std::error::Error;
use std::fs::File;
use std::io::{self, stdin, stdout, Write};
use std::sync::mpsc::channel;
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use clap::Parser;
use device_query::{DeviceQuery, DeviceState};
use termion::event::Event;
use termion::input::TermRead;
use termion::raw::{IntoRawMode, RawTerminal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Cli, Settings};
use crate::controls::{command_for, Command, InputSampler};
use crate::profile::TunableParam;
use crate::render::Renderer;
use crate::sandbox::{FixedTimestep, Sandbox};

struct Game {
    sandbox: Sandbox,
    stdout: RawTerminal<std::io::Stdout>,
    renderer: Renderer,
    keyboard: DeviceState,
    sampler: InputSampler,
    timestep: FixedTimestep,
    selected_param: TunableParam,
    running: bool, // set false to quit
}

impl Game {
    fn new_game(settings: &Settings) -> Result<Game, Box<dyn Error>> {
        let (width, height) = termion::terminal_size()?;
        let sandbox = Sandbox::new(
            settings.character,
            settings.playground()?,
            settings.seed,
            settings.tuning_steps,
        );
        Ok(Game {
            sandbox,
            stdout: stdout().into_raw_mode()?,
            renderer: Renderer::new(width, height),
            keyboard: DeviceState::new(),
            sampler: InputSampler::default(),
            timestep: FixedTimestep::new(settings.tick_rate_hz, settings.max_ticks_per_frame),
            selected_param: TunableParam::Gravity,
            running: true,
        })
    }

    fn handle_input(&mut self, evt: Event) {
        if let Event::Key(key) = evt {
            if let Some(command) = command_for(key) {
                self.handle_command(command);
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Quit => self.running = false,
            Command::SelectCharacter(character) => self.sandbox.select_character(character),
            Command::NextCharacter => {
                let next = self.sandbox.character().next();
                self.sandbox.select_character(next);
            }
            Command::LoadLevel(playground) => self.sandbox.load_level(playground),
            Command::NextLevel => self.sandbox.next_level(),
            Command::PreviousLevel => self.sandbox.previous_level(),
            Command::Randomize => {
                self.sandbox.randomize_level();
            }
            Command::ResetPlayer => self.sandbox.reset_player(),
            Command::NextParam => self.selected_param = self.selected_param.next(),
            Command::PreviousParam => self.selected_param = self.selected_param.previous(),
            Command::Tune(steps) => {
                self.sandbox.tune(self.selected_param, steps);
            }
            Command::ResetProfile => self.sandbox.reset_profile(),
        }
    }

    // Held keys are sampled once per tick so press edges line up with ticks
    fn tick_physics(&mut self, ticks: u32) {
        for _ in 0..ticks {
            let held = self.keyboard.get_keys();
            let input = self.sampler.sample(&held);
            self.sandbox.tick(&input);
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        let frame = self.renderer.compose(&self.sandbox, self.selected_param);
        self.renderer.draw(&mut self.stdout, frame)
    }
}

fn init_logging(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let file = File::create(&settings.log_file)?;
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&settings.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;
    init_logging(&settings)?;
    info!(?settings, "starting sandbox");

    let stdin = stdin();
    let mut game = Game::new_game(&settings)?;
    write!(game.stdout, "{}{}", termion::clear::All, termion::cursor::Hide)?;
    game.stdout.flush()?;
    let (tx, rx) = channel();

    // Separate thread for reading input
    thread::spawn(move || {
        for c in stdin.events() {
            match c {
                Ok(evt) => {
                    if tx.send(evt).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "stopped reading terminal input");
                    break;
                }
            }
        }
    });

    let mut last_frame = Instant::now();
    while game.running {
        while let Ok(evt) = rx.try_recv() {
            game.handle_input(evt);
        }
        let now = Instant::now();
        let ticks = game.timestep.advance(now - last_frame);
        last_frame = now;
        game.tick_physics(ticks);
        game.draw()?;
        thread::sleep(game.timestep.fixed_dt() / 2);
    }

    write!(
        game.stdout,
        "{}{}{}{}",
        termion::style::Reset,
        termion::clear::All,
        termion::cursor::Goto(1, 1),
        termion::cursor::Show
    )?;
    game.stdout.flush()?;
    info!(ticks = game.sandbox.tick_count(), "sandbox closed");
    Ok(())
}
