//! Terminal presentation. The world is rasterised onto a cell grid and only
//! cells that changed since the last frame are written out.

use std::io::{self, Write};

use geo::Point;
use termion::color;

use crate::body::MovementState;
use crate::profile::TunableParam;
use crate::sandbox::Sandbox;
use crate::utility::{bottom, left, p, right, top, world_to_cell, Rgb};

/// World units covered by one terminal cell. Cells are about twice as tall as wide.
pub const CELL_SIZE: (f32, f32) = (10.0, 20.0);
/// Velocity is drawn this many ticks ahead of the player.
pub const VELOCITY_LOOKAHEAD: f32 = 5.0;
pub const STATUS_ROWS: usize = 2;

const BACKGROUND: Rgb = Rgb(15, 15, 25);
const TEXT: Rgb = Rgb(220, 220, 220);
const HAZARD: Rgb = Rgb(255, 50, 50);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Cell {
    fn blank() -> Cell {
        Cell {
            glyph: ' ',
            fg: TEXT,
            bg: BACKGROUND,
        }
    }

    fn solid(glyph: char, fg: Rgb) -> Cell {
        Cell {
            glyph,
            fg,
            bg: BACKGROUND,
        }
    }
}

/// One rasterised screen, (x,y) left to right, top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    grid: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Frame {
        Frame {
            grid: vec![vec![Cell::blank(); height]; width],
        }
    }

    pub fn width(&self) -> usize {
        self.grid.len()
    }

    pub fn height(&self) -> usize {
        self.grid.first().map_or(0, |column| column.len())
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.grid.get(x as usize)?.get(y as usize).copied()
    }

    /// Writes outside the frame are clipped.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(slot) = self.grid.get_mut(x as usize).and_then(|column| column.get_mut(y as usize)) {
            *slot = cell;
        }
    }

    pub fn fill_world_rect(&mut self, min: Point<f32>, max: Point<f32>, cell: Cell) {
        let cell_size = p(CELL_SIZE.0, CELL_SIZE.1);
        let from = world_to_cell(min, cell_size);
        // max is exclusive, nudge it back inside
        let to = world_to_cell(p(max.x() - 0.01, max.y() - 0.01), cell_size);
        for x in from.x()..=to.x() {
            for y in from.y()..=to.y() {
                self.set(x, y, cell);
            }
        }
    }

    pub fn text(&mut self, x: i32, y: i32, text: &str, fg: Rgb) {
        for (i, glyph) in text.chars().enumerate() {
            self.set(x + i as i32, y, Cell::solid(glyph, fg));
        }
    }

    #[cfg(test)]
    pub fn row(&self, y: usize) -> String {
        self.grid
            .iter()
            .filter_map(|column| column.get(y).map(|cell| cell.glyph))
            .collect()
    }
}

pub struct Renderer {
    width: usize,
    height: usize,
    previous: Option<Frame>,
}

impl Renderer {
    pub fn new(width: u16, height: u16) -> Renderer {
        Renderer {
            width: width as usize,
            height: height as usize,
            previous: None,
        }
    }

    pub fn compose(&self, sandbox: &Sandbox, selected: TunableParam) -> Frame {
        let mut frame = Frame::new(self.width, self.height);
        let level = sandbox.level();

        for platform in level.platforms() {
            let glyph = if platform.is_finish { '▓' } else { '█' };
            frame.fill_world_rect(platform.rect.min().into(), platform.rect.max().into(), Cell::solid(glyph, platform.color));
        }
        for hazard in level.hazards() {
            frame.fill_world_rect(hazard.min().into(), hazard.max().into(), Cell::solid('^', HAZARD));
        }
        let cell_size = p(CELL_SIZE.0, CELL_SIZE.1);
        for (position, character) in sandbox.playgrounds().key_positions() {
            let cell = world_to_cell(position, cell_size);
            frame.set(cell.x(), cell.y(), Cell::solid('⚷', character.preset().color));
        }

        let body = sandbox.body();
        let profile = sandbox.profile();
        let player_color = match body.state {
            MovementState::Dashing => profile.color.lighten(80),
            MovementState::WallSliding => profile.color.lighten(40),
            _ => profile.color,
        };
        let bounds = body.rect();
        frame.fill_world_rect(
            p(left(&bounds), top(&bounds)),
            p(right(&bounds), bottom(&bounds)),
            Cell::solid('█', player_color),
        );
        self.draw_velocity(&mut frame, sandbox);

        let status_y = self.height.saturating_sub(STATUS_ROWS) as i32;
        frame.text(0, status_y, &status_line(sandbox, selected), TEXT);
        frame.text(
            0,
            status_y + 1,
            "move a/d  jump space  run shift  dash x  chars y-p tab  levels 1-6 b n  random 7  reset r  tune [ ] - =  defaults 0  quit q",
            Rgb(140, 140, 160),
        );
        frame
    }

    fn draw_velocity(&self, frame: &mut Frame, sandbox: &Sandbox) {
        let body = sandbox.body();
        let cell_size = p(CELL_SIZE.0, CELL_SIZE.1);
        let center = body.position + body.size / 2.0;
        let from = world_to_cell(center, cell_size);
        let to = world_to_cell(center + body.velocity * VELOCITY_LOOKAHEAD, cell_size);
        for (x, y) in line_drawing::Bresenham::new((from.x(), from.y()), (to.x(), to.y())).skip(1) {
            if frame.get(x, y).map_or(false, |cell| cell.glyph == ' ') {
                frame.set(x, y, Cell::solid('·', TEXT));
            }
        }
    }

    /// Write the cells that differ from the previous frame.
    pub fn draw<W: Write>(&mut self, out: &mut W, frame: Frame) -> io::Result<()> {
        for x in 0..frame.width() {
            for y in 0..frame.height() {
                let cell = frame.grid[x][y];
                let unchanged = self
                    .previous
                    .as_ref()
                    .and_then(|previous| previous.get(x as i32, y as i32))
                    .map_or(false, |old| old == cell);
                if unchanged {
                    continue;
                }
                write!(
                    out,
                    "{}{}{}{}",
                    termion::cursor::Goto(x as u16 + 1, y as u16 + 1),
                    color::Fg(color::Rgb(cell.fg.0, cell.fg.1, cell.fg.2)),
                    color::Bg(color::Rgb(cell.bg.0, cell.bg.1, cell.bg.2)),
                    cell.glyph
                )?;
            }
        }
        write!(out, "{}", termion::cursor::Goto(1, 1))?;
        out.flush()?;
        self.previous = Some(frame);
        Ok(())
    }
}

fn status_line(sandbox: &Sandbox, selected: TunableParam) -> String {
    let body = sandbox.body();
    let profile = sandbox.profile();
    let playgrounds = sandbox.playgrounds();
    let mut line = format!(
        "{} | {} | {} | v ({:.1}, {:.1}) | deaths {} | keys {} | {} {:.2}",
        sandbox.level().name,
        profile.name,
        body.state,
        body.velocity.x(),
        body.velocity.y(),
        sandbox.deaths(),
        playgrounds.keys(playgrounds.current()).len(),
        selected.label(),
        selected.get(profile),
    );
    if let Some(event) = sandbox.last_event() {
        line.push_str(&format!(" | {}", event));
    }
    line
}
