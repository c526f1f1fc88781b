use std::{
    error::Error as StdError,
    fs::File,
    io,
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};

use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use rand::{rngs::StdRng, SeedableRng};
use sodium as na;
use tictacai::{Command, Difficulty, Error, Mark, Mode, Session, TicTacToe};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame, Terminal,
};

/// Pause before the computer's mark shows up.
const COMPUTER_DELAY: Duration = Duration::from_millis(400);
const TICK: Duration = Duration::from_millis(250);

/// Play tic-tac-toe in a terminal window.
#[derive(Debug, Parser)]
#[command(name = "ttt-tui")]
struct Args {
    /// `pvp` or `computer`
    #[arg(long, default_value_t = Mode::PlayerVsPlayer)]
    mode: Mode,

    /// `easy` or `hard`, only used against the computer
    #[arg(long, default_value_t = Difficulty::Easy)]
    difficulty: Difficulty,

    /// Seed for the easy computer's random choices
    #[arg(long)]
    seed: Option<u64>,

    /// Write logs here; the terminal is taken over by the board
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn StdError>> {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let session = Session::new(args.mode, args.difficulty, rng);

    let ctx = na::SodiumCtx::new();

    let (commands, game, message) = ctx.transaction(|| {
        let commands: na::StreamSink<Command> = ctx.new_stream_sink();

        let game = TicTacToe::new(&ctx, &commands.stream(), session.clone());

        // Last rejection, cleared by the next accepted command
        let message = game
            .error
            .map(|err: &Error| err.to_string())
            .or_else(&game.session.updates().map(|_: &Session| String::new()))
            .hold(String::new());

        (commands, game, message)
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!("terminal ui started");
    let result = run(&mut terminal, &commands, &game, &message);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(result?)
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    commands: &na::StreamSink<Command>,
    game: &TicTacToe,
    message: &na::Cell<String>,
) -> io::Result<()> {
    let mut computer_due: Option<Instant> = None;

    loop {
        let session = game.session.sample();
        let mut ui = Ui {
            session: session.clone(),
            message: message.sample(),
            cells: [Rect::default(); 9],
        };
        terminal.draw(|f| ui.draw(f))?;

        if session.computer_to_move() {
            let due = *computer_due.get_or_insert_with(|| Instant::now() + COMPUTER_DELAY);
            if Instant::now() >= due {
                computer_due = None;
                commands.send(Command::ComputerMove);
                continue;
            }
        } else {
            computer_due = None;
        }

        let timeout = computer_due
            .map(|due| due.saturating_duration_since(Instant::now()))
            .unwrap_or(TICK);
        if !event::poll(timeout)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('r') => commands.send(Command::Restart),
                KeyCode::Char('m') => commands.send(Command::SetMode(session.mode().toggle())),
                KeyCode::Char('d') => {
                    commands.send(Command::SetDifficulty(session.difficulty().toggle()))
                }
                KeyCode::Char(c @ '1'..='9') => {
                    commands.send(Command::Place(c as usize - '1' as usize))
                }
                _ => {}
            },
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(MouseButton::Left),
                column,
                row,
                ..
            }) => {
                if let Some(index) = ui.cell_at(column, row) {
                    commands.send(Command::Place(index));
                }
            }
            _ => {}
        }
    }
}

struct Ui {
    session: Session,
    message: String,
    /// Screen area of each square from the last draw, for mouse clicks.
    cells: [Rect; 9],
}

impl Ui {
    fn draw<B: Backend>(&mut self, f: &mut Frame<B>) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .margin(2)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
            .split(f.size());
        let block = Block::default().title("Board").borders(Borders::ALL);
        self.draw_board(f, block.inner(chunks[0]));
        f.render_widget(block, chunks[0]);

        let block = Block::default().title("Game Info").borders(Borders::ALL);
        let info = Paragraph::new(self.info_lines())
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(info, chunks[1]);
    }

    fn info_lines(&self) -> Vec<Spans<'static>> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let status = self.session.status();
        let mut lines = vec![
            Spans::from(Span::styled(status.to_string(), bold)),
            Spans::from(""),
            Spans::from(format!("Mode: {}", self.session.mode())),
        ];
        if self.session.mode() == Mode::PlayerVsComputer {
            lines.push(Spans::from(format!(
                "Difficulty: {}",
                self.session.difficulty()
            )));
            if self.session.computer_to_move() {
                lines.push(Spans::from("Computer is thinking..."));
            }
        }
        if !self.message.is_empty() {
            lines.push(Spans::from(""));
            lines.push(Spans::from(Span::styled(
                self.message.clone(),
                Style::default().fg(Color::Red),
            )));
        }
        lines.extend([
            Spans::from(""),
            Spans::from("1-9/click  place"),
            Spans::from("r          restart"),
            Spans::from("m          mode"),
            Spans::from("d          difficulty"),
            Spans::from("q          quit"),
        ]);
        lines
    }

    fn draw_board<B: Backend>(&mut self, f: &mut Frame<B>, area: Rect) {
        let thirds = [
            Constraint::Percentage(5),
            Constraint::Percentage(29),
            Constraint::Percentage(34),
            Constraint::Percentage(30),
            Constraint::Percentage(5),
        ];
        let vchunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(0)
            .constraints(thirds.as_ref())
            .split(area);

        for row in 0..3 {
            let hchunks = Layout::default()
                .direction(Direction::Horizontal)
                .margin(0)
                .horizontal_margin(3)
                .constraints(thirds.as_ref())
                .split(vchunks[row + 1]);
            for col in 0..3 {
                self.cells[row * 3 + col] = hchunks[col + 1];
            }
        }

        let borders = [
            Borders::RIGHT | Borders::BOTTOM,
            Borders::ALL ^ Borders::TOP,
            Borders::LEFT | Borders::BOTTOM,
            Borders::ALL ^ Borders::LEFT,
            Borders::ALL,
            Borders::ALL ^ Borders::RIGHT,
            Borders::RIGHT | Borders::TOP,
            Borders::ALL ^ Borders::BOTTOM,
            Borders::LEFT | Borders::TOP,
        ];

        let board = self.session.board();
        let line = self.session.status().line();
        for (index, (chunk, borders)) in self.cells.iter().zip(borders).enumerate() {
            let style = match line {
                Some(line) if line.contains(&index) => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default(),
            };
            let block = Block::default().borders(borders);
            f.render_widget(RenderMark(board.get(index), style), block.inner(*chunk));
            f.render_widget(block, *chunk);
        }
    }

    fn cell_at(&self, column: u16, row: u16) -> Option<usize> {
        self.cells.iter().position(|cell| {
            column >= cell.x
                && column < cell.x + cell.width
                && row >= cell.y
                && row < cell.y + cell.height
        })
    }
}

struct RenderMark(Option<Mark>, Style);

impl Widget for RenderMark {
    fn render(self, area: Rect, buf: &mut tui::buffer::Buffer) {
        if area.width < 3 || area.height < 1 {
            return;
        }
        match self.0 {
            Some(Mark::X) => render_x(area, buf, self.1),
            Some(Mark::O) => render_o(area, buf, self.1),
            None => {}
        }
    }
}

fn render_x(area: Rect, buf: &mut tui::buffer::Buffer, style: Style) {
    const LEFT: &str = "\\@\\";
    const RIGHT: &str = "/@/";

    // Columns to step over per line; each stroke is 3 characters wide
    let inv_slope = area.width.saturating_sub(3).div_euclid(area.height.max(1));
    for y in 0..area.height {
        let x_left = area.width.saturating_sub(3 + y * inv_slope);
        buf.set_string(area.x + x_left, area.y + y, RIGHT, style);

        let x_right = (y * inv_slope).min(area.width - 3);
        buf.set_string(area.x + x_right, area.y + y, LEFT, style);
    }
}

fn render_o(area: Rect, buf: &mut tui::buffer::Buffer, style: Style) {
    let x_offset;
    let y_offset;
    if area.width >= area.height {
        x_offset = (area.width - area.height).div_euclid(2);
        y_offset = 0;
    } else {
        x_offset = 0;
        y_offset = (area.height - area.width).div_euclid(2);
    }

    let diameter = area.width.min(area.height);
    let radius = diameter.saturating_sub(1).div_euclid(2).max(1);
    let center_x = (area.x + radius + x_offset) as i32;
    let center_y = (area.y + radius + y_offset) as i32;

    let radius = radius as f32;
    let min_angle = (1.0 / radius).min(0.5);

    let mut angle = 0.0_f32;
    while angle <= std::f32::consts::PI {
        let (sin, cos) = angle.sin_cos();
        let x = center_x + (radius * cos).round() as i32;
        for y in [
            center_y + (radius * sin).round() as i32,
            center_y - (radius * sin).round() as i32,
        ] {
            let inside_x = x >= area.left() as i32 && x < area.right() as i32;
            let inside_y = y >= area.top() as i32 && y < area.bottom() as i32;
            if inside_x && inside_y {
                buf.get_mut(x as u16, y as u16).set_char('@').set_style(style);
            }
        }
        angle += min_angle;
    }
}
