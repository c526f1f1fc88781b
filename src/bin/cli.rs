use std::io::{self, BufRead};

use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use sodium::{SodiumCtx, StreamSink};
use tracing_subscriber::EnvFilter;

use tictacai::{
    Command, CommandParser, Difficulty, Error, Mark, Mode, Session, Status, TicTacToe,
};

/// Play tic-tac-toe in the terminal, one command per line.
#[derive(Debug, Parser)]
#[command(name = "ttt-cli")]
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
}

const HELP: &str = "squares are 1-9 from the top left; \
    also: restart, mode pvp|computer, difficulty easy|hard, quit";

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let session = Session::new(args.mode, args.difficulty, rng);

    let ctx = SodiumCtx::new();

    let (kb_input, computer, game, _listeners) = ctx.transaction(|| {
        let mut listeners = Vec::new();

        let kb_input: StreamSink<String> = ctx.new_stream_sink();
        let computer: StreamSink<Command> = ctx.new_stream_sink();

        let parser = CommandParser::new(&kb_input.stream());
        let commands = parser.commands.or_else(&computer.stream());

        let game = TicTacToe::new(&ctx, &commands, session.clone());

        listeners.push(parser.error.listen(|err: &Error| println!("{}", err)));
        listeners.push(game.error.listen(|err: &Error| println!("{}", err)));

        listeners.push(game.moves.listen(|(index, mark): &(usize, Mark)| {
            println!("\n{}s took space {}:", mark, index + 1)
        }));

        listeners.push(game.session.updates().listen(|session: &Session| {
            println!("{}", session.board());
            println!("{}", session.status());
        }));

        listeners.push(game.outcome.listen(|status: &Status| {
            if let Some(winner) = status.winner() {
                println!("{} has won the game! type `restart` to play again", winner);
            } else {
                println!("nobody wins. type `restart` to play again");
            }
        }));

        (kb_input, computer, game, listeners)
    });

    let session = game.session.sample();
    println!("Welcome to Tic Tac Toe!");
    println!("{}\n", HELP);
    match session.mode() {
        Mode::PlayerVsPlayer => println!("Two players, X goes first.\n"),
        Mode::PlayerVsComputer => println!(
            "You are X against the {} computer.\n",
            session.difficulty()
        ),
    }
    println!("{}", session.board());

    let stdin = io::stdin().lock();
    for line in stdin.lines() {
        let line = line?;
        match line.trim() {
            "" => continue,
            "q" | "quit" | "exit" => break,
            "h" | "help" => {
                println!("{}", HELP);
                continue;
            }
            _ => {}
        }

        kb_input.send(line);
        if game.session.sample().computer_to_move() {
            computer.send(Command::ComputerMove);
        }
    }

    Ok(())
}
