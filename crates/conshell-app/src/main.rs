//! Line-oriented console on stdin/stdout.
//!
//! Every stdin line is submitted to the engine; character reads take the
//! first character of the line. `QUIT` or end of input exits.
//! The config file comes from the first CLI argument or `CONSHELL_CONFIG`.

mod demo;
mod stdio_surface;

use std::cell::Cell;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};

use conshell_terminal::{Completion, Console, DefinitionSpec, Handler};
use conshell_types::config::ConsoleConfig;
use conshell_types::input::{SurfaceEvent, TextStyle};
use stdio_surface::StdioSurface;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    log::info!(
        "Starting conshell (echo {}, prompt {:?})",
        config.echo,
        config.prompt_prefix
    );

    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let mut console = Console::new(StdioSurface::new(stdout, color), config);
    demo::register(&mut console)?;

    let quit = Rc::new(Cell::new(false));
    let flag = Rc::clone(&quit);
    console.define(
        DefinitionSpec::new(
            "QUIT",
            Handler::custom(move |_| {
                flag.set(true);
                Ok(Completion::Done)
            }),
        )
        .description("Leaves the console"),
    )?;
    console.write_line("Type HELP for a list of commands.", &TextStyle::Plain);

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        console.surface_mut().mark_typed(&line);
        console.handle_event(SurfaceEvent::LineSubmit(line));
        if quit.get() {
            break;
        }
    }

    log::info!("Shutting down");
    console.dispose();
    Ok(())
}

fn load_config() -> Result<ConsoleConfig> {
    let path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os("CONSHELL_CONFIG"))
        .map(PathBuf::from);
    match path {
        Some(path) => ConsoleConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(ConsoleConfig::default()),
    }
}
