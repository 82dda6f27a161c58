//! Interactive session: reads commands from stdin while the engine keeps ticking.

use anyhow::Context;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use weather_core::{Engine, Update};

use crate::render;

const HELP: &str = "\
Type a city and press Enter to look it up. A blank line repeats the last input.
  :r N   look up history entry N again
  :h     show recent searches
  :t     toggle dark/light theme
  :q     quit";

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Query(&'a str),
    Resubmit,
    Replay(usize),
    History,
    Theme,
    Help,
    Quit,
    Unknown(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line {
            "" => Input::Resubmit,
            ":q" | ":quit" => Input::Quit,
            ":t" | ":theme" => Input::Theme,
            ":h" | ":history" => Input::History,
            ":?" | ":help" => Input::Help,
            _ => {
                if let Some(arg) = line.strip_prefix(":r") {
                    // history is shown 1-based
                    match arg.trim().parse::<usize>() {
                        Ok(n) if n > 0 => Input::Replay(n - 1),
                        _ => Input::Unknown(line),
                    }
                } else if line.starts_with(':') {
                    Input::Unknown(line)
                } else {
                    Input::Query(line)
                }
            }
        }
    }
}

pub async fn run(mut engine: Engine) -> anyhow::Result<()> {
    engine.start_clock();
    println!("{HELP}\n");
    prompt(&engine)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };

                match Input::parse(&line) {
                    Input::Quit => break,
                    Input::Query(city) => {
                        engine.set_input(city);
                        engine.submit_lookup(None);
                        println!("{}", render::render_state(engine.state()));
                    }
                    Input::Resubmit => {
                        engine.submit_lookup(None);
                        println!("{}", render::render_state(engine.state()));
                    }
                    Input::Replay(index) => {
                        if engine.replay(index).is_none() {
                            println!("No history entry {}.", index + 1);
                        } else {
                            println!("{}", render::render_state(engine.state()));
                        }
                    }
                    Input::History => {
                        if engine.state().history.is_empty() {
                            println!("No recent searches.");
                        } else {
                            print!("{}", render::render_history(engine.state()));
                        }
                    }
                    Input::Theme => {
                        engine.toggle_theme();
                    }
                    Input::Help => println!("{HELP}"),
                    Input::Unknown(cmd) => {
                        println!("Unknown command '{cmd}'. Type :help for commands.");
                    }
                }
                prompt(&engine)?;
            }
            update = engine.next_update() => {
                match update {
                    Update::LookupSucceeded { .. } | Update::LookupFailed { .. } => {
                        println!();
                        println!("{}", render::render_state(engine.state()));
                        prompt(&engine)?;
                    }
                    Update::Discarded { seq } => {
                        tracing::debug!(seq, "superseded lookup finished");
                    }
                    Update::Clock | Update::Ignored => {}
                }
            }
        }
    }

    engine.shutdown().await;
    Ok(())
}

fn prompt(engine: &Engine) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "{} > ", render::render_header(engine.state()))?;
    stdout.flush().context("Failed to flush stdout")
}
