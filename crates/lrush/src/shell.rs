//! Read-eval-print loop over any line source

use std::fmt::Display;
use std::hash::Hash;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use tracing::warn;

use crate::command::Command;
use crate::handler::CommandHandler;
use crate::reply::Reply;

/// Execute every command from `input`, writing one reply per command to
/// `output`. Returns the number of commands executed.
pub fn run<K, R, W>(handler: &mut CommandHandler<K>, input: R, output: &mut W) -> io::Result<usize>
where
    K: FromStr + Display + Hash + Eq + Clone + 'static,
    R: BufRead,
    W: Write,
{
    let mut executed = 0;

    for (lineno, line) in input.lines().enumerate() {
        let line = line?;
        let reply = match Command::parse(&line) {
            Ok(Some(cmd)) => {
                executed += 1;
                handler.handle(cmd)
            }
            Ok(None) => continue,
            Err(e) => {
                warn!(line = lineno + 1, "Parse error: {}", e);
                Reply::Error(e)
            }
        };
        writeln!(output, "{}", reply)?;
    }

    output.flush()?;
    Ok(executed)
}
