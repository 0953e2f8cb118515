//! Line-oriented command parser
//!
//! One command per line: a case-insensitive verb followed by
//! whitespace-separated arguments. `SET` takes the rest of the line after
//! the key verbatim as the value, inner whitespace included.

/// Parsed shell command. Keys stay raw until the handler parses them for
/// the configured key type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// SET key value
    Set { key: String, value: String },
    /// GET key
    Get(String),
    /// PEEK key
    Peek(String),
    /// DEL key [key ...]
    Del(Vec<String>),
    /// EXISTS key [key ...]
    Exists(Vec<String>),
    /// LEN
    Len,
    /// KEYS
    Keys,
    /// STATS
    Stats,
    /// CLEAR
    Clear,
}

impl Command {
    /// Parse a single line.
    ///
    /// Returns `Ok(None)` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Result<Option<Command>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut parts = line.split_whitespace();
        let verb = match parts.next() {
            Some(v) => v.to_uppercase(),
            None => return Ok(None),
        };
        let args: Vec<&str> = parts.collect();

        let cmd = match verb.as_str() {
            "SET" => {
                if args.len() < 2 {
                    return Err(arity("set"));
                }
                let (_, rest) = split_token(line);
                let (key, value) = split_token(rest);
                Command::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                }
            }
            "GET" => Command::Get(single(&args, "get")?),
            "PEEK" => Command::Peek(single(&args, "peek")?),
            "DEL" => Command::Del(at_least_one(&args, "del")?),
            "EXISTS" => Command::Exists(at_least_one(&args, "exists")?),
            "LEN" => nullary(&args, "len", Command::Len)?,
            "KEYS" => nullary(&args, "keys", Command::Keys)?,
            "STATS" => nullary(&args, "stats", Command::Stats)?,
            "CLEAR" => nullary(&args, "clear", Command::Clear)?,
            _ => return Err(format!("ERR unknown command '{}'", verb)),
        };

        Ok(Some(cmd))
    }
}

/// Split off the first whitespace-delimited token, returning it and the
/// remainder with its leading whitespace removed.
fn split_token(s: &str) -> (&str, &str) {
    let mut parts = s.splitn(2, char::is_whitespace);
    let token = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim_start();
    (token, rest)
}

fn arity(name: &str) -> String {
    format!("ERR wrong number of arguments for '{}' command", name)
}

fn single(args: &[&str], name: &str) -> Result<String, String> {
    match args {
        [key] => Ok(key.to_string()),
        _ => Err(arity(name)),
    }
}

fn at_least_one(args: &[&str], name: &str) -> Result<Vec<String>, String> {
    if args.is_empty() {
        return Err(arity(name));
    }
    Ok(args.iter().map(|s| s.to_string()).collect())
}

fn nullary(args: &[&str], name: &str, cmd: Command) -> Result<Command, String> {
    if args.is_empty() {
        Ok(cmd)
    } else {
        Err(arity(name))
    }
}
