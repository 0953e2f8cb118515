//! Shell replies, rendered in the style of `redis-cli`

use std::fmt;

/// Reply to a single command
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Status line: OK
    Simple(String),
    /// Error: (error) ERR ...
    Error(String),
    /// Integer: (integer) 3
    Integer(i64),
    /// Value or (nil)
    Bulk(Option<String>),
    /// Numbered list
    Array(Vec<Reply>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Simple(s) => write!(f, "{}", s),
            Reply::Error(e) => write!(f, "(error) {}", e),
            Reply::Integer(i) => write!(f, "(integer) {}", i),
            Reply::Bulk(None) => write!(f, "(nil)"),
            Reply::Bulk(Some(s)) => write!(f, "{:?}", s),
            Reply::Array(items) if items.is_empty() => write!(f, "(empty array)"),
            Reply::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}) {}", i + 1, item)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_scalars() {
        assert_eq!(Reply::ok().to_string(), "OK");
        assert_eq!(Reply::Error("ERR boom".into()).to_string(), "(error) ERR boom");
        assert_eq!(Reply::Integer(3).to_string(), "(integer) 3");
        assert_eq!(Reply::Bulk(None).to_string(), "(nil)");
        assert_eq!(Reply::Bulk(Some("v".into())).to_string(), "\"v\"");
    }

    #[test]
    fn test_render_escapes_values() {
        let reply = Reply::Bulk(Some("say \"hi\"\nbye".into()));
        assert_eq!(reply.to_string(), r#""say \"hi\"\nbye""#);
    }

    #[test]
    fn test_render_array() {
        let reply = Reply::Array(vec![
            Reply::Bulk(Some("4".into())),
            Reply::Bulk(Some("3".into())),
        ]);
        assert_eq!(reply.to_string(), "1) \"4\"\n2) \"3\"");
        assert_eq!(Reply::Array(vec![]).to_string(), "(empty array)");
    }
}
