//! Command handler backed by an LRU cache

use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

use lrucache::LruCache;
use tracing::{debug, info};

use crate::command::Command;
use crate::reply::Reply;

pub struct CommandHandler<K> {
    cache: LruCache<K, String>,
}

impl<K> CommandHandler<K>
where
    K: FromStr + Display + Hash + Eq + Clone + 'static,
{
    pub fn new(capacity: usize) -> lrucache::Result<Self> {
        let cache = LruCache::with_on_evict(capacity, |key: K, value: String| {
            info!(%key, bytes = value.len(), "evicted");
        })?;
        Ok(Self { cache })
    }

    pub fn handle(&mut self, cmd: Command) -> Reply {
        debug!(?cmd, "handling command");

        match cmd {
            Command::Set { key, value } => self.handle_set(&key, value),
            Command::Get(key) => self.handle_get(&key),
            Command::Peek(key) => self.handle_peek(&key),
            Command::Del(keys) => self.handle_del(&keys),
            Command::Exists(keys) => self.handle_exists(&keys),
            Command::Len => Reply::Integer(self.cache.len() as i64),
            Command::Keys => self.handle_keys(),
            Command::Stats => self.handle_stats(),
            Command::Clear => {
                self.cache.clear();
                Reply::ok()
            }
        }
    }

    fn handle_set(&mut self, raw: &str, value: String) -> Reply {
        match parse_key::<K>(raw) {
            Ok(key) => {
                self.cache.set(key, value);
                Reply::ok()
            }
            Err(e) => e,
        }
    }

    fn handle_get(&mut self, raw: &str) -> Reply {
        match parse_key::<K>(raw) {
            Ok(key) => Reply::Bulk(self.cache.get(&key).cloned()),
            Err(e) => e,
        }
    }

    fn handle_peek(&self, raw: &str) -> Reply {
        match parse_key::<K>(raw) {
            Ok(key) => Reply::Bulk(self.cache.peek(&key).cloned()),
            Err(e) => e,
        }
    }

    fn handle_del(&mut self, raws: &[String]) -> Reply {
        // Reject the whole command before touching the cache
        let keys = match parse_keys::<K>(raws) {
            Ok(keys) => keys,
            Err(e) => return e,
        };

        let deleted = keys
            .iter()
            .filter(|key| self.cache.remove(*key).is_some())
            .count();
        Reply::Integer(deleted as i64)
    }

    fn handle_exists(&self, raws: &[String]) -> Reply {
        let keys = match parse_keys::<K>(raws) {
            Ok(keys) => keys,
            Err(e) => return e,
        };

        let count = keys.iter().filter(|key| self.cache.contains(*key)).count();
        Reply::Integer(count as i64)
    }

    fn handle_keys(&self) -> Reply {
        Reply::Array(
            self.cache
                .keys()
                .map(|k| Reply::Bulk(Some(k.to_string())))
                .collect(),
        )
    }

    fn handle_stats(&self) -> Reply {
        let stats = self.cache.stats();
        let lines = [
            format!("len:{}", self.cache.len()),
            format!("capacity:{}", self.cache.capacity()),
            format!("hits:{}", stats.hits()),
            format!("misses:{}", stats.misses()),
            format!("hit_ratio:{:.2}", stats.hit_ratio()),
            format!("inserts:{}", stats.inserts()),
            format!("updates:{}", stats.updates()),
            format!("evictions:{}", stats.evictions()),
            format!("deletes:{}", stats.deletes()),
        ];
        Reply::Array(lines.into_iter().map(Reply::Simple).collect())
    }
}

fn parse_key<K: FromStr>(raw: &str) -> Result<K, Reply> {
    raw.parse()
        .map_err(|_| Reply::Error(format!("ERR invalid key '{}'", raw)))
}

fn parse_keys<K: FromStr>(raws: &[String]) -> Result<Vec<K>, Reply> {
    raws.iter().map(|raw| parse_key::<K>(raw)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<K>(handler: &mut CommandHandler<K>, line: &str) -> Reply
    where
        K: FromStr + Display + Hash + Eq + Clone + 'static,
    {
        let cmd = Command::parse(line).unwrap().unwrap();
        handler.handle(cmd)
    }

    #[test]
    fn test_set_and_get() {
        let mut handler = CommandHandler::<String>::new(4).unwrap();

        assert_eq!(run(&mut handler, "SET mykey myvalue"), Reply::ok());
        assert_eq!(
            run(&mut handler, "GET mykey"),
            Reply::Bulk(Some("myvalue".to_string()))
        );
        assert_eq!(run(&mut handler, "GET other"), Reply::Bulk(None));
    }

    #[test]
    fn test_u64_keys_reject_text() {
        let mut handler = CommandHandler::<u64>::new(4).unwrap();

        assert_eq!(
            run(&mut handler, "SET abc 1"),
            Reply::Error("ERR invalid key 'abc'".to_string())
        );
        assert_eq!(run(&mut handler, "SET 42 answer"), Reply::ok());
        assert_eq!(run(&mut handler, "EXISTS 42 7"), Reply::Integer(1));
    }

    #[test]
    fn test_eviction_and_keys() {
        let mut handler = CommandHandler::<u64>::new(2).unwrap();

        run(&mut handler, "SET 1 a");
        run(&mut handler, "SET 2 b");
        run(&mut handler, "GET 1");
        run(&mut handler, "SET 3 c");

        assert_eq!(
            run(&mut handler, "KEYS"),
            Reply::Array(vec![
                Reply::Bulk(Some("3".to_string())),
                Reply::Bulk(Some("1".to_string())),
            ])
        );
        assert_eq!(run(&mut handler, "LEN"), Reply::Integer(2));
    }

    #[test]
    fn test_del_counts_removed() {
        let mut handler = CommandHandler::<String>::new(4).unwrap();

        run(&mut handler, "SET a 1");
        run(&mut handler, "SET b 2");

        assert_eq!(run(&mut handler, "DEL a a c b"), Reply::Integer(2));
        assert_eq!(run(&mut handler, "LEN"), Reply::Integer(0));
    }

    #[test]
    fn test_peek_and_stats() {
        let mut handler = CommandHandler::<String>::new(1).unwrap();

        run(&mut handler, "SET a 1");
        run(&mut handler, "PEEK a");
        run(&mut handler, "SET b 2");

        match run(&mut handler, "STATS") {
            Reply::Array(lines) => {
                assert!(lines.contains(&Reply::Simple("evictions:1".to_string())));
                assert!(lines.contains(&Reply::Simple("hits:0".to_string())));
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        assert_eq!(run(&mut handler, "CLEAR"), Reply::ok());
        assert_eq!(run(&mut handler, "KEYS"), Reply::Array(vec![]));
    }

    #[test]
    fn test_del_invalid_key_is_atomic() {
        let mut handler = CommandHandler::<u64>::new(4).unwrap();

        run(&mut handler, "SET 1 a");

        assert_eq!(
            run(&mut handler, "DEL 1 abc"),
            Reply::Error("ERR invalid key 'abc'".to_string())
        );
        assert_eq!(run(&mut handler, "EXISTS 1"), Reply::Integer(1));
        assert_eq!(run(&mut handler, "LEN"), Reply::Integer(1));
    }

    #[test]
    fn test_invalid_key_leaves_cache_unchanged() {
        let mut handler = CommandHandler::<u64>::new(2).unwrap();

        run(&mut handler, "SET 1 a");
        run(&mut handler, "SET 2 b");

        for line in ["GET x", "PEEK x", "DEL 2 x", "EXISTS 1 x", "SET x c"] {
            assert_eq!(
                run(&mut handler, line),
                Reply::Error("ERR invalid key 'x'".to_string()),
                "command: {}",
                line
            );
        }

        // Order unchanged: nothing was promoted, removed or inserted
        assert_eq!(
            run(&mut handler, "KEYS"),
            Reply::Array(vec![
                Reply::Bulk(Some("2".to_string())),
                Reply::Bulk(Some("1".to_string())),
            ])
        );
        assert_eq!(run(&mut handler, "LEN"), Reply::Integer(2));
        match run(&mut handler, "STATS") {
            Reply::Array(lines) => {
                assert!(lines.contains(&Reply::Simple("hits:0".to_string())));
                assert!(lines.contains(&Reply::Simple("misses:0".to_string())));
                assert!(lines.contains(&Reply::Simple("deletes:0".to_string())));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_zero_capacity() {
        assert!(CommandHandler::<u64>::new(0).is_err());
    }
}
