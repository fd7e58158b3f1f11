//! Command handler for the shell

use recache::LruCache;
use tracing::debug;

use crate::reply::Reply;

pub struct CommandHandler {
    cache: LruCache<String, String>,
}

impl CommandHandler {
    pub fn new(cache: LruCache<String, String>) -> Self {
        Self { cache }
    }

    /// Handle one input line; blank lines and `#` comments yield no reply
    pub fn handle(&mut self, line: &str) -> Option<Reply> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let args: Vec<&str> = line.split_whitespace().collect();
        let name = args[0];
        let command = name.to_uppercase();
        let args = &args[1..];

        let reply = match command.as_str() {
            "PING" => self.handle_ping(args),
            "SET" => self.handle_set(args),
            "GET" => self.handle_get(args),
            "PEEK" => self.handle_peek(args),
            "DEL" => self.handle_del(args),
            "EXISTS" => self.handle_exists(args),
            "LEN" => self.handle_len(args),
            "KEYS" => self.handle_keys(args),
            "DUMP" => Reply::Value(self.cache.to_string()),
            "STATS" => self.handle_stats(),
            "FLUSH" => {
                self.cache.clear();
                Reply::ok()
            }
            "QUIT" | "EXIT" => Reply::Quit,
            _ => Reply::Error(format!("ERR unknown command '{}'", name)),
        };
        Some(reply)
    }

    fn handle_ping(&self, args: &[&str]) -> Reply {
        if args.is_empty() {
            Reply::Status("PONG".to_string())
        } else {
            Reply::Value(args.join(" "))
        }
    }

    fn handle_set(&mut self, args: &[&str]) -> Reply {
        if args.len() < 2 {
            return Reply::wrong_arity("SET");
        }

        // Values may contain spaces
        let key = args[0].to_string();
        let value = args[1..].join(" ");
        match self.cache.set(key, value) {
            Some((evicted, _)) => {
                debug!(key = %evicted, "evicted");
                Reply::Status(format!("OK (evicted {})", evicted))
            }
            None => Reply::ok(),
        }
    }

    fn handle_get(&mut self, args: &[&str]) -> Reply {
        if args.len() != 1 {
            return Reply::wrong_arity("GET");
        }

        match self.cache.get(args[0]) {
            Some(value) => Reply::Value(value.clone()),
            None => Reply::Nil,
        }
    }

    fn handle_peek(&self, args: &[&str]) -> Reply {
        if args.len() != 1 {
            return Reply::wrong_arity("PEEK");
        }

        match self.cache.peek(args[0]) {
            Some(value) => Reply::Value(value.clone()),
            None => Reply::Nil,
        }
    }

    fn handle_del(&mut self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::wrong_arity("DEL");
        }

        let deleted = args
            .iter()
            .filter(|key| self.cache.remove(**key).is_some())
            .count();
        Reply::Integer(deleted)
    }

    fn handle_exists(&self, args: &[&str]) -> Reply {
        if args.is_empty() {
            return Reply::wrong_arity("EXISTS");
        }

        let count = args.iter().filter(|key| self.cache.contains(**key)).count();
        Reply::Integer(count)
    }

    fn handle_len(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return Reply::wrong_arity("LEN");
        }
        Reply::Integer(self.cache.len())
    }

    fn handle_keys(&self, args: &[&str]) -> Reply {
        if !args.is_empty() {
            return Reply::wrong_arity("KEYS");
        }
        if self.cache.is_empty() {
            return Reply::Status("(empty)".to_string());
        }

        let keys: Vec<&str> = self.cache.keys().map(String::as_str).collect();
        Reply::Value(keys.join(" "))
    }

    fn handle_stats(&self) -> Reply {
        let stats = self.cache.stats();
        Reply::Value(format!(
            "hits={} misses={} evictions={} hit_ratio={:.2}",
            stats.hits(),
            stats.misses(),
            stats.evictions(),
            stats.hit_ratio(),
        ))
    }
}
