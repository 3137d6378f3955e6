use crate::config::StoreConfig;
use crate::reply::Reply;
use crate::storage::Store;
use crate::value::Value;

#[derive(Debug, PartialEq)]
pub enum Command {
    Ping,
    Echo(String),
    Quit,
    Select(String),
    /// Any store command; the name is upper-cased.
    Call { name: String, args: Vec<String> },
}

/// Splits one REPL line into a command. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let name = parts.next()?.to_ascii_uppercase();
    let args: Vec<String> = parts.collect();

    let cmd = match name.as_str() {
        "PING" => Command::Ping,
        "ECHO" => Command::Echo(args.join(" ")),
        "QUIT" | "EXIT" => Command::Quit,
        "SELECT" if args.len() == 1 => Command::Select(args[0].clone()),
        _ => Command::Call { name, args },
    };
    Some(cmd)
}

/// A REPL session over a fixed set of numbered stores.
pub struct Session {
    databases: Vec<Store>,
    current: usize,
}

impl Session {
    /// `base` seeds database 0 only; the others start empty and are named
    /// `db1`, `db2`, ...
    pub fn new(base: StoreConfig, databases: usize) -> Self {
        let count = databases.max(1);
        let mut stores = Vec::with_capacity(count);
        let notifier = base.notifier.clone();
        let scheduler = base.scheduler.clone();
        stores.push(Store::with_config(base));

        for index in 1..count {
            let mut config = StoreConfig::new().with_name(format!("db{}", index));
            config.notifier = notifier.clone();
            config.scheduler = scheduler.clone();
            stores.push(Store::with_config(config));
        }

        Session {
            databases: stores,
            current: 0,
        }
    }

    pub fn store(&self) -> &Store {
        &self.databases[self.current]
    }

    pub fn database(&self, index: usize) -> Option<&Store> {
        self.databases.get(index)
    }

    /// Cancels every pending expiration in every database.
    pub fn die(&self) {
        for store in &self.databases {
            store.die();
        }
    }

    pub fn execute(&mut self, cmd: Command) -> Reply {
        match cmd {
            Command::Ping => Reply::Status("PONG".to_string()),
            Command::Echo(text) => Reply::Bulk(text),
            Command::Quit => Reply::Ok,
            Command::Select(index) => match index.parse::<usize>() {
                Ok(index) if index < self.databases.len() => {
                    self.current = index;
                    Reply::Ok
                }
                _ => Reply::error("ERR DB index is out of range"),
            },
            Command::Call { name, args } => self.call(&name, &args),
        }
    }

    fn call(&self, name: &str, args: &[String]) -> Reply {
        let store = self.store();
        let lower = name.to_ascii_lowercase();

        macro_rules! arity {
            ($ok:expr) => {
                if !($ok) {
                    return Reply::error(format!(
                        "ERR wrong number of arguments for '{}' command",
                        lower
                    ));
                }
            };
        }

        match name {
            // Keys
            "DEL" => {
                arity!(!args.is_empty());
                Reply::Integer(store.del(args) as i64)
            }
            "EXISTS" => {
                arity!(args.len() == 1);
                Reply::flag(store.exists(&args[0]))
            }
            "EXPIRE" => {
                arity!(args.len() == 2);
                match args[1].parse::<f64>() {
                    Ok(seconds) => Reply::flag(store.expire(&args[0], seconds)),
                    Err(_) => not_a_number(),
                }
            }
            "EXPIREAT" => {
                arity!(args.len() == 2);
                match args[1].parse::<i64>() {
                    Ok(timestamp) => Reply::flag(store.expireat(&args[0], timestamp)),
                    Err(_) => not_an_integer(),
                }
            }
            "KEYS" => {
                arity!(args.len() == 1);
                let mut keys = store.keys(&args[0]);
                keys.sort();
                Reply::from_strings(keys)
            }
            "MOVE" => {
                arity!(args.len() == 2);
                let target = args[1].parse::<usize>().ok().and_then(|i| self.database(i));
                match target {
                    Some(destination) => Reply::flag(store.move_key(&args[0], destination)),
                    None => Reply::error("ERR DB index is out of range"),
                }
            }
            "PERSIST" => {
                arity!(args.len() == 1);
                Reply::flag(store.persist(&args[0]))
            }
            "RANDOMKEY" => {
                arity!(args.is_empty());
                store.randomkey().map_or(Reply::Nil, Reply::Bulk)
            }
            "RENAME" => {
                arity!(args.len() == 2);
                if store.rename(&args[0], &args[1]) {
                    Reply::Ok
                } else {
                    Reply::error("ERR no such key")
                }
            }
            "RENAMENX" => {
                arity!(args.len() == 2);
                Reply::flag(store.renamenx(&args[0], &args[1]))
            }
            "TTL" => {
                arity!(args.len() == 1);
                Reply::Integer(store.ttl(&args[0]))
            }
            "TYPE" => {
                arity!(args.len() == 1);
                Reply::Status(store.type_of(&args[0]).to_string())
            }
            "SWAP" => {
                arity!(args.len() == 2);
                Reply::flag(store.swap(&args[0], &args[1]))
            }
            "DUMP" => {
                arity!(args.is_empty());
                Reply::from_hash(store.dump())
            }
            "FINDIN" => {
                arity!(args.len() == 2);
                match store.findin(&args[0], Value::from_token(&args[1])) {
                    Some(index) => Reply::Integer(index),
                    None => Reply::Nil,
                }
            }

            // Strings
            "APPEND" => {
                arity!(args.len() == 2);
                store
                    .append(&args[0], &args[1])
                    .map_or(Reply::Nil, |s| Reply::Integer(s.chars().count() as i64))
            }
            "DECR" => {
                arity!(args.len() == 1);
                store.decr(&args[0]).map_or_else(wrong_type, number)
            }
            "DECRBY" => {
                arity!(args.len() == 2);
                match args[1].parse::<f64>() {
                    Ok(delta) => store.decrby(&args[0], delta).map_or_else(wrong_type, number),
                    Err(_) => not_a_number(),
                }
            }
            "GET" => {
                arity!(args.len() == 1);
                Reply::from_value(store.get(&args[0]))
            }
            "GETRANGE" => {
                arity!(args.len() == 2 || args.len() == 3);
                let start = args[1].parse::<i64>();
                let end = args.get(2).map(|s| s.parse::<i64>()).transpose();
                match (start, end) {
                    (Ok(start), Ok(end)) => store
                        .getrange(&args[0], start, end)
                        .map_or(Reply::Nil, Reply::Bulk),
                    _ => not_an_integer(),
                }
            }
            "GETSET" => {
                arity!(args.len() == 2);
                store
                    .getset(&args[0], Value::from_token(&args[1]))
                    .map_or(Reply::Nil, Reply::Bulk)
            }
            "INCR" => {
                arity!(args.len() == 1);
                store.incr(&args[0]).map_or_else(wrong_type, number)
            }
            "INCRBY" => {
                arity!(args.len() == 2);
                match args[1].parse::<f64>() {
                    Ok(delta) => store.incrby(&args[0], delta).map_or_else(wrong_type, number),
                    Err(_) => not_a_number(),
                }
            }
            "MGET" => {
                arity!(!args.is_empty());
                Reply::Array(
                    store
                        .mget(args)
                        .into_iter()
                        .map(Reply::from_value)
                        .collect(),
                )
            }
            "MSET" => {
                arity!(!args.is_empty() && args.len() % 2 == 0);
                store.mset(token_pairs(args));
                Reply::Ok
            }
            "MSETNX" => {
                arity!(!args.is_empty() && args.len() % 2 == 0);
                Reply::flag(store.msetnx(token_pairs(args)))
            }
            "SET" => {
                arity!(args.len() == 2 || args.len() == 3);
                let ttl = args.get(2).map(|s| s.parse::<f64>()).transpose();
                match ttl {
                    Ok(ttl) => {
                        store.set(&args[0], Value::from_token(&args[1]), ttl);
                        Reply::Ok
                    }
                    Err(_) => not_a_number(),
                }
            }
            "SETNX" => {
                arity!(args.len() == 2);
                Reply::flag(store.setnx(&args[0], Value::from_token(&args[1]), None))
            }
            "SETRANGE" => {
                arity!(args.len() == 3);
                match args[1].parse::<usize>() {
                    Ok(offset) => store
                        .setrange(&args[0], offset, &args[2])
                        .map_or(Reply::Nil, |len| Reply::Integer(len as i64)),
                    Err(_) => not_an_integer(),
                }
            }
            "STRLEN" => {
                arity!(args.len() == 1);
                Reply::Integer(store.strlen(&args[0]).unwrap_or(0) as i64)
            }

            // Hashes
            "HDEL" => {
                arity!(args.len() >= 2);
                Reply::Integer(store.hdel(&args[0], &args[1..]) as i64)
            }
            "HEXISTS" => {
                arity!(args.len() == 2);
                Reply::flag(store.hexists(&args[0], &args[1]))
            }
            "HGET" => {
                arity!(args.len() == 2);
                Reply::from_value(store.hget(&args[0], &args[1]))
            }
            "HGETALL" => {
                arity!(args.len() == 1);
                Reply::from_hash(store.hgetall(&args[0]))
            }
            "HINCR" => {
                arity!(args.len() == 2);
                store.hincr(&args[0], &args[1]).map_or_else(wrong_type, number)
            }
            "HINCRBY" => {
                arity!(args.len() == 3);
                match args[2].parse::<f64>() {
                    Ok(delta) => store
                        .hincrby(&args[0], &args[1], delta)
                        .map_or_else(wrong_type, number),
                    Err(_) => not_a_number(),
                }
            }
            "HDECR" => {
                arity!(args.len() == 2);
                store.hdecr(&args[0], &args[1]).map_or_else(wrong_type, number)
            }
            "HDECRBY" => {
                arity!(args.len() == 3);
                match args[2].parse::<f64>() {
                    Ok(delta) => store
                        .hdecrby(&args[0], &args[1], delta)
                        .map_or_else(wrong_type, number),
                    Err(_) => not_a_number(),
                }
            }
            "HKEYS" => {
                arity!(args.len() == 1);
                let mut fields = store.hkeys(&args[0]);
                fields.sort();
                Reply::from_strings(fields)
            }
            "HLEN" => {
                arity!(args.len() == 1);
                Reply::Integer(store.hlen(&args[0]) as i64)
            }
            "HMGET" => {
                arity!(args.len() >= 2);
                Reply::Array(
                    store
                        .hmget(&args[0], &args[1..])
                        .into_iter()
                        .map(Reply::from_value)
                        .collect(),
                )
            }
            "HMSET" => {
                arity!(args.len() >= 3 && args.len() % 2 == 1);
                if store.hmset(&args[0], token_pairs(&args[1..])) {
                    Reply::Ok
                } else {
                    wrong_type()
                }
            }
            "HSET" => {
                arity!(args.len() == 3);
                match store.hset(&args[0], &args[1], Value::from_token(&args[2])) {
                    Some(existed) => Reply::flag(!existed),
                    None => wrong_type(),
                }
            }
            "HSETNX" => {
                arity!(args.len() == 3);
                Reply::flag(store.hsetnx(&args[0], &args[1], Value::from_token(&args[2])))
            }
            "HVALS" => {
                arity!(args.len() == 1);
                Reply::Array(
                    store
                        .hvals(&args[0])
                        .into_iter()
                        .map(|v| Reply::from_value(Some(v)))
                        .collect(),
                )
            }

            // Deliberately unimplemented.
            "OBJECT" | "SORT" | "GETBIT" | "SETBIT" | "SETEX" => {
                let err = match name {
                    "OBJECT" => store.object(args.first().map_or("", String::as_str)).err(),
                    "SORT" => store.sort(args.first().map_or("", String::as_str)).err(),
                    "GETBIT" => store.getbit("", 0).err(),
                    "SETBIT" => store.setbit("", 0, false).err(),
                    _ => store.setex("", 0.0, Value::Bool(false)).err(),
                };
                err.map_or(Reply::Ok, |e| Reply::error(format!("ERR {}", e)))
            }

            _ => {
                let mut line = vec![name.to_string()];
                line.extend(args.iter().cloned());
                Reply::error(format!("ERR unknown command '{}'", line.join(" ")))
            }
        }
    }
}

fn token_pairs(args: &[String]) -> Vec<(String, Value)> {
    args.chunks(2)
        .map(|pair| (pair[0].clone(), Value::from_token(&pair[1])))
        .collect()
}

fn number(value: f64) -> Reply {
    Reply::from_number(Some(value))
}

fn wrong_type() -> Reply {
    Reply::error("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn not_a_number() -> Reply {
    Reply::error("ERR value is not a valid number")
}

fn not_an_integer() -> Reply {
    Reply::error("ERR value is not an integer or out of range")
}
