//! In-memory stand-in for a Redis server, used by the unit tests.
//!
//! Each [`MemoryConnection`] tracks its own selected database the way a real
//! server connection does, so tests can observe which database every command
//! landed in.

use crate::client::KeyValueClient;
use crate::command::Command;
use crate::connection::{Connection, ManageConnection};
use crate::core::{
    config::PoolConfig,
    error::{ClientError, ClientResult},
    value::Value,
};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Logical databases a default server configuration provides
const DATABASES: i64 = 16;

#[derive(Debug, Clone)]
enum Entry {
    Text(String),
    Hash(Vec<(String, String)>),
    List(VecDeque<String>),
    SortedSet(Vec<(f64, String)>),
}

struct Failure {
    command: String,
    key: String,
    io: bool,
}

#[derive(Default)]
struct State {
    databases: HashMap<i64, HashMap<String, Entry>>,
    expiries: HashMap<(i64, String), i64>,
    log: Vec<(i64, String)>,
    published: Vec<(i64, String, String)>,
    failures: Vec<Failure>,
    insert_on_keys: Option<(i64, String)>,
    ping_fails: bool,
    ping_delay: Duration,
    connects: usize,
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn connects(&self) -> usize {
        self.lock().connects
    }

    pub(crate) fn set_ping_failure(&self, fails: bool) {
        self.lock().ping_fails = fails;
    }

    /// Delay every PING reply, to hold health checks open
    pub(crate) fn set_ping_delay(&self, delay: Duration) {
        self.lock().ping_delay = delay;
    }

    /// Make `command` on `key` fail with a transport error
    pub(crate) fn fail_with_io(&self, command: &str, key: &str) {
        self.add_failure(command, key, true);
    }

    /// Make `command` on `key` fail with a server error reply
    pub(crate) fn fail_with_reply(&self, command: &str, key: &str) {
        self.add_failure(command, key, false);
    }

    fn add_failure(&self, command: &str, key: &str, io: bool) {
        self.lock().failures.push(Failure {
            command: command.to_string(),
            key: key.to_string(),
            io,
        });
    }

    /// Insert `key` into `db` right after the next KEYS reply is built
    pub(crate) fn insert_on_keys(&self, db: i64, key: &str) {
        self.lock().insert_on_keys = Some((db, key.to_string()));
    }

    /// Every command run, with the database it ran against. SELECT, PING and
    /// AUTH are not recorded.
    pub(crate) fn commands(&self) -> Vec<(i64, String)> {
        self.lock().log.clone()
    }

    pub(crate) fn commands_named(&self, name: &str) -> Vec<(i64, String)> {
        let prefix = format!("{name} ");
        self.commands()
            .into_iter()
            .filter(|(_, line)| line == name || line.starts_with(&prefix))
            .collect()
    }

    pub(crate) fn set_string(&self, db: i64, key: &str, value: &str) {
        self.lock()
            .databases
            .entry(db)
            .or_default()
            .insert(key.to_string(), Entry::Text(value.to_string()));
    }

    pub(crate) fn contains(&self, db: i64, key: &str) -> bool {
        self.lock()
            .databases
            .get(&db)
            .is_some_and(|keys| keys.contains_key(key))
    }

    pub(crate) fn text(&self, db: i64, key: &str) -> Option<String> {
        match self.lock().databases.get(&db)?.get(key)? {
            Entry::Text(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub(crate) fn list(&self, db: i64, key: &str) -> Vec<String> {
        match self.lock().databases.get(&db).and_then(|keys| keys.get(key)) {
            Some(Entry::List(items)) => items.iter().cloned().collect(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn expiry(&self, db: i64, key: &str) -> Option<i64> {
        self.lock().expiries.get(&(db, key.to_string())).copied()
    }

    pub(crate) fn published(&self) -> Vec<(i64, String, String)> {
        self.lock().published.clone()
    }

    async fn ping(&self) -> ClientResult<Value> {
        let delay = self.lock().ping_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.lock().ping_fails {
            return Err(io_error("connection reset by peer"));
        }
        Ok(Value::Status("PONG".to_string()))
    }

    fn record(&self, db: i64, name: &str, args: &[String]) -> ClientResult<()> {
        let mut state = self.lock();
        let line = std::iter::once(name.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        state.log.push((db, line));

        let failure = state
            .failures
            .iter()
            .find(|f| f.command == name && args.first() == Some(&f.key));
        match failure {
            Some(f) if f.io => Err(io_error("broken pipe")),
            Some(_) => Err(reply_error("ERR", "injected failure")),
            None => Ok(()),
        }
    }

    fn pop_right(&self, db: i64, key: &str) -> ClientResult<Option<String>> {
        let mut state = self.lock();
        let keys = state.databases.entry(db).or_default();
        let popped = match keys.get_mut(key) {
            None => None,
            Some(Entry::List(items)) => items.pop_back(),
            Some(_) => return Err(wrong_type()),
        };
        if matches!(keys.get(key), Some(Entry::List(items)) if items.is_empty()) {
            keys.remove(key);
        }
        Ok(popped)
    }

    async fn blocking_pop_right(&self, db: i64, args: &[String]) -> ClientResult<Value> {
        let key = arg(args, 0)?;
        let seconds = int_arg(args, 1)?;
        let deadline = (seconds > 0).then(|| Instant::now() + Duration::from_secs(seconds as u64));

        loop {
            if let Some(value) = self.pop_right(db, key)? {
                return Ok(Value::Bulk(vec![data(key), data(&value)]));
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Ok(Value::Nil);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn apply(&self, db: i64, name: &str, args: &[String]) -> ClientResult<Value> {
        let mut guard = self.lock();
        let state = &mut *guard;
        let keys = state.databases.entry(db).or_default();

        match name {
            "GET" => match keys.get(arg(args, 0)?) {
                None => Ok(Value::Nil),
                Some(Entry::Text(value)) => Ok(data(value)),
                Some(_) => Err(wrong_type()),
            },
            "SET" => {
                keys.insert(arg(args, 0)?.clone(), Entry::Text(arg(args, 1)?.clone()));
                Ok(Value::Okay)
            }
            "EXISTS" => Ok(Value::Int(
                args.iter().filter(|key| keys.contains_key(*key)).count() as i64,
            )),
            "DEL" => {
                let removed = args.iter().filter(|key| keys.remove(*key).is_some()).count();
                Ok(Value::Int(removed as i64))
            }
            "KEYS" => {
                let pattern = arg(args, 0)?;
                let mut matches: Vec<&String> = keys
                    .keys()
                    .filter(|key| glob_match(pattern.as_bytes(), key.as_bytes()))
                    .collect();
                matches.sort();
                let reply = Value::Bulk(matches.into_iter().map(|key| data(key)).collect());

                if let Some((target, key)) = state.insert_on_keys.take() {
                    state
                        .databases
                        .entry(target)
                        .or_default()
                        .insert(key, Entry::Text("late".to_string()));
                }
                Ok(reply)
            }
            "EXPIRE" => {
                let key = arg(args, 0)?;
                if !keys.contains_key(key) {
                    return Ok(Value::Int(0));
                }
                let seconds = int_arg(args, 1)?;
                state.expiries.insert((db, key.clone()), seconds);
                Ok(Value::Int(1))
            }
            "HMSET" => {
                if args.len() < 3 || args.len() % 2 == 0 {
                    return Err(reply_error("ERR", "wrong number of arguments for 'hmset'"));
                }
                let entry = keys
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::Hash(Vec::new()));
                let Entry::Hash(fields) = entry else {
                    return Err(wrong_type());
                };
                for pair in args[1..].chunks(2) {
                    match fields.iter_mut().find(|(field, _)| *field == pair[0]) {
                        Some(existing) => existing.1 = pair[1].clone(),
                        None => fields.push((pair[0].clone(), pair[1].clone())),
                    }
                }
                Ok(Value::Okay)
            }
            "HGETALL" => match keys.get(arg(args, 0)?) {
                None => Ok(Value::Bulk(Vec::new())),
                Some(Entry::Hash(fields)) => Ok(Value::Bulk(
                    fields
                        .iter()
                        .flat_map(|(field, value)| [data(field), data(value)])
                        .collect(),
                )),
                Some(_) => Err(wrong_type()),
            },
            "LPUSH" => {
                let entry = keys
                    .entry(arg(args, 0)?.clone())
                    .or_insert_with(|| Entry::List(VecDeque::new()));
                let Entry::List(items) = entry else {
                    return Err(wrong_type());
                };
                for value in &args[1..] {
                    items.push_front(value.clone());
                }
                Ok(Value::Int(items.len() as i64))
            }
            "LLEN" | "LRANGE" | "LINDEX" | "LSET" | "LPOP" => {
                let key = arg(args, 0)?;
                let items = match keys.get_mut(key) {
                    None if name == "LSET" => return Err(reply_error("ERR", "no such key")),
                    None if name == "LRANGE" => return Ok(Value::Bulk(Vec::new())),
                    None if name == "LLEN" => return Ok(Value::Int(0)),
                    None => return Ok(Value::Nil),
                    Some(Entry::List(items)) => items,
                    Some(_) => return Err(wrong_type()),
                };
                let reply = match name {
                    "LLEN" => Value::Int(items.len() as i64),
                    "LRANGE" => {
                        let range = bounds(items.len(), int_arg(args, 1)?, int_arg(args, 2)?);
                        Value::Bulk(match range {
                            Some((start, stop)) => {
                                items.range(start..=stop).map(|item| data(item)).collect()
                            }
                            None => Vec::new(),
                        })
                    }
                    "LINDEX" => match index(items.len(), int_arg(args, 1)?) {
                        Some(i) => data(&items[i]),
                        None => Value::Nil,
                    },
                    "LSET" => match index(items.len(), int_arg(args, 1)?) {
                        Some(i) => {
                            items[i] = arg(args, 2)?.clone();
                            Value::Okay
                        }
                        None => return Err(reply_error("ERR", "index out of range")),
                    },
                    _ => match items.pop_front() {
                        Some(item) => data(&item),
                        None => Value::Nil,
                    },
                };
                if items.is_empty() {
                    keys.remove(key);
                }
                Ok(reply)
            }
            "ZADD" => {
                if args.len() < 3 || args.len() % 2 == 0 {
                    return Err(reply_error("ERR", "syntax error"));
                }
                let entry = keys
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::SortedSet(Vec::new()));
                let Entry::SortedSet(members) = entry else {
                    return Err(wrong_type());
                };
                let mut added = 0;
                for pair in args[1..].chunks(2) {
                    let score = float(&pair[0])?;
                    match members.iter_mut().find(|(_, member)| *member == pair[1]) {
                        Some(existing) => existing.0 = score,
                        None => {
                            members.push((score, pair[1].clone()));
                            added += 1;
                        }
                    }
                }
                members.sort_by(|a, b| {
                    a.0.partial_cmp(&b.0)
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| a.1.cmp(&b.1))
                });
                Ok(Value::Int(added))
            }
            "ZCARD" | "ZCOUNT" | "ZRANGEBYSCORE" | "ZREMRANGEBYSCORE" | "ZREMRANGEBYRANK" => {
                let key = arg(args, 0)?;
                let members = match keys.get_mut(key) {
                    None if name == "ZRANGEBYSCORE" => return Ok(Value::Bulk(Vec::new())),
                    None => return Ok(Value::Int(0)),
                    Some(Entry::SortedSet(members)) => members,
                    Some(_) => return Err(wrong_type()),
                };
                let reply = match name {
                    "ZCARD" => Value::Int(members.len() as i64),
                    "ZREMRANGEBYRANK" => {
                        match bounds(members.len(), int_arg(args, 1)?, int_arg(args, 2)?) {
                            Some((start, stop)) => {
                                members.drain(start..=stop);
                                Value::Int((stop - start + 1) as i64)
                            }
                            None => Value::Int(0),
                        }
                    }
                    _ => {
                        let (min, max) = (float(arg(args, 1)?)?, float(arg(args, 2)?)?);
                        let in_range = |score: f64| score >= min && score <= max;
                        match name {
                            "ZCOUNT" => Value::Int(
                                members.iter().filter(|(score, _)| in_range(*score)).count()
                                    as i64,
                            ),
                            "ZRANGEBYSCORE" => Value::Bulk(
                                members
                                    .iter()
                                    .filter(|(score, _)| in_range(*score))
                                    .map(|(_, member)| data(member))
                                    .collect(),
                            ),
                            _ => {
                                let before = members.len();
                                members.retain(|(score, _)| !in_range(*score));
                                Value::Int((before - members.len()) as i64)
                            }
                        }
                    }
                };
                if members.is_empty() {
                    keys.remove(key);
                }
                Ok(reply)
            }
            "PUBLISH" => {
                state
                    .published
                    .push((db, arg(args, 0)?.clone(), arg(args, 1)?.clone()));
                Ok(Value::Int(0))
            }
            other => Err(reply_error("ERR", &format!("unknown command '{other}'"))),
        }
    }
}

/// A connection to a [`MemoryStore`], with its own selected database
pub(crate) struct MemoryConnection {
    store: Arc<MemoryStore>,
    db: i64,
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn run(&mut self, command: &Command) -> ClientResult<Value> {
        let name = command.name().to_ascii_uppercase();
        let args: Vec<String> = command
            .args()
            .iter()
            .map(|arg| String::from_utf8_lossy(arg).into_owned())
            .collect();

        match name.as_str() {
            "SELECT" => {
                let db = int_arg(&args, 0)?;
                if !(0..DATABASES).contains(&db) {
                    return Err(reply_error("ERR", "DB index is out of range"));
                }
                self.db = db;
                Ok(Value::Okay)
            }
            "PING" => self.store.ping().await,
            "AUTH" => Ok(Value::Okay),
            "BRPOP" => {
                self.store.record(self.db, &name, &args)?;
                self.store.blocking_pop_right(self.db, &args).await
            }
            _ => {
                self.store.record(self.db, &name, &args)?;
                self.store.apply(self.db, &name, &args)
            }
        }
    }
}

pub(crate) struct MemoryManager {
    store: Arc<MemoryStore>,
}

impl MemoryManager {
    pub(crate) fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ManageConnection for MemoryManager {
    type Connection = MemoryConnection;

    async fn connect(&self) -> ClientResult<MemoryConnection> {
        self.store.lock().connects += 1;
        Ok(MemoryConnection {
            store: Arc::clone(&self.store),
            db: 0,
        })
    }
}

/// Client over a fresh in-memory store
pub(crate) fn client(config: PoolConfig) -> (KeyValueClient<MemoryManager>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let client = KeyValueClient::with_manager(MemoryManager::new(Arc::clone(&store)), config);
    (client, store)
}

fn data(s: &str) -> Value {
    Value::Data(s.as_bytes().to_vec())
}

fn io_error(msg: &str) -> ClientError {
    ClientError::Redis(io::Error::new(io::ErrorKind::BrokenPipe, msg.to_string()).into())
}

fn reply_error(code: &'static str, msg: &str) -> ClientError {
    ClientError::Redis((redis::ErrorKind::ResponseError, code, msg.to_string()).into())
}

fn wrong_type() -> ClientError {
    reply_error(
        "WRONGTYPE",
        "Operation against a key holding the wrong kind of value",
    )
}

fn arg(args: &[String], i: usize) -> ClientResult<&String> {
    args.get(i)
        .ok_or_else(|| reply_error("ERR", "wrong number of arguments"))
}

fn int_arg(args: &[String], i: usize) -> ClientResult<i64> {
    arg(args, i)?
        .parse()
        .map_err(|_| reply_error("ERR", "value is not an integer or out of range"))
}

fn float(value: &str) -> ClientResult<f64> {
    value
        .parse()
        .map_err(|_| reply_error("ERR", "value is not a valid float"))
}

fn index(len: usize, index: i64) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };
    (0..len).contains(&index).then_some(index as usize)
}

fn bounds(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    (start <= stop && start < len).then_some((start as usize, stop as usize))
}

fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.first(), text.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            glob_match(&pattern[1..], text) || (!text.is_empty() && glob_match(pattern, &text[1..]))
        }
        (Some(b'?'), Some(_)) => glob_match(&pattern[1..], &text[1..]),
        (Some(p), Some(t)) if p == t => glob_match(&pattern[1..], &text[1..]),
        _ => false,
    }
}
