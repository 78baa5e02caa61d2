//! Scripted in-memory driver shared by the integration tests.
#![allow(dead_code)]

use crudkit::{
    Backoff, ConnectOptions, ConnectionError, ConnectionErrorKind, Connector, Driver,
    EngineConfig, Error, LogLevel, LogSink, QueryEngine, Result, Row, Value,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct State {
    statements: Vec<(String, Vec<Value>)>,
    results: VecDeque<Vec<Row>>,
    fail_statements: u32,
    fail_pings: u32,
    fail_connects: u32,
    fail_insert_ids: u32,
    fail_closes: u32,
    affected: u64,
    insert_id: u64,
    connects: u32,
    closes: u32,
    pings: u32,
    transactions: Vec<&'static str>,
}

fn gone_away() -> Error {
    Error::Connection(ConnectionError::new(
        ConnectionErrorKind::Disconnected,
        "MySQL server has gone away",
    ))
}

/// Handle for scripting and inspecting the fake database.
#[derive(Clone, Default)]
pub struct Script(Arc<Mutex<State>>);

impl Script {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.0.lock().expect("script lock")
    }

    /// Make the next `n` statements fail.
    pub fn fail_next(&self, n: u32) {
        self.state().fail_statements = n;
    }

    pub fn fail_pings(&self, n: u32) {
        self.state().fail_pings = n;
    }

    pub fn fail_connects(&self, n: u32) {
        self.state().fail_connects = n;
    }

    /// Make the next `n` insert id lookups fail after their INSERT ran.
    pub fn fail_insert_ids(&self, n: u32) {
        self.state().fail_insert_ids = n;
    }

    pub fn fail_closes(&self, n: u32) {
        self.state().fail_closes = n;
    }

    /// Queue the result set of a future query.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.state().results.push_back(rows);
    }

    pub fn set_affected(&self, affected: u64) {
        self.state().affected = affected;
    }

    pub fn set_insert_id(&self, id: u64) {
        self.state().insert_id = id;
    }

    /// SQL text of every statement that reached the driver.
    pub fn statements(&self) -> Vec<String> {
        self.state()
            .statements
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// SQL text and bound values of the last statement.
    pub fn last(&self) -> (String, Vec<Value>) {
        self.state()
            .statements
            .last()
            .cloned()
            .expect("no statement was run")
    }

    pub fn connects(&self) -> u32 {
        self.state().connects
    }

    pub fn closes(&self) -> u32 {
        self.state().closes
    }

    pub fn pings(&self) -> u32 {
        self.state().pings
    }

    pub fn transactions(&self) -> Vec<&'static str> {
        self.state().transactions.clone()
    }
}

pub struct ScriptedDriver(Script);

impl ScriptedDriver {
    #[allow(clippy::result_large_err)]
    fn record(&mut self, sql: &str, params: &[Value]) -> Result<()> {
        let mut state = self.0.state();
        state.statements.push((sql.to_string(), params.to_vec()));
        if state.fail_statements > 0 {
            state.fail_statements -= 1;
            return Err(gone_away());
        }
        Ok(())
    }
}

impl Driver for ScriptedDriver {
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.record(sql, params)?;
        Ok(self.0.state().results.pop_front().unwrap_or_default())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64> {
        self.record(sql, params)?;
        Ok(self.0.state().affected)
    }

    fn last_insert_id(&mut self) -> Result<u64> {
        let mut state = self.0.state();
        if state.fail_insert_ids > 0 {
            state.fail_insert_ids -= 1;
            return Err(gone_away());
        }
        Ok(state.insert_id)
    }

    fn ping(&mut self) -> Result<()> {
        let mut state = self.0.state();
        state.pings += 1;
        if state.fail_pings > 0 {
            state.fail_pings -= 1;
            return Err(gone_away());
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.0.state().transactions.push("begin");
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.0.state().transactions.push("commit");
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.0.state().transactions.push("rollback");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.0.state();
        state.closes += 1;
        if state.fail_closes > 0 {
            state.fail_closes -= 1;
            return Err(gone_away());
        }
        Ok(())
    }
}

pub struct ScriptedConnector(pub Script);

impl Connector for ScriptedConnector {
    type Driver = ScriptedDriver;

    fn connect(&self, _options: &ConnectOptions) -> Result<ScriptedDriver> {
        let mut state = self.0.state();
        state.connects += 1;
        if state.fail_connects > 0 {
            state.fail_connects -= 1;
            return Err(Error::Connection(ConnectionError::new(
                ConnectionErrorKind::Authentication,
                "Access denied for user 'app'@'localhost'",
            )));
        }
        Ok(ScriptedDriver(self.0.clone()))
    }
}

/// Captures every sink entry.
#[derive(Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<(LogLevel, String)>>>);

impl RecordingSink {
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.0.lock().expect("sink lock").clone()
    }

    pub fn at(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl LogSink for RecordingSink {
    fn log(&self, level: LogLevel, message: &str) {
        self.0
            .lock()
            .expect("sink lock")
            .push((level, message.to_string()));
    }
}

/// Counts waits instead of sleeping.
#[derive(Clone, Default)]
pub struct CountingBackoff(Arc<AtomicU32>);

impl CountingBackoff {
    pub fn waits(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

impl Backoff for CountingBackoff {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::from_secs(1)
    }

    fn wait(&self, _attempt: u32) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub engine: QueryEngine<ScriptedConnector>,
    pub script: Script,
    pub sink: RecordingSink,
    pub backoff: CountingBackoff,
}

pub fn options() -> ConnectOptions {
    ConnectOptions::new("localhost", "shop", "app", "secret")
}

pub fn harness(config: EngineConfig) -> Harness {
    let script = Script::default();
    let sink = RecordingSink::default();
    let backoff = CountingBackoff::default();
    let engine = QueryEngine::init(ScriptedConnector(script.clone()), options(), config)
        .expect("init scripted engine")
        .with_sink(sink.clone())
        .with_backoff(backoff.clone());
    Harness {
        engine,
        script,
        sink,
        backoff,
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::new(
        pairs.iter().map(|(name, _)| (*name).to_string()).collect(),
        pairs.iter().map(|(_, value)| value.clone()).collect(),
    )
}
