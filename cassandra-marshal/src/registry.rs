use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::types::ColumnType;
use crate::value::{CqlTimestamp, InvalidTimeUuid, TimeUuid, GREGORIAN_OFFSET, TICKS_PER_MILLI};

/// Default number of distinct parsed symbols a registry remembers.
pub const DEFAULT_MEMO_CAPACITY: usize = 1024;

/// Resolves type hint symbols to column types and owns the process's
/// timeuuid generator.
///
/// A registry is built once and shared, typically behind an `Arc`, by every
/// statement which needs it. Lookups of compound symbols such as
/// `"map<text, int>"` are parsed once and memoised. Only symbols which parse
/// are memoised, and at most `memo_capacity` of them. Once the memo is full
/// new symbols are parsed on every lookup.
#[derive(Debug)]
pub struct TypeRegistry {
    aliases: FxHashMap<SmolStr, ColumnType>,
    memo: RwLock<FxHashMap<SmolStr, ColumnType>>,
    memo_capacity: usize,
    timeuuids: TimeUuidGenerator,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::with_generator(TimeUuidGenerator::new())
    }

    pub fn with_generator(timeuuids: TimeUuidGenerator) -> Self {
        let aliases = [
            ("string", ColumnType::Text),
            ("bool", ColumnType::Boolean),
            ("bytes", ColumnType::Blob),
        ]
        .into_iter()
        .map(|(symbol, ty)| (SmolStr::new_static(symbol), ty))
        .collect();
        TypeRegistry {
            aliases,
            memo: RwLock::new(FxHashMap::default()),
            memo_capacity: DEFAULT_MEMO_CAPACITY,
            timeuuids,
        }
    }

    pub fn with_memo_capacity(mut self, capacity: usize) -> Self {
        self.memo_capacity = capacity;
        self
    }

    /// Number of parsed symbols currently memoised.
    pub fn memoised(&self) -> usize {
        self.memo.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Register an additional symbol. Symbols are case insensitive.
    pub fn with_alias(mut self, symbol: &str, column_type: ColumnType) -> Self {
        self.aliases
            .insert(SmolStr::new(symbol.trim().to_ascii_lowercase()), column_type);
        self
    }

    /// The column type named by `symbol`, either a CQL type name (`"int"`,
    /// `"list<frozen<set<text>>>"`) or a registered alias.
    pub fn resolve(&self, symbol: &str) -> Option<ColumnType> {
        let key = SmolStr::new(symbol.trim().to_ascii_lowercase());
        if let Some(ty) = self.aliases.get(&key) {
            return Some(ty.clone());
        }
        if let Some(ty) = self
            .memo
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Some(ty.clone());
        }
        let ty = key.parse::<ColumnType>().ok()?;
        let mut memo = self.memo.write().unwrap_or_else(PoisonError::into_inner);
        if memo.len() < self.memo_capacity {
            trace!(symbol = %key, column_type = %ty, "memoising type symbol");
            memo.entry(key).or_insert_with(|| ty.clone());
        }
        Some(ty)
    }

    pub fn timeuuids(&self) -> &TimeUuidGenerator {
        &self.timeuuids
    }

    /// A new timeuuid for the current time.
    pub fn generate_timeuuid(&self) -> TimeUuid {
        self.timeuuids.generate()
    }

    pub fn timeuuid_from_timestamp(&self, timestamp: CqlTimestamp) -> Result<TimeUuid, InvalidTimeUuid> {
        self.timeuuids.from_timestamp(timestamp)
    }
}

/// Generates version 1 UUIDs from a fixed node id and clock sequence.
///
/// Generated timestamps strictly increase, so two uuids generated within the
/// same 100ns tick (or after the clock moves backwards) still differ and
/// sort in generation order.
#[derive(Debug)]
pub struct TimeUuidGenerator {
    node: [u8; 6],
    clock_seq: u16,
    last_ticks: AtomicU64,
}

impl Default for TimeUuidGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeUuidGenerator {
    /// A generator with a random node id, marked as not being a MAC address,
    /// and a random clock sequence.
    pub fn new() -> Self {
        let mut rng = rand::rng();
        let mut node: [u8; 6] = rand::Rng::random(&mut rng);
        node[0] |= 0x01;
        let clock_seq = rand::Rng::random::<u16>(&mut rng) & 0x3FFF;
        Self::with_node(node, clock_seq)
    }

    pub fn with_node(node: [u8; 6], clock_seq: u16) -> Self {
        TimeUuidGenerator {
            node,
            clock_seq: clock_seq & 0x3FFF,
            last_ticks: AtomicU64::new(0),
        }
    }

    pub fn node(&self) -> [u8; 6] {
        self.node
    }

    pub fn clock_seq(&self) -> u16 {
        self.clock_seq
    }

    pub fn generate(&self) -> TimeUuid {
        let now = Utc::now();
        let ticks = now
            .timestamp_nanos_opt()
            .map(|nanos| nanos / 100 + GREGORIAN_OFFSET)
            .unwrap_or_else(|| now.timestamp_millis() * TICKS_PER_MILLI + GREGORIAN_OFFSET)
            .max(0) as u64;
        let previous = self
            .last_ticks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(ticks.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        TimeUuid::from_parts(ticks.max(previous + 1), self.clock_seq, self.node)
    }

    /// A timeuuid for the start of the millisecond `timestamp` with this
    /// generator's node and clock sequence. Not guaranteed unique.
    pub fn from_timestamp(&self, timestamp: CqlTimestamp) -> Result<TimeUuid, InvalidTimeUuid> {
        let ticks = TimeUuid::ticks_for(timestamp)?;
        Ok(TimeUuid::from_parts(ticks, self.clock_seq, self.node))
    }
}
