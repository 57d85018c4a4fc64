//! Mock accounting API for testing.
//!
//! A small in-memory company that behaves like the provider where the
//! workflow depends on it:
//! - Ids are assigned on create, `SyncToken` starts at `"0"`
//! - Sparse updates require the current `SyncToken` and bump it
//! - Invoice `TotalAmt`/`Balance` are computed from lines and payments
//! - Query statements are interpreted (projection, `=`/`like` filters,
//!   `STARTPOSITION`, `MAXRESULTS`)
//!
//! Calls are recorded and errors can be injected.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::accounting::EntityKind;
use crate::ports::{AccountingApi, AccountingApiError, ApiScope, QueryResponse};

/// Which endpoint a recorded call hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Query,
    Read,
    Write,
}

/// Recorded call for assertions.
#[derive(Debug, Clone)]
pub struct ApiCall {
    pub method: ApiMethod,
    pub entity: Option<EntityKind>,
    pub access_token: String,
    /// Statement, entity id or request body.
    pub detail: String,
}

struct WriteFailure {
    entity: EntityKind,
    needle: String,
    error: AccountingApiError,
}

#[derive(Default)]
struct MockState {
    tables: HashMap<EntityKind, BTreeMap<String, Map<String, Value>>>,
    /// Amount applied to each invoice by recorded payments.
    paid: HashMap<String, f64>,
    next_id: u64,
    calls: Vec<ApiCall>,
    next_error: Option<AccountingApiError>,
    write_failures: Vec<WriteFailure>,
}

/// Stateful mock implementation of `AccountingApi`.
#[derive(Default)]
pub struct MockAccountingApi {
    inner: Mutex<MockState>,
}

impl MockAccountingApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Stores an entity as if created remotely; returns its Id.
    pub fn seed(&self, entity: EntityKind, record: Value) -> String {
        let mut state = self.state();
        let record = match record {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        state.insert_new(entity, record)
    }

    /// Merges `changes` into a stored entity and bumps its SyncToken, as an
    /// edit made directly in the provider would. Returns false if absent.
    pub fn edit(&self, entity: EntityKind, id: &str, changes: Value) -> bool {
        let mut state = self.state();
        let Some(stored) = state.table(entity).get_mut(id) else {
            return false;
        };
        if let Value::Object(changes) = changes {
            stored.extend(changes);
        }
        let next = stored
            .get("SyncToken")
            .and_then(Value::as_str)
            .and_then(|token| token.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        stored.insert("SyncToken".to_string(), Value::String(next.to_string()));
        if entity == EntityKind::Invoice {
            state.recompute_invoice(id);
        }
        true
    }

    /// Fails the next call of any kind.
    pub fn fail_next(&self, error: AccountingApiError) {
        self.state().next_error = Some(error);
    }

    /// Fails every write of `entity` whose body contains `needle`.
    pub fn fail_writes_containing(
        &self,
        entity: EntityKind,
        needle: impl Into<String>,
        error: AccountingApiError,
    ) {
        self.state().write_failures.push(WriteFailure {
            entity,
            needle: needle.into(),
            error,
        });
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.write_failures.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    /// Current stored copy of an entity.
    pub fn get(&self, entity: EntityKind, id: &str) -> Option<Value> {
        self.state()
            .tables
            .get(&entity)
            .and_then(|table| table.get(id))
            .cloned()
            .map(Value::Object)
    }

    pub fn count(&self, entity: EntityKind) -> usize {
        self.state().tables.get(&entity).map_or(0, BTreeMap::len)
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    pub fn writes_of(&self, entity: EntityKind) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.method == ApiMethod::Write && call.entity == Some(entity))
            .count()
    }
}

impl MockState {
    fn record(&mut self, method: ApiMethod, entity: Option<EntityKind>, token: &str, detail: String) {
        self.calls.push(ApiCall {
            method,
            entity,
            access_token: token.to_string(),
            detail,
        });
    }

    fn table(&mut self, entity: EntityKind) -> &mut BTreeMap<String, Map<String, Value>> {
        self.tables.entry(entity).or_default()
    }

    fn insert_new(&mut self, entity: EntityKind, mut record: Map<String, Value>) -> String {
        self.next_id += 1;
        let id = self.next_id.to_string();
        record.insert("Id".to_string(), Value::String(id.clone()));
        record
            .entry("SyncToken".to_string())
            .or_insert_with(|| Value::String("0".to_string()));
        self.table(entity).insert(id.clone(), record);
        id
    }

    fn create(
        &mut self,
        entity: EntityKind,
        mut record: Map<String, Value>,
    ) -> Result<Value, AccountingApiError> {
        record.remove("Id");
        record.remove("SyncToken");

        match entity {
            EntityKind::Invoice => number_lines(&mut record),
            EntityKind::Payment => {
                for (invoice_id, amount) in linked_invoices(&record) {
                    if !self.table(EntityKind::Invoice).contains_key(&invoice_id) {
                        return Err(bad_request(format!(
                            "Invalid Reference Id: Invoice {}",
                            invoice_id
                        )));
                    }
                    *self.paid.entry(invoice_id).or_default() += amount;
                }
            }
            _ => {}
        }

        let id = self.insert_new(entity, record);
        if entity == EntityKind::Payment {
            self.recompute_invoices();
        } else if entity == EntityKind::Invoice {
            self.recompute_invoice(&id);
        }
        self.stored(entity, &id)
    }

    fn sparse_update(
        &mut self,
        entity: EntityKind,
        changes: Map<String, Value>,
    ) -> Result<Value, AccountingApiError> {
        let id = changes
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| bad_request("Sparse update requires Id"))?
            .to_string();
        let stored = self
            .table(entity)
            .get_mut(&id)
            .ok_or_else(|| bad_request(format!("Object Not Found: {} {}", entity, id)))?;

        let current = stored
            .get("SyncToken")
            .and_then(Value::as_str)
            .unwrap_or("0")
            .to_string();
        if changes.get("SyncToken").and_then(Value::as_str) != Some(current.as_str()) {
            return Err(bad_request(format!(
                "Stale Object Error: You and someone else edited {} {}",
                entity, id
            )));
        }

        for (key, value) in changes {
            if key != "sparse" && key != "SyncToken" {
                stored.insert(key, value);
            }
        }
        let next = current.parse::<u64>().unwrap_or(0) + 1;
        stored.insert("SyncToken".to_string(), Value::String(next.to_string()));

        if entity == EntityKind::Invoice {
            self.recompute_invoice(&id);
        }
        self.stored(entity, &id)
    }

    fn stored(&mut self, entity: EntityKind, id: &str) -> Result<Value, AccountingApiError> {
        self.table(entity)
            .get(id)
            .cloned()
            .map(Value::Object)
            .ok_or_else(|| not_found(entity, id))
    }

    fn recompute_invoices(&mut self) {
        let ids: Vec<String> = self.table(EntityKind::Invoice).keys().cloned().collect();
        for id in ids {
            self.recompute_invoice(&id);
        }
    }

    fn recompute_invoice(&mut self, id: &str) {
        let paid = self.paid.get(id).copied().unwrap_or(0.0);
        if let Some(invoice) = self.table(EntityKind::Invoice).get_mut(id) {
            let total: f64 = invoice
                .get("Line")
                .and_then(Value::as_array)
                .map(|lines| {
                    lines
                        .iter()
                        .filter_map(|line| line.get("Amount").and_then(Value::as_f64))
                        .sum()
                })
                .unwrap_or(0.0);
            invoice.insert("TotalAmt".to_string(), Value::from(total));
            invoice.insert("Balance".to_string(), Value::from((total - paid).max(0.0)));
        }
    }

    fn run_query(&mut self, statement: &str) -> Result<QueryResponse, AccountingApiError> {
        let parsed = ParsedQuery::parse(statement)
            .ok_or_else(|| bad_request(format!("QueryParserError: {}", statement)))?;

        let rows: Vec<Value> = self
            .table(parsed.entity)
            .values()
            .filter(|record| parsed.conditions.iter().all(|c| c.matches(record)))
            .skip(parsed.start_position.saturating_sub(1))
            .take(parsed.max_results.unwrap_or(usize::MAX))
            .map(|record| parsed.project(record))
            .collect();

        if rows.is_empty() {
            return Ok(QueryResponse::new(Map::new()));
        }
        Ok(QueryResponse::with_rows(parsed.entity, rows))
    }
}

fn number_lines(record: &mut Map<String, Value>) {
    if let Some(Value::Array(lines)) = record.get_mut("Line") {
        for (index, line) in lines.iter_mut().enumerate() {
            if let Value::Object(line) = line {
                line.entry("Id".to_string())
                    .or_insert_with(|| Value::String((index + 1).to_string()));
            }
        }
    }
}

/// `(invoice id, amount)` for each `LinkedTxn` of type Invoice.
fn linked_invoices(payment: &Map<String, Value>) -> Vec<(String, f64)> {
    let lines = payment
        .get("Line")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut links = Vec::new();
    for line in lines {
        let amount = line.get("Amount").and_then(Value::as_f64).unwrap_or(0.0);
        let txns = line
            .get("LinkedTxn")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for txn in txns {
            if txn.get("TxnType").and_then(Value::as_str) == Some("Invoice") {
                if let Some(id) = txn.get("TxnId").and_then(Value::as_str) {
                    links.push((id.to_string(), amount));
                }
            }
        }
    }
    links
}

fn bad_request(body: impl Into<String>) -> AccountingApiError {
    AccountingApiError::Status {
        status: 400,
        body: body.into(),
    }
}

fn not_found(entity: EntityKind, id: &str) -> AccountingApiError {
    AccountingApiError::Status {
        status: 404,
        body: format!("Object Not Found: {} {}", entity, id),
    }
}

struct Condition {
    field: String,
    op: String,
    value: String,
}

impl Condition {
    fn parse(text: &str) -> Option<Self> {
        let (field, rest) = text.trim().split_once(' ')?;
        let (op, value) = rest.trim().split_once(' ')?;
        let value = value.trim();
        let value = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .unwrap_or(value)
            .replace("%25", "%");
        Some(Self {
            field: field.to_string(),
            op: op.to_lowercase(),
            value,
        })
    }

    fn matches(&self, record: &Map<String, Value>) -> bool {
        let actual = match record.get(&self.field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Object(obj)) => match obj.get("Address").and_then(Value::as_str) {
                Some(address) => address.to_string(),
                None => return false,
            },
            _ => return false,
        };

        match self.op.as_str() {
            "=" => actual == self.value,
            "like" => like(&actual, &self.value),
            _ => false,
        }
    }
}

/// `%` wildcards only, case-insensitive like the provider.
fn like(actual: &str, pattern: &str) -> bool {
    let actual = actual.to_lowercase();
    let pattern = pattern.to_lowercase();
    let parts: Vec<&str> = pattern.split('%').collect();
    if parts.len() == 1 {
        return actual == pattern;
    }

    let mut rest = actual.as_str();
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if index == 0 {
            match rest.strip_prefix(part) {
                Some(tail) => rest = tail,
                None => return false,
            }
        } else if index == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

struct ParsedQuery {
    fields: Option<Vec<String>>,
    entity: EntityKind,
    conditions: Vec<Condition>,
    start_position: usize,
    max_results: Option<usize>,
}

impl ParsedQuery {
    fn parse(statement: &str) -> Option<Self> {
        let rest = statement.trim().strip_prefix("select ")?;
        let (fields, rest) = rest.split_once(" from ")?;
        let (entity, mut rest) = rest.split_once(' ').unwrap_or((rest, ""));
        let entity = EntityKind::from_name(entity)?;

        let mut max_results = None;
        if let Some((head, count)) = rest.rsplit_once("MAXRESULTS ") {
            max_results = Some(count.trim().parse().ok()?);
            rest = head;
        }
        let mut start_position = 1;
        if let Some((head, start)) = rest.rsplit_once("STARTPOSITION ") {
            start_position = start.trim().parse().ok()?;
            rest = head;
        }

        let conditions = match rest.trim().strip_prefix("where ") {
            Some(clause) => clause
                .split(" AND ")
                .map(Condition::parse)
                .collect::<Option<Vec<_>>>()?,
            None if rest.trim().is_empty() => Vec::new(),
            None => return None,
        };

        let fields = match fields.trim() {
            "*" => None,
            list => Some(list.split(',').map(|f| f.trim().to_string()).collect()),
        };

        Some(Self {
            fields,
            entity,
            conditions,
            start_position,
            max_results,
        })
    }

    fn project(&self, record: &Map<String, Value>) -> Value {
        match &self.fields {
            None => Value::Object(record.clone()),
            Some(fields) => Value::Object(
                fields
                    .iter()
                    .filter_map(|f| record.get(f).map(|v| (f.clone(), v.clone())))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl AccountingApi for MockAccountingApi {
    async fn query(
        &self,
        scope: ApiScope<'_>,
        statement: &str,
    ) -> Result<QueryResponse, AccountingApiError> {
        let mut state = self.state();
        let entity = ParsedQuery::parse(statement).map(|q| q.entity);
        state.record(ApiMethod::Query, entity, scope.access_token, statement.to_string());
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        state.run_query(statement)
    }

    async fn read(
        &self,
        scope: ApiScope<'_>,
        entity: EntityKind,
        id: &str,
    ) -> Result<Value, AccountingApiError> {
        let mut state = self.state();
        state.record(ApiMethod::Read, Some(entity), scope.access_token, id.to_string());
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        state.stored(entity, id)
    }

    async fn write(
        &self,
        scope: ApiScope<'_>,
        entity: EntityKind,
        body: &Value,
    ) -> Result<Value, AccountingApiError> {
        let mut state = self.state();
        let detail = body.to_string();
        state.record(ApiMethod::Write, Some(entity), scope.access_token, detail.clone());
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        if let Some(failure) = state
            .write_failures
            .iter()
            .find(|f| f.entity == entity && detail.contains(&f.needle))
        {
            return Err(failure.error.clone());
        }

        let record = match body {
            Value::Object(map) => map.clone(),
            _ => return Err(bad_request("Request body must be an object")),
        };
        if record.get("sparse") == Some(&Value::Bool(true)) {
            state.sparse_update(entity, record)
        } else {
            state.create(entity, record)
        }
    }
}
