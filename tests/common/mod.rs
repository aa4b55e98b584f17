//! Reference models shared by the integration tests.

#![allow(dead_code)] // each test binary uses a subset

use linvet::{Model, Operation};
use std::collections::HashMap;

/// Builds an operation record.
pub fn op<In, Out>(
    client_id: usize,
    input: In,
    call: i64,
    output: Out,
    ret: i64,
) -> Operation<In, Out> {
    Operation {
        client_id,
        input,
        call,
        output,
        ret,
    }
}

/// A single integer register: reads must observe the most recent write.
#[derive(Clone, Debug, PartialEq)]
pub struct Register(pub i64);

#[derive(Clone, Debug, PartialEq)]
pub enum RegisterOp {
    Write(i64),
    Read,
}

impl Model for Register {
    type In = RegisterOp;
    type Out = i64;

    fn init() -> Self {
        Register(0)
    }

    fn step(&self, input: &RegisterOp, output: &i64) -> Option<Self> {
        match input {
            RegisterOp::Write(value) => Some(Register(*value)),
            RegisterOp::Read if self.0 == *output => Some(self.clone()),
            RegisterOp::Read => None,
        }
    }

    fn equal(&self, other: &Self) -> bool {
        self == other
    }

    fn describe_operation(input: &RegisterOp, output: &i64) -> String {
        match input {
            RegisterOp::Write(value) => format!("write({})", value),
            RegisterOp::Read => format!("read() -> {}", output),
        }
    }

    fn describe_state(&self) -> String {
        self.0.to_string()
    }
}

/// A string key-value store partitioned by key. Each partition touches a
/// single key, so the state is just that key's value.
#[derive(Clone, Debug, PartialEq)]
pub struct Kv(pub String);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KvOp {
    Get,
    Put,
    Append,
}

#[derive(Clone, Debug)]
pub struct KvInput {
    pub op: KvOp,
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, Default)]
pub struct KvOutput {
    pub value: String,
}

/// A get input for `key`.
pub fn kv_get(key: &str) -> KvInput {
    KvInput {
        op: KvOp::Get,
        key: key.to_string(),
        value: String::new(),
    }
}

/// A put input storing `value` under `key`.
pub fn kv_put(key: &str, value: &str) -> KvInput {
    KvInput {
        op: KvOp::Put,
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// An append input extending `key` with `value`.
pub fn kv_append(key: &str, value: &str) -> KvInput {
    KvInput {
        op: KvOp::Append,
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// An output carrying `value` (gets) or nothing (puts and appends).
pub fn kv_out(value: &str) -> KvOutput {
    KvOutput {
        value: value.to_string(),
    }
}

impl Model for Kv {
    type In = KvInput;
    type Out = KvOutput;

    fn init() -> Self {
        Kv(String::new())
    }

    fn step(&self, input: &KvInput, output: &KvOutput) -> Option<Self> {
        match input.op {
            KvOp::Get => (output.value == self.0).then(|| self.clone()),
            KvOp::Put => Some(Kv(input.value.clone())),
            KvOp::Append => Some(Kv(format!("{}{}", self.0, input.value))),
        }
    }

    fn equal(&self, other: &Self) -> bool {
        self == other
    }

    fn partition(
        history: Vec<Operation<KvInput, KvOutput>>,
    ) -> Vec<Vec<Operation<KvInput, KvOutput>>> {
        // group by key, partitions ordered by first appearance
        let mut index_of: HashMap<String, usize> = HashMap::new();
        let mut partitions: Vec<Vec<Operation<KvInput, KvOutput>>> = Vec::new();
        for op in history {
            let at = *index_of.entry(op.input.key.clone()).or_insert_with(|| {
                partitions.push(Vec::new());
                partitions.len() - 1
            });
            partitions[at].push(op);
        }
        partitions
    }

    fn describe_operation(input: &KvInput, output: &KvOutput) -> String {
        match input.op {
            KvOp::Get => format!("get('{}') -> '{}'", input.key, output.value),
            KvOp::Put => format!("put('{}', '{}')", input.key, input.value),
            KvOp::Append => format!("append('{}', '{}')", input.key, input.value),
        }
    }

    fn describe_state(&self) -> String {
        self.0.clone()
    }
}
