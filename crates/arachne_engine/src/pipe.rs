//! Data pipes: ordered buffers between actions or task boundaries.
//!
//! Order contract: producers push to the tail, consumers pop from the tail.
//! The buffer is deliberately last-in-first-out; tests elsewhere rely on
//! tail-pop (an xpath multi-match is observed in reverse document order).

use arachne_protocol::{Item, TaskPromise, Value};
use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

/// What a pipe can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum PipeValue {
    Value(Value),
    Item(Item),
    Promise(TaskPromise),
}

impl PipeValue {
    pub fn type_name(&self) -> String {
        match self {
            PipeValue::Value(v) => format!("value:{}", v.type_name()),
            PipeValue::Item(_) => "item".to_string(),
            PipeValue::Promise(_) => "promise".to_string(),
        }
    }
}

impl From<Value> for PipeValue {
    fn from(v: Value) -> Self {
        PipeValue::Value(v)
    }
}

impl From<Item> for PipeValue {
    fn from(i: Item) -> Self {
        PipeValue::Item(i)
    }
}

impl From<TaskPromise> for PipeValue {
    fn from(p: TaskPromise) -> Self {
        PipeValue::Promise(p)
    }
}

/// Pipes are shared between the task and the actions they connect; a task is
/// single-threaded, so `Rc<RefCell<_>>` is the ownership model.
pub type DataPipeRef = Rc<RefCell<DataPipe>>;

/// An ordered buffer with optional producer/consumer endpoint links.
///
/// A pipe with no `from_action` is a task input; with no `to_action` it is a
/// task output. Endpoints are recorded as action UUIDs so the graph stays
/// acyclic in memory.
#[derive(Debug)]
pub struct DataPipe {
    pub uuid: Uuid,
    pub from_action: Option<Uuid>,
    pub to_action: Option<Uuid>,
    queue: Vec<PipeValue>,
}

impl DataPipe {
    pub fn new() -> DataPipeRef {
        Rc::new(RefCell::new(Self {
            uuid: Uuid::new_v4(),
            from_action: None,
            to_action: None,
            queue: Vec::new(),
        }))
    }

    pub fn between(from_action: Uuid, to_action: Uuid) -> DataPipeRef {
        let pipe = Self::new();
        pipe.borrow_mut().from_action = Some(from_action);
        pipe.borrow_mut().to_action = Some(to_action);
        pipe
    }

    pub fn push(&mut self, value: impl Into<PipeValue>) {
        self.queue.push(value.into());
    }

    /// Take from the tail.
    pub fn pop(&mut self) -> Option<PipeValue> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
