use std::sync::Arc;

use crate::binary::container::SyncMarker;
use crate::union_resolver::{SchemaShapeFallback, UnionFallback};

/// What a record does with a field name its schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Fail with a schema mismatch.
    #[default]
    Fail,
    /// Discard the field's value, including any nested objects and arrays.
    Ignore,
}

/// Generator configuration. The defaults write bare datums straight to the sink, fail on
/// unknown fields, close any structures left open at `close()` and flush after every
/// completed top-level value.
#[derive(Clone, Debug)]
pub struct WriteConfig {
    pub(crate) buffer_capacity: Option<usize>,
    pub(crate) container_file: bool,
    pub(crate) add_null_defaults: bool,
    pub(crate) unknown_fields: UnknownFieldPolicy,
    pub(crate) auto_close_content: bool,
    pub(crate) flush_on_complete: bool,
    pub(crate) sync_marker: Option<SyncMarker>,
    pub(crate) union_fallback: Arc<dyn UnionFallback>,
}

impl WriteConfig {
    pub fn new() -> Self {
        WriteConfig {
            buffer_capacity: None,
            container_file: false,
            add_null_defaults: false,
            unknown_fields: UnknownFieldPolicy::Fail,
            auto_close_content: true,
            flush_on_complete: true,
            sync_marker: None,
            union_fallback: Arc::new(SchemaShapeFallback),
        }
    }

    /// Buffers output in memory, writing it to the sink in chunks of `capacity` bytes.
    pub fn with_buffering(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Wraps the output in an object container file: a header holding the schema, then a
    /// single block with every top-level value. The file is written when the generator is
    /// closed.
    pub fn with_container_file(mut self, container_file: bool) -> Self {
        self.container_file = container_file;
        self
    }

    /// Gives every record field whose type is a union starting with `null`, and which has no
    /// default, a `null` default. Such fields may then be left out.
    pub fn with_null_defaults(mut self, add_null_defaults: bool) -> Self {
        self.add_null_defaults = add_null_defaults;
        self
    }

    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// When enabled, `close()` ends any arrays and objects that are still open.
    pub fn with_auto_close_content(mut self, auto_close_content: bool) -> Self {
        self.auto_close_content = auto_close_content;
        self
    }

    /// When enabled, the sink is flushed after each top-level value is written to it.
    pub fn with_flush_on_complete(mut self, flush_on_complete: bool) -> Self {
        self.flush_on_complete = flush_on_complete;
        self
    }

    /// Uses `sync_marker` instead of a random one for container files.
    pub fn with_sync_marker(mut self, sync_marker: SyncMarker) -> Self {
        self.sync_marker = Some(sync_marker);
        self
    }

    /// Replaces the resolver consulted for union datums the built-in rules do not cover.
    pub fn with_union_fallback(mut self, fallback: Arc<dyn UnionFallback>) -> Self {
        self.union_fallback = fallback;
        self
    }

    pub fn unknown_fields(&self) -> UnknownFieldPolicy {
        self.unknown_fields
    }

    pub fn is_container_file(&self) -> bool {
        self.container_file
    }
}

impl Default for WriteConfig {
    fn default() -> Self {
        WriteConfig::new()
    }
}
