use std::io::{self, BufWriter, Write};

use delegate::delegate;
use log::debug;

use crate::binary::container::{random_sync_marker, ContainerWriter};
use crate::context::{ContainerKind, ContextStack};
use crate::datum_writer::DatumWriter;
use crate::result::cleanup_error::CleanupError;
use crate::result::{configuration_error, illegal_operation, AvroError, AvroResult};
use crate::schema::Schema;
use crate::types::{Number, Value};
use crate::write_config::WriteConfig;

/// Configures and constructs new instances of [`AvroGenerator`].
#[derive(Debug, Clone, Default)]
pub struct AvroGeneratorBuilder {
    schema: Option<Schema>,
    config: WriteConfig,
}

impl AvroGeneratorBuilder {
    pub fn new() -> Self {
        AvroGeneratorBuilder::default()
    }

    /// The schema every top-level value is written with. A generator built without one fails
    /// on its first write with a configuration error.
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_config(mut self, config: WriteConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates a new AvroGenerator that will write its encoded output to the provided
    /// io::Write sink.
    pub fn build<W: Write>(self, out: W) -> AvroResult<AvroGenerator<W>> {
        let AvroGeneratorBuilder { schema, config } = self;
        let schema = match schema {
            Some(schema) if config.add_null_defaults => Some(schema.with_null_defaults()),
            other => other,
        };
        let container = match (&schema, config.container_file) {
            (Some(schema), true) => Some(ContainerWriter::new(
                schema,
                config.sync_marker.unwrap_or_else(random_sync_marker),
            )),
            _ => None,
        };
        let sink = match config.buffer_capacity {
            Some(capacity) => Sink::Buffered(BufWriter::with_capacity(capacity, out)),
            None => Sink::Direct(out),
        };
        Ok(AvroGenerator {
            contexts: ContextStack::new(
                schema,
                config.union_fallback.clone(),
                config.unknown_fields,
            ),
            datum_writer: None,
            container,
            sink,
            failure: None,
            config,
        })
    }
}

// Where encoded bytes go.
#[derive(Debug)]
enum Sink<W: Write> {
    Direct(W),
    Buffered(BufWriter<W>),
}

impl<W: Write> Sink<W> {
    fn get_ref(&self) -> &W {
        match self {
            Sink::Direct(out) => out,
            Sink::Buffered(buffered) => buffered.get_ref(),
        }
    }

    fn into_inner(self) -> io::Result<W> {
        match self {
            Sink::Direct(out) => Ok(out),
            Sink::Buffered(buffered) => buffered.into_inner().map_err(|e| e.into_error()),
        }
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Direct(out) => out.write(buf),
            Sink::Buffered(buffered) => buffered.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Direct(out) => out.flush(),
            Sink::Buffered(buffered) => buffered.flush(),
        }
    }
}

/// Writes a stream of structural events (objects, arrays, field names and scalars) as Avro
/// binary data.
///
/// Each top-level value is assembled in memory from the events that make it up. Once it is
/// complete it is encoded against the schema as a whole, so a value that fails to encode
/// leaves no partial bytes behind. Bare datums are written to the sink one after another; in
/// container-file mode they are collected and written as a single block by
/// [`close`](AvroGenerator::close).
///
/// The first failure poisons the generator: every later call fails with an
/// [`IllegalOperation`](AvroError::IllegalOperation) that names the original error.
#[derive(Debug)]
pub struct AvroGenerator<W: Write> {
    contexts: ContextStack,
    datum_writer: Option<DatumWriter>,
    container: Option<ContainerWriter>,
    sink: Sink<W>,
    failure: Option<AvroError>,
    config: WriteConfig,
}

impl<W: Write> AvroGenerator<W> {
    delegate! {
        to self.contexts {
            /// The number of arrays and objects that are currently open.
            pub fn depth(&self) -> usize;
            /// The schema top-level values are written with, including any injected defaults.
            pub fn schema(&self) -> Option<&Schema>;
        }
    }

    /// The sink this generator writes to. Output that is still buffered is not visible here.
    pub fn output(&self) -> &W {
        self.sink.get_ref()
    }

    pub fn config(&self) -> &WriteConfig {
        &self.config
    }

    /// Whether an earlier call failed, making this generator unusable.
    pub fn is_poisoned(&self) -> bool {
        self.failure.is_some()
    }

    /// Starts an object at the current position. A union position resolves to its only record
    /// or map branch.
    pub fn start_object(&mut self) -> AvroResult<()> {
        self.guarded(|generator| generator.contexts.start_object(None))
    }

    /// Starts a record of the named type at the current position. A union position resolves to
    /// the record branch with that full name.
    pub fn start_object_as(&mut self, record_name: &str) -> AvroResult<()> {
        self.guarded(|generator| generator.contexts.start_object(Some(record_name)))
    }

    pub fn end_object(&mut self) -> AvroResult<()> {
        self.guarded(|generator| {
            generator.contexts.end(ContainerKind::Object)?;
            generator.emit_completed()
        })
    }

    pub fn start_array(&mut self) -> AvroResult<()> {
        self.guarded(|generator| generator.contexts.start_array())
    }

    pub fn end_array(&mut self) -> AvroResult<()> {
        self.guarded(|generator| {
            generator.contexts.end(ContainerKind::Array)?;
            generator.emit_completed()
        })
    }

    /// Names the record field or map key the next value is written to.
    pub fn field_name(&mut self, name: &str) -> AvroResult<()> {
        self.guarded(|generator| generator.contexts.write_field_name(name))
    }

    pub fn write_string<S: Into<String>>(&mut self, value: S) -> AvroResult<()> {
        self.write_value(Value::String(value.into()))
    }

    pub fn write_number<N: Into<Number>>(&mut self, value: N) -> AvroResult<()> {
        self.write_value(Value::from(value.into()))
    }

    pub fn write_boolean(&mut self, value: bool) -> AvroResult<()> {
        self.write_value(Value::Boolean(value))
    }

    pub fn write_null(&mut self) -> AvroResult<()> {
        self.write_value(Value::Null)
    }

    /// Writes `bytes` as a `bytes` or `fixed` value.
    pub fn write_binary(&mut self, bytes: &[u8]) -> AvroResult<()> {
        self.write_value(Value::Bytes(bytes.to_vec()))
    }

    /// Writes bytes that are already an Avro encoding of a value for the current position. They
    /// are copied to the output as they are; nothing checks them against the schema.
    pub fn write_embedded(&mut self, encoded: &[u8]) -> AvroResult<()> {
        self.write_value(Value::Encoded(encoded.to_vec()))
    }

    /// Writes a complete value, such as a pre-built [`Record`](crate::Record), at the current
    /// position.
    pub fn write_value(&mut self, value: Value) -> AvroResult<()> {
        self.guarded(|generator| {
            generator.contexts.write_value(value)?;
            generator.emit_completed()
        })
    }

    /// Flushes the sink. In container-file mode, values written so far are held until
    /// [`close`](AvroGenerator::close) and are not affected.
    pub fn flush(&mut self) -> AvroResult<()> {
        self.guarded(|generator| Ok(generator.sink.flush()?))
    }

    /// Finishes the output and returns the sink.
    ///
    /// If auto-closing is enabled, arrays and objects that are still open are ended first. If
    /// it is disabled, a value that is still open is dropped. In container-file mode, the
    /// header and the block holding every datum are written here.
    ///
    /// Closing a poisoned generator returns its original failure. If unwinding its open
    /// contexts also fails, both failures are reported in a
    /// [`CleanupError`].
    pub fn close(mut self) -> AvroResult<W> {
        if let Some(original) = self.failure.take() {
            if self.config.auto_close_content {
                // Open contexts are ended to check that they could be, but nothing more is
                // written.
                if let Err(secondary) = self.end_open_contexts(false) {
                    return Err(CleanupError::new(original, secondary).into());
                }
            }
            if let Err(secondary) = self.sink.flush() {
                return Err(CleanupError::new(original, secondary.into()).into());
            }
            return Err(original);
        }
        if self.config.auto_close_content {
            self.end_open_contexts(true)?;
        } else if self.contexts.depth() > 0 {
            debug!(
                "closing with {} open container(s); the incomplete value is dropped",
                self.contexts.depth()
            );
        }
        if let Some(container) = self.container.take() {
            debug!(
                "writing container file with {} datum(s)",
                container.datum_count()
            );
            container.finish(&mut self.sink)?;
        }
        self.sink.flush()?;
        Ok(self.sink.into_inner()?)
    }

    fn end_open_contexts(&mut self, emit: bool) -> AvroResult<()> {
        while let Some(kind) = self.contexts.current_kind() {
            self.contexts.end(kind)?;
            if emit {
                self.emit_completed()?;
            }
        }
        Ok(())
    }

    // Runs `operation` unless the generator is poisoned, and poisons it if `operation` fails.
    fn guarded<T, F>(&mut self, operation: F) -> AvroResult<T>
    where
        F: FnOnce(&mut Self) -> AvroResult<T>,
    {
        if let Some(failure) = &self.failure {
            return illegal_operation(format!(
                "the generator cannot be used after an earlier failure: {failure}"
            ));
        }
        let result = operation(self);
        if let Err(error) = &result {
            self.failure = Some(error.clone());
        }
        result
    }

    // Encodes the top-level value completed by the last call, if there is one.
    fn emit_completed(&mut self) -> AvroResult<()> {
        let Some(value) = self.contexts.take_completed() else {
            return Ok(());
        };
        let datum = self.datum_writer()?.encode(&value)?;
        match &mut self.container {
            Some(container) => {
                container.append_datum(&datum);
                debug!(
                    "buffered a {} datum of {} bytes for the container file",
                    value.kind_name(),
                    datum.len()
                );
            }
            None => {
                self.sink.write_all(&datum)?;
                if self.config.flush_on_complete {
                    self.sink.flush()?;
                }
                debug!("wrote a {} datum of {} bytes", value.kind_name(), datum.len());
            }
        }
        Ok(())
    }

    fn datum_writer(&mut self) -> AvroResult<&DatumWriter> {
        if self.datum_writer.is_none() {
            let Some(schema) = self.contexts.schema() else {
                return configuration_error("no schema supplied");
            };
            self.datum_writer = Some(DatumWriter::with_fallback(
                schema.clone(),
                self.config.union_fallback.clone(),
            ));
        }
        match &self.datum_writer {
            Some(datum_writer) => Ok(datum_writer),
            None => configuration_error("no schema supplied"),
        }
    }
}
