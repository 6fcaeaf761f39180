//! The Avro object container file layout.
//!
//! A container file starts with a header (magic bytes, a metadata map holding the writer's
//! schema and codec, and a random sync marker) followed by blocks of datums. Each block is a
//! datum count, the block's size in bytes, the encoded datums and a copy of the sync marker.

use std::collections::HashMap;
use std::io::Write;

use log::debug;

use crate::binary::decoder::BinaryDecoder;
use crate::binary::encoder::BinaryEncoder;
use crate::result::{decoding_error, decoding_error_raw, AvroResult};
use crate::schema::Schema;

/// The four bytes every container file starts with.
pub const MAGIC: [u8; 4] = *b"Obj\x01";
pub const SYNC_SIZE: usize = 16;
pub const SCHEMA_KEY: &str = "avro.schema";
pub const CODEC_KEY: &str = "avro.codec";
pub const NULL_CODEC: &str = "null";

pub type SyncMarker = [u8; SYNC_SIZE];

pub fn random_sync_marker() -> SyncMarker {
    rand::random()
}

/// Collects encoded datums and writes them as a complete container file: the header and a
/// single block holding every datum.
#[derive(Debug)]
pub struct ContainerWriter {
    schema_json: String,
    sync_marker: SyncMarker,
    block: Vec<u8>,
    datum_count: usize,
}

impl ContainerWriter {
    pub fn new(schema: &Schema, sync_marker: SyncMarker) -> Self {
        ContainerWriter {
            schema_json: schema.to_json().to_string(),
            sync_marker,
            block: Vec::new(),
            datum_count: 0,
        }
    }

    /// Adds one already-encoded datum to the pending block.
    pub fn append_datum(&mut self, datum: &[u8]) {
        self.block.extend_from_slice(datum);
        self.datum_count += 1;
    }

    pub fn datum_count(&self) -> usize {
        self.datum_count
    }

    pub fn sync_marker(&self) -> &SyncMarker {
        &self.sync_marker
    }

    /// Writes the header followed by the pending block, if it holds any datums.
    pub fn finish<W: Write>(self, sink: &mut W) -> AvroResult<()> {
        self.write_header(sink)?;
        if self.datum_count > 0 {
            debug!(
                "writing a container block of {} datums ({} bytes)",
                self.datum_count,
                self.block.len()
            );
            sink.encode_long(self.datum_count as i64)?;
            sink.encode_long(self.block.len() as i64)?;
            sink.write_all(&self.block)?;
            sink.write_all(&self.sync_marker)?;
        }
        Ok(())
    }

    fn write_header<W: Write>(&self, sink: &mut W) -> AvroResult<()> {
        sink.write_all(&MAGIC)?;
        sink.encode_block_count(2)?;
        sink.encode_string(SCHEMA_KEY)?;
        sink.encode_string(&self.schema_json)?;
        sink.encode_string(CODEC_KEY)?;
        sink.encode_string(NULL_CODEC)?;
        sink.encode_block_count(0)?;
        sink.write_all(&self.sync_marker)?;
        Ok(())
    }
}

/// The parsed header of a container file.
#[derive(Debug)]
pub struct ContainerHeader {
    pub schema: Schema,
    pub metadata: HashMap<String, Vec<u8>>,
    pub sync_marker: SyncMarker,
}

/// Reads a container file header, leaving `decoder` at the first block.
pub fn read_header(decoder: &mut BinaryDecoder) -> AvroResult<ContainerHeader> {
    if decoder.read_exact(MAGIC.len())? != MAGIC {
        return decoding_error("data does not start with the Avro container magic bytes");
    }
    let mut metadata = HashMap::new();
    loop {
        let count = decoder.read_block_count()?;
        if count == 0 {
            break;
        }
        for _ in 0..count {
            let key = decoder.read_string()?.to_owned();
            let value = decoder.read_bytes()?.to_vec();
            metadata.insert(key, value);
        }
    }
    match metadata.get(CODEC_KEY).map(Vec::as_slice) {
        None => {}
        Some(codec) if codec == NULL_CODEC.as_bytes() => {}
        Some(codec) => {
            return decoding_error(format!(
                "unsupported codec '{}'",
                String::from_utf8_lossy(codec)
            ))
        }
    }
    let schema_json = metadata
        .get(SCHEMA_KEY)
        .ok_or_else(|| decoding_error_raw("container header has no schema"))?;
    let schema_json = std::str::from_utf8(schema_json)
        .map_err(|e| decoding_error_raw(format!("container schema is not UTF-8: {e}")))?;
    let schema = Schema::parse_str(schema_json)?;
    let mut sync_marker = [0u8; SYNC_SIZE];
    sync_marker.copy_from_slice(decoder.read_exact(SYNC_SIZE)?);
    Ok(ContainerHeader {
        schema,
        metadata,
        sync_marker,
    })
}
