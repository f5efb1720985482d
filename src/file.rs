//! The persistent DAG file format.
//!
//! A file is a fixed 65-byte header followed by the raw cache bytes and raw
//! DAG bytes at the offsets the header declares. All integers are
//! little-endian. The loader validates the magic, the version gate, and that
//! the declared section sizes match the sizing schedule for the declared
//! epoch before it reads a single body byte.
//!
//! Readers and writers are plain `std::io` streams; callers own buffering
//! (wrap files in `BufReader`/`BufWriter`) and path handling.

use std::io::{self, Read, Write};
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::cache::Cache;
use crate::dag::Dag;
use crate::error::{CorruptDagError, Error};
use crate::observer::{Observer, Phase};
use crate::params::HASH_BYTES;
use crate::registry::DagRegistry;
use crate::sizes::file_section_sizes;

pub(crate) const DAG_MAGIC: [u8; 12] = *b"EGIHASH_DAG\0";
const MAJOR_VERSION: u32 = 1;
const REVISION: u32 = 23;
const MINOR_VERSION: u32 = 0;
/// Magic + three version words + epoch + four offsets + one reserved byte.
pub(crate) const HEADER_BYTES: u64 = 65;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileHeader {
    epoch: u64,
    cache_begin: u64,
    cache_end: u64,
    dag_begin: u64,
    dag_end: u64,
}

fn write_header<W: Write>(writer: &mut W, header: &FileHeader) -> io::Result<()> {
    writer.write_all(&DAG_MAGIC)?;
    writer.write_u32::<LittleEndian>(MAJOR_VERSION)?;
    writer.write_u32::<LittleEndian>(REVISION)?;
    writer.write_u32::<LittleEndian>(MINOR_VERSION)?;
    writer.write_u64::<LittleEndian>(header.epoch)?;
    writer.write_u64::<LittleEndian>(header.cache_begin)?;
    writer.write_u64::<LittleEndian>(header.cache_end)?;
    writer.write_u64::<LittleEndian>(header.dag_begin)?;
    writer.write_u64::<LittleEndian>(header.dag_end)?;
    writer.write_u8(0)
}

fn read_header<R: Read>(reader: &mut R) -> Result<FileHeader, Error> {
    let mut magic = [0u8; 12];
    reader.read_exact(&mut magic).map_err(truncated)?;
    if magic != DAG_MAGIC {
        return Err(CorruptDagError::BadMagic.into());
    }
    let major = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    let revision = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    // The minor version carries no compatibility meaning.
    let _minor = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    if major != MAJOR_VERSION || revision != REVISION {
        return Err(CorruptDagError::BadVersion { major, revision }.into());
    }
    let header = FileHeader {
        epoch: reader.read_u64::<LittleEndian>().map_err(truncated)?,
        cache_begin: reader.read_u64::<LittleEndian>().map_err(truncated)?,
        cache_end: reader.read_u64::<LittleEndian>().map_err(truncated)?,
        dag_begin: reader.read_u64::<LittleEndian>().map_err(truncated)?,
        dag_end: reader.read_u64::<LittleEndian>().map_err(truncated)?,
    };
    let _reserved = reader.read_u8().map_err(truncated)?;
    Ok(header)
}

/// Check the declared offsets against the sizing schedule for the declared
/// epoch. Sections must sit past the header, in order, without overlap.
fn validate_header(header: &FileHeader) -> Result<(), Error> {
    let bad = || CorruptDagError::BadSizes {
        epoch: header.epoch,
    };
    let (cache_size, dag_size) = file_section_sizes(header.epoch).ok_or_else(bad)?;
    if header.cache_begin < HEADER_BYTES {
        return Err(bad().into());
    }
    if header.cache_end.checked_sub(header.cache_begin) != Some(cache_size) {
        return Err(bad().into());
    }
    if header.dag_begin < header.cache_end {
        return Err(bad().into());
    }
    if header.dag_end.checked_sub(header.dag_begin) != Some(dag_size) {
        return Err(bad().into());
    }
    Ok(())
}

fn truncated(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CorruptDagError::ShortFile.into()
    } else {
        Error::Io(err)
    }
}

fn skip<R: Read>(reader: &mut R, bytes: u64) -> Result<(), Error> {
    if bytes == 0 {
        return Ok(());
    }
    let copied = io::copy(&mut reader.by_ref().take(bytes), &mut io::sink())?;
    if copied < bytes {
        return Err(CorruptDagError::ShortFile.into());
    }
    Ok(())
}

fn write_section<W: Write>(
    writer: &mut W,
    bytes: &[u8],
    phase: Phase,
    observer: &dyn Observer,
) -> Result<(), Error> {
    let total = (bytes.len() / HASH_BYTES) as u64;
    for (index, item) in bytes.chunks(HASH_BYTES).enumerate() {
        writer.write_all(item)?;
        if !observer.report(index as u64 + 1, total, phase) {
            return Err(Error::Cancelled(phase));
        }
    }
    Ok(())
}

fn read_section<R: Read>(
    reader: &mut R,
    size: u64,
    phase: Phase,
    observer: &dyn Observer,
) -> Result<Vec<u8>, Error> {
    let mut bytes = vec![0u8; size as usize];
    let total = size / HASH_BYTES as u64;
    for (index, item) in bytes.chunks_mut(HASH_BYTES).enumerate() {
        reader.read_exact(item).map_err(truncated)?;
        if !observer.report(index as u64 + 1, total, phase) {
            return Err(Error::Cancelled(phase));
        }
    }
    Ok(bytes)
}

/// Serialize a DAG handle: header, cache bytes, DAG bytes, back to back.
/// Reports [`Phase::CacheSaving`] and [`Phase::DagSaving`] progress per item
/// and honors cancellation; a cancelled save leaves a partial stream the
/// caller should discard.
pub fn save_dag<W: Write>(dag: &Dag, mut writer: W, observer: &dyn Observer) -> Result<(), Error> {
    let cache_begin = HEADER_BYTES;
    let cache_end = cache_begin + dag.cache().size();
    let header = FileHeader {
        epoch: dag.epoch(),
        cache_begin,
        cache_end,
        dag_begin: cache_end,
        dag_end: cache_end + dag.size(),
    };
    write_header(&mut writer, &header)?;
    write_section(&mut writer, dag.cache().as_bytes(), Phase::CacheSaving, observer)?;
    write_section(&mut writer, dag.as_bytes(), Phase::DagSaving, observer)?;
    Ok(())
}

/// Deserialize a DAG file and register the handle under its declared epoch.
///
/// If the registry already holds that epoch, the established handle is
/// returned without reading the file body. On an insertion race the freshly
/// loaded handle is dropped in favor of the winner.
pub fn load_dag<R: Read>(mut reader: R, observer: &dyn Observer) -> Result<Arc<Dag>, Error> {
    let header = read_header(&mut reader)?;
    validate_header(&header)?;
    if let Some(existing) = DagRegistry::global().get(header.epoch) {
        return Ok(existing);
    }

    skip(&mut reader, header.cache_begin - HEADER_BYTES)?;
    let cache_bytes = read_section(
        &mut reader,
        header.cache_end - header.cache_begin,
        Phase::CacheLoading,
        observer,
    )?;
    skip(&mut reader, header.dag_begin - header.cache_end)?;
    let dag_bytes = read_section(
        &mut reader,
        header.dag_end - header.dag_begin,
        Phase::DagLoading,
        observer,
    )?;

    let cache = Cache::from_parts(header.epoch, cache_bytes);
    let dag = Arc::new(Dag::from_parts(header.epoch, cache, dag_bytes));
    Ok(DagRegistry::global().insert(dag))
}
