//! Archive write path.

use picklepack_buffers::Writer;

use crate::tensor::TensorTable;

use super::constants::*;

/// Writes a named-entry archive through a push-based byte sink.
///
/// The header is emitted on construction; each [`ArchiveWriter::write_entry`]
/// streams its header words and payload straight through, so the writer
/// never holds an entry in memory.
pub struct ArchiveWriter<'a> {
    sink: Box<dyn FnMut(&[u8]) + 'a>,
    writer: Writer,
    entries: usize,
}

impl<'a> ArchiveWriter<'a> {
    /// Creates a writer and emits the archive header through the sink.
    pub fn new(sink: impl FnMut(&[u8]) + 'a) -> Self {
        let mut archive = Self {
            sink: Box::new(sink),
            writer: Writer::new(),
            entries: 0,
        };
        archive.writer.buf(&ARCHIVE_MAGIC);
        archive.writer.u8(ARCHIVE_VERSION);
        archive.flush();
        archive
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Writes one named entry.
    pub fn write_entry(&mut self, name: &str, bytes: &[u8]) {
        self.writer.u32(name.len() as u32);
        self.writer.utf8(name);
        self.writer.u64(bytes.len() as u64);
        self.flush();
        (self.sink)(bytes);
        self.entries += 1;
    }

    /// Emits the end-of-entries marker, consuming the writer.
    pub fn finish(mut self) {
        self.writer.u32(END_OF_ENTRIES);
        self.flush();
    }

    fn flush(&mut self) {
        let bytes = self.writer.flush();
        if !bytes.is_empty() {
            (self.sink)(&bytes);
        }
    }
}

/// Writes the structural stream under entry `root_name`, then each
/// side-table record's raw storage bytes under `root_name/<index>`, in
/// table order.
pub fn write_archive_and_tensors(
    root_name: &str,
    struct_bytes: &[u8],
    tensors: &TensorTable,
    writer: &mut ArchiveWriter<'_>,
) {
    writer.write_entry(root_name, struct_bytes);
    for (index, tensor) in tensors.iter().enumerate() {
        writer.write_entry(&format!("{root_name}/{index}"), &tensor.storage.data);
    }
}
