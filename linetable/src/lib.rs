//! Extracts statement-granular source line information from the DWARF
//! debug sections of an ELF executable.
//!
//! This is the only component in the workspace that touches the DWARF
//! library directly; it exposes a pure data interface — a map from
//! normalized source path to the `(line, address)` pairs that
//! instrument it — so that swapping the underlying DWARF crate never
//! ripples past this module.

#[macro_use]
extern crate log;

mod address;
mod error;
mod path;

pub use address::Address;
pub use error::LineTableError;
pub use path::normalize_path;

use std::collections::BTreeMap;
use std::path::Path;

use gimli::{EndianSlice, RunTimeEndian, SectionId};
use goblin::elf::Elf;

/// A single `(line, address)` attribution, restricted to statement-start
/// rows of the line table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LineEntry {
    pub line: u32,
    pub address: Address,
}

type Reader<'data> = EndianSlice<'data, RunTimeEndian>;

/// Read the statement-level line table of `executable_path`.
///
/// Absence of debug info is not an error: the result is simply an
/// empty map. A DWARF error confined to a single row is logged and the
/// row skipped; a CU whose line program can't be obtained is skipped
/// and iteration continues. Only a failure to open the file or
/// initialize the DWARF reader aborts extraction.
pub fn read_lines(executable_path: &Path) -> Result<BTreeMap<String, Vec<LineEntry>>, LineTableError> {
    let data = std::fs::read(executable_path).map_err(|source| LineTableError::Open {
        path: executable_path.display().to_string(),
        source,
    })?;

    let elf = Elf::parse(&data).map_err(|e| LineTableError::Object(e.to_string()))?;

    let mut result: BTreeMap<String, Vec<LineEntry>> = BTreeMap::new();

    // x86 only (see crate docs); section data is always little-endian.
    let endian = RunTimeEndian::Little;
    let load_section = |id: SectionId| -> Result<Reader<'_>, gimli::Error> {
        Ok(load_section_data(&elf, &data, id, endian))
    };

    let dwarf = gimli::Dwarf::load(load_section)?;

    let mut units = dwarf.units();
    loop {
        let header = match units.next() {
            Ok(Some(header)) => header,
            Ok(None) => break,
            Err(e) => {
                warn!("error reading compilation unit header: {e}");
                break;
            }
        };

        let unit = match dwarf.unit(header) {
            Ok(unit) => unit,
            Err(e) => {
                warn!("skipping compilation unit: {e}");
                continue;
            }
        };

        let program = match &unit.line_program {
            Some(program) => program.clone(),
            None => continue,
        };

        let mut rows = program.rows();

        loop {
            let (row_header, row) = match rows.next_row() {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("skipping malformed line table row: {e}");
                    continue;
                }
            };

            if row.end_sequence() || !row.is_stmt() {
                continue;
            }

            let line = match row.line() {
                Some(line) => line.get() as u32,
                None => continue,
            };
            if line == 0 {
                continue;
            }

            let file_entry = match row.file(row_header) {
                Some(file) => file,
                None => continue,
            };

            let path = match source_path(&dwarf, &unit, row_header, file_entry) {
                Ok(path) => path,
                Err(e) => {
                    warn!("skipping row with unreadable file name: {e}");
                    continue;
                }
            };

            let address = Address(row.address());
            result
                .entry(normalize_path(&path))
                .or_default()
                .push(LineEntry { line, address });
        }
    }

    Ok(result)
}

fn load_section_data<'d>(
    elf: &Elf,
    data: &'d [u8],
    id: SectionId,
    endian: RunTimeEndian,
) -> EndianSlice<'d, RunTimeEndian> {
    for shdr in &elf.section_headers {
        if let Some(name) = elf.shdr_strtab.get_at(shdr.sh_name) {
            if name == id.name() {
                if let Some(range) = shdr.file_range() {
                    if let Some(bytes) = data.get(range) {
                        return EndianSlice::new(bytes, endian);
                    }
                }
            }
        }
    }

    EndianSlice::new(&[], endian)
}

fn source_path<'a>(
    dwarf: &gimli::Dwarf<Reader<'a>>,
    unit: &gimli::Unit<Reader<'a>>,
    header: &gimli::LineProgramHeader<Reader<'a>>,
    file: &gimli::FileEntry<Reader<'a>>,
) -> Result<String, gimli::Error> {
    let name = dwarf.attr_string(unit, file.path_name())?;
    let name = name.to_string_lossy();

    if name.starts_with('/') {
        return Ok(name.into_owned());
    }

    let dir = match file.directory(header) {
        Some(dir_attr) => {
            let dir = dwarf.attr_string(unit, dir_attr)?;
            let dir = dir.to_string_lossy().into_owned();
            if dir.is_empty() {
                None
            } else {
                Some(dir)
            }
        }
        None => None,
    };

    match dir {
        Some(dir) => Ok(format!("{dir}/{name}")),
        None => Ok(name.into_owned()),
    }
}
