// Plain comma separated tables, parsed with chumsky

use std::str::FromStr;

use chumsky::{prelude::*, Parser};
use structs::{CapacityRecord, CapacityTable, VisitRecord, VisitTable};
use thiserror::Error;

pub mod structs;

#[derive(Debug, Error)]
pub enum TableParseError {
    #[error("ParseError occurred: {0:?}")]
    ParseError(Vec<Simple<char>>),
    #[error("Table has no header")]
    EmptyTable,
    #[error("Required column `{0}` is missing")]
    MissingColumn(&'static str),
    #[error("Line {line}: column `{column}` is empty")]
    MissingField { line: usize, column: &'static str },
    #[error("Line {line}: column `{column}` has invalid value `{value}`")]
    InvalidNumber {
        line: usize,
        column: &'static str,
        value: String,
    },
}

// Accepted header names, first entry is the canonical one
const ENTITY_ID: &[&str] = &["entity_id", "job_id", "ship_name"];
const RESOURCE_ID: &[&str] = &["resource_id", "machine_id", "port_name"];
const READY_TIME: &[&str] = &["ready_time", "arrival_time"];
const DURATION: &[&str] = &["duration", "proc_time", "service_time_hours"];
const DUE_TIME: &[&str] = &["due_time", "due_date"];
const TRANSFER_TIME: &[&str] = &["transfer_time", "travel_time"];
const SEQUENCE_INDEX: &[&str] = &["sequence_index", "operation_seq"];

const CAPACITY_RESOURCE_ID: &[&str] = &["resource_id", "nama_pelabuhan", "port_name", "machine_id"];
const SERVER_COUNT: &[&str] = &["server_count", "total_berths", "capacity"];

pub fn parse_visit_table(content: &str) -> Result<VisitTable, TableParseError> {
    let (header, rows) = split_header(content)?;

    let entity_id = header.require(ENTITY_ID)?;
    let resource_id = header.require(RESOURCE_ID)?;
    let ready_time = header.require(READY_TIME)?;
    let duration = header.require(DURATION)?;
    let due_time = header.require(DUE_TIME)?;
    let transfer_time = header.find(TRANSFER_TIME);
    let sequence_index = header.find(SEQUENCE_INDEX);

    let records = rows
        .iter()
        .map(|row| {
            Ok(VisitRecord {
                line: row.line,
                entity_id: row.text(entity_id, ENTITY_ID[0])?.to_string(),
                resource_id: row.text(resource_id, RESOURCE_ID[0])?.to_string(),
                ready_time: row.number(ready_time, READY_TIME[0])?,
                duration: row.number(duration, DURATION[0])?,
                due_time: row.number(due_time, DUE_TIME[0])?,
                transfer_time: row.optional_number(transfer_time, TRANSFER_TIME[0])?,
                sequence_index: row.optional_number(sequence_index, SEQUENCE_INDEX[0])?,
            })
        })
        .collect::<Result<Vec<_>, TableParseError>>()?;

    Ok(VisitTable { records })
}

pub fn parse_capacity_table(content: &str) -> Result<CapacityTable, TableParseError> {
    let (header, rows) = split_header(content)?;

    let resource_id = header.require(CAPACITY_RESOURCE_ID)?;
    let server_count = header.require(SERVER_COUNT)?;

    let records = rows
        .iter()
        .map(|row| {
            Ok(CapacityRecord {
                line: row.line,
                resource_id: row.text(resource_id, CAPACITY_RESOURCE_ID[0])?.to_string(),
                server_count: row.number(server_count, SERVER_COUNT[0])?,
            })
        })
        .collect::<Result<Vec<_>, TableParseError>>()?;

    Ok(CapacityTable { records })
}

pub(crate) fn csv_parser() -> impl Parser<char, Vec<Vec<String>>, Error = Simple<char>> {
    let quoted = just("\"\"")
        .to('"')
        .or(none_of("\"\r\n"))
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .labelled("quoted field");

    let bare = none_of(",\"\r\n")
        .repeated()
        .collect::<String>()
        .labelled("field");

    let record = quoted.or(bare).separated_by(just(',')).labelled("record");

    let line_break = just('\r').or_not().then(just('\n')).ignored();

    record.separated_by(line_break).then_ignore(end())
}

struct Header(Vec<String>);

impl Header {
    fn find(&self, aliases: &[&str]) -> Option<usize> {
        self.0
            .iter()
            .position(|name| aliases.iter().any(|alias| name == alias))
    }

    fn require(&self, aliases: &[&'static str]) -> Result<usize, TableParseError> {
        self.find(aliases)
            .ok_or(TableParseError::MissingColumn(aliases[0]))
    }
}

struct Row {
    line: usize,
    cells: Vec<String>,
}

impl Row {
    fn cell(&self, index: usize) -> Option<&str> {
        self.cells
            .get(index)
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    fn text(&self, index: usize, column: &'static str) -> Result<&str, TableParseError> {
        self.cell(index).ok_or(TableParseError::MissingField {
            line: self.line,
            column,
        })
    }

    fn number<T: FromStr>(&self, index: usize, column: &'static str) -> Result<T, TableParseError> {
        let value = self.text(index, column)?;
        value.parse().map_err(|_| TableParseError::InvalidNumber {
            line: self.line,
            column,
            value: value.to_string(),
        })
    }

    fn optional_number<T: FromStr>(
        &self,
        index: Option<usize>,
        column: &'static str,
    ) -> Result<Option<T>, TableParseError> {
        match index {
            Some(index) if self.cell(index).is_some() => self.number(index, column).map(Some),
            _ => Ok(None),
        }
    }
}

fn split_header(content: &str) -> Result<(Header, Vec<Row>), TableParseError> {
    let records = csv_parser()
        .parse(content)
        .map_err(TableParseError::ParseError)?;

    let mut rows = records
        .into_iter()
        .enumerate()
        .map(|(index, cells)| Row {
            line: index + 1,
            cells,
        })
        .filter(|row| row.cells.iter().any(|cell| !cell.trim().is_empty()));

    let header = rows.next().ok_or(TableParseError::EmptyTable)?;
    let header = Header(
        header
            .cells
            .iter()
            .map(|name| name.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect(),
    );

    Ok((header, rows.collect()))
}
