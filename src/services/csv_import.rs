//! Streaming CSV import.
//!
//! Reads a CSV document row by row, maps tolerant header names to contact
//! fields, and runs each record through the row parser. Bad rows become
//! `"Row N: <reason>"` entries instead of failing the import. Nothing here
//! touches storage.

use std::io::{BufRead, BufReader, Read};

use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use tokio_util::sync::CancellationToken;

use super::row_parser::{parse_row, RawRow, RowError};
use crate::error::{ServiceError, ServiceResult};
use crate::models::ParsedImport;

pub const EMPTY_FILE_MESSAGE: &str = "File is empty.";

/// Delimiters considered by auto-detection, in tie-break order.
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Contact fields a CSV column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvField {
    Name,
    DateOfBirth,
    Married,
    Phone,
    Salary,
}

impl CsvField {
    /// Match a header cell, ignoring case, surrounding space and a UTF-8 BOM.
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized = header.trim_start_matches('\u{feff}').trim().to_lowercase();
        match normalized.as_str() {
            "name" => Some(Self::Name),
            "date of birth" | "dateofbirth" | "date_of_birth" | "dob" => Some(Self::DateOfBirth),
            "married" => Some(Self::Married),
            "phone" => Some(Self::Phone),
            "salary" => Some(Self::Salary),
            _ => None,
        }
    }
}

/// Column positions for each field; the first matching header wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    name: Option<usize>,
    date_of_birth: Option<usize>,
    married: Option<usize>,
    phone: Option<usize>,
    salary: Option<usize>,
}

impl HeaderMap {
    pub fn from_headers(headers: &StringRecord) -> Self {
        let mut map = Self::default();
        for (idx, header) in headers.iter().enumerate() {
            let slot = match CsvField::from_header(header) {
                Some(CsvField::Name) => &mut map.name,
                Some(CsvField::DateOfBirth) => &mut map.date_of_birth,
                Some(CsvField::Married) => &mut map.married,
                Some(CsvField::Phone) => &mut map.phone,
                Some(CsvField::Salary) => &mut map.salary,
                None => continue,
            };
            slot.get_or_insert(idx);
        }
        map
    }

    /// Pull mapped values out of a record. Absent columns read as empty.
    pub fn extract(&self, record: &StringRecord) -> RawRow {
        let get = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        RawRow {
            name: get(self.name),
            date_of_birth: get(self.date_of_birth),
            married: get(self.married),
            phone: get(self.phone),
            salary: get(self.salary),
        }
    }
}

/// Pick the delimiter that occurs most often, outside quotes, in the first line.
pub fn detect_delimiter(sample: &[u8]) -> u8 {
    let line_end = sample
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(sample.len());

    let mut counts = [0usize; CANDIDATE_DELIMITERS.len()];
    let mut in_quotes = false;
    for &byte in &sample[..line_end] {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            if let Some(i) = CANDIDATE_DELIMITERS.iter().position(|&d| d == byte) {
                counts[i] += 1;
            }
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    CANDIDATE_DELIMITERS[best]
}

/// Parse a CSV stream into contacts and row errors.
///
/// Row numbers count the header as row 1. The cancellation token is checked
/// before every record; a cancelled import returns [`ServiceError::Cancelled`]
/// and its partial results are dropped.
pub fn import_contacts<R: Read>(input: R, cancel: &CancellationToken) -> ServiceResult<ParsedImport> {
    let mut input = BufReader::new(input);
    let delimiter = {
        let sample = input.fill_buf()?;
        if sample.is_empty() {
            return Err(ServiceError::Validation(EMPTY_FILE_MESSAGE.to_string()));
        }
        detect_delimiter(sample)
    };

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);

    let headers = match reader.byte_headers() {
        Ok(raw) => lossy_record(raw),
        Err(e) => return Err(read_error(e)),
    };
    let header_map = HeaderMap::from_headers(&headers);
    log::debug!("CSV delimiter {:?}, columns {:?}", delimiter as char, header_map);

    let mut parsed = ParsedImport::default();
    let mut row_number = 1usize;
    let mut record = ByteRecord::new();

    loop {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }

        let outcome = match reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => StringRecord::from_byte_record(record.clone())
                .map_err(|e| RowError::Malformed(format!("invalid UTF-8 in field {}", field_number(&e))))
                .and_then(|rec| parse_row(&header_map.extract(&rec))),
            Err(e) if e.is_io_error() => return Err(read_error(e)),
            Err(e) => Err(RowError::Malformed(e.to_string())),
        };
        row_number += 1;

        match outcome {
            Ok(contact) => parsed.contacts.push(contact),
            Err(reason) => {
                log::debug!("CSV row {} rejected: {}", row_number, reason);
                parsed.errors.push(format!("Row {}: {}", row_number, reason));
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(ServiceError::Cancelled);
    }

    Ok(parsed)
}

fn lossy_record(raw: &ByteRecord) -> StringRecord {
    raw.iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

fn field_number(err: &csv::FromUtf8Error) -> usize {
    err.utf8_error().field() + 1
}

fn read_error(err: csv::Error) -> ServiceError {
    match err.into_kind() {
        csv::ErrorKind::Io(io) => ServiceError::Io(io),
        other => ServiceError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{:?}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Cursor;

    fn import(text: &str) -> ParsedImport {
        import_contacts(Cursor::new(text.as_bytes().to_vec()), &CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_invalid_salary_reported_with_row_number() {
        let csv = "Name,Date of birth,Married,Phone,Salary\n\
                   Ann,1990-01-01,true,555-0001,1000\n\
                   Ben,1991-02-02,false,555-0002,2000\n\
                   Cat,1992-03-03,yes,555-0003,abc\n\
                   Dan,1993-04-04,no,555-0004,4000.50\n";
        let parsed = import(csv);

        assert_eq!(parsed.contacts.len(), 3);
        assert_eq!(parsed.errors, vec!["Row 4: Invalid Salary (expected decimal).".to_string()]);

        let outcome = parsed.outcome();
        assert_eq!((outcome.imported, outcome.failed), (3, 1));
    }

    #[test]
    fn test_empty_stream() {
        let err = import_contacts(Cursor::new(Vec::new()), &CancellationToken::new()).unwrap_err();
        match err {
            ServiceError::Validation(msg) => assert_eq!(msg, EMPTY_FILE_MESSAGE),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_header_only() {
        let parsed = import("name,phone\n");
        assert!(parsed.contacts.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_header_aliases_and_semicolons() {
        let csv = "\u{feff}PHONE; dob ;NAME;Salary;married\n\
                   555-1;01.02.1980;Eve;1.234,50;Y\n";
        let parsed = import(csv);

        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        let eve = &parsed.contacts[0];
        assert_eq!(eve.name, "Eve");
        assert_eq!(eve.phone, "555-1");
        assert_eq!(eve.date_of_birth, NaiveDate::from_ymd_opt(1980, 2, 1).unwrap());
        assert!(eve.married);
        assert_eq!(eve.salary.to_string(), "1234.50");
    }

    #[test]
    fn test_tab_delimited_with_quotes() {
        let csv = "Name\tDateOfBirth\tMarried\tPhone\tSalary\n\
                   \"Doe, Jane\"\t1970-07-07\t0\t555\t10\n";
        let parsed = import(csv);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.contacts[0].name, "Doe, Jane");
    }

    #[test]
    fn test_short_rows_fail_without_aborting() {
        let csv = "name,dob,married,phone,salary\n\
                   Only Name\n\
                   Ok,2000-01-01,1,555,1\n";
        let parsed = import(csv);
        assert_eq!(parsed.errors, vec!["Row 2: Invalid Phone (required, max 32).".to_string()]);
        assert_eq!(parsed.contacts.len(), 1);
    }

    #[test]
    fn test_invalid_utf8_row_is_malformed() {
        let mut bytes = b"name,dob,married,phone,salary\n".to_vec();
        bytes.extend_from_slice(b"Bad\xff,2000-01-01,1,555,1\n");
        bytes.extend_from_slice(b"Good,2000-01-01,1,555,1\n");

        let parsed = import_contacts(Cursor::new(bytes), &CancellationToken::new()).unwrap();
        assert_eq!(parsed.contacts.len(), 1);
        assert_eq!(parsed.errors, vec!["Row 2: Malformed row (invalid UTF-8 in field 1).".to_string()]);
    }

    #[test]
    fn test_unknown_headers_leave_fields_empty() {
        let parsed = import("full name,telephone\nAnn,555\n");
        assert_eq!(parsed.errors, vec!["Row 2: Invalid Name (required, max 200).".to_string()]);
    }

    #[test]
    fn test_cancelled_import_returns_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = import_contacts(Cursor::new(b"name\nAnn\n".to_vec()), &cancel).unwrap_err();
        assert!(matches!(err, ServiceError::Cancelled));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter(b"a,b,c\n1;2;3;4;5"), b',');
        assert_eq!(detect_delimiter(b"a;b;c"), b';');
        assert_eq!(detect_delimiter(b"\"a;b;c\",d\n"), b',');
        assert_eq!(detect_delimiter(b"a\tb|c\td"), b'\t');
        assert_eq!(detect_delimiter(b"single"), b',');
    }
}
