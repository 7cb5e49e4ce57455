use super::ReportSink;
use crate::error::Result;
use crate::model::CommitRecord;
use std::io::Write;

pub struct CsvSink<W: Write> {
    out: W,
    sha1: bool,
    separator: String,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W, sha1: bool, separator: &str) -> Self {
        Self {
            out,
            sha1,
            separator: separator.to_string(),
        }
    }

    fn write_row(&mut self, fields: &[&str]) -> Result<()> {
        writeln!(self.out, "{}", fields.join(self.separator.as_str()))?;
        Ok(())
    }
}

impl<W: Write> ReportSink for CsvSink<W> {
    fn begin(&mut self) -> Result<()> {
        if self.sha1 {
            self.write_row(&["Sha1", "Date", "LOCs"])
        } else {
            self.write_row(&["Date", "LOCs"])
        }
    }

    fn emit(&mut self, commit: &CommitRecord, lines: u64) -> Result<()> {
        let date = commit.date_string();
        let lines = lines.to_string();
        if self.sha1 {
            self.write_row(&[commit.id(), &date, &lines])?;
        } else {
            self.write_row(&[&date, &lines])?;
        }
        // rows are independent; flush so partial runs leave usable output
        self.out.flush()?;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
