//! The line driver: factor set resolution, per-line computation, stream
//! runners and batch variants.
//!
//! Two modes exist, mirroring the two phases of a factored translation
//! system:
//!
//! - **Text (training) mode**: exactly one factor; each tokenized input line
//!   yields one space-joined label line. The corpus-preparation scripts call
//!   this once per factor.
//! - **JSON (inference) mode**: any number of factors; each input line is a
//!   JSON record that gains `factor_names` and a `factors` matrix. When a
//!   segmentation-role factor is requested, every other factor's labels are
//!   broadcast across the subword units first.
//!
//! The reference runners are sequential and preserve line order. Lines are
//! independent of each other, so [`Pipeline::text_batch`] and
//! [`Pipeline::json_batch`] offer an order-preserving rayon-parallel path for
//! bulk corpus preparation.

use std::io::{BufRead, Write};

use rayon::prelude::*;
use serde_json::{Map, Value};
use tracing::debug;

use super::broadcast::broadcast;
use super::factor::{Factor, FactorError, FactorRegistry, FactorRole};
use super::record::Record;
use super::segmentation::{tag_segment, SubwordTag};

/// A resolved, ordered factor set and the operations over it.
#[derive(Debug)]
pub struct Pipeline {
    factors: Vec<(String, Box<dyn Factor>)>,
}

impl Pipeline {
    /// Resolve `names` against `registry`, preserving request order.
    ///
    /// Fails with [`FactorError::UnknownFactor`] before any line is read, so
    /// a bad configuration never consumes input.
    pub fn from_names<S: AsRef<str>>(
        registry: &FactorRegistry,
        names: &[S],
    ) -> Result<Self, FactorError> {
        let mut factors = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            factors.push((name.to_string(), registry.build(name)?));
        }
        debug!(factors = ?factors.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(), "factor set resolved");
        Ok(Self { factors })
    }

    /// The requested factor names, in request order.
    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn single_factor(&self) -> Result<&dyn Factor, FactorError> {
        match self.factors.as_slice() {
            [(_, factor)] => Ok(factor.as_ref()),
            factors => Err(FactorError::SingleFactorRequired(factors.len())),
        }
    }

    /// The tag sequence of the first segmentation-role factor, if one was
    /// requested. Its field is read from the record; its tags define the
    /// grouping every other factor is broadcast over.
    fn segmentation_tags(&self, record: &Record) -> Result<Option<Vec<SubwordTag>>, FactorError> {
        for (_, factor) in &self.factors {
            if factor.role() == FactorRole::Segmentation {
                let segment = record.text_field(factor.json_field())?;
                return Ok(Some(tag_segment(segment)));
            }
        }
        Ok(None)
    }

    /// Training mode, one line: compute the single configured factor and
    /// join its labels with spaces.
    pub fn text_line(&self, line: &str) -> Result<String, FactorError> {
        let factor = self.single_factor()?;
        Ok(factor.compute(line).join(" "))
    }

    /// Inference mode, one line: parse the record, attach `factor_names`,
    /// compute every factor, broadcast across subword units when a
    /// segmentation factor is present, attach `factors`, serialize.
    pub fn json_line(&self, line: &str) -> Result<String, FactorError> {
        let mut record = Record::parse(line)?;

        let names: Vec<Value> = self
            .factors
            .iter()
            .map(|(name, _)| Value::String(name.clone()))
            .collect();
        record.insert("factor_names", Value::Array(names));

        let tags = self.segmentation_tags(&record)?;

        let mut matrix = Map::new();
        for (name, factor) in &self.factors {
            if factor.role() == FactorRole::Segmentation {
                continue;
            }
            let values = factor.compute_record(&record)?;
            let values = match &tags {
                Some(tags) => broadcast(tags, &values).map_err(|source| {
                    FactorError::Misaligned {
                        factor: name.clone(),
                        source,
                    }
                })?,
                None => values,
            };
            matrix.insert(
                name.clone(),
                Value::Array(values.into_iter().map(Value::String).collect()),
            );
        }
        record.insert("factors", Value::Object(matrix));

        Ok(record.to_line()?)
    }

    /// Run training mode over a stream: one label line out per input line.
    ///
    /// The first failing line aborts the stream with its 1-based line number
    /// attached; no partial or misaligned output follows an error.
    pub fn run_text<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<(), FactorError> {
        self.single_factor()?;
        let mut lines = 0usize;
        for (lineno, line) in input.lines().enumerate() {
            let line = line?;
            let labels = self.text_line(&line).map_err(|e| e.at_line(lineno + 1))?;
            writeln!(output, "{labels}")?;
            lines += 1;
        }
        output.flush()?;
        debug!(lines, "text stream complete");
        Ok(())
    }

    /// Run inference mode over a stream of JSON records.
    ///
    /// Output is flushed after every record; downstream translators consume
    /// records incrementally.
    pub fn run_json<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<(), FactorError> {
        let mut lines = 0usize;
        for (lineno, line) in input.lines().enumerate() {
            let line = line?;
            let enriched = self.json_line(&line).map_err(|e| e.at_line(lineno + 1))?;
            writeln!(output, "{enriched}")?;
            output.flush()?;
            lines += 1;
        }
        debug!(lines, "json stream complete");
        Ok(())
    }

    /// Training mode over a batch of lines, in parallel. Output order matches
    /// input order; the first error wins, and no output is produced for a
    /// failing batch.
    pub fn text_batch(&self, lines: &[String]) -> Result<Vec<String>, FactorError> {
        self.single_factor()?;
        lines.par_iter().map(|line| self.text_line(line)).collect()
    }

    /// Inference mode over a batch of records, in parallel, order-preserving.
    pub fn json_batch(&self, lines: &[String]) -> Result<Vec<String>, FactorError> {
        lines.par_iter().map(|line| self.json_line(line)).collect()
    }
}
