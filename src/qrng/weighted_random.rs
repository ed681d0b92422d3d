use super::error::{Error, Result};
use super::source::RandomByteSource;
use super::{BYTE_SPACE, TABLE_TOTAL};
use log::{debug, trace};
use std::borrow::Cow;
use std::ops::{Range, RangeInclusive};

///
/// Rescales `weights` into integer slot counts summing to exactly 255.
///
/// Each entry is truncated, and whatever truncation lost goes to the first
/// entry holding the largest source weight.
///
pub fn normalize_weights(weights: &[f64]) -> Result<Vec<u32>> {
    if weights.is_empty() {
        return Err(Error::InvalidArguments(
            "at least one weight is required".to_string(),
        ));
    }
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(Error::InvalidArguments(format!(
            "weights must be finite and non-negative, got {}",
            bad
        )));
    }
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(Error::InvalidArguments(format!(
            "weights must sum to a positive number, got {}",
            total
        )));
    }

    let mut table: Vec<u32> = weights
        .iter()
        .map(|weight| ((weight / total) * TABLE_TOTAL as f64) as u32)
        .collect();

    let deficit = TABLE_TOTAL.saturating_sub(table.iter().sum());
    if deficit > 0 {
        let max_idx = weights
            .iter()
            .enumerate()
            .fold(0, |best, (i, weight)| if *weight > weights[best] { i } else { best });
        table[max_idx] += deficit;
    }
    trace!("Normalized {:?} into {:?}", weights, table);
    Ok(table)
}

///
/// Assignment of every byte value to one of the choices.
///
/// Choices own contiguous byte ranges in input order, sized by the normalized
/// table. The table only covers 255 slots, so the last choice holding any
/// slots also owns byte 255.
///
#[derive(Debug, Clone)]
pub struct ChoiceMap<'a, T> {
    choices: &'a [T],
    table: Vec<u32>,
    ranges: Vec<Range<u32>>,
    last_filled: usize,
}

impl<'a, T> ChoiceMap<'a, T> {
    pub fn new(choices: &'a [T], weights: Option<&[f64]>) -> Result<ChoiceMap<'a, T>> {
        if choices.is_empty() {
            return Err(Error::InvalidArguments(
                "at least one choice is required".to_string(),
            ));
        }
        let weights: Cow<[f64]> = match weights {
            Some(weights) if weights.len() != choices.len() => {
                return Err(Error::InvalidArguments(format!(
                    "got {} weights for {} choices",
                    weights.len(),
                    choices.len()
                )));
            }
            Some(weights) => Cow::Borrowed(weights),
            None => Cow::Owned(vec![1.0; choices.len()]),
        };

        let table = normalize_weights(&weights)?;
        // A positive total always leaves at least the max-weight entry filled
        let last_filled = table.iter().rposition(|slots| *slots > 0).unwrap_or(0);

        let mut start = 0;
        let ranges = table
            .iter()
            .enumerate()
            .map(|(i, slots)| {
                let end = if i == last_filled {
                    BYTE_SPACE as u32
                } else {
                    start + slots
                };
                let range = start..end;
                start = end;
                range
            })
            .collect();

        Ok(ChoiceMap {
            choices,
            table,
            ranges,
            last_filled,
        })
    }

    /// The normalized slot counts, one per choice.
    pub fn table(&self) -> &[u32] {
        &self.table
    }

    pub fn index_of(&self, byte: u8) -> usize {
        let byte = byte as u32;
        self.ranges
            .iter()
            .position(|range| range.contains(&byte))
            .unwrap_or(self.last_filled)
    }

    pub fn resolve(&self, byte: u8) -> &'a T {
        &self.choices[self.index_of(byte)]
    }

    /// Bytes that select choice `index`, or `None` when it owns no slots.
    pub fn slot_range(&self, index: usize) -> Option<RangeInclusive<u8>> {
        let range = self.ranges.get(index)?;
        if range.is_empty() {
            return None;
        }
        Some(range.start as u8..=(range.end - 1) as u8)
    }
}

///
/// Makes weighted choices, drawing one byte from its source per choice.
///
pub struct WeightedChooser<S: RandomByteSource> {
    source: S,
}

impl<S: RandomByteSource> WeightedChooser<S> {
    pub fn new(source: S) -> WeightedChooser<S> {
        WeightedChooser { source }
    }

    ///
    /// Picks one of `choices`. Without `weights` every choice is equally likely.
    ///
    /// Arguments are checked before the source is touched.
    ///
    pub fn choose<'a, T: std::fmt::Debug>(
        &mut self,
        choices: &'a [T],
        weights: Option<&[f64]>,
    ) -> Result<&'a T> {
        let map = ChoiceMap::new(choices, weights)?;
        let byte = self.source.fetch_byte()?;
        let choice = map.resolve(byte);
        debug!("Byte {} selects {:?}", byte, choice);
        Ok(choice)
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

/// One-off weighted choice from `source`.
pub fn quantum_choice<'a, S: RandomByteSource + ?Sized, T: std::fmt::Debug>(
    source: &mut S,
    choices: &'a [T],
    weights: Option<&[f64]>,
) -> Result<&'a T> {
    WeightedChooser::new(source).choose(choices, weights)
}
