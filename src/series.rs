//! PLC series definitions.
//!
//! The series decides which devices exist, how device references are laid
//! out on the wire and which subcommands select bit or word access.

use std::fmt;
use std::str::FromStr;

use crate::error::{McError, Result};

/// MELSEC PLC series supported by the MC protocol client.
///
/// # Example
///
/// ```
/// use melsec_mc::PlcSeries;
///
/// let series: PlcSeries = "iQ-R".parse().unwrap();
/// assert_eq!(series, PlcSeries::IqR);
/// assert_eq!(series.to_string(), "iQ-R");
/// assert!("FX".parse::<PlcSeries>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlcSeries {
    /// MELSEC-Q series.
    #[default]
    Q,
    /// MELSEC-L series.
    L,
    /// MELSEC-QnA series.
    QnA,
    /// MELSEC iQ-L series.
    IqL,
    /// MELSEC iQ-R series.
    IqR,
}

impl PlcSeries {
    /// Returns whether this is the iQ-R series.
    ///
    /// iQ-R uses wider device references (4-byte number, 2-byte code) and
    /// its own subcommands for batch and random access.
    pub fn is_iqr(self) -> bool {
        self == PlcSeries::IqR
    }

    /// Returns the series name as used in configuration strings.
    pub fn as_str(self) -> &'static str {
        match self {
            PlcSeries::Q => "Q",
            PlcSeries::L => "L",
            PlcSeries::QnA => "QnA",
            PlcSeries::IqL => "iQ-L",
            PlcSeries::IqR => "iQ-R",
        }
    }
}

impl FromStr for PlcSeries {
    type Err = McError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Q" => Ok(PlcSeries::Q),
            "L" => Ok(PlcSeries::L),
            "QnA" => Ok(PlcSeries::QnA),
            "iQ-L" => Ok(PlcSeries::IqL),
            "iQ-R" => Ok(PlcSeries::IqR),
            other => Err(McError::PlcType(other.to_string())),
        }
    }
}

impl fmt::Display for PlcSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
