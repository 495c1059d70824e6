//! Marker colors and color tables.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use image::Rgb;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An exactly-matchable 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Fuchsia, the default border marker for the first render.
    pub const FUCHSIA: Color = Color::new(255, 0, 255);

    /// Aqua, the default border marker for the second render.
    pub const AQUA: Color = Color::new(0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lowercase `rrggbb` code, as written into document markup.
    pub fn hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#RRGGBB` or `rrggbb`.
    pub fn parse_hex(code: &str) -> Result<Self> {
        let digits = code.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(Error::InvalidColor(code.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| Error::InvalidColor(code.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Pixel value for matching against decoded renders.
    pub fn to_rgb(&self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

impl From<Rgb<u8>> for Color {
    fn from(pixel: Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0;
        Self::new(r, g, b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.hex())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_hex(s)
    }
}

/// An ordered list of allocated colors.
///
/// Order matters: cells are colored in allocation order, and cell recovery
/// scans colors in the same order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorTable {
    colors: Vec<Color>,
}

impl ColorTable {
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn into_colors(self) -> Vec<Color> {
        self.colors
    }

    /// Write the table as CSV rows `index,HEX,R-G-B` with a header line.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(["", "HEX", "RGB"])?;
        for (i, color) in self.colors.iter().enumerate() {
            wtr.write_record([
                i.to_string(),
                color.hex(),
                format!("{}-{}-{}", color.r, color.g, color.b),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Read a table written by [`ColorTable::write_csv`].
    ///
    /// The `HEX` column is authoritative; the `RGB` column is ignored.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let mut colors = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let hex = record.get(1).ok_or_else(|| {
                Error::Serialization(format!("color table row {}: missing HEX", row + 1))
            })?;
            colors.push(Color::parse_hex(hex)?);
        }
        Ok(Self { colors })
    }
}

impl From<Vec<Color>> for ColorTable {
    fn from(colors: Vec<Color>) -> Self {
        Self::new(colors)
    }
}
