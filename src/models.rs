use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Style id carried by records that do not name one.
pub const DEFAULT_STYLE: i32 = 0;
/// Time-axis sentinel meaning "no time sequence".
pub const DEFAULT_TIME_SEQ: f64 = -1.0;
/// Geometry is normalized to this resolution unless the caller overrides it.
pub const NORMALIZED_GEOMETRY: f64 = 1000.0;
/// Byte threshold at which a new `wrapper-raw` element is opened.
pub const WRAPPER_BUFFER_SIZE: usize = 8192;
/// Separator between serialized records inside a `wrapper-raw` element.
pub const WRAPPER_RAW_DELIMITER: char = ':';
/// Delimiter between a value field and its style suffix (`<value>:<styleId>`).
pub const VALUE_STYLE_DELIMITER: char = ':';
/// Lines whose first field starts with this are comments.
pub const COMMENT_FLAG: char = '#';

/// Extension used when the render service declares a content type we don't know.
pub const GENERIC_EXTENSION: &str = ".gaia";

/// Response content types the render service is known to produce, with the
/// file extension each one is saved under.
pub static FILE_EXTENSIONS: &[(&str, &str)] = &[
    ("image/gif", ".gif"),
    ("image/png", ".png"),
    ("video/mpeg", ".mpg"),
    ("video/quicktime", ".mov"),
    ("video/mp4", ".mp4"),
    ("video/ogg", ".ogg"),
    ("application/x-tar", ".tgz"),
    ("application/x-gzip", ".gz"),
];

/// Look up the output extension for a response content type.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    FILE_EXTENSIONS
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, ext)| *ext)
}

/// Error for a color string that is not `alpha.blue.green.red` with each
/// channel in 0..=255.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a valid aBGR color (expected `alpha.blue.green.red`, channels 0-255)")]
pub struct ColorParseError(pub String);

/// Color in the render protocol's alpha/blue/green/red channel order.
///
/// The textual form is 4 dot-separated integers in that order, e.g.
/// `255.0.0.255` for opaque red.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abgr {
    pub alpha: u8,
    pub blue: u8,
    pub green: u8,
    pub red: u8,
}

impl Abgr {
    pub fn new(alpha: u8, blue: u8, green: u8, red: u8) -> Self {
        Self {
            alpha,
            blue,
            green,
            red,
        }
    }
}

impl fmt::Display for Abgr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.alpha, self.blue, self.green, self.red
        )
    }
}

impl FromStr for Abgr {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let channels: Vec<&str> = s.split('.').collect();
        if channels.len() != 4 {
            return Err(ColorParseError(s.to_string()));
        }
        let mut parsed = [0u8; 4];
        for (slot, token) in parsed.iter_mut().zip(&channels) {
            *slot = token
                .parse::<u8>()
                .map_err(|_| ColorParseError(s.to_string()))?;
        }
        Ok(Self::new(parsed[0], parsed[1], parsed[2], parsed[3]))
    }
}

impl Serialize for Abgr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Abgr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        struct AbgrVisitor;

        impl<'de> Visitor<'de> for AbgrVisitor {
            type Value = Abgr;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a dotted aBGR color string like \"255.0.0.255\"")
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                s.parse::<Abgr>().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(AbgrVisitor)
    }
}

/// Region coding scheme for `Region` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodingScheme {
    /// US FIPS state/county codes (e.g. `st42.ct003`).
    UsFips,
    /// Hierarchical administrative subdivision codes.
    Hasc,
}

impl CodingScheme {
    /// Keyword that introduces a record of this scheme in the input format.
    pub fn keyword(&self) -> &'static str {
        match self {
            CodingScheme::UsFips => "usfips",
            CodingScheme::Hasc => "hasc",
        }
    }
}

/// One plottable map element.
///
/// Every variant carries a `style_id` (0 when unstyled) and a `time` axis
/// value (`DEFAULT_TIME_SEQ` when the element has no time axis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WrapperRecord {
    /// A single value at a point.
    Point {
        lat: f64,
        lon: f64,
        value: f64,
        style_id: i32,
        time: f64,
    },
    /// A value for a coded region (choropleth fill).
    Region {
        code: String,
        scheme: CodingScheme,
        value: f64,
        style_id: i32,
        time: f64,
    },
    /// A labeled point.
    Label {
        lat: f64,
        lon: f64,
        label: String,
        value: f64,
        style_id: i32,
        time: f64,
    },
    /// An open polyline; vertices are `(lon, lat)` in plot order.
    Path {
        id: i64,
        vertices: Vec<(f64, f64)>,
        value: f64,
        style_id: i32,
        time: f64,
    },
    /// A closed shape; vertices are `(lon, lat)` in plot order.
    Polygon {
        id: i64,
        vertices: Vec<(f64, f64)>,
        value: f64,
        style_id: i32,
        time: f64,
    },
}

impl WrapperRecord {
    /// Input-format keyword for this element type.
    pub fn keyword(&self) -> &'static str {
        match self {
            WrapperRecord::Point { .. } => "lonlat",
            WrapperRecord::Region { scheme, .. } => scheme.keyword(),
            WrapperRecord::Label { .. } => "lonlat-label",
            WrapperRecord::Path { .. } => "lonlat-path",
            WrapperRecord::Polygon { .. } => "lonlat-poly",
        }
    }

    pub fn style_id(&self) -> i32 {
        match self {
            WrapperRecord::Point { style_id, .. }
            | WrapperRecord::Region { style_id, .. }
            | WrapperRecord::Label { style_id, .. }
            | WrapperRecord::Path { style_id, .. }
            | WrapperRecord::Polygon { style_id, .. } => *style_id,
        }
    }

    pub fn time(&self) -> f64 {
        match self {
            WrapperRecord::Point { time, .. }
            | WrapperRecord::Region { time, .. }
            | WrapperRecord::Label { time, .. }
            | WrapperRecord::Path { time, .. }
            | WrapperRecord::Polygon { time, .. } => *time,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            WrapperRecord::Point { value, .. }
            | WrapperRecord::Region { value, .. }
            | WrapperRecord::Label { value, .. }
            | WrapperRecord::Path { value, .. }
            | WrapperRecord::Polygon { value, .. } => *value,
        }
    }
}

/// One color/radius bin covering an inclusive value range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleBin {
    pub color: Abgr,
    pub radius: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// A set of bins color-coding magnitude, keyed by a numeric style id.
///
/// Bins keep the order they were produced in; producers are responsible for
/// emitting them in ascending, non-overlapping order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTable {
    pub style_id: i32,
    pub legend_support: bool,
    pub bins: Vec<StyleBin>,
}

impl StyleTable {
    /// Zip boundary pairs with a color list into a table, one bin per pair.
    ///
    /// Trailing boundaries without a matching color (or vice versa) are
    /// dropped.
    pub fn from_boundaries(
        style_id: i32,
        legend_support: bool,
        boundaries: &[(f64, f64)],
        colors: &[Abgr],
        radius: f64,
    ) -> Self {
        let bins = boundaries
            .iter()
            .zip(colors)
            .map(|(&(lower_bound, upper_bound), &color)| StyleBin {
                color,
                radius,
                lower_bound,
                upper_bound,
            })
            .collect();
        Self {
            style_id,
            legend_support,
            bins,
        }
    }
}
