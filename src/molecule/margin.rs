//! Margin identities and boxes.
//!
//! A margin is a named, axis-aligned board region not occupied by pins. Each
//! margin kind belongs to one board [`Side`], which fixes the packing
//! direction and which way "away from the board centre" points.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::molecule::units::EPSILON_MM;

/// A 2D point in mm, relative to the pin-grid origin (y grows upward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate (mm).
    pub x: f64,
    /// Y coordinate (mm).
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

impl Axis {
    /// Returns the other axis.
    #[must_use]
    pub const fn perpendicular(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// Board side a margin belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Left edge.
    Left,
    /// Top edge.
    Top,
    /// Right edge.
    Right,
    /// Bottom edge.
    Bottom,
    /// Board interior.
    Center,
}

impl Side {
    /// Returns `true` if contacts pack from low to high coordinate.
    ///
    /// Left and top pack forward and right and bottom pack in reverse, which
    /// keeps grid indices running clockwise around the board.
    #[must_use]
    pub const fn packs_forward(self) -> bool {
        matches!(self, Self::Left | Self::Top | Self::Center)
    }

    /// Sign of the direction pointing away from the board centre.
    #[must_use]
    pub const fn outward_sign(self) -> f64 {
        match self {
            Self::Left | Self::Bottom => -1.0,
            Self::Top | Self::Right | Self::Center => 1.0,
        }
    }

    /// Natural packing axis for a margin running along this side.
    #[must_use]
    pub const fn natural_axis(self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Y,
            Self::Top | Self::Bottom | Self::Center => Axis::X,
        }
    }
}

/// Identity of a margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarginKind {
    // Base margins
    Left,
    Right,
    Top,
    Bottom,
    Center,
    // Wing areas
    TopWing,
    BottomWing,
    LeftWing,
    RightWing,
    // Wing edges (four-pin)
    TopLeftPinTop,
    TopRightPinTop,
    TopRightPinRight,
    BottomRightPinRight,
    BottomRightPinBottom,
    BottomLeftPinBottom,
    BottomLeftPinLeft,
    TopLeftPinLeft,
    // Wing edges (two-pin)
    LeftPinLeft,
    RightPinRight,
    // Diagonal corners
    TopLeftDiagonal,
    TopRightDiagonal,
    BottomRightDiagonal,
    BottomLeftDiagonal,
}

impl MarginKind {
    /// Every margin kind.
    pub const ALL: [Self; 23] = [
        Self::Left,
        Self::Right,
        Self::Top,
        Self::Bottom,
        Self::Center,
        Self::TopWing,
        Self::BottomWing,
        Self::LeftWing,
        Self::RightWing,
        Self::TopLeftPinTop,
        Self::TopRightPinTop,
        Self::TopRightPinRight,
        Self::BottomRightPinRight,
        Self::BottomRightPinBottom,
        Self::BottomLeftPinBottom,
        Self::BottomLeftPinLeft,
        Self::TopLeftPinLeft,
        Self::LeftPinLeft,
        Self::RightPinRight,
        Self::TopLeftDiagonal,
        Self::TopRightDiagonal,
        Self::BottomRightDiagonal,
        Self::BottomLeftDiagonal,
    ];

    /// Returns the stable name used in JSON, CSV and contact requests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
            Self::Top => "Top",
            Self::Bottom => "Bottom",
            Self::Center => "Center",
            Self::TopWing => "TopWing",
            Self::BottomWing => "BottomWing",
            Self::LeftWing => "LeftWing",
            Self::RightWing => "RightWing",
            Self::TopLeftPinTop => "TopLeftPinTop",
            Self::TopRightPinTop => "TopRightPinTop",
            Self::TopRightPinRight => "TopRightPinRight",
            Self::BottomRightPinRight => "BottomRightPinRight",
            Self::BottomRightPinBottom => "BottomRightPinBottom",
            Self::BottomLeftPinBottom => "BottomLeftPinBottom",
            Self::BottomLeftPinLeft => "BottomLeftPinLeft",
            Self::TopLeftPinLeft => "TopLeftPinLeft",
            Self::LeftPinLeft => "LeftPinLeft",
            Self::RightPinRight => "RightPinRight",
            Self::TopLeftDiagonal => "TopLeftDiagonal",
            Self::TopRightDiagonal => "TopRightDiagonal",
            Self::BottomRightDiagonal => "BottomRightDiagonal",
            Self::BottomLeftDiagonal => "BottomLeftDiagonal",
        }
    }

    /// Returns the side this margin belongs to.
    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::Left
            | Self::LeftWing
            | Self::BottomLeftPinLeft
            | Self::TopLeftPinLeft
            | Self::LeftPinLeft
            | Self::BottomLeftDiagonal => Side::Left,
            Self::Top
            | Self::TopWing
            | Self::TopLeftPinTop
            | Self::TopRightPinTop
            | Self::TopLeftDiagonal => Side::Top,
            Self::Right
            | Self::RightWing
            | Self::TopRightPinRight
            | Self::BottomRightPinRight
            | Self::RightPinRight
            | Self::TopRightDiagonal => Side::Right,
            Self::Bottom
            | Self::BottomWing
            | Self::BottomRightPinBottom
            | Self::BottomLeftPinBottom
            | Self::BottomRightDiagonal => Side::Bottom,
            Self::Center => Side::Center,
        }
    }

    /// Position in the clockwise fill order, or `None` for kinds outside it.
    #[must_use]
    pub const fn clockwise_rank(self) -> Option<u8> {
        match self {
            Self::Left => Some(0),
            Self::Top => Some(1),
            Self::Right => Some(2),
            Self::Bottom => Some(3),
            _ => None,
        }
    }
}

impl fmt::Display for MarginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MarginKind {
    type Err = String;

    /// Matches margin names case-insensitively, ignoring `-` and `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&key))
            .ok_or_else(|| format!("Unknown margin: {s}"))
    }
}

impl From<MarginKind> for String {
    fn from(kind: MarginKind) -> Self {
        kind.name().to_string()
    }
}

/// An axis-aligned usable region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarginBox {
    /// Margin identity.
    pub kind: MarginKind,
    /// Centre X (mm).
    pub center_x: f64,
    /// Centre Y (mm).
    pub center_y: f64,
    /// Width in X (mm).
    pub width: f64,
    /// Height in Y (mm).
    pub height: f64,
}

impl MarginBox {
    /// Creates a margin box.
    #[must_use]
    pub const fn new(kind: MarginKind, center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            kind,
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Returns `true` if the box has positive area.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.width > EPSILON_MM && self.height > EPSILON_MM
    }

    /// Returns the centre as a point.
    #[must_use]
    pub const fn center(&self) -> Point {
        Point::new(self.center_x, self.center_y)
    }

    /// Returns the centre coordinate on `axis`.
    #[must_use]
    pub const fn center_on(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.center_x,
            Axis::Y => self.center_y,
        }
    }

    /// Returns the size along `axis`.
    #[must_use]
    pub const fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.width,
            Axis::Y => self.height,
        }
    }

    /// Returns the lowest coordinate on `axis`.
    #[must_use]
    pub fn low(&self, axis: Axis) -> f64 {
        self.center_on(axis) - self.extent(axis) / 2.0
    }

    /// Returns the highest coordinate on `axis`.
    #[must_use]
    pub fn high(&self, axis: Axis) -> f64 {
        self.center_on(axis) + self.extent(axis) / 2.0
    }

    /// Returns the axis contacts are packed along: the longer dimension, or
    /// the side's natural axis for square boxes.
    #[must_use]
    pub fn primary_axis(&self) -> Axis {
        if self.width > self.height + EPSILON_MM {
            Axis::X
        } else if self.height > self.width + EPSILON_MM {
            Axis::Y
        } else {
            self.kind.side().natural_axis()
        }
    }

    /// Sign of the perpendicular direction pointing away from the board centre.
    ///
    /// Follows the box position when it is off-centre on the perpendicular
    /// axis, otherwise the side convention.
    #[must_use]
    pub fn outward_sign(&self) -> f64 {
        let across = self.center_on(self.primary_axis().perpendicular());
        if across.abs() > EPSILON_MM {
            across.signum()
        } else {
            self.kind.side().outward_sign()
        }
    }

    /// Returns `true` if `point` lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.low(Axis::X) - EPSILON_MM
            && point.x <= self.high(Axis::X) + EPSILON_MM
            && point.y >= self.low(Axis::Y) - EPSILON_MM
            && point.y <= self.high(Axis::Y) + EPSILON_MM
    }
}
