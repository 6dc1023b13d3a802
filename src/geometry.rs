use std::ops::{Add, Sub};
use std::str::FromStr;

/// Tag for the relative position of a screen with respect to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    LeftOf,
    RightOf,
    Above,
    Under,
}

impl Direction {
    /// `a.relation_to(b) == d` implies `b.relation_to(a) == d.inverse()`.
    pub fn inverse(self) -> Direction {
        match self {
            Direction::LeftOf => Direction::RightOf,
            Direction::RightOf => Direction::LeftOf,
            Direction::Above => Direction::Under,
            Direction::Under => Direction::Above,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Direction::LeftOf => "left",
            Direction::RightOf => "right",
            Direction::Above => "above",
            Direction::Under => "under",
        };
        f.write_str(s)
    }
}

impl FromStr for Direction {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Direction, &'static str> {
        match s {
            "left" | "left-of" => Ok(Direction::LeftOf),
            "right" | "right-of" => Ok(Direction::RightOf),
            "above" => Ok(Direction::Above),
            "under" | "below" => Ok(Direction::Under),
            _ => Err("expected one of: left right above under"),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////

/// Pair of integers, used as coordinates / sizes.
/// `x` goes from left to right, `y` from top to bottom.
/// [`Ord`] is lexicographic: `x` compared first, then `y`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Vec2d {
    pub x: i32,
    pub y: i32,
}

impl Vec2d {
    pub fn new(x: i32, y: i32) -> Vec2d {
        Vec2d { x, y }
    }

    /// Component-wise max.
    pub fn cwise_max(self, rhs: Vec2d) -> Vec2d {
        Vec2d {
            x: std::cmp::max(self.x, rhs.x),
            y: std::cmp::max(self.y, rhs.y),
        }
    }
}

impl From<(i32, i32)> for Vec2d {
    fn from(pair: (i32, i32)) -> Vec2d {
        let (x, y) = pair;
        Vec2d { x, y }
    }
}

impl Add for Vec2d {
    type Output = Vec2d;
    fn add(self, rhs: Vec2d) -> Vec2d {
        Vec2d {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2d {
    type Output = Vec2d;
    fn sub(self, rhs: Vec2d) -> Vec2d {
        Vec2d {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::fmt::Display for Vec2d {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Parse `"1920x1080"` style strings, for the command line.
impl FromStr for Vec2d {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Vec2d, &'static str> {
        let (x, y) = s.split_once('x').ok_or("expected WxH")?;
        let x = x.parse().map_err(|_| "bad width")?;
        let y = y.parse().map_err(|_| "bad height")?;
        Ok(Vec2d { x, y })
    }
}

///////////////////////////////////////////////////////////////////////////////

/// `x` axis is from left to right, `y` axis from top to bottom.
/// The rectangle covers pixels in `[tl.x, tl.x+size.x[ X [tl.y, tl.y+size.y[`.
/// Right and bottom sides are excluded.
#[derive(Debug, Clone)]
pub struct Rect {
    pub top_left: Vec2d,
    pub size: Vec2d,
}

impl Rect {
    pub fn new(top_left: Vec2d, size: Vec2d) -> Rect {
        Rect { top_left, size }
    }

    pub fn bottom_right(&self) -> Vec2d {
        self.top_left + self.size
    }
    fn top_right(&self) -> Vec2d {
        self.top_left + Vec2d::new(self.size.x, 0)
    }
    fn bottom_left(&self) -> Vec2d {
        self.top_left + Vec2d::new(0, self.size.y)
    }

    fn center_top(&self) -> Vec2d {
        self.top_left + Vec2d::new(self.size.x / 2, 0)
    }
    fn center_bottom(&self) -> Vec2d {
        self.top_left + Vec2d::new(self.size.x / 2, self.size.y)
    }
    fn center_left(&self) -> Vec2d {
        self.top_left + Vec2d::new(0, self.size.y / 2)
    }
    fn center_right(&self) -> Vec2d {
        self.top_left + Vec2d::new(self.size.x, self.size.y / 2)
    }

    fn offset(&self, delta: Vec2d) -> Rect {
        Rect {
            top_left: self.top_left + delta,
            size: self.size,
        }
    }

    /// Does `self` overlap `other` ?
    pub fn overlaps(&self, other: &Rect) -> bool {
        // Easier to determine the absence of overlap : the other rect must be entirely on one side.
        let left_of = self.top_right().x <= other.top_left.x;
        let right_of = other.top_right().x <= self.top_left.x;
        let above = self.bottom_left().y <= other.top_left.y;
        let under = other.bottom_left().y <= self.top_left.y;
        let no_overlap = left_of || right_of || above || under;
        !no_overlap
    }

    /// Determine if `self` is adjacent to `rhs`, and in which direction (`self direction rhs`).
    /// Current criterion : touching on one side with an overlap at least half the size of the biggest rect.
    pub fn adjacent_direction(&self, rhs: &Rect) -> Option<Direction> {
        let lhs = self;
        let size_max = Vec2d::cwise_max(lhs.size, rhs.size);
        let is_adjacent_x = |l: Vec2d, r: Vec2d| l.x == r.x && 2 * (l.y - r.y).abs() <= size_max.y;
        let is_adjacent_y = |l: Vec2d, r: Vec2d| l.y == r.y && 2 * (l.x - r.x).abs() <= size_max.x;
        if is_adjacent_x(lhs.center_right(), rhs.center_left()) {
            return Some(Direction::LeftOf);
        }
        if is_adjacent_x(lhs.center_left(), rhs.center_right()) {
            return Some(Direction::RightOf);
        }
        if is_adjacent_y(lhs.center_bottom(), rhs.center_top()) {
            return Some(Direction::Above);
        }
        if is_adjacent_y(lhs.center_top(), rhs.center_bottom()) {
            return Some(Direction::Under);
        }
        None
    }
}

#[cfg(test)]
#[test]
fn test_direction_algebra() {
    use Direction::*;
    for d in [LeftOf, RightOf, Above, Under] {
        assert_eq!(d.inverse().inverse(), d);
        assert_eq!(d, d.to_string().parse().unwrap());
    }
    assert_eq!(LeftOf.inverse(), RightOf);
    assert_eq!(Above.inverse(), Under);
    assert!("northwest".parse::<Direction>().is_err());
}

#[cfg(test)]
#[test]
fn test_vec2d() {
    assert_eq!("1920x1080".parse(), Ok(Vec2d::new(1920, 1080)));
    assert!("1920".parse::<Vec2d>().is_err());
    assert!("axb".parse::<Vec2d>().is_err());
    // Lexicographic order, x first.
    assert!(Vec2d::new(1000, 2000) < Vec2d::new(2000, 1000));
    assert!(Vec2d::new(1000, 500) < Vec2d::new(1000, 800));
}

#[cfg(test)]
#[test]
fn test_overlaps() {
    let main = Rect::new(Vec2d::new(0, 0), Vec2d::new(1920, 1080));
    // Adjacent
    assert!(!main.overlaps(&main.offset((1920, 0).into())));
    assert!(!main.overlaps(&main.offset((-1920, 0).into())));
    assert!(!main.overlaps(&main.offset((0, 1080).into())));
    assert!(!main.overlaps(&main.offset((0, -1080).into())));
    // Adjacent to corners
    assert!(!main.overlaps(&main.offset((1920, 600).into())));
    assert!(!main.overlaps(&main.offset((1920, 1080).into())));
    // With gap
    assert!(!main.overlaps(&main.offset((-2000, 0).into())));
    assert!(!main.overlaps(&main.offset((2000, 0).into())));
    assert!(!main.overlaps(&main.offset((0, 1500).into())));
    // Should overlap
    assert!(main.overlaps(&main.offset((1919, 0).into())));
    assert!(main.overlaps(&main.offset((-1919, 0).into())));
    assert!(main.overlaps(&main.offset((200, 0).into())));
    assert!(main.overlaps(&main.offset((0, 1079).into())));
    assert!(main.overlaps(&main))
}

#[cfg(test)]
#[test]
fn test_adjacent_direction() {
    let size = Vec2d::new(1920, 1080);
    let primary = Rect::new(Vec2d::new(0, 0), size);
    let at_right = Rect::new(primary.top_right(), size);
    let right_gap = Rect::new(primary.top_right() + Vec2d::new(1, 0), size);
    let under_middle = Rect::new(primary.center_bottom(), size);
    let smaller_above = Rect::new(
        primary.center_top() + Vec2d::new(200, -480),
        Vec2d::new(640, 480),
    );
    assert_eq!(primary.adjacent_direction(&primary), None);
    assert_eq!(primary.adjacent_direction(&at_right), Some(Direction::LeftOf));
    assert_eq!(at_right.adjacent_direction(&primary), Some(Direction::RightOf));
    assert_eq!(primary.adjacent_direction(&right_gap), None);
    assert_eq!(
        primary.adjacent_direction(&under_middle),
        Some(Direction::Above)
    );
    assert_eq!(
        at_right.adjacent_direction(&under_middle),
        Some(Direction::Above)
    );
    assert_eq!(
        primary.adjacent_direction(&smaller_above),
        Some(Direction::Under)
    );
    assert_eq!(at_right.adjacent_direction(&smaller_above), None);
}
